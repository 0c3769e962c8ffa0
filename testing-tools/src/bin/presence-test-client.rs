use anyhow::Result;
use clap::Parser;
use colored::*;
use std::time::Duration;

use testing_tools::api_client::ApiClient;
use testing_tools::output::print_test_summary;
use testing_tools::scenarios;
use testing_tools::sse_client::Connection;

#[derive(Parser)]
#[command(name = "presence-test-client")]
#[command(about = "Realtime presence integration testing tool")]
struct Cli {
    /// Base URL of the backend (e.g., http://localhost:4000)
    #[arg(long)]
    base_url: String,

    /// Test scenario to run
    #[arg(long, value_enum, default_value = "all")]
    scenario: ScenarioChoice,

    /// Seconds to wait for the server to drop a closed session; must exceed the
    /// server's realtime keep-alive interval
    #[arg(long, default_value_t = 30)]
    cleanup_timeout_secs: u64,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone)]
enum ScenarioChoice {
    /// Both clients connect and are listed by the server
    ConnectionTest,
    /// A new dev is pushed to both clients
    NewDev,
    /// A client reports a new location
    RegionChange,
    /// A client hangs up and stops receiving events
    Disconnect,
    /// Run every scenario in order
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    println!("{}", "=== SETUP PHASE ===".bright_white().bold());

    let api_client = ApiClient::new(reqwest::Client::new(), cli.base_url.clone());

    println!("\n{} Establishing realtime connections...", "→".blue());
    let mut conn_a = Connection::establish(
        &cli.base_url,
        "Client A".to_string(),
        Color::BrightBlue,
        10.0,
        20.0,
    )
    .await?;
    let mut conn_b = Connection::establish(
        &cli.base_url,
        "Client B".to_string(),
        Color::BrightMagenta,
        11.0,
        21.0,
    )
    .await?;

    println!("{} Client A connected (session {})", "✓".green(), conn_a.session_id);
    println!("{} Client B connected (session {})", "✓".green(), conn_b.session_id);

    println!("\n{}", "=== TEST PHASE ===".bright_white().bold());

    let cleanup_timeout = Duration::from_secs(cli.cleanup_timeout_secs);
    let mut results = Vec::new();

    match cli.scenario {
        ScenarioChoice::ConnectionTest => {
            results.push(scenarios::test_connection(&api_client, &conn_a, &conn_b).await?);
        }
        ScenarioChoice::NewDev => {
            results.push(
                scenarios::test_new_dev_broadcast(&api_client, &mut conn_a, &mut conn_b).await?,
            );
        }
        ScenarioChoice::RegionChange => {
            results.push(scenarios::test_region_change(&api_client, &conn_a).await?);
        }
        ScenarioChoice::Disconnect => {
            results.push(
                scenarios::test_disconnect(&api_client, &mut conn_a, conn_b, cleanup_timeout)
                    .await?,
            );
        }
        ScenarioChoice::All => {
            results.push(scenarios::test_connection(&api_client, &conn_a, &conn_b).await?);
            results.push(
                scenarios::test_new_dev_broadcast(&api_client, &mut conn_a, &mut conn_b).await?,
            );
            results.push(scenarios::test_region_change(&api_client, &conn_a).await?);
            results.push(
                scenarios::test_disconnect(&api_client, &mut conn_a, conn_b, cleanup_timeout)
                    .await?,
            );
        }
    }

    println!("\n{}", "=== RESULTS ===".bright_white().bold());
    print_test_summary(&results);

    let all_passed = results.iter().all(|r| r.passed);

    if all_passed {
        println!("\n{}", "All tests passed! ✓".bright_green().bold());
    } else {
        println!("\n{}", "Some tests failed! ✗".bright_red().bold());
    }

    std::process::exit(if all_passed { 0 } else { 1 });
}
