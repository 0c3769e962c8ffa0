use anyhow::Result;
use colored::*;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

use crate::api_client::ApiClient;
use crate::output::{print_event, TestResult};
use crate::sse_client::Connection;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

fn test_dev(id: &str) -> Value {
    json!({
        "github_username": id,
        "name": format!("Test Dev {id}"),
        "bio": "Created by presence-test-client",
        "techs": ["Rust", "React Native"],
        "avatar_url": format!("https://avatars.example/{id}.png"),
        "location": {"type": "Point", "coordinates": [20.0, 10.0]}
    })
}

pub async fn test_connection(
    api_client: &ApiClient,
    conn_a: &Connection,
    conn_b: &Connection,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Connection ===".bright_cyan().bold());

    let sessions = api_client.list_connections().await?;
    let listed = |id: &str| sessions.iter().any(|s| s["id"] == json!(id));

    if conn_a.session_id.is_empty() || conn_b.session_id.is_empty() {
        return Ok(TestResult::fail(
            "connection",
            "connected event did not carry a session id".to_string(),
            start.elapsed(),
        ));
    }

    if listed(&conn_a.session_id) && listed(&conn_b.session_id) {
        println!("{} Both sessions are registered on the server", "✓".green());
        Ok(TestResult::pass("connection", start.elapsed()))
    } else {
        Ok(TestResult::fail(
            "connection",
            format!(
                "Expected sessions {} and {} in {:?}",
                conn_a.session_id, conn_b.session_id, sessions
            ),
            start.elapsed(),
        ))
    }
}

pub async fn test_new_dev_broadcast(
    api_client: &ApiClient,
    conn_a: &mut Connection,
    conn_b: &mut Connection,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: New Dev Broadcast ===".bright_cyan().bold());

    let dev = test_dev("broadcast");
    println!("{} Publishing new dev...", "→".blue());
    api_client.publish_new_dev(&dev).await?;

    for conn in [conn_a, conn_b] {
        match conn.wait_for_event("new-dev", EVENT_TIMEOUT).await {
            Ok(event) => {
                print_event(&conn.label, conn.color, &event);
                if event.data != dev {
                    return Ok(TestResult::fail(
                        "new_dev_broadcast",
                        format!("{} received {} instead of {}", conn.label, event.data, dev),
                        start.elapsed(),
                    ));
                }
            }
            Err(e) => {
                println!("{} {} missed the event: {}", "✗".red(), conn.label, e);
                return Ok(TestResult::fail(
                    "new_dev_broadcast",
                    format!("{}: {}", conn.label, e),
                    start.elapsed(),
                ));
            }
        }
    }

    println!("{} Both connections received the dev unchanged", "✓".green());
    Ok(TestResult::pass("new_dev_broadcast", start.elapsed()))
}

pub async fn test_region_change(
    api_client: &ApiClient,
    conn_a: &Connection,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Region Change ===".bright_cyan().bold());

    api_client
        .update_coordinates(&conn_a.session_id, -3.7319, -38.5267)
        .await?;

    let sessions = api_client.list_connections().await?;
    let coordinates = sessions
        .iter()
        .find(|s| s["id"] == json!(conn_a.session_id))
        .map(|s| s["coordinates"].clone());

    if coordinates == Some(json!({"latitude": -3.7319, "longitude": -38.5267})) {
        println!("{} Server reports the new location", "✓".green());
        Ok(TestResult::pass("region_change", start.elapsed()))
    } else {
        Ok(TestResult::fail(
            "region_change",
            format!("Unexpected coordinates {:?}", coordinates),
            start.elapsed(),
        ))
    }
}

/// Hangs up `conn_b` and checks that only `conn_a` is notified afterwards.
///
/// The server notices a hang-up the next time it writes to the socket, so the
/// wait has to cover at least one keep-alive interval.
pub async fn test_disconnect(
    api_client: &ApiClient,
    conn_a: &mut Connection,
    conn_b: Connection,
    cleanup_timeout: Duration,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Disconnect ===".bright_cyan().bold());

    let b_id = conn_b.session_id.clone();
    println!("{} Closing {}...", "→".blue(), conn_b.label);
    conn_b.close();

    let deadline = Instant::now() + cleanup_timeout;
    loop {
        let sessions = api_client.list_connections().await?;
        if !sessions.iter().any(|s| s["id"] == json!(b_id)) {
            println!("{} Server removed the closed session", "✓".green());
            break;
        }
        if Instant::now() >= deadline {
            return Ok(TestResult::fail(
                "disconnect",
                format!("Session {} still registered after {:?}", b_id, cleanup_timeout),
                start.elapsed(),
            ));
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    let dev = test_dev("after-disconnect");
    api_client.publish_new_dev(&dev).await?;

    match conn_a.wait_for_event("new-dev", EVENT_TIMEOUT).await {
        Ok(event) if event.data == dev => {
            print_event(&conn_a.label, conn_a.color, &event);
            println!(
                "{} {} still notified, {} devs known locally",
                "✓".green(),
                conn_a.label,
                conn_a.known_devs.len()
            );
            Ok(TestResult::pass("disconnect", start.elapsed()))
        }
        Ok(event) => Ok(TestResult::fail(
            "disconnect",
            format!("Unexpected payload {}", event.data),
            start.elapsed(),
        )),
        Err(e) => Ok(TestResult::fail(
            "disconnect",
            format!("{} missed the event: {}", conn_a.label, e),
            start.elapsed(),
        )),
    }
}
