use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use presence::ProximityPolicy;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

fn parse_radius_km(raw: &str) -> Result<f64, String> {
    let km: f64 = raw
        .parse()
        .map_err(|_| format!("`{raw}` is not a number of kilometers"))?;
    if km.is_finite() && km > 0.0 {
        Ok(km)
    } else {
        Err(format!("push radius must be a positive number of kilometers, got {raw}"))
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that are allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,http://localhost:19006"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Only push new-dev notifications to sessions within this many kilometers of
    /// the new dev. Unset pushes to every connected session.
    #[arg(long, env, value_parser = parse_radius_km)]
    pub push_radius_km: Option<f64>,

    /// Seconds between keep-alive comments on idle realtime streams
    #[arg(long, env, default_value_t = 15)]
    pub realtime_keep_alive_secs: u64,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// `interface:port` to bind the listener to.
    pub fn listen_address(&self) -> String {
        format!(
            "{}:{}",
            self.interface.as_deref().unwrap_or("127.0.0.1"),
            self.port
        )
    }

    pub fn proximity_policy(&self) -> ProximityPolicy {
        ProximityPolicy::from_radius_km(self.push_radius_km)
    }

    pub fn realtime_keep_alive(&self) -> Duration {
        Duration::from_secs(self.realtime_keep_alive_secs.max(1))
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("devradar").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn defaults_broadcast_to_everyone_on_localhost() {
        let config = parse(&[]);

        assert_eq!(config.listen_address(), "127.0.0.1:4000");
        assert_eq!(config.proximity_policy(), ProximityPolicy::BroadcastAll);
        assert_eq!(config.realtime_keep_alive(), Duration::from_secs(15));
        assert_eq!(config.log_level_filter, LevelFilter::Info);
        assert_eq!(config.runtime_env(), RustEnv::Development);
    }

    #[test]
    fn push_radius_enables_radius_policy() {
        let config = parse(&["--push-radius-km", "10"]);

        assert_eq!(
            config.proximity_policy(),
            ProximityPolicy::WithinRadius { km: 10.0 }
        );
    }

    #[test]
    fn non_positive_push_radius_is_rejected() {
        assert!(Config::try_parse_from(["devradar", "--push-radius-km", "0"]).is_err());
        assert!(Config::try_parse_from(["devradar", "--push-radius-km", "-5"]).is_err());
        assert!(Config::try_parse_from(["devradar", "--push-radius-km", "far"]).is_err());
    }

    #[test]
    fn allowed_origins_are_comma_separated() {
        let config = parse(&["--allowed-origins", "http://a.test,http://b.test"]);

        assert_eq!(config.allowed_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn runtime_env_parses_case_insensitively() {
        assert_eq!("PRODUCTION".parse::<RustEnv>(), Ok(RustEnv::Production));
        assert_eq!("staging".parse::<RustEnv>(), Ok(RustEnv::Staging));
        assert_eq!("qa".parse::<RustEnv>(), Err(RustEnvParseError));
        assert_eq!(
            parse(&["--runtime-env", "production"]).runtime_env(),
            RustEnv::Production
        );
    }
}
