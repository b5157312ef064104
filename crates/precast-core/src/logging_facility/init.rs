//! Logging initialization module

use serde::Deserialize;
use std::str::FromStr;
use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Human-readable output for development
    Development,
    /// JSON structured output for production
    Production,
    /// Test capture mode for deterministic testing
    Test,
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            "test" => Ok(Profile::Test),
            other => Err(format!("unknown logging profile '{}'", other)),
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Call once at process start. Later calls are ignored.
///
/// - **Development**: human-readable, `precast=debug`
/// - **Production**: JSON lines, `precast=info`
/// - **Test**: bare registry; use `init_test_capture()` to collect events
///
/// `RUST_LOG` overrides the default filter in every profile.
pub fn init(profile: Profile) {
    // A subscriber installed earlier (e.g. test capture) wins.
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("precast=debug")),
                )
                .try_init();
        }
        Profile::Production => {
            let _ = tracing_subscriber::fmt()
                .json()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("precast=info")),
                )
                .try_init();
        }
        Profile::Test => {
            let _ = tracing_subscriber::registry().try_init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init(Profile::Test);
        init(Profile::Test);
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!("prod".parse::<Profile>().unwrap(), Profile::Production);
        assert_eq!(
            " Development ".parse::<Profile>().unwrap(),
            Profile::Development
        );
        assert!("verbose".parse::<Profile>().is_err());
    }
}
