//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod broker;
pub mod database;
pub mod email;
pub mod logging;
pub mod realtime;
pub mod webpush;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::broker::BrokerConfig;
pub use self::database::DatabaseConfig;
pub use self::email::EmailRelayConfig;
pub use self::logging::LoggingConfig;
pub use self::realtime::RealtimeConfig;
pub use self::webpush::WebPushConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Message broker settings.
    pub broker: BrokerConfig,
    /// Web Push (VAPID) settings.
    pub webpush: WebPushConfig,
    /// Email relay settings.
    pub email: EmailRelayConfig,
    /// Queue worker settings.
    pub worker: WorkerConfig,
    /// Real-time socket hub settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// IANA timezone used to interpret server-local wall-clock values.
    ///
    /// Threaded explicitly to the components that need it; never installed
    /// as a process-wide default.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `NOTIHUB__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("NOTIHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse the configured timezone into a [`chrono_tz::Tz`].
    pub fn timezone(&self) -> Result<chrono_tz::Tz, AppError> {
        self.timezone
            .parse()
            .map_err(|_| AppError::configuration(format!("Unknown timezone: {}", self.timezone)))
    }
}

fn default_timezone() -> String {
    "America/Sao_Paulo".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timezone_parses() {
        assert_eq!(
            default_timezone().parse::<chrono_tz::Tz>().unwrap(),
            chrono_tz::America::Sao_Paulo
        );
    }
}
