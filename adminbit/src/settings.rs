use crate::info;
use crate::schema::SchemaRegistry;
use crate::session::Credentials;
use config::{Config, ConfigError, Environment, File};
use dotenv::dotenv;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Once;
use std::time::Duration;

static DOTENV_ONCE: Once = Once::new();

fn ensure_dotenv_loaded() {
    DOTENV_ONCE.call_once(|| match dotenv() {
        Ok(_) => info!("Config loaded including .env file."),
        Err(_) => info!("Config loaded without .env file."),
    });
}

fn duration_from_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let millis = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(millis))
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpSettings,
    pub store: StoreSettings,
    pub auth: Credentials,
    /// Optional registry override; the builtin collections apply when absent.
    pub schema: Option<SchemaRegistry>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpSettings {
    pub enable: bool,
    pub bind_address: SocketAddr,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { enable: true, bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)) }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreSettings {
    /// Artificial latency of the mock store, standing in for network time.
    #[serde(rename = "latency_ms", deserialize_with = "duration_from_millis")]
    pub latency: Duration,
    pub seed: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { latency: Duration::from_millis(150), seed: true }
    }
}

impl AppConfig {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        ensure_dotenv_loaded();
        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("ADMINBIT").try_parsing(true).separator("__"));
        let config = builder.build()?.try_deserialize();
        info!("{:#?}", config);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_fall_back_to_defaults_without_a_config_file() {
        let cfg = AppConfig::new("/nonexistent/settings").expect("defaults");
        assert!(cfg.http.enable);
        assert_eq!(cfg.store.latency, Duration::from_millis(150));
        assert_eq!(cfg.auth, Credentials::default());
        assert!(cfg.schema.is_none());
    }
}
