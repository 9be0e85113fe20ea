use secrecy::Secret;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // Card number encryption
    pub encryption_key: Secret<String>,
    // Accepted for compatibility with existing deployments; the codec
    // derives its key from encryption_key alone (see services::codec).
    pub encryption_salt: Option<Secret<String>>,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Ok(Self {
            database_url: config.get("database_url")?,
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port").unwrap_or(8080),

            encryption_key: Secret::new(config.get("encryption_key")?),
            encryption_salt: config
                .get::<String>("encryption_salt")
                .ok()
                .map(Secret::new),
        })
    }
}
