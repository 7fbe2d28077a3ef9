use anyhow::Result;
use std::env;

/// Service configuration, loaded from environment variables.
pub struct AppConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub log_file: String,
    /// Regional provider endpoint is derived from this unless
    /// `provider_base_url` overrides it (e.g. for a mock server).
    pub provider_region: String,
    pub provider_base_url: Option<String>,
    pub provider_api_token: String,
    /// When set, `POST /send/email` requires a matching `X-Api-Key` header.
    pub api_key: Option<String>,
}

impl AppConfig {
    /// Loads configuration from the environment. A listen address passed on
    /// the command line takes precedence over `LISTEN_ADDR`.
    pub fn load(listen_override: Option<String>) -> Result<Self> {
        let listen_addr = listen_override
            .or_else(|| env::var("LISTEN_ADDR").ok())
            .unwrap_or_else(|| "0.0.0.0:8000".to_string());
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "mailflow.db".to_string());
        let log_file = "logs/mailflow.log".to_string();
        let provider_region =
            env::var("SES_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let provider_base_url = env::var("SES_BASE_URL").ok();
        let provider_api_token = env::var("SES_API_TOKEN").unwrap_or_default();
        let api_key = env::var("API_KEY").ok().filter(|k| !k.is_empty());

        Ok(Self {
            listen_addr,
            database_url,
            log_file,
            provider_region,
            provider_base_url,
            provider_api_token,
            api_key,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider_api_token.is_empty() {
            anyhow::bail!("SES_API_TOKEN not set");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        env::remove_var("LISTEN_ADDR");
        env::remove_var("DATABASE_URL");
        env::remove_var("SES_REGION");
        env::remove_var("SES_BASE_URL");
        env::remove_var("SES_API_TOKEN");
        env::remove_var("API_KEY");
    }

    #[test]
    #[serial]
    fn test_load_config_with_defaults() {
        clear_env();
        env::set_var("SES_API_TOKEN", "test-token");

        let config = AppConfig::load(None).unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8000");
        assert_eq!(config.database_url, "mailflow.db");
        assert_eq!(config.log_file, "logs/mailflow.log");
        assert_eq!(config.provider_region, "us-east-1");
        assert!(config.provider_base_url.is_none());
        assert_eq!(config.provider_api_token, "test-token");
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_config_with_custom_values() {
        clear_env();
        env::set_var("LISTEN_ADDR", "127.0.0.1:9000");
        env::set_var("DATABASE_URL", "custom.db");
        env::set_var("SES_REGION", "eu-west-1");
        env::set_var("SES_BASE_URL", "http://localhost:1234");
        env::set_var("SES_API_TOKEN", "custom-token");
        env::set_var("API_KEY", "secret");

        let config = AppConfig::load(None).unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.database_url, "custom.db");
        assert_eq!(config.provider_region, "eu-west-1");
        assert_eq!(
            config.provider_base_url.as_deref(),
            Some("http://localhost:1234")
        );
        assert_eq!(config.provider_api_token, "custom-token");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }

    #[test]
    #[serial]
    fn test_listen_override_wins() {
        clear_env();
        env::set_var("LISTEN_ADDR", "127.0.0.1:9000");
        env::set_var("SES_API_TOKEN", "t");

        let config = AppConfig::load(Some("127.0.0.1:9001".to_string())).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9001");
    }

    #[test]
    #[serial]
    fn test_validate_requires_provider_token() {
        clear_env();
        let config = AppConfig::load(None).unwrap();
        assert!(config.validate().is_err());
    }
}
