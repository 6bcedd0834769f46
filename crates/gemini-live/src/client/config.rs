use secrecy::SecretString;

use crate::client::consts::{BASE_URL, DEFAULT_MODEL};

/// Where and as whom to open a Live session.
///
/// The base URL is the WebSocket origin only; the service path is appended
/// when the request is built.
pub struct Config {
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl Config {
    pub fn new(api_key: &str) -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            api_key: SecretString::from(api_key.to_string()),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.strip_prefix("models/").unwrap_or(model).to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults_and_overrides() {
        let config = Config::new("k");
        assert_eq!(config.base_url(), "wss://generativelanguage.googleapis.com");
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.api_key().expose_secret(), "k");

        let config = config
            .with_base_url("ws://localhost:8080/")
            .with_model("models/custom-live");
        assert_eq!(config.base_url(), "ws://localhost:8080");
        assert_eq!(config.model(), "custom-live");
    }
}
