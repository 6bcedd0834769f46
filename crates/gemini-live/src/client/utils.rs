use secrecy::ExposeSecret;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;

use crate::client::config::Config;
use crate::client::consts::LIVE_PATH;

pub fn build_url(config: &Config) -> String {
    format!(
        "{}{}?key={}",
        config.base_url().trim_end_matches('/'),
        LIVE_PATH,
        config.api_key().expose_secret()
    )
}

pub fn build_request(config: &Config) -> tokio_tungstenite::tungstenite::Result<Request> {
    build_url(config).into_client_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_appends_live_path_and_key() {
        let config = Config::new("secret").with_base_url("ws://127.0.0.1:9000/");
        assert_eq!(
            build_url(&config),
            "ws://127.0.0.1:9000/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent?key=secret"
        );
    }
}
