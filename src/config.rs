//! Client configuration and endpoint derivation

use url::Url;

use crate::constants::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, EVENTS_PATH};
use crate::error::{ClientError, ClientResult};

/// Connection settings for the Tinyphone server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Base HTTP(S) address of the server (e.g. `http://localhost:6060`).
    pub base_url: String,
    /// Request timeout for command API calls, in seconds.
    pub timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Settings for a server at the given base address, default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Derive the event stream endpoint from the base address.
    ///
    /// Maps `http` to `ws` and `https` to `wss`, then appends the event
    /// path. Any other scheme is rejected.
    pub fn events_url(&self) -> ClientResult<Url> {
        let mut url = Url::parse(&self.base_url)?;

        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => {
                return Err(ClientError::invalid_endpoint(format!(
                    "unsupported scheme '{}' in base URL {}",
                    other, self.base_url
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::invalid_endpoint("cannot derive WebSocket scheme"))?;

        let path = format!("{}{}", url.path().trim_end_matches('/'), EVENTS_PATH);
        url.set_path(&path);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_url_maps_http_to_ws() {
        let settings = Settings::new("http://localhost:6060");
        assert_eq!(
            settings
                .events_url()
                .unwrap()
                .as_str(),
            "ws://localhost:6060/events"
        );
    }

    #[test]
    fn events_url_maps_https_to_wss() {
        let settings = Settings::new("https://phone.example.com");
        assert_eq!(
            settings
                .events_url()
                .unwrap()
                .as_str(),
            "wss://phone.example.com/events"
        );
    }

    #[test]
    fn events_url_handles_trailing_slash() {
        let settings = Settings::new("http://localhost:6060/");
        assert_eq!(
            settings
                .events_url()
                .unwrap()
                .as_str(),
            "ws://localhost:6060/events"
        );
    }

    #[test]
    fn events_url_rejects_unknown_scheme() {
        let settings = Settings::new("ftp://localhost:6060");
        let err = settings
            .events_url()
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidEndpoint { .. }));
    }

    #[test]
    fn events_url_rejects_garbage() {
        let settings = Settings::new("not a url");
        assert!(settings
            .events_url()
            .is_err());
    }

    #[test]
    fn default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.base_url, "http://localhost:6060");
        assert_eq!(settings.timeout_seconds, 30);
    }
}
