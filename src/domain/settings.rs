// Dashboard settings model
use serde::{Deserialize, Serialize};

/// Backend host used until the user saves their own.
pub const DEFAULT_API_URL: &str = "https://travieso-gps-platform.onrender.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub show_labels: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            show_labels: false,
        }
    }
}

impl Settings {
    /// Normalizes raw user input: whitespace trimmed on both fields, the
    /// trailing slash stripped from the URL, an empty key treated as unset.
    pub fn normalized(api_url: &str, api_key: &str, show_labels: bool) -> Self {
        let api_url = api_url.trim().trim_end_matches('/').to_string();
        let api_key = api_key.trim();
        Self {
            api_url,
            api_key: (!api_key.is_empty()).then(|| api_key.to_string()),
            show_labels,
        }
    }

    /// Live stream endpoint, derived by substituting the HTTP scheme with
    /// the matching WebSocket scheme.
    pub fn ws_endpoint(&self) -> String {
        if let Some(rest) = self.api_url.strip_prefix("https://") {
            format!("wss://{rest}/ws")
        } else if let Some(rest) = self.api_url.strip_prefix("http://") {
            format!("ws://{rest}/ws")
        } else {
            format!("ws://{}/ws", self.api_url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_trims_and_strips_trailing_slash() {
        let settings = Settings::normalized(" http://host/ ", " key ", false);
        assert_eq!(settings.api_url, "http://host");
        assert_eq!(settings.api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_normalized_empty_key_is_unset() {
        let settings = Settings::normalized("http://host", "   ", true);
        assert_eq!(settings.api_key, None);
        assert!(settings.show_labels);
    }

    #[test]
    fn test_ws_endpoint_scheme_substitution() {
        let https = Settings::normalized("https://tracker.example.com", "", false);
        assert_eq!(https.ws_endpoint(), "wss://tracker.example.com/ws");

        let http = Settings::normalized("http://localhost:8080", "", false);
        assert_eq!(http.ws_endpoint(), "ws://localhost:8080/ws");
    }
}
