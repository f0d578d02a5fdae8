use std::{env, net::SocketAddr, path::PathBuf};
use tracing::warn;

pub const DEFAULT_API_URL: &str = "https://secrets-backend-67g2.onrender.com";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub prefs_path: PathBuf,
    pub api_url: String,
    pub restore_last_tab: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = match lookup("PORT") {
            Some(value) => value.trim().parse().unwrap_or_else(|err| {
                warn!("invalid PORT {value:?} ({err}), using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let prefs_path = lookup("APP_PREFS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/preferences.json"));

        let api_url = lookup("API_URL")
            .map(|url| normalize_base_url(&url))
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let restore_last_tab = lookup("RESTORE_LAST_TAB")
            .is_some_and(|value| matches!(value.trim(), "1" | "true" | "yes"));

        Self {
            port,
            prefs_path,
            api_url,
            restore_last_tab,
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], self.port))
    }
}

pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.prefs_path, PathBuf::from("data/preferences.json"));
        assert!(!config.restore_last_tab);
    }

    #[test]
    fn trims_trailing_slashes_and_bad_ports() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "not-a-port"),
            ("API_URL", "http://localhost:8000///"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.api_url, "http://localhost:8000");
    }
}
