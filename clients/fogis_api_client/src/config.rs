use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_BASE_URL: &str = "https://fogis.svenskfotboll.se/mdk";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Root of the upstream application, without a trailing slash.
    pub base_url: String,
    pub http: HttpConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http: HttpConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.trim().parse::<T>().ok())
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = env::var("FOGIS_API_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(timeout) = env_parse::<u64>("FOGIS_REQUEST_TIMEOUT_SECS") {
            config.http.request_timeout_secs = timeout;
        }
        if let Some(timeout) = env_parse::<u64>("FOGIS_CONNECT_TIMEOUT_SECS") {
            config.http.connect_timeout_secs = timeout;
        }
        if let Ok(user_agent) = env::var("FOGIS_USER_AGENT") {
            config.http.user_agent = user_agent;
        }

        config
    }

    pub fn login_url(&self) -> String {
        format!("{}/Login.aspx?ReturnUrl=%2fmdk%2f", self.base_url)
    }

    pub fn method_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MockServerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub validate_requests: bool,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
            username: "test_user".to_string(),
            password: "test_password".to_string(),
            validate_requests: true,
        }
    }
}

impl MockServerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("MOCK_SERVER_HOST") {
            config.host = host;
        }
        if let Some(port) = env_parse::<u16>("MOCK_SERVER_PORT") {
            config.port = port;
        }
        if let Ok(username) = env::var("MOCK_SERVER_USERNAME") {
            config.username = username;
        }
        if let Ok(password) = env::var("MOCK_SERVER_PASSWORD") {
            config.password = password;
        }
        if let Some(validate) = env_parse::<bool>("MOCK_SERVER_VALIDATE") {
            config.validate_requests = validate;
        }

        config
    }

    /// Same settings on an ephemeral port.
    pub fn ephemeral() -> Self {
        Self {
            port: 0,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(
            config.login_url(),
            "https://fogis.svenskfotboll.se/mdk/Login.aspx?ReturnUrl=%2fmdk%2f"
        );
        assert_eq!(
            config.method_url("/MatchWebMetoder.aspx/GetMatch"),
            "https://fogis.svenskfotboll.se/mdk/MatchWebMetoder.aspx/GetMatch"
        );

        let mock = MockServerConfig::default();
        assert_eq!(mock.port, 5001);
        assert!(mock.validate_requests);
    }

    #[test]
    fn test_with_base_url_trims_trailing_slash() {
        let config = ClientConfig::with_base_url("http://127.0.0.1:5001/mdk/");
        assert_eq!(config.base_url, "http://127.0.0.1:5001/mdk");
    }
}
