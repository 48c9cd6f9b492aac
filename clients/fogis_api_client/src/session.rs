use cookie::Cookie;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use std::sync::Arc;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::{FogisError, Result};

/// Headers set on an individual request replace same-named defaults.
pub struct HttpSession {
    client: Client,
    jar: Arc<Jar>,
    default_headers: HeaderMap,
    http: HttpConfig,
}

fn build_client(http: &HttpConfig, jar: Arc<Jar>) -> Result<Client> {
    Client::builder()
        .cookie_provider(jar)
        .user_agent(http.user_agent.as_str())
        .timeout(Duration::from_secs(http.request_timeout_secs))
        .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
        .build()
        .map_err(|e| FogisError::request("building HTTP client", e))
}

impl HttpSession {
    pub fn new(http: &HttpConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let client = build_client(http, jar.clone())?;
        Ok(Self {
            client,
            jar,
            default_headers: HeaderMap::new(),
            http: http.clone(),
        })
    }

    pub fn set_default_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.default_headers.insert(name, value);
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url).headers(self.default_headers.clone())
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url).headers(self.default_headers.clone())
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url).headers(self.default_headers.clone())
    }

    /// Reads one cookie the jar would send to `url`.
    pub fn cookie(&self, url: &str, name: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let header = self.jar.cookies(&url)?;
        let header = header.to_str().ok()?;
        Cookie::split_parse(header)
            .filter_map(|cookie| cookie.ok())
            .find(|cookie| cookie.name() == name)
            .map(|cookie| cookie.value().to_string())
    }

    /// Drops every stored cookie. Default headers are kept.
    pub fn reset_cookies(&mut self) -> Result<()> {
        let jar = Arc::new(Jar::default());
        self.client = build_client(&self.http, jar.clone())?;
        self.jar = jar;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn add_cookie(&self, url: &str, cookie: &str) {
        if let Ok(url) = Url::parse(url) {
            self.jar.add_cookie_str(cookie, &url);
        }
    }
}
