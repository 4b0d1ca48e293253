//! Shared construction of the HTTP stack.

use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::env;

use crate::http::HttpClient;

/// Default release feed API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Network configuration shared by download and livecheck.
pub struct Config {
    pub http_client: HttpClient,
    pub api_url: String,
}

impl Config {
    /// Builds the HTTP client, attaching a GITHUB_TOKEN bearer header when
    /// the environment provides one.
    pub fn new(api_url: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(token) = env::var("GITHUB_TOKEN") {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using GITHUB_TOKEN for authentication");
        }

        let client = Client::builder()
            .user_agent("caskr-cli")
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client: HttpClient::new(client),
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        })
    }
}
