use serde::Deserialize;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to (e.g., "127.0.0.1")
    pub host: String,

    /// Port number to bind to (e.g., 3000)
    pub port: u16,

    /// Base URL for constructing short URLs (e.g., "http://localhost:3000")
    pub base_url: String,
}

impl ServerConfig {
    /// `host:port` to bind the listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL derived from the bind address, used when `BASE_URL` is unset
    pub fn derived_base_url(&self) -> String {
        format!("http://{}", self.bind_addr())
    }
}
