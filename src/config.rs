use std::net::SocketAddr;
use std::path::Path;

use burn::config::Config;

use crate::error::Error;
use crate::model::DigitClassifierConfig;

/// Settings of the prediction server.
///
/// Stored as JSON; fields given on the command line override the file.
#[derive(Config, Debug)]
pub struct ServerConfig {
    /// Path of the trained model record (`.mpk`, the extension may be omitted).
    pub model_path: String,
    /// IP address to bind.
    #[config(default = "String::from(\"127.0.0.1\")")]
    pub host: String,
    #[config(default = 5000)]
    pub port: u16,
    /// Largest accepted request body.
    #[config(default = 2097152)]
    pub max_body_bytes: usize,
    /// Inference threads, each holding a copy of the model.
    #[config(default = 2)]
    pub workers: usize,
    #[config(default = "DigitClassifierConfig::new()")]
    pub model: DigitClassifierConfig,
}

impl ServerConfig {
    /// Reads a configuration previously written with `save`.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        Self::load(path).map_err(|err| Error::Config(format!("{}: {err}", path.display())))
    }

    pub fn address(&self) -> crate::Result<SocketAddr> {
        let address = format!("{}:{}", self.host, self.port);
        address
            .parse()
            .map_err(|err| Error::Config(format!("invalid address {address}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_serve_locally() {
        let config = ServerConfig::new("model".to_string());

        assert_eq!(config.address().unwrap().to_string(), "127.0.0.1:5000");
        assert_eq!(config.max_body_bytes, 2 * 1024 * 1024);
        assert_eq!(config.workers, 2);
        assert_eq!(config.model.height, 28);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.json");
        ServerConfig::new("weights/mnist".to_string())
            .with_port(8080)
            .save(&path)
            .unwrap();

        let config = ServerConfig::from_file(&path).unwrap();

        assert_eq!(config.model_path, "weights/mnist");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let result = ServerConfig::from_file("/nonexistent/server.json");

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn invalid_host_is_a_config_error() {
        let config = ServerConfig::new("model".to_string()).with_host("not a host".to_string());

        assert!(matches!(config.address(), Err(Error::Config(_))));
    }
}
