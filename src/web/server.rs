//! Web server for Filedrop.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::file::{DiskStore, ExtensionPolicy};
use crate::{FiledropError, Result};

use super::handlers::{AppState, SharedStore};
use super::router::create_router;

/// Web server serving the upload form, listing and downloads.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Maximum request body size in bytes.
    max_content_length: u64,
}

impl WebServer {
    /// Create a new web server over an existing store.
    pub fn new(config: &Config, store: SharedStore) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse::<SocketAddr>()
            .map_err(|e| {
                FiledropError::Config(format!(
                    "invalid listen address {}:{}: {e}",
                    config.server.host, config.server.port
                ))
            })?;

        let policy = ExtensionPolicy::new(&config.storage.allowed_extensions);
        let app_state = AppState::new(store, policy, &config.session.secret_key);

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            max_content_length: config.storage.max_content_length,
        })
    }

    /// Create a web server storing files on disk under the configured folder.
    ///
    /// The folder is created if it doesn't exist.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = DiskStore::new(&config.storage.upload_folder);
        store.ensure_root()?;
        tracing::info!("File storage initialized at: {}", store.root().display());

        Self::new(config, Arc::new(store))
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn bind(self) -> std::io::Result<(TcpListener, axum::Router)> {
        let router = create_router(self.app_state, self.max_content_length);
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);
        Ok((listener, router))
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> std::io::Result<()> {
        let (listener, router) = self.bind().await?;
        axum::serve(listener, router).await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let (listener, router) = self.bind().await?;
        let local_addr = listener.local_addr()?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::MemoryStore;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config
    }

    #[test]
    fn test_web_server_new() {
        let server = WebServer::new(&create_test_config(), Arc::new(MemoryStore::new())).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[test]
    fn test_invalid_host_rejected() {
        let mut config = create_test_config();
        config.server.host = "not a host".to_string();

        let result = WebServer::new(&config, Arc::new(MemoryStore::new()));
        assert!(matches!(result, Err(FiledropError::Config(_))));
    }

    #[test]
    fn test_from_config_creates_upload_folder() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let folder = temp_dir.path().join("uploads");
        let mut config = create_test_config();
        config.storage.upload_folder = folder.to_string_lossy().into_owned();

        WebServer::from_config(&config).unwrap();
        assert!(folder.is_dir());
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let server = WebServer::new(&create_test_config(), Arc::new(MemoryStore::new())).unwrap();
        let addr = server.run_with_addr().await.unwrap();

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("OK"));
    }
}
