use std::future::Future;
use std::sync::Arc;

use nts_store::Storage;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::AppState;
use crate::note::PureNote;
use crate::router::build_router;

/// Notes HTTP server.
pub struct NotesServer {
    config: ServerConfig,
    state: AppState,
}

impl NotesServer {
    /// Serve notes out of `store`.
    pub fn new(config: ServerConfig, store: Arc<dyn Storage<PureNote>>) -> Self {
        Self {
            config,
            state: AppState::new(store),
        }
    }

    /// Open the backend named by the config and serve notes out of it.
    pub fn from_config(config: ServerConfig) -> Self {
        let store = config.backend.open(config.initial_id);
        Self::new(config, store)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            %addr,
            backend = %self.config.backend,
            initial_id = self.config.initial_id,
            "notes server listening"
        );
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("server closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nts_store::Backend;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[test]
    fn server_construction() {
        let server = NotesServer::from_config(ServerConfig::default());
        assert_eq!(server.config().bind_addr, "0.0.0.0:8080".parse().unwrap());
        let _router = server.router();
    }

    #[test]
    fn from_config_uses_initial_id() {
        let config = ServerConfig {
            backend: Backend::Linked,
            initial_id: 50,
            ..ServerConfig::default()
        };
        let server = NotesServer::from_config(config);
        let id = server
            .state
            .store()
            .add(PureNote {
                name: "a".into(),
                last_name: "b".into(),
                content: "c".into(),
            })
            .unwrap();
        assert_eq!(id, 50);
    }

    #[tokio::test]
    async fn serves_until_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let server = NotesServer::from_config(ServerConfig::default());
        let handle = tokio::spawn(server.serve_on(listener, async {
            rx.await.ok();
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /get-all HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("no records found"));

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
