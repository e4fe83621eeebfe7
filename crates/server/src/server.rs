use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_server::tls_rustls::RustlsConfig;

use std::{
    future::Future,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{ServerError, accounts, transactions, users};
use engine::{Engine, ResultEngine};

/// Per-request deadlines.
#[derive(Clone, Copy, Debug)]
pub struct Timeouts {
    /// Every single-row read and every mutation.
    pub standard: Duration,
    /// Listing an account's transactions.
    pub stream: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            standard: Duration::from_secs(5),
            stream: Duration::from_secs(30),
        }
    }
}

/// PEM certificate chain and private key for HTTPS.
#[derive(Clone, Debug)]
pub struct TlsFiles {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    /// Serve HTTPS when set. `None` serves plain HTTP and is only meant for
    /// local development.
    pub tls: Option<TlsFiles>,
    pub timeouts: Timeouts,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            tls: None,
            timeouts: Timeouts::default(),
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub timeouts: Timeouts,
}

impl ServerState {
    pub fn new(engine: Arc<Engine>, timeouts: Timeouts) -> Self {
        Self { engine, timeouts }
    }

    /// Run `op` under the standard deadline. On expiry the future is dropped,
    /// which rolls back any transaction it still holds.
    pub(crate) async fn deadline<T>(
        &self,
        op: impl Future<Output = ResultEngine<T>>,
    ) -> Result<T, ServerError> {
        bounded(self.timeouts.standard, op).await
    }

    pub(crate) async fn stream_deadline<T>(
        &self,
        op: impl Future<Output = ResultEngine<T>>,
    ) -> Result<T, ServerError> {
        bounded(self.timeouts.stream, op).await
    }
}

async fn bounded<T>(
    limit: Duration,
    op: impl Future<Output = ResultEngine<T>>,
) -> Result<T, ServerError> {
    match tokio::time::timeout(limit, op).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(ServerError::Timeout),
    }
}

async fn trace_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/users", post(users::create).get(users::list))
        .route("/users/{id}", get(users::get).put(users::update))
        .route("/users/{id}/accounts", get(users::accounts))
        .route("/accounts", post(accounts::create).get(accounts::list))
        .route("/accounts/{id_number}", get(accounts::get))
        .route("/accounts/{id_number}/balance", get(accounts::balance))
        .route(
            "/accounts/{id_number}/transactions",
            get(accounts::transactions),
        )
        .route("/transactions/{id}", get(transactions::get))
        .layer(middleware::from_fn(trace_requests))
        .with_state(state)
}

/// Make ring the process-wide rustls provider. A provider installed earlier
/// is kept.
fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Serve until the listener fails, over HTTPS when `config.tls` is set.
pub async fn run(engine: Arc<Engine>, config: ServerConfig) -> Result<(), std::io::Error> {
    let addr = SocketAddr::new(config.bind, config.port);
    let state = ServerState::new(engine, config.timeouts);

    match config.tls {
        Some(tls) => {
            install_crypto_provider();
            let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;
            tracing::info!("Server listening on https://{}", addr);
            axum_server::bind_rustls(addr, rustls)
                .serve(router(state).into_make_service())
                .await
        }
        None => {
            tracing::warn!("no certificate configured, serving plain HTTP");
            let listener = tokio::net::TcpListener::bind(addr).await?;
            run_with_listener(state, listener).await
        }
    }
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expired_deadline_is_a_timeout() {
        let result: Result<(), ServerError> =
            bounded(Duration::from_millis(10), std::future::pending()).await;
        assert!(matches!(result, Err(ServerError::Timeout)));
    }

    #[tokio::test]
    async fn finished_operation_passes_through() {
        let result = bounded(Duration::from_secs(1), async { Ok(3) }).await;
        assert!(matches!(result, Ok(3)));
    }
}
