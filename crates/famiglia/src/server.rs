//! `FamigliaServer` builder and server loop.
//!
//! This is the entry point for running a Famiglia backend. It ties the
//! layers together:
//!
//! ```text
//! axum router → bearer extraction (session) → Game (rules) → Storage
//! ```

use std::sync::Arc;

use axum::Router;
use famiglia_game::{Clock, Game, LogNotifier, SystemClock, score};
use famiglia_session::{LoginFlow, TokenAuthenticator, TokenService};
use famiglia_store::{MemoryStorage, Resilient, Storage, load_seed};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{FamigliaError, ServerConfig, routes};

/// The storage stack the binary runs on.
pub type ServerStorage = Resilient<MemoryStorage>;

/// Shared state handed to every request handler.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. Everything
/// mutable inside (stores, game state, news) synchronizes itself.
pub struct AppState<S> {
    pub game: Game<S, LogNotifier>,
    pub login: LoginFlow<S>,
    pub auth: TokenAuthenticator<S>,
    pub tokens: Arc<TokenService>,
}

impl<S: Storage> AppState<S> {
    /// Wires every service to one storage backend.
    pub fn new(storage: Arc<S>, config: &ServerConfig, clock: Arc<dyn Clock>) -> Self {
        let tokens = Arc::new(TokenService::new(config.tokens.clone()));
        Self {
            game: Game::new(
                Arc::clone(&storage),
                LogNotifier,
                clock,
                config.game.clone(),
            ),
            login: LoginFlow::new(
                Arc::clone(&tokens),
                config.admin.clone(),
                Arc::clone(&storage),
            ),
            auth: TokenAuthenticator::new(Arc::clone(&tokens), config.admin.clone(), storage),
            tokens,
        }
    }
}

/// Builds the HTTP router over `state`.
///
/// Every route except `/`, login, refresh and verify requires a bearer
/// access token. CORS allows any origin.
pub fn router<S: Storage>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::root::router::<S>())
        .merge(routes::auth::router::<S>())
        .merge(routes::players::router::<S>())
        .merge(routes::missions::router::<S>())
        .merge(routes::trades::router::<S>())
        .merge(routes::families::router::<S>())
        .merge(routes::blackmarket::router::<S>())
        .merge(routes::admin::router::<S>())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a Famiglia server.
///
/// # Example
///
/// ```rust,ignore
/// let server = FamigliaServer::builder()
///     .config(ServerConfig::from_env())
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct FamigliaServerBuilder {
    config: ServerConfig,
    clock: Arc<dyn Clock>,
}

impl FamigliaServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Replaces the wall clock (tests pin time with a `FixedClock`).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Loads the seed file (if any), binds the listener and wires the
    /// services together.
    pub async fn build(self) -> Result<FamigliaServer, FamigliaError> {
        let config = self.config.validated();

        let memory = match &config.seed_path {
            Some(path) => {
                MemoryStorage::from_seed(load_seed(path).await?, score::rescore).await?
            }
            None => {
                tracing::warn!("no seed file configured, starting with an empty store");
                MemoryStorage::new()
            }
        };
        let storage = Arc::new(Resilient::new(memory, config.retry.clone()));
        let state = Arc::new(AppState::new(storage, &config, self.clock));

        let listener = TcpListener::bind(&config.bind_addr).await?;
        Ok(FamigliaServer { listener, state })
    }
}

impl Default for FamigliaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Famiglia server.
///
/// Call [`run()`](Self::run) to start serving requests.
pub struct FamigliaServer {
    listener: TcpListener,
    state: Arc<AppState<ServerStorage>>,
}

impl FamigliaServer {
    /// Creates a new builder.
    pub fn builder() -> FamigliaServerBuilder {
        FamigliaServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves requests until `shutdown` resolves, then drains in-flight
    /// requests and returns.
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), FamigliaError> {
        let addr = self.local_addr()?;
        tracing::info!(%addr, "Famiglia server running");
        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("Famiglia server stopped");
        Ok(())
    }

    /// Serves requests until Ctrl-C.
    pub async fn run(self) -> Result<(), FamigliaError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await
    }
}
