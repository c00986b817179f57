use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use engine::Engine;
use receipts::ReceiptExtractor;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    AuthKeys,
    auth::require_user,
    dashboard,
    receipt::{self, MAX_RECEIPT_BYTES},
    transactions, user,
};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub auth: Arc<AuthKeys>,
    /// `None` when no OCR provider is configured; uploads then fail.
    pub extractor: Option<Arc<dyn ReceiptExtractor>>,
}

impl ServerState {
    pub fn new(engine: Engine, auth: AuthKeys) -> Self {
        Self {
            engine: Arc::new(engine),
            auth: Arc::new(auth),
            extractor: None,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn ReceiptExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }
}

async fn health() -> &'static str {
    "Server is running.."
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(user::me))
        .route(
            "/transactions",
            post(transactions::create).get(transactions::list),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .put(transactions::update)
                .delete(transactions::delete),
        )
        .route("/dashboard", get(dashboard::get))
        .route(
            "/receipts/upload",
            post(receipt::upload)
                .layer(DefaultBodyLimit::max(MAX_RECEIPT_BYTES + 64 * 1024)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    let api = Router::new()
        .route("/auth/register", post(user::register))
        .route("/auth/login", post(user::login))
        .merge(protected);

    Router::new()
        .route("/", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(state: ServerState, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(state, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
