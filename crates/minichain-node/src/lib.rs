//! HTTP host for the proof-of-work chain.
//!
//! One [`Chain`] lives behind an async mutex; every mutating request takes the
//! lock, so calls into the core never overlap.

pub mod config;
pub mod constants;
pub mod error;
pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use minichain_core::{Chain, Clock};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

pub type SharedClock = Arc<dyn Clock>;
pub type SharedChain = Arc<Mutex<Chain<SharedClock>>>;

#[derive(Clone)]
pub struct AppState {
    pub chain: SharedChain,
    pub difficulty: u32,
    pub mine_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(chain: Chain<SharedClock>, difficulty: u32, mine_timeout: Option<Duration>) -> Self {
        Self {
            chain: Arc::new(Mutex::new(chain)),
            difficulty,
            mine_timeout,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/transactions/new", post(routes::new_transaction))
        .route("/mine", get(routes::mine))
        .route("/chain", get(routes::chain))
        .route("/chain/validate", get(routes::validate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
