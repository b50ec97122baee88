//! Web server adapter.
//!
//! JSON API over axum. Sessions are signed cookies backed by an in-memory
//! store; the logged-in user scopes every trade operation.

mod auth;
mod error;
mod handlers;

pub use auth::{Backend, Credentials, SessionUser, UserView, hash_password, verify_password};
pub use error::{WebError, status_from_error};
pub use handlers::*;

use axum::{
    Router,
    routing::{get, post},
};
use axum_login::AuthManagerLayerBuilder;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key};

use crate::domain::config_validation::validate_session_config;
use crate::domain::error::JournalError;
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_port::TradePort;
use crate::ports::user_port::UserPort;

/// Runs a store or hashing call on the blocking pool so pool waits and
/// argon2 work stay off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, JournalError>
where
    F: FnOnce() -> Result<T, JournalError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| JournalError::Task {
            reason: e.to_string(),
        })?
}

pub struct AppState {
    pub trades: Arc<dyn TradePort + Send + Sync>,
    pub users: Arc<dyn UserPort + Send + Sync>,
    pub config: Arc<dyn ConfigPort + Send + Sync>,
}

pub fn build_router(state: AppState) -> Result<Router, JournalError> {
    let session = validate_session_config(&*state.config)?;
    let key = Key::try_from(session.key.as_slice()).map_err(|e| JournalError::ConfigInvalid {
        section: "auth".to_string(),
        key: "session_secret".to_string(),
        reason: e.to_string(),
    })?;

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(session.secure_cookies)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(
            session.lifetime,
        )))
        .with_signed(key);
    let backend = Backend::new(Arc::clone(&state.users));
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    Ok(Router::new()
        .route("/health", get(handlers::health))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me))
        .route(
            "/trades",
            get(handlers::list_trades).post(handlers::create_trade),
        )
        .route("/trades/summary", get(handlers::trade_summary))
        .route("/trades/{id}", get(handlers::get_trade))
        .fallback(handlers::not_found)
        .layer(auth_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state)))
}
