//! HTTP request handlers for the web adapter.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{SubsecRound, Utc};
use std::sync::Arc;

use crate::domain::error::JournalError;
use crate::domain::listing::{ListParams, TradeQuery};
use crate::domain::summary::JournalSummary;
use crate::domain::trade::Trade;
use crate::domain::validation::{RawSubmission, validate};

use super::auth::{Backend, Credentials, SessionUser, UserView};
use super::{AppState, WebError, run_blocking};

pub type AuthSession = axum_login::AuthSession<Backend>;

/// Identity is taken from the session per request; no session means 401.
fn current_user(auth: &AuthSession) -> Result<&SessionUser, WebError> {
    auth.user
        .as_ref()
        .ok_or_else(|| JournalError::Unauthenticated.into())
}

fn session_error(err: axum_login::Error<Backend>) -> WebError {
    tracing::error!(error = %err, "session handling failed");
    WebError::internal()
}

async fn owned_trades(state: &AppState, user_id: &str) -> Result<Vec<Trade>, JournalError> {
    let store = Arc::clone(&state.trades);
    let user_id = user_id.to_string();
    run_blocking(move || store.list_trades(&user_id)).await
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn login(
    mut auth: AuthSession,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<UserView>, WebError> {
    let Json(creds) = payload.map_err(|e| WebError::bad_request(e.body_text()))?;
    let username = creds.username.clone();

    let user = match auth.authenticate(creds).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(%username, "login rejected");
            return Err(JournalError::InvalidCredentials.into());
        }
        Err(e) => return Err(session_error(e)),
    };

    auth.login(&user).await.map_err(session_error)?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(UserView::from(&user)))
}

pub async fn logout(mut auth: AuthSession) -> Result<StatusCode, WebError> {
    auth.logout().await.map_err(session_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(auth: AuthSession) -> Result<Json<UserView>, WebError> {
    current_user(&auth).map(|user| Json(UserView::from(user)))
}

pub async fn list_trades(
    auth: AuthSession,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Trade>>, WebError> {
    let user = current_user(&auth)?;
    let query = TradeQuery::from_params(&params)?;
    let trades = owned_trades(&state, &user.id).await?;
    Ok(Json(query.apply(trades)))
}

pub async fn create_trade(
    auth: AuthSession,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RawSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<Trade>), WebError> {
    let user = current_user(&auth)?;
    let Json(submission) = payload.map_err(|e| WebError::bad_request(e.body_text()))?;

    let validated = validate(&submission)?;
    // Storage keeps microseconds; the response must match a later fetch.
    let trade = Trade::create(validated, &user.id, Utc::now().trunc_subsecs(6));
    let store = Arc::clone(&state.trades);
    let trade = run_blocking(move || {
        store.create_trade(&trade)?;
        Ok(trade)
    })
    .await?;

    tracing::info!(
        trade_id = %trade.id,
        user_id = %user.id,
        outcome = %trade.outcome,
        "trade recorded"
    );
    Ok((StatusCode::CREATED, Json(trade)))
}

pub async fn get_trade(
    auth: AuthSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Trade>, WebError> {
    let user = current_user(&auth)?;
    let store = Arc::clone(&state.trades);
    let (user_id, trade_id) = (user.id.clone(), id.clone());
    match run_blocking(move || store.get_trade(&user_id, &trade_id)).await? {
        Some(trade) => Ok(Json(trade)),
        None => Err(JournalError::NotFound { id }.into()),
    }
}

/// Summary over the same filters the list accepts; sort params are ignored.
pub async fn trade_summary(
    auth: AuthSession,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<JournalSummary>, WebError> {
    let user = current_user(&auth)?;
    let query = TradeQuery::from_params(&params)?;
    let trades = query.apply(owned_trades(&state, &user.id).await?);
    Ok(Json(JournalSummary::compute(&trades)))
}

pub async fn not_found() -> WebError {
    WebError::not_found("no such route")
}
