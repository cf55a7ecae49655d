//! HTTP routes.

use crate::{error::ApiError, kyc::KycCallback, limiter::Limiter, AppState};
use alloy_primitives::Address;
use axum::{
    body::Bytes,
    extract::{rejection::FormRejection, ConnectInfo, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use storage::{CoreId, StorageError};
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};
use tracing::{debug, error, info};

const CLAIM: &str = "claim";
const CLAIM_AUTHORIZED: &str = "claim_authorized";
const CALLBACK: &str = "callback";

const INTERNAL: &str = "Internal Server Error";

#[derive(Debug, Default, Deserialize)]
pub struct ClaimForm {
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthorizedClaimForm {
    #[serde(default)]
    pub jwt: String,
}

/// Body of `GET /api/info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    pub account: String,
    pub network: String,
    pub payout: String,
    pub tokens_payout: String,
}

/// Build the faucet router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/api/claim", post(claim))
        .route("/api/claimAuthorized", post(claim_authorized))
        .route("/api/callback", post(callback))
        .route("/api/info", get(info))
        .route("/health", get(health));

    if let Some(web_dir) = &state.config.web_dir {
        router = router.fallback_service(ServeDir::new(web_dir));
    }

    router
        .with_state(state)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// An unreadable form is treated as empty so the field checks answer for it.
fn form_or_default<T: Default>(form: Result<Form<T>, FormRejection>) -> T {
    match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            debug!("Unreadable form: {rejection}");
            T::default()
        }
    }
}

/// Record the outcome of a funding route.
fn observe(state: &AppState, route: &'static str, result: &Result<String, ApiError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) => e.outcome(),
    };
    state.metrics.record_claim(route, outcome);
}

/// Claim `keys` on `limiter`, counting rejections.
fn rate_limit<'a>(
    state: &AppState,
    limiter: &'a Limiter,
    route: &'static str,
    keys: &[&str],
) -> Result<crate::limiter::LimitGuard<'a>, ApiError> {
    limiter.acquire(keys).map_err(|limited| {
        debug!(keys = ?keys, remaining = ?limited.remaining, "Rate limited");
        state.metrics.record_rate_limited(route);
        ApiError::RateLimited(limited.message())
    })
}

async fn claim(
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    form: Result<Form<ClaimForm>, FormRejection>,
) -> Result<String, ApiError> {
    let form = form_or_default(form);
    let result = handle_claim(&state, &headers, remote, &form.address).await;
    observe(&state, CLAIM, &result);
    result
}

async fn handle_claim(
    state: &AppState,
    headers: &HeaderMap,
    remote: SocketAddr,
    raw_address: &str,
) -> Result<String, ApiError> {
    let address = parse_address(raw_address)?;
    let client_ip = state.claim_limiter.client_ip(headers, remote);

    let guard = rate_limit(
        state,
        &state.claim_limiter,
        CLAIM,
        &[raw_address, client_ip.as_str()],
    )?;
    debug!(address = %address, client_ip = %client_ip, "Received claim");

    let body = state.fund(address).await?;
    guard.commit();

    Ok(body)
}

async fn claim_authorized(
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    form: Result<Form<AuthorizedClaimForm>, FormRejection>,
) -> Result<String, ApiError> {
    let form = form_or_default(form);
    let result = handle_claim_authorized(&state, &headers, remote, &form.jwt).await;
    observe(&state, CLAIM_AUTHORIZED, &result);
    result
}

async fn handle_claim_authorized(
    state: &AppState,
    headers: &HeaderMap,
    remote: SocketAddr,
    token: &str,
) -> Result<String, ApiError> {
    let id = crate::jwt::subject_id(token).map_err(|e| {
        debug!("Bad JWT Token: {e}");
        ApiError::BadJwt
    })?;
    let address = parse_address(&id)?;

    let core_id = match state.storage.get_core_id(&id) {
        Ok(core_id) => core_id,
        Err(StorageError::NotFound) => return request_kyc(state, &id).await,
        Err(e) => {
            error!(id = %id, "Cannot check if core id exists: {e}");
            return Err(ApiError::Internal(INTERNAL.to_string()));
        }
    };

    let client_ip = state.auth_limiter.client_ip(headers, remote);
    let guard = rate_limit(
        state,
        &state.auth_limiter,
        CLAIM_AUTHORIZED,
        &[id.as_str(), client_ip.as_str()],
    )?;

    if !core_id.verified {
        // Dropping the guard frees the keys for the next poll
        debug!(id = %id, "Requesting data is in progress");
        return Ok("Requesting data is in progress".to_string());
    }

    let body = state.fund(address).await?;
    guard.commit();

    Ok(body)
}

/// First contact from an identity: ask for its KYC data and remember it.
async fn request_kyc(state: &AppState, id: &str) -> Result<String, ApiError> {
    let requested = state.kyc.request(id).await;
    state.metrics.record_kyc_request(requested.is_ok());
    requested.map_err(|e| {
        error!(id = %id, "KYC request failed: {e}");
        ApiError::Internal(format!("/kyc/request endpoint returned err: {e}"))
    })?;

    match state.storage.create_core_id(&CoreId::new(id)) {
        // A concurrent request got there first
        Ok(()) | Err(StorageError::AlreadyExists(_)) => {}
        Err(e) => {
            error!(id = %id, "Cannot create new core id: {e}");
            return Err(ApiError::Internal(INTERNAL.to_string()));
        }
    }

    info!(id = %id, "Requested KYC data");
    Ok("KYC data has been requested".to_string())
}

async fn callback(State(state): State<Arc<AppState>>, body: Bytes) -> Result<String, ApiError> {
    let result = handle_callback(&state, &body).await;
    observe(&state, CALLBACK, &result);
    result
}

async fn handle_callback(state: &AppState, body: &[u8]) -> Result<String, ApiError> {
    let callback: KycCallback = serde_json::from_slice(body).map_err(|e| {
        debug!("Cannot parse KYC callback: {e}");
        ApiError::BadRequest
    })?;

    callback.validate().map_err(|e| {
        error!(user = %callback.user, "KYC provider sent bad callback: {e}");
        ApiError::BadRequest
    })?;

    let address = chain::parse_checksummed(&callback.user).ok_or_else(|| {
        error!(user = %callback.user, "KYC callback for invalid address");
        ApiError::BadRequest
    })?;

    match state.storage.verify(&callback.user) {
        Ok(()) => info!(user = %callback.user, "Verified KYC data"),
        Err(StorageError::NotFound) => {
            return Err(ApiError::NotFound(format!(
                "unknown user {}",
                callback.user
            )));
        }
        Err(e) => {
            error!(user = %callback.user, "Cannot verify users kyc data: {e}");
            return Err(ApiError::Internal(INTERNAL.to_string()));
        }
    }

    state.fund(address).await
}

async fn info(State(state): State<Arc<AppState>>) -> Json<Info> {
    Json(Info {
        account: state.tx_builder.sender().to_checksum(None),
        network: state.tx_builder.chain_id().to_string(),
        payout: state.config.payout.to_string(),
        tokens_payout: state.config.tokens_payout.to_string(),
    })
}

async fn health() -> impl IntoResponse {
    "OK"
}

fn parse_address(raw: &str) -> Result<Address, ApiError> {
    chain::parse_checksummed(raw).ok_or_else(|| {
        debug!(address = %raw, "Invalid address");
        ApiError::InvalidAddress
    })
}
