// handler/wallet.rs
use std::sync::Arc;

use axum::{
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::marketdtos::{ApiResponse, DepositDto, EscrowSummaryDto},
    error::HttpError,
    middleware::AuthenticatedCaller,
    AppState,
};

pub fn wallet_handler() -> Router {
    Router::new()
        .route("/", get(get_wallet))
        .route("/deposit", post(deposit))
        .route("/escrow", get(get_escrow_summary))
}

pub async fn get_wallet(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedCaller>,
) -> Result<impl IntoResponse, HttpError> {
    let account = app_state.account_service.balance(caller.id).await?;

    Ok(Json(ApiResponse::success("Wallet retrieved successfully", account)))
}

pub async fn deposit(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedCaller>,
    Json(body): Json<DepositDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let account = app_state.account_service.deposit(caller.id, body.amount).await?;

    Ok(Json(ApiResponse::success("Deposit successful", account)))
}

pub async fn get_escrow_summary(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let escrow = &app_state.escrow_service;
    let custody_total = escrow.custody_total().await?;
    let platform = app_state.account_service.balance(escrow.platform_account()).await?;

    Ok(Json(ApiResponse::success(
        "Escrow summary retrieved successfully",
        EscrowSummaryDto {
            custody_total,
            platform_account: platform.identity,
            platform_balance: platform.balance,
            payout_basis: escrow.payout_basis().to_str().to_string(),
        },
    )))
}
