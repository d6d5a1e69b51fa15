use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    adapters::http::{app_state::AppState, routes::json_body},
    app_error::AppResult,
    application::use_cases::checkout::CreatePaymentRequest,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/config", get(checkout_config))
        .route("/payment-methods", get(payment_methods))
        .route("/create-payment", post(create_payment))
        .route("/confirm-payment", post(confirm_payment))
}

async fn checkout_config(State(app_state): State<AppState>) -> impl IntoResponse {
    let config = app_state.checkout.config();
    Json(json!({
        "publishable_key": config.publishable_key,
        "product_name": config.product_name,
        "unit_amount": config.unit_amount,
        "currency": config.currency,
    }))
}

async fn payment_methods(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "payment_method_types": app_state.checkout.payment_method_types() }))
}

#[derive(Debug, Deserialize)]
struct CreatePaymentReq {
    email: Option<String>,
    quantity: Option<u32>,
    payment_method_id: Option<String>,
}

async fn create_payment(
    State(app_state): State<AppState>,
    payload: Result<Json<CreatePaymentReq>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let req = json_body(payload)?;
    let result = app_state
        .checkout
        .create_payment(&CreatePaymentRequest {
            email: req.email,
            quantity: req.quantity,
            payment_method_id: req.payment_method_id.filter(|id| !id.is_empty()),
        })
        .await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct ConfirmPaymentReq {
    payment_intent_id: String,
    payment_method_id: Option<String>,
}

async fn confirm_payment(
    State(app_state): State<AppState>,
    payload: Result<Json<ConfirmPaymentReq>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let req = json_body(payload)?;
    let result = app_state
        .checkout
        .confirm_payment(&req.payment_intent_id, req.payment_method_id.as_deref())
        .await?;
    Ok(Json(result))
}
