pub mod admin;
pub mod checkout;
pub mod waitlist;
pub mod webhooks;

use axum::{Json, Router, extract::rejection::JsonRejection};

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
};

pub fn router(app_state: AppState) -> Router<AppState> {
    Router::new()
        .merge(waitlist::router())
        .merge(checkout::router())
        .merge(webhooks::router())
        .nest("/admin", admin::router(app_state))
}

/// Unwraps a JSON body, turning missing or malformed bodies into 400s.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}
