use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::{app_state::AppState, routes::json_body},
    app_error::AppResult,
    application::use_cases::{
        delivery::DeliveryOutcome,
        waitlist::{SubscribeResult, SubscribeStatus},
    },
};

pub fn router() -> Router<AppState> {
    Router::new().route("/waitlist", post(join_waitlist))
}

#[derive(Debug, Deserialize)]
struct WaitlistReq {
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct WaitlistResp {
    status: SubscribeStatus,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    delivery: Option<DeliveryOutcome>,
}

impl From<SubscribeResult> for WaitlistResp {
    fn from(result: SubscribeResult) -> Self {
        WaitlistResp {
            status: result.status,
            message: result.status.message(),
            delivery: result.delivery,
        }
    }
}

#[tracing::instrument(name = "join_waitlist", skip_all)]
async fn join_waitlist(
    State(app_state): State<AppState>,
    payload: Result<Json<WaitlistReq>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let req = json_body(payload)?;
    let result = app_state.waitlist.subscribe(req.email.as_deref()).await?;
    tracing::info!(email = %result.email, status = ?result.status, "Waitlist signup handled");
    Ok(Json(WaitlistResp::from(result)))
}
