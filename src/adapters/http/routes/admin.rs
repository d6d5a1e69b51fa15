use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    adapters::http::{
        app_state::AppState,
        middleware::{admin_auth_middleware, credentials_match},
        routes::json_body,
    },
    app_error::{AppError, AppResult},
    application::use_cases::campaign::CampaignRequest,
    domain::entities::{campaign::Campaign, subscriber::Subscriber},
};

pub fn router(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/subscribers", get(list_subscribers))
        .route("/resend", post(resend))
        .route("/remove", post(remove))
        .route("/campaign", post(send_campaign))
        .route("/process-queue", post(process_queue))
        .route_layer(middleware::from_fn_with_state(app_state, admin_auth_middleware))
        .route("/login", post(login))
}

fn parse_campaign(raw: Option<&str>) -> AppResult<Campaign> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => Campaign::from_str(name)
            .map_err(|_| AppError::InvalidInput(format!("Unknown campaign: {name}"))),
        None => Ok(Campaign::default()),
    }
}

#[derive(Debug, Deserialize)]
struct LoginReq {
    username: String,
    password: String,
}

async fn login(
    State(app_state): State<AppState>,
    payload: Result<Json<LoginReq>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let req = json_body(payload)?;
    let admin = app_state
        .config
        .admin
        .as_ref()
        .ok_or(AppError::InvalidCredentials)?;
    if !credentials_match(admin, &req.username, &req.password) {
        return Err(AppError::InvalidCredentials);
    }
    tracing::info!(username = %req.username, "Admin login");
    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Serialize)]
struct SubscribersResp {
    count: usize,
    subscribers: Vec<Subscriber>,
}

async fn list_subscribers(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let subscribers = app_state.waitlist.list().await?;
    Ok(Json(SubscribersResp {
        count: subscribers.len(),
        subscribers,
    }))
}

#[derive(Debug, Deserialize)]
struct ResendReq {
    email: String,
    campaign: Option<String>,
}

async fn resend(
    State(app_state): State<AppState>,
    payload: Result<Json<ResendReq>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let req = json_body(payload)?;
    let campaign = parse_campaign(req.campaign.as_deref())?;
    let outcome = app_state.campaigns.resend(&req.email, campaign).await?;
    Ok(Json(json!({ "campaign": campaign, "delivery": outcome })))
}

#[derive(Debug, Deserialize)]
struct RemoveReq {
    email: String,
}

async fn remove(
    State(app_state): State<AppState>,
    payload: Result<Json<RemoveReq>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let req = json_body(payload)?;
    let report = app_state.waitlist.remove(&req.email).await?;
    Ok(Json(json!({
        "removed": true,
        "email": report.email,
        "removed_from": report.removed_from,
        "purged_queue_files": report.purged_queue_files,
    })))
}

#[derive(Debug, Deserialize)]
struct CampaignReq {
    campaign: String,
    email: Option<String>,
    #[serde(default)]
    start: usize,
    batch: Option<usize>,
    #[serde(default)]
    dry_run: bool,
}

async fn send_campaign(
    State(app_state): State<AppState>,
    payload: Result<Json<CampaignReq>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let req = json_body(payload)?;
    let request = CampaignRequest {
        campaign: parse_campaign(Some(&req.campaign))?,
        email: req.email.filter(|e| !e.trim().is_empty()),
        start: req.start,
        batch: req.batch,
        dry_run: req.dry_run,
    };
    let report = app_state.campaigns.run(&request).await?;
    Ok(Json(report))
}

async fn process_queue(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let report = app_state.queue_processor.process().await?;
    Ok(Json(report))
}
