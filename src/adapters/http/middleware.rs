use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use base64::Engine;
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

use crate::{adapters::http::app_state::AppState, app_error::AppError, infra::config::AdminCredentials};

/// Requires HTTP Basic credentials matching the configured admin account.
pub async fn admin_auth_middleware(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(admin) = app_state.config.admin.as_ref() else {
        tracing::warn!("Admin request rejected: no admin credentials configured");
        return Err(AppError::InvalidCredentials);
    };

    let (username, password) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_basic)
        .ok_or(AppError::InvalidCredentials)?;

    if !credentials_match(admin, &username, &password) {
        tracing::warn!(username = %username, "Admin request rejected: bad credentials");
        return Err(AppError::InvalidCredentials);
    }

    Ok(next.run(request).await)
}

fn parse_basic(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

/// Compares SHA-256 digests so timing does not depend on where inputs differ.
pub fn credentials_match(admin: &AdminCredentials, username: &str, password: &str) -> bool {
    let user_ok = digest(username) == digest(&admin.username);
    let pass_ok = digest(password) == digest(admin.password.expose_secret());
    user_ok & pass_ok
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn admin() -> AdminCredentials {
        AdminCredentials {
            username: "admin".into(),
            password: SecretString::new("s3cret".into()),
        }
    }

    #[test]
    fn parse_basic_splits_on_first_colon() {
        let header = format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode("admin:pa:ss")
        );
        assert_eq!(
            parse_basic(&header),
            Some(("admin".to_string(), "pa:ss".to_string()))
        );
        assert_eq!(parse_basic("Bearer abc"), None);
        assert_eq!(parse_basic("Basic !!!"), None);
    }

    #[test]
    fn credentials_must_both_match() {
        assert!(credentials_match(&admin(), "admin", "s3cret"));
        assert!(!credentials_match(&admin(), "admin", "wrong"));
        assert!(!credentials_match(&admin(), "root", "s3cret"));
    }
}
