use std::sync::Arc;

use axum::{
    http::{header, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Authenticated caller identity, available to handlers via request extensions.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub name: String,
    pub role: String,
}

impl CallerIdentity {
    /// Readers may only issue safe (read-only) requests.
    pub fn may(&self, method: &Method) -> bool {
        match self.role.as_str() {
            "admin" | "writer" => true,
            _ => matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS),
        }
    }
}

#[derive(Serialize)]
struct AuthError {
    success: bool,
    error: String,
}

fn reject(status: StatusCode, error: &str) -> Response {
    (status, Json(AuthError {
        success: false,
        error: error.to_string(),
    })).into_response()
}

pub async fn auth_middleware<B>(
    Extension(config): Extension<Arc<AuthConfig>>,
    mut req: Request<B>,
    next: Next<B>,
) -> Response {
    if !config.enabled {
        req.extensions_mut().insert(CallerIdentity {
            name: "anonymous".to_string(),
            role: "admin".to_string(),
        });
        return next.run(req).await;
    }

    let api_key = req.headers()
        .get(API_KEY_HEADER)
        .or_else(|| req.headers().get(header::AUTHORIZATION))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.strip_prefix("Bearer ").unwrap_or(s));

    let key = match api_key {
        Some(key) => key,
        None => {
            return reject(
                StatusCode::UNAUTHORIZED,
                "Missing API key. Provide X-API-Key header or Authorization: Bearer <key>",
            )
        }
    };

    let entry = match config.api_keys.iter().find(|entry| entry.key.as_bytes().ct_eq(key.as_bytes()).into()) {
        Some(entry) => entry,
        None => {
            tracing::warn!("Invalid API key presented");
            return reject(StatusCode::UNAUTHORIZED, "Invalid API key");
        }
    };

    let caller = CallerIdentity {
        name: entry.name.clone(),
        role: entry.role.clone(),
    };
    if !caller.may(req.method()) {
        tracing::warn!(caller = %caller.name, method = %req.method(), "Write attempted with read-only key");
        return reject(StatusCode::FORBIDDEN, "API key does not permit this operation");
    }

    tracing::debug!(caller = %caller.name, role = %caller.role, "Authenticated request");
    req.extensions_mut().insert(caller);
    next.run(req).await
}
