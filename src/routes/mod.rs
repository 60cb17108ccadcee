pub mod blogs;
pub mod comments;
pub mod study_materials;
pub mod users;

use axum::routing::get;
use axum::{Json, Router};
use mongodb::bson::oid::ObjectId;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Full application router. Split out of `main` so the e2e tests can mount
/// the exact same surface on an ephemeral port.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(blogs::router())
        .merge(comments::router())
        .merge(study_materials::router())
        .merge(users::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Path ids arrive as hex strings; a malformed one is the caller's fault,
/// never a 500.
pub(crate) fn parse_object_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid id: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_object_id_accepts_valid_hex() {
        let oid = ObjectId::new();
        assert_eq!(parse_object_id(&oid.to_hex()).unwrap(), oid);
    }

    #[test]
    fn parse_object_id_rejects_garbage() {
        assert!(parse_object_id("not-an-id").is_err());
        assert!(parse_object_id("").is_err());
        // Right length, invalid hex
        assert!(parse_object_id("zzzzzzzzzzzzzzzzzzzzzzzz").is_err());
    }
}
