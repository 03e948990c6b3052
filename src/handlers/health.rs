use axum::Json;
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "music-lib-api",
    }))
}

pub async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}
