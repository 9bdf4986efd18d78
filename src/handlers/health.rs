use actix_web::{web, HttpResponse, Result};
use chrono::Utc;

use crate::models::HealthResponse;
use crate::state::AppState;

pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        cache_entries: state.cache.len(),
        timestamp: Utc::now().to_rfc3339(),
    };
    Ok(HttpResponse::Ok().json(response))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
