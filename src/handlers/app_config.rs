//! 前端配置接口
//!
//! GET /api/config/ 返回 `{"APP_BASE_URL": "..."}`

use actix_web::{web, HttpResponse, Result};

use crate::state::AppState;

pub async fn get_config(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(&state.public))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/config/", web::get().to(get_config));
}
