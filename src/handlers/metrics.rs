//! 行情指标接口
//!
//! GET /diff-ath-cmp?codes=<code>
//!
//! 数据源失败时仍返回 200，错误信息在 `error` 字段中

use actix_web::{web, HttpResponse, Result};

use super::gateway_error_response;
use crate::models::MetricsQuery;
use crate::state::AppState;

pub async fn get_stock_metrics(
    state: web::Data<AppState>,
    query: web::Query<MetricsQuery>,
) -> Result<HttpResponse> {
    match state.metrics.metrics(&query.codes).await {
        Ok(metrics) => Ok(HttpResponse::Ok().json(metrics)),
        Err(e) => Ok(gateway_error_response(e)),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/diff-ath-cmp", web::get().to(get_stock_metrics));
}
