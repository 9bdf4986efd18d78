//! 股票搜索接口
//!
//! GET /fetch_nse/?q=<query>

use actix_web::{web, HttpResponse, Result};

use super::gateway_error_response;
use crate::models::SearchQuery;
use crate::state::AppState;

pub async fn fetch_nse(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    // 查询词统一小写，保证缓存键一致
    let q = query.q.to_lowercase();

    match state.search.search(&q).await {
        Ok(payload) => Ok(HttpResponse::Ok().json(payload)),
        Err(e) => Ok(gateway_error_response(e)),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/fetch_nse/", web::get().to(fetch_nse));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{context, FakeSearch};
    use crate::models::MISSING_QUERY_ERROR;
    use actix_web::{test, App};
    use serde_json::{json, Value};
    use std::sync::atomic::Ordering;

    #[actix_web::test]
    async fn test_search_is_case_insensitive_and_cached() {
        let ctx = context(FakeSearch::default()).await;
        let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(config)).await;

        let first = test::TestRequest::get().uri("/fetch_nse/?q=TCS").to_request();
        let first = test::call_and_read_body(&app, first).await;
        let second = test::TestRequest::get().uri("/fetch_nse/?q=tcs").to_request();
        let second = test::call_and_read_body(&app, second).await;

        assert_eq!(first, second);
        let body: Value = serde_json::from_slice(&first).unwrap();
        assert_eq!(body, json!({"symbols": [{"symbol_info": "tcs Ltd", "symbol": "TCS"}]}));
        assert_eq!(ctx.search.calls.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn test_missing_query() {
        let ctx = context(FakeSearch::default()).await;
        let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(config)).await;

        for uri in ["/fetch_nse/", "/fetch_nse/?q="] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), 400);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({"error": MISSING_QUERY_ERROR}));
        }
        assert_eq!(ctx.search.calls.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn test_upstream_failure_is_500() {
        let ctx = context(FakeSearch {
            fail: true,
            ..Default::default()
        })
        .await;
        let app = test::init_service(App::new().app_data(ctx.state.clone()).configure(config)).await;

        let req = test::TestRequest::get().uri("/fetch_nse/?q=infy").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "upstream timed out"}));
        assert_eq!(ctx.state.cache.len(), 0);
    }
}
