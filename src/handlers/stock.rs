//! 股票增删改查接口
//!
//! - GET    /stock-list        全部股票
//! - POST   /stock-list        新建股票
//! - GET    /stock-list/{id}   单只股票
//! - PUT    /stock-list/{id}   更新股票
//! - DELETE /stock-list/{id}   删除股票

use actix_web::{web, HttpResponse, Result};

use super::repository_error_response;
use crate::models::StockInput;
use crate::state::AppState;

pub async fn list_stocks(state: web::Data<AppState>) -> Result<HttpResponse> {
    match state.repo.list_stocks().await {
        Ok(stocks) => Ok(HttpResponse::Ok().json(stocks)),
        Err(e) => Ok(repository_error_response(e)),
    }
}

pub async fn create_stock(
    state: web::Data<AppState>,
    body: web::Json<StockInput>,
) -> Result<HttpResponse> {
    match state.repo.create_stock(&body).await {
        Ok(stock) => {
            log::info!("新建股票 {} (id={})", stock.symbol, stock.id);
            Ok(HttpResponse::Created().json(stock))
        }
        Err(e) => Ok(repository_error_response(e)),
    }
}

pub async fn get_stock(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse> {
    match state.repo.get_stock(path.into_inner()).await {
        Ok(stock) => Ok(HttpResponse::Ok().json(stock)),
        Err(e) => Ok(repository_error_response(e)),
    }
}

pub async fn update_stock(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<StockInput>,
) -> Result<HttpResponse> {
    match state.repo.update_stock(path.into_inner(), &body).await {
        Ok(stock) => Ok(HttpResponse::Ok().json(stock)),
        Err(e) => Ok(repository_error_response(e)),
    }
}

pub async fn delete_stock(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse> {
    let id = path.into_inner();
    match state.repo.delete_stock(id).await {
        Ok(()) => {
            log::info!("删除股票 id={}", id);
            Ok(HttpResponse::NoContent().finish())
        }
        Err(e) => Ok(repository_error_response(e)),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/stock-list")
            .route(web::get().to(list_stocks))
            .route(web::post().to(create_stock)),
    )
    .service(
        web::resource("/stock-list/{id}")
            .route(web::get().to(get_stock))
            .route(web::put().to(update_stock))
            .route(web::delete().to(delete_stock)),
    );
}
