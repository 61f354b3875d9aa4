use crate::api::server::AppState;
use actix_web::{
    web::{self, get, Data},
    HttpResponse, Scope,
};
use shared::models::api::ApiResponse;

async fn get_analytics(app_state: Data<AppState>) -> HttpResponse {
    let snapshot = app_state.aggregator.lock().await.snapshot();
    ApiResponse::ok(snapshot).into()
}

pub fn analytics_routes() -> Scope {
    web::scope("/analytics").route("", get().to(get_analytics))
}
