use crate::{api::server::AppState, predicates::MarketplaceEvent};
use actix_web::{
    web::{self, post, Data},
    HttpResponse, Scope,
};
use log::error;
use shared::models::{api::ApiResponse, payload::ChainhookPayload};

fn batch_id(payload: &ChainhookPayload, event: MarketplaceEvent) -> String {
    payload
        .predicate_uuid()
        .unwrap_or(event.path_segment())
        .to_string()
}

// Deliveries are acknowledged with 200 even when the payload cannot be
// parsed: the node must not retry a batch the listener has already dropped.
async fn receive_event(
    event: web::Path<String>,
    body: web::Bytes,
    app_state: Data<AppState>,
) -> HttpResponse {
    let segment = event.into_inner();
    let Some(event) = MarketplaceEvent::from_path_segment(&segment) else {
        return HttpResponse::NotFound().json(ApiResponse::failure(format!(
            "Unknown event type: {segment}"
        )));
    };

    let payload = match serde_json::from_slice::<ChainhookPayload>(&body) {
        Ok(payload) => payload,
        Err(e) => {
            error!(
                "Error processing {} event: invalid payload: {e}",
                event.path_segment()
            );
            return ApiResponse::failure(format!("Invalid payload: {e}")).into();
        }
    };

    let batch_id = batch_id(&payload, event);
    let summary = app_state.aggregator.lock().await.handle(&batch_id, &payload);
    ApiResponse::ok(summary).into()
}

pub fn chainhook_routes() -> Scope {
    web::scope("/chainhook").route("/{event}", post().to(receive_event))
}
