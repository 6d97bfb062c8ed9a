use crate::controller::bankid_controller::transaction_key;
use crate::AppState;
use async_stream::stream;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use bankid::poll::PollEvent;
use bankid::status::TRANSACTION_EXPIRED;
use bankid::StatusResponse;
use log::*;
use serde_json::json;
use std::convert::Infallible;

/// GET /bankid/events
///
/// SSE stream of the authentication named by the transaction cookie. Emits `pending`
/// and `qr` events until a single `finished` event, then closes.
#[utoipa::path(
    get,
    path = "/bankid/events",
    responses(
        (status = 200, description = "text/event-stream of pending, qr and finished events"),
        (status = 400, description = "No transaction cookie"),
    )
)]
pub(crate) async fn events_handler(State(app_state): State<AppState>, jar: CookieJar) -> Response {
    let Some(key) = transaction_key(&jar) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse::failed(TRANSACTION_EXPIRED)),
        )
            .into_response();
    };

    debug!("Establishing BankID event stream");
    let mut poller = app_state
        .provider
        .clone()
        .watch(&key, app_state.config.poller_config());

    // The poller is owned by the stream; a disconnecting client drops it, which
    // stops the background collect loop.
    let stream = stream! {
        while let Some(event) = poller.next().await {
            match sse_event(event) {
                Ok(event) => yield Ok::<Event, Infallible>(event),
                Err(e) => warn!("Failed to serialize BankID event: {}", e),
            }
        }
        debug!("BankID event stream finished");
    };

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

fn sse_event(event: PollEvent) -> Result<Event, axum::Error> {
    match event {
        PollEvent::Pending { message } => Event::default()
            .event("pending")
            .json_data(json!({ "message": message })),
        PollEvent::QrFrame { index, data } => Event::default()
            .event("qr")
            .json_data(json!({ "index": index, "qrData": data })),
        PollEvent::Finished(response) => Event::default().event("finished").json_data(response),
    }
}
