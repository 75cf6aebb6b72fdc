mod handlers;

use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::debug;

use crate::api::AppState;

pub use handlers::{BiometricSession, ClientMessage, ServerMessage};

// WebSocket connection handler, one biometric session per connection
pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = BiometricSession::new(&state);
    debug!(
        "Opening biometric session {} from {:?}",
        session.id(),
        req.peer_addr()
    );

    // Start WebSocket connection
    let resp = ws::start(session, &req, stream)?;

    Ok(resp)
}
