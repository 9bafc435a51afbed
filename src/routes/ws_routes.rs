//! Canal push de estado de la flota
//!
//! `GET /ws/status` abre un WebSocket que recibe en cada tick el estado de
//! toda la flota como array JSON de `{car_id, battery, status}`. Los
//! mensajes de texto del cliente se registran y se ignoran.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{Sink, SinkExt, StreamExt};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::services::subscription_registry::{Subscription, SubscriptionRegistry};
use crate::state::AppState;

pub fn create_ws_router() -> Router<AppState> {
    Router::new().route("/ws/status", get(status_socket))
}

async fn status_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let registry = state.registry.clone();
    let buffer = state.config.observer_buffer;
    let send_timeout = state.config.observer_send_timeout;
    ws.on_upgrade(move |socket| handle_socket(socket, registry, buffer, send_timeout))
}

async fn handle_socket(
    socket: WebSocket,
    registry: SubscriptionRegistry,
    buffer: usize,
    send_timeout: Duration,
) {
    let Subscription { id, mut receiver } = registry.subscribe(buffer).await;
    info!("🔌 Observador {} conectado", id);

    let (mut outgoing, mut incoming) = socket.split();

    loop {
        tokio::select! {
            snapshot = receiver.recv() => {
                let Some(snapshot) = snapshot else {
                    // El broadcaster ya eliminó la suscripción
                    break;
                };
                let payload = match serde_json::to_string(snapshot.as_ref()) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!("⚠️ No se pudo serializar el snapshot: {}", e);
                        continue;
                    }
                };
                match push_snapshot(&mut outgoing, payload, send_timeout).await {
                    Push::Sent => {}
                    Push::Failed(e) => {
                        debug!("Envío a observador {} fallido: {}", id, e);
                        break;
                    }
                    Push::Stalled => {
                        warn!("⏱️ Observador {} no lee el socket, se cierra", id);
                        break;
                    }
                }
            }
            message = incoming.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        debug!("Mensaje de observador {} ignorado: {}", id, text);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!("⚠️ Error recibiendo de observador {}: {}", id, e);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    registry.unregister(id).await;
    info!("🔌 Observador {} desconectado", id);
}

#[derive(Debug)]
enum Push {
    Sent,
    Failed(String),
    /// El cliente dejó de leer y el envío no cabe en el plazo
    Stalled,
}

async fn push_snapshot<S>(sink: &mut S, payload: String, send_timeout: Duration) -> Push
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    match tokio::time::timeout(send_timeout, sink.send(Message::Text(payload))).await {
        Ok(Ok(())) => Push::Sent,
        Ok(Err(e)) => Push::Failed(e.to_string()),
        Err(_) => Push::Stalled,
    }
}
