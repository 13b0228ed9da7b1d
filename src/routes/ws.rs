//! WebSocket upgrade + message loop. Each connection owns one tutoring session.
//!
//! Client intents are applied one at a time. While an intent's external call is
//! running, snapshots are forwarded to the client but no further message is
//! read, so a session never has two outstanding calls.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::logic::drive;
use crate::protocol::{ClientWsMessage, ServerWsMessage, SessionView};
use crate::session::Session;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "pydata_tutor", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

fn encode(msg: &ServerWsMessage) -> String {
  serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  })
}

async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> Result<(), axum::Error> {
  socket.send(Message::Text(encode(msg))).await
}

#[instrument(level = "info", skip(socket, state), fields(session_id = tracing::field::Empty))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let session_id = Uuid::new_v4().to_string();
  tracing::Span::current().record("session_id", session_id.as_str());
  info!(target: "pydata_tutor", "WebSocket connected");

  let mut session = Session::new();
  let greeting = [
    ServerWsMessage::Topics { topics: state.catalog.topics().to_vec() },
    ServerWsMessage::Session { session: SessionView::of(&session_id, &session) },
  ];
  for msg in &greeting {
    if let Err(e) = send(&mut socket, msg).await {
      error!(target: "pydata_tutor", error = %e, "WS send error");
      return;
    }
  }

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let incoming = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(m) => m,
          Err(e) => {
            let reply = ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) };
            if send(&mut socket, &reply).await.is_err() { break; }
            continue;
          }
        };
        debug!(target: "pydata_tutor", "WS received: {:?}", &incoming);

        let reply = match incoming {
          ClientWsMessage::Ping => Some(ServerWsMessage::Pong),
          ClientWsMessage::ListTopics => Some(ServerWsMessage::Topics { topics: state.catalog.topics().to_vec() }),
          other => {
            if let Some(event) = other.into_event() {
              let (next, sent) = apply_and_stream(&state, &session_id, session, event, &mut socket).await;
              session = next;
              if !sent { break; }
            }
            None
          }
        };

        if let Some(reply) = reply {
          if let Err(e) = send(&mut socket, &reply).await {
            error!(target: "pydata_tutor", error = %e, "WS send error");
            break;
          }
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "pydata_tutor", phase = session.phase.name(), "WebSocket disconnected");
}

/// Drive the session while forwarding each snapshot as it is produced.
/// Returns the settled session and whether every snapshot reached the client.
async fn apply_and_stream(
  state: &AppState,
  session_id: &str,
  session: Session,
  event: crate::session::Event,
  socket: &mut WebSocket,
) -> (Session, bool) {
  let (tx, mut rx) = mpsc::unbounded_channel::<SessionView>();
  let driving = drive(state, session_id, session, event, tx);
  let forwarding = async {
    let mut ok = true;
    while let Some(view) = rx.recv().await {
      if !ok { continue; }
      if let Err(e) = send(&mut *socket, &ServerWsMessage::Session { session: view }).await {
        error!(target: "pydata_tutor", error = %e, "WS send error");
        ok = false;
      }
    }
    ok
  };
  tokio::join!(driving, forwarding)
}
