use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn};

use burrow_types::events::ClientFrame;

use crate::registry::{Registry, peer_tag};

/// Keepalive interval: the server sends a Ping every 30 seconds so idle
/// connections are not reaped by intermediaries.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Handle one relay WebSocket connection: register the peer, forward
/// registry frames out, rebroadcast inbound frames, unregister on close.
pub async fn handle_connection(socket: WebSocket, registry: Registry) {
    let (mut sender, mut receiver) = socket.split();

    let (conn_id, mut rx) = registry.add().await;
    let tag = peer_tag(conn_id);
    info!("peer {} connected to relay", tag);

    // Forward relay frames (plus keepalive pings) to this peer
    let mut send_task = tokio::spawn(async move {
        let mut keepalive = tokio::time::interval(KEEPALIVE_INTERVAL);
        keepalive.tick().await;

        loop {
            tokio::select! {
                frame = rx.recv() => {
                    let frame = match frame {
                        Some(frame) => frame,
                        None => break,
                    };
                    let text = serde_json::to_string(&frame).unwrap();
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = keepalive.tick() => {
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Rebroadcast inbound frames to every other peer
    let registry_recv = registry.clone();
    let tag_recv = tag.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(frame) => {
                        registry_recv
                            .broadcast_except(conn_id, frame.kind, frame.body)
                            .await;
                    }
                    Err(e) => {
                        warn!(
                            "peer {} sent a bad frame: {} -- raw: {}",
                            tag_recv,
                            e,
                            frame_excerpt(&text)
                        );
                    }
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Whichever side ends first tears the connection down
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    registry.remove(conn_id).await;
    info!("peer {} disconnected from relay", tag);
}

/// First 200 bytes of a frame for logging. The cut point is walked back to a
/// char boundary; frame bodies are arbitrary client input and may put a
/// multi-byte character across the limit.
fn frame_excerpt(text: &str) -> &str {
    const MAX: usize = 200;
    if text.len() <= MAX {
        return text;
    }
    let mut end = MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_cuts_multibyte_frames_on_a_char_boundary() {
        // 100 three-byte chars: 300 bytes, byte 200 lands mid-character
        let text = "€".repeat(100);
        let excerpt = frame_excerpt(&text);
        assert!(excerpt.len() <= 200);
        assert_eq!(excerpt.chars().count(), 66);
        assert!(text.is_char_boundary(excerpt.len()));
    }

    #[test]
    fn short_frames_pass_through_whole() {
        assert_eq!(frame_excerpt("hi"), "hi");
        let exact = "x".repeat(200);
        assert_eq!(frame_excerpt(&exact), exact);
    }
}
