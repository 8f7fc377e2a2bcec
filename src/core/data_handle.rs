use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::format::DerivedSeries;

#[derive(Serialize)]
struct PointPayload {
    x: f64,
    y: f64,
    seq: u64,
    end_flag: bool,
}

/// Streams one point per message, then an end flag.
pub async fn handle_ws_fetch(mut socket: WebSocket, series: Arc<DerivedSeries>, label: String) {
    info!("ws_fetch streaming started: {} ({} points)", label, series.len());

    let mut seq: u64 = 0;

    for (x, y) in series.x.iter().zip(&series.y) {
        let payload = PointPayload {
            x: *x,
            y: *y,
            seq,
            end_flag: false,
        };

        let json = match serde_json::to_string(&payload) {
            Ok(j) => j,
            Err(e) => {
                error!("json serialize error: {}", e);
                return;
            }
        };

        if let Err(e) = socket.send(Message::Text(json.into())).await {
            warn!("ws send failed: {}", e);
            return;
        }

        seq += 1;
    }

    let end_payload = PointPayload {
        x: 0.0,
        y: 0.0,
        seq,
        end_flag: true,
    };

    if let Ok(json) = serde_json::to_string(&end_payload) {
        let _ = socket.send(Message::Text(json.into())).await;
    }

    info!("ws_fetch finished: {}", label);
}
