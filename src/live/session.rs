//! WebSocket client for the live transcription session.
//!
//! One `LiveSession` is one connection. The socket splits into a send half
//! (audio uplink) and a receive half (transcription events) so the two can
//! live on different tasks.

use crate::error::{ParleyError, Result};
use crate::live::event::{self, LiveEvent};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

const LIVE_ENDPOINT: &str = "wss://generativelanguage.googleapis.com/ws/\
                             google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// How long to wait for the server's setup acknowledgment.
const SETUP_TIMEOUT: Duration = Duration::from_secs(30);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Send half of a live session: forwards PCM audio frames.
pub struct LiveSender {
    ws_tx: SplitSink<WsStream, Message>,
}

/// Receive half of a live session: yields parsed server events.
pub struct LiveReceiver {
    ws_rx: SplitStream<WsStream>,
}

/// Open a live session: connect, send setup, wait for the acknowledgment.
///
/// `resume_handle` restores the prior connection's server-side context when
/// present.
pub async fn connect(
    api_key: &str,
    model: &str,
    instruction: Option<&str>,
    resume_handle: Option<&str>,
) -> Result<(LiveSender, LiveReceiver)> {
    let url = format!("{}?key={}", LIVE_ENDPOINT, api_key);

    let (ws_stream, _response) =
        connect_async(url.as_str())
            .await
            .map_err(|e| ParleyError::LiveConnect {
                message: format!("websocket handshake failed: {}", e),
            })?;
    debug!("live session websocket connected");

    let (mut ws_tx, ws_rx) = ws_stream.split();

    let setup = event::setup_message(model, instruction, resume_handle);
    ws_tx
        .send(Message::Text(setup.into()))
        .await
        .map_err(|e| ParleyError::LiveConnect {
            message: format!("failed to send setup: {}", e),
        })?;

    let mut receiver = LiveReceiver { ws_rx };
    receiver.await_setup().await?;
    debug!("live session setup acknowledged");

    Ok((LiveSender { ws_tx }, receiver))
}

impl LiveSender {
    /// Forward one frame of PCM samples with its sample-rate metadata.
    pub async fn send_audio(&mut self, samples: &[i16], sample_rate: u32) -> Result<()> {
        let msg = event::audio_message(samples, sample_rate);
        self.ws_tx
            .send(Message::Text(msg.into()))
            .await
            .map_err(|e| ParleyError::LiveStream {
                message: format!("audio send failed: {}", e),
            })
    }

    /// Close the uplink cleanly.
    pub async fn close(mut self) {
        let _ = self.ws_tx.close().await;
    }
}

impl LiveReceiver {
    /// Block until the server acknowledges setup.
    async fn await_setup(&mut self) -> Result<()> {
        let deadline = tokio::time::timeout(SETUP_TIMEOUT, async {
            loop {
                match self.next_events().await? {
                    Some(events) => {
                        if events.contains(&LiveEvent::SetupComplete) {
                            return Ok(());
                        }
                    }
                    None => {
                        return Err(ParleyError::LiveConnect {
                            message: "connection closed before setup completed".to_string(),
                        });
                    }
                }
            }
        });
        deadline.await.map_err(|_| ParleyError::LiveConnect {
            message: "timed out waiting for setup acknowledgment".to_string(),
        })?
    }

    /// Receive the next batch of events.
    ///
    /// Returns `Ok(None)` on clean connection close. Control frames yield
    /// an empty batch. The batch can carry several events when the server
    /// packs them into one frame.
    pub async fn next_events(&mut self) -> Result<Option<Vec<LiveEvent>>> {
        match self.ws_rx.next().await {
            Some(Ok(Message::Text(text))) => event::parse_server_message(&text).map(Some),
            Some(Ok(Message::Binary(bytes))) => {
                // The native audio endpoint sometimes delivers JSON as
                // binary frames.
                let text = String::from_utf8_lossy(&bytes);
                event::parse_server_message(&text).map(Some)
            }
            Some(Ok(Message::Close(frame))) => {
                debug!(?frame, "live session closed by server");
                Ok(None)
            }
            Some(Ok(_)) => Ok(Some(Vec::new())),
            Some(Err(e)) => Err(ParleyError::LiveStream {
                message: format!("websocket receive failed: {}", e),
            }),
            None => Ok(None),
        }
    }
}
