/*
[INPUT]:  WebSocket URL
[OUTPUT]: TransportLink (outbound text sink + inbound event stream)
[POS]:    WebSocket layer - socket seam between the manager and tokio-tungstenite
[UPDATE]: When changing socket options or frame handling
*/

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::debug;
use url::Url;

use crate::error::{Result, TradelinkError};

/// What the socket reports back to the connection manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame (binary frames are decoded as UTF-8)
    Message(String),
    /// The peer closed the socket
    Closed(Option<String>),
    /// The socket failed
    Error(String),
}

/// One open socket. Dropping `outbound` closes it.
#[derive(Debug)]
pub struct TransportLink {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Opens sockets for the connection manager
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Resolve once the socket is open
    async fn connect(&self, url: &Url) -> Result<TransportLink>;
}

/// Connector backed by `tokio_tungstenite::connect_async`
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &Url) -> Result<TransportLink> {
        let (ws_stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|err| TradelinkError::WebSocket(err.to_string()))?;
        let (mut write, mut read) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    outbound = outbound_rx.recv() => {
                        match outbound {
                            Some(text) => {
                                if let Err(err) = write.send(WsMessage::Text(text.into())).await {
                                    let _ = inbound_tx.send(TransportEvent::Error(err.to_string()));
                                    break;
                                }
                            }
                            None => {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break;
                            }
                        }
                    }
                    incoming = read.next() => {
                        match incoming {
                            Some(Ok(WsMessage::Text(text))) => {
                                if inbound_tx.send(TransportEvent::Message(text.to_string())).is_err() {
                                    break;
                                }
                            }
                            Some(Ok(WsMessage::Binary(bytes))) => {
                                match String::from_utf8(bytes.to_vec()) {
                                    Ok(text) => {
                                        if inbound_tx.send(TransportEvent::Message(text)).is_err() {
                                            break;
                                        }
                                    }
                                    Err(_) => debug!(bytes = bytes.len(), "ws binary frame is not utf-8"),
                                }
                            }
                            Some(Ok(WsMessage::Close(frame))) => {
                                let reason = frame.map(|frame| frame.reason.to_string());
                                let _ = write.send(WsMessage::Close(None)).await;
                                let _ = inbound_tx.send(TransportEvent::Closed(reason));
                                break;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(err)) => {
                                let _ = inbound_tx.send(TransportEvent::Error(err.to_string()));
                                break;
                            }
                            None => {
                                let _ = inbound_tx.send(TransportEvent::Closed(None));
                                break;
                            }
                        }
                    }
                }
            }
        });

        Ok(TransportLink {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
