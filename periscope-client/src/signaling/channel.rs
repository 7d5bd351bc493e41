use crate::config::DEFAULT_CLOSE_GRACE;
use crate::error::{CloseError, ConnectError, SendError, TransportError};
use crate::signaling::ChannelClosed;
use crate::signaling::handlers::ChannelHandlers;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use periscope_core::SignalingMessage;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Outbound {
    Frame(String, oneshot::Sender<Result<(), SendError>>),
    Close(oneshot::Sender<Result<(), CloseError>>),
}

/// A single WebSocket connection to a signaling endpoint.
///
/// Created already open. Inbound frames are decoded on a reader task and
/// pushed to the registered handlers; outbound frames go through a writer
/// task so `send` can be called from anywhere while frames are being
/// received. Once closed (locally or by the peer) the channel is spent.
pub struct SignalingChannel {
    endpoint: String,
    outbound: mpsc::UnboundedSender<Outbound>,
    handlers: Arc<ChannelHandlers>,
    closed: Arc<AtomicBool>,
    close_grace: Duration,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl SignalingChannel {
    /// Connect to `endpoint` and start listening for frames.
    pub async fn open(endpoint: &str, timeout: Duration) -> Result<Self, ConnectError> {
        let url = parse_endpoint(endpoint)?;
        info!("Opening signaling channel: {}", url);

        let (ws, _response) = match tokio::time::timeout(timeout, connect_async(url.as_str())).await
        {
            Ok(Ok(connected)) => connected,
            Ok(Err(e)) => return Err(ConnectError::Refused(e.to_string())),
            Err(_) => return Err(ConnectError::Timeout(timeout)),
        };

        let (sink, stream) = ws.split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let handlers = Arc::new(ChannelHandlers::default());
        let closed = Arc::new(AtomicBool::new(false));

        let writer = tokio::spawn(write_loop(sink, outbound_rx));
        let reader = tokio::spawn(read_loop(stream, handlers.clone(), closed.clone()));

        debug!("Signaling channel open: {}", url);
        Ok(Self {
            endpoint: url.to_string(),
            outbound,
            handlers,
            closed,
            close_grace: DEFAULT_CLOSE_GRACE,
            reader,
            writer,
        })
    }

    /// How long a local close waits for the peer to finish the close handshake.
    pub fn with_close_grace(mut self, grace: Duration) -> Self {
        self.close_grace = grace;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Serialize and transmit one frame, resolving once the transport took it.
    pub async fn send(&self, message: &SignalingMessage) -> Result<(), SendError> {
        if self.is_closed() {
            return Err(SendError::Closed);
        }
        let text = message
            .to_json()
            .map_err(|e| SendError::Encode(e.to_string()))?;

        let (ack, done) = oneshot::channel();
        self.outbound
            .send(Outbound::Frame(text, ack))
            .map_err(|_| SendError::Closed)?;
        done.await.map_err(|_| SendError::Closed)?
    }

    /// Start the close handshake. Closing twice is a no-op.
    ///
    /// The close notification follows once the peer answers, or after the
    /// close grace period if it never does.
    pub async fn close(&self) -> Result<(), CloseError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!("Closing signaling channel: {}", self.endpoint);
        self.arm_close_watchdog();

        let (ack, done) = oneshot::channel();
        if self.outbound.send(Outbound::Close(ack)).is_err() {
            return Ok(());
        }
        done.await.unwrap_or(Ok(()))
    }

    pub fn on_message<F>(&self, handler: F)
    where
        F: Fn(SignalingMessage) + Send + Sync + 'static,
    {
        self.handlers.set_message(Box::new(handler));
    }

    pub fn on_close<F>(&self, handler: F)
    where
        F: Fn(ChannelClosed) + Send + Sync + 'static,
    {
        self.handlers.set_close(Box::new(handler));
    }

    pub fn on_error<F>(&self, handler: F)
    where
        F: Fn(TransportError) + Send + Sync + 'static,
    {
        self.handlers.set_error(Box::new(handler));
    }

    fn arm_close_watchdog(&self) {
        let handlers = self.handlers.clone();
        let reader = self.reader.abort_handle();
        let grace = self.close_grace;
        let endpoint = self.endpoint.clone();

        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if handlers.close_fired() {
                return;
            }
            warn!("Peer did not finish close handshake on {} within {:?}", endpoint, grace);
            reader.abort();
            handlers.close(ChannelClosed {
                code: None,
                reason: "close handshake timed out".to_owned(),
            });
        });
    }
}

impl Drop for SignalingChannel {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, ConnectError> {
    let url = Url::parse(endpoint).map_err(|e| ConnectError::InvalidEndpoint {
        endpoint: endpoint.to_owned(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(ConnectError::UnsupportedScheme(other.to_owned())),
    }
}

async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    while let Some(cmd) = outbound.recv().await {
        match cmd {
            Outbound::Frame(text, ack) => {
                let result = match sink.send(Message::Text(text.into())).await {
                    Ok(()) => Ok(()),
                    Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => {
                        Err(SendError::Closed)
                    }
                    Err(e) => Err(SendError::Rejected(e.to_string())),
                };
                let _ = ack.send(result);
            }
            Outbound::Close(ack) => {
                let result = match sink.close().await {
                    Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
                    Err(e) => Err(CloseError::Transport(e.to_string())),
                };
                let _ = ack.send(result);
                break;
            }
        }
    }
}

async fn read_loop(
    mut stream: SplitStream<WsStream>,
    handlers: Arc<ChannelHandlers>,
    closed: Arc<AtomicBool>,
) {
    let mut close_frame = ChannelClosed::default();

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match SignalingMessage::from_json(text.as_str()) {
                Ok(msg) => {
                    debug!("Signaling IN: {}", msg.what);
                    handlers.message(msg);
                }
                Err(e) => warn!("Invalid signaling frame: {}. Text: {}", e, text.as_str()),
            },
            Ok(Message::Close(frame)) => {
                if let Some(frame) = frame {
                    close_frame = ChannelClosed {
                        code: Some(u16::from(frame.code)),
                        reason: frame.reason.as_str().to_owned(),
                    };
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Signaling receive failed: {}", e);
                handlers.error(TransportError::Receive(e.to_string()));
                break;
            }
        }
    }

    closed.store(true, Ordering::SeqCst);
    info!("Signaling channel closed: {:?}", close_frame);
    handlers.close(close_frame);
}
