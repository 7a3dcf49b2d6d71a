//! Event socket connection management

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::constants::{CONNECT_TIMEOUT_MS, MAX_EVENT_QUEUE_SIZE, RECONNECT_DELAY_MS};
use crate::error::{ClientError, ClientResult};
use crate::event::{RawMessage, SocketEvent};
use crate::protocol::{classify, Classification, FrameAssembler, Step};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Connection status of the event socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConnectionStatus {
    /// No connection, and none being attempted.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The event stream is live.
    Connected,
    /// The previous connection was lost; a retry is pending.
    Reconnecting,
    /// The last connection attempt failed.
    Failed,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Reconnecting => write!(f, "reconnecting"),
            ConnectionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Options fixed at socket construction time.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Capacity of the channel delivering [`SocketEvent`]s. Default: 1000.
    pub event_queue_size: usize,
    /// Pause between reconnect attempts. Default: 5 seconds.
    pub reconnect_delay: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            event_queue_size: MAX_EVENT_QUEUE_SIZE,
            reconnect_delay: Duration::from_millis(RECONNECT_DELAY_MS),
        }
    }
}

/// Shared state between socket handles and the driver loop.
struct Inner {
    settings: Settings,
    options: ConnectOptions,
    /// Write half of the live connection. Serializes concurrent sends.
    writer: Mutex<Option<WsSink>>,
    /// Read half, handed to the receive cycle by `run()`.
    reader: Mutex<Option<WsSource>>,
    /// Reassembly buffer. Outlives connections so sequence numbers stay
    /// monotonic.
    assembler: Mutex<FrameAssembler>,
    /// Held for the duration of a receive cycle; `disconnect()` waits on it.
    receive_gate: Mutex<()>,
    status_tx: watch::Sender<ConnectionStatus>,
    event_tx: mpsc::Sender<SocketEvent>,
    /// Cancellation source for the current `run()`. Replaced on each run.
    cancel: Mutex<CancellationToken>,
    running: AtomicBool,
    disposed: AtomicBool,
    /// Set when events have been dropped due to a full queue.
    event_overflow: AtomicBool,
    dropped_event_count: AtomicU64,
}

/// Handle to the event socket (Clone + Send).
///
/// Controls the connection lifecycle and sends messages. Events arrive on
/// the paired [`EventStream`].
#[derive(Clone)]
pub struct EventSocket {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for EventSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSocket")
            .field("status", &self.status())
            .finish()
    }
}

/// Event receiver (!Clone)
///
/// Receives [`SocketEvent`]s from the socket via a bounded channel. A
/// `SocketEvent::Error(ClientError::QueueFull)` indicates that one or more
/// events were dropped because the application fell behind. Use
/// [`EventSocket::dropped_event_count`] for the exact count.
pub struct EventStream {
    rx: mpsc::Receiver<SocketEvent>,
    status_rx: watch::Receiver<ConnectionStatus>,
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("status", &self.status())
            .finish()
    }
}

impl EventSocket {
    /// Create a socket for the given server. Nothing connects until
    /// [`connect()`](Self::connect) or [`run()`](Self::run) is called.
    pub fn new(settings: Settings) -> (Self, EventStream) {
        Self::with_options(settings, ConnectOptions::default())
    }

    /// Create a socket with custom options.
    pub fn with_options(settings: Settings, options: ConnectOptions) -> (Self, EventStream) {
        let queue_size = options
            .event_queue_size
            .max(1);

        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        let (event_tx, event_rx) = mpsc::channel(queue_size);

        let inner = Arc::new(Inner {
            settings,
            options,
            writer: Mutex::new(None),
            reader: Mutex::new(None),
            assembler: Mutex::new(FrameAssembler::new()),
            receive_gate: Mutex::new(()),
            status_tx,
            event_tx,
            cancel: Mutex::new(CancellationToken::new()),
            running: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            event_overflow: AtomicBool::new(false),
            dropped_event_count: AtomicU64::new(0),
        });

        let socket = EventSocket { inner };
        let stream = EventStream {
            rx: event_rx,
            status_rx,
        };
        (socket, stream)
    }

    /// Current connection status snapshot.
    pub fn status(&self) -> ConnectionStatus {
        *self
            .inner
            .status_tx
            .borrow()
    }

    /// Whether the event stream is live.
    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Number of events dropped due to a full event queue.
    pub fn dropped_event_count(&self) -> u64 {
        self.inner
            .dropped_event_count
            .load(Ordering::Relaxed)
    }

    /// Establish the WebSocket connection.
    ///
    /// No-op if already connected or connecting. On failure the status
    /// becomes [`Failed`](ConnectionStatus::Failed), the error is also
    /// delivered on the event channel, and the caller gets it back.
    pub async fn connect(&self) -> ClientResult<()> {
        if self
            .inner
            .disposed
            .load(Ordering::SeqCst)
        {
            return Err(ClientError::Disposed);
        }
        match self.status() {
            ConnectionStatus::Connected | ConnectionStatus::Connecting => return Ok(()),
            _ => {}
        }

        self.set_status(ConnectionStatus::Connecting);

        let url = match self
            .inner
            .settings
            .events_url()
        {
            Ok(url) => url,
            Err(e) => return Err(self.fail_connect(e.to_string())),
        };

        info!("connecting to event socket at {}", url);
        let handshake = timeout(
            Duration::from_millis(CONNECT_TIMEOUT_MS),
            connect_async(url.as_str()),
        )
        .await;

        let ws = match handshake {
            Ok(Ok((ws, _response))) => ws,
            Ok(Err(e)) => {
                warn!("WebSocket connect failed: {}", e);
                return Err(self.fail_connect(e.to_string()));
            }
            Err(_) => {
                warn!("WebSocket connect timed out after {}ms", CONNECT_TIMEOUT_MS);
                self.set_status(ConnectionStatus::Failed);
                self.emit(SocketEvent::Error(ClientError::Timeout {
                    timeout_ms: CONNECT_TIMEOUT_MS,
                }));
                return Err(ClientError::Timeout {
                    timeout_ms: CONNECT_TIMEOUT_MS,
                });
            }
        };

        let (sink, source) = ws.split();
        *self
            .inner
            .writer
            .lock()
            .await = Some(sink);
        *self
            .inner
            .reader
            .lock()
            .await = Some(source);

        self.set_status(ConnectionStatus::Connected);
        info!("event socket connected");
        Ok(())
    }

    /// Close the connection and stop the driver loop.
    ///
    /// The close handshake is best effort; failures are logged, never
    /// propagated. Waits for any in-flight receive cycle, then lands on
    /// [`Disconnected`](ConnectionStatus::Disconnected). Idempotent; a new
    /// [`run()`](Self::run) may follow.
    pub async fn disconnect(&self) {
        info!("client requested disconnect");
        {
            let mut writer = self
                .inner
                .writer
                .lock()
                .await;
            if let Some(sink) = writer.as_mut() {
                let frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: "client disconnect".into(),
                };
                if let Err(e) = sink
                    .send(Message::Close(Some(frame)))
                    .await
                {
                    warn!("error during WebSocket close: {}", e);
                }
            }
            *writer = None;
        }

        self.inner
            .cancel
            .lock()
            .await
            .cancel();

        // Wait out the in-flight receive cycle, if any.
        drop(
            self.inner
                .receive_gate
                .lock()
                .await,
        );
        *self
            .inner
            .reader
            .lock()
            .await = None;

        self.set_status(ConnectionStatus::Disconnected);
        info!("event socket disconnected");
    }

    /// Tear the socket down permanently.
    ///
    /// After this, every operation fails with
    /// [`Disposed`](ClientError::Disposed).
    pub async fn shutdown(&self) {
        if self
            .inner
            .disposed
            .swap(true, Ordering::SeqCst)
        {
            return;
        }
        debug!("shutting down event socket");
        self.disconnect()
            .await;
    }

    /// Send a text message to the server as a single frame.
    ///
    /// Sends from concurrent tasks are serialized through the writer lock.
    pub async fn send(&self, message: &str) -> ClientResult<()> {
        if self
            .inner
            .disposed
            .load(Ordering::SeqCst)
        {
            return Err(ClientError::Disposed);
        }

        let mut writer = self
            .inner
            .writer
            .lock()
            .await;
        let sink = writer
            .as_mut()
            .ok_or(ClientError::NotConnected)?;
        sink.send(Message::text(message))
            .await?;
        debug!("sent message: {}", message);
        Ok(())
    }

    /// Drive the connection until cancelled.
    ///
    /// Connects if needed, runs the receive cycle, and on any exit (clean
    /// close, receive failure, or connect failure) waits the fixed
    /// reconnect delay and tries again, indefinitely. Only
    /// [`disconnect()`](Self::disconnect) or
    /// [`shutdown()`](Self::shutdown) make it return; transport errors are
    /// reported on the event channel instead. Final status is always
    /// [`Disconnected`](ConnectionStatus::Disconnected).
    pub async fn run(&self) -> ClientResult<()> {
        if self
            .inner
            .disposed
            .load(Ordering::SeqCst)
        {
            return Err(ClientError::Disposed);
        }
        if self
            .inner
            .running
            .swap(true, Ordering::SeqCst)
        {
            warn!("run() called while the event loop is already active");
            return Ok(());
        }

        let cancel = {
            let mut guard = self
                .inner
                .cancel
                .lock()
                .await;
            *guard = CancellationToken::new();
            guard.clone()
        };

        info!("event loop started");
        loop {
            if cancel.is_cancelled() {
                break;
            }

            if self.status() != ConnectionStatus::Connected {
                if self
                    .connect()
                    .await
                    .is_err()
                {
                    // connect() already reported the failure.
                    if self
                        .reconnect_pause(&cancel)
                        .await
                    {
                        continue;
                    }
                    break;
                }
            }

            let source = self
                .inner
                .reader
                .lock()
                .await
                .take();
            let outcome = match source {
                Some(source) => {
                    self.receive_cycle(source, &cancel)
                        .await
                }
                None => Ok(()),
            };

            // Epoch over; the old transport handle is never reused.
            self.inner
                .writer
                .lock()
                .await
                .take();

            if let Err(e) = outcome {
                warn!("receive cycle failed: {}", e);
                self.emit(SocketEvent::Error(e));
            }

            if !self
                .reconnect_pause(&cancel)
                .await
            {
                break;
            }
        }

        self.inner
            .writer
            .lock()
            .await
            .take();
        self.inner
            .reader
            .lock()
            .await
            .take();
        self.set_status(ConnectionStatus::Disconnected);
        self.inner
            .running
            .store(false, Ordering::SeqCst);
        info!("event loop stopped");
        Ok(())
    }

    /// Pull frames until the connection ends or cancellation is requested.
    ///
    /// Cancellation is a normal exit. A transport error propagates so the
    /// driver loop can schedule the reconnect.
    async fn receive_cycle(
        &self,
        mut source: WsSource,
        cancel: &CancellationToken,
    ) -> ClientResult<()> {
        let _gate = self
            .inner
            .receive_gate
            .lock()
            .await;
        let mut assembler = self
            .inner
            .assembler
            .lock()
            .await;
        assembler.reset();

        debug!("receive cycle started");
        loop {
            let item = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("receive cycle cancelled");
                    return Ok(());
                }
                item = source.next() => item,
            };

            match item {
                None => {
                    info!("event stream closed by server");
                    return Ok(());
                }
                Some(Err(e)) => return Err(ClientError::WebSocket(e)),
                Some(Ok(frame)) => match assembler.push(frame)? {
                    Step::Complete(raw) => self.dispatch(raw),
                    Step::Pending => {}
                    Step::Closed => {
                        info!("close frame received, ending receive cycle");
                        return Ok(());
                    }
                },
            }
        }
    }

    /// Classify one message and fan it out. The raw text always goes out;
    /// at most one typed event follows it.
    fn dispatch(&self, raw: RawMessage) {
        debug!("received message #{}: {}", raw.sequence, raw.text);
        let classification = classify(&raw.text);
        self.emit(SocketEvent::Raw(raw));

        match classification {
            Classification::Welcome(notice) => {
                info!("welcome received: {}", notice.message);
                self.emit(SocketEvent::Welcome(notice));
            }
            Classification::Account(event) => {
                info!("account event: {} -> {}", event.account, event.status);
                self.emit(SocketEvent::Account(event));
            }
            Classification::Call(event) => {
                info!("call event: call {} -> {}", event.id, event.state);
                self.emit(SocketEvent::Call(event));
            }
            Classification::Unclassified => {}
        }
    }

    /// Wait the reconnect delay. Returns `false` if cancellation arrived
    /// before or during the wait.
    async fn reconnect_pause(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        self.set_status(ConnectionStatus::Reconnecting);
        debug!(
            "waiting {:?} before reconnecting",
            self.inner
                .options
                .reconnect_delay
        );
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.inner.options.reconnect_delay) => true,
        }
    }

    /// Record a connect failure: status, error channel, and the returned
    /// error (the channel gets its own copy since the cause is not Clone).
    fn fail_connect(&self, message: String) -> ClientError {
        self.set_status(ConnectionStatus::Failed);
        self.emit(SocketEvent::Error(ClientError::connect_failed(
            message.clone(),
        )));
        ClientError::connect_failed(message)
    }

    /// Transition the status cell. No-op (and no notification) if the new
    /// status equals the current one. Only socket methods call this, so the
    /// cell has a single logical writer.
    fn set_status(&self, new: ConnectionStatus) {
        let mut previous = None;
        self.inner
            .status_tx
            .send_if_modified(|current| {
                if *current == new {
                    false
                } else {
                    previous = Some(*current);
                    *current = new;
                    true
                }
            });
        if let Some(previous) = previous {
            debug!("status changed: {} -> {}", previous, new);
            self.emit(SocketEvent::StatusChanged {
                previous,
                current: new,
            });
        }
    }

    /// Try to deliver an event without blocking the receive path.
    ///
    /// A full queue drops the event, counts it, and flags the overflow so
    /// the next delivery attempt leads with a `QueueFull` notification.
    fn emit(&self, event: SocketEvent) -> bool {
        let inner = &self.inner;
        if inner
            .event_overflow
            .load(Ordering::Relaxed)
        {
            match inner
                .event_tx
                .try_send(SocketEvent::Error(ClientError::QueueFull))
            {
                Ok(()) => {
                    inner
                        .event_overflow
                        .store(false, Ordering::Relaxed);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => return false,
                Err(mpsc::error::TrySendError::Full(_)) => {}
            }
        }

        match inner
            .event_tx
            .try_send(event)
        {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => false,
            Err(mpsc::error::TrySendError::Full(_)) => {
                inner
                    .event_overflow
                    .store(true, Ordering::Relaxed);
                inner
                    .dropped_event_count
                    .fetch_add(1, Ordering::Relaxed);
                warn!("event queue full, dropping event");
                true
            }
        }
    }
}

impl EventStream {
    /// Receive the next event, or `None` if the socket is gone.
    pub async fn recv(&mut self) -> Option<SocketEvent> {
        self.rx
            .recv()
            .await
    }

    /// Current connection status snapshot.
    pub fn status(&self) -> ConnectionStatus {
        *self
            .status_rx
            .borrow()
    }

    /// Whether the event stream is live.
    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }
}

impl futures_util::Stream for EventStream {
    type Item = SocketEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx
            .poll_recv(cx)
    }
}
