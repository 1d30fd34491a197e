use crate::message::LogLine;
use futures::{
    Sink,
    SinkExt,
    StreamExt,
};
use std::{
    fmt,
    mem,
    sync::{
        atomic::{
            AtomicU64,
            Ordering,
        },
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
    },
    time::Duration,
};
use tokio::{
    net::TcpStream,
    sync::mpsc::{
        self,
        error::TrySendError,
    },
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::protocol::Message,
    MaybeTlsStream,
    WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use url::Url;

const DIAL_TIMEOUT: Duration = Duration::from_secs(10);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);
const FRAME_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone)]
pub struct LogSenderOptions {
    pub url: Url,
    pub reconnect_interval: Duration,
    pub agent_id: String,
    pub agent_name: String,
}

/// A live connection. Dropping it stops its writer and read-monitor tasks.
struct Connection {
    id: u64,
    frames: mpsc::Sender<Message>,
    token: CancellationToken,
    writer: Option<JoinHandle<()>>,
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

enum Handle {
    Disconnected,
    Connecting,
    Connected(Connection),
}

impl Handle {
    fn state(&self) -> ConnectionState {
        match self {
            Handle::Disconnected => ConnectionState::Disconnected,
            Handle::Connecting => ConnectionState::Connecting,
            Handle::Connected(_) => ConnectionState::Connected,
        }
    }
}

struct Inner {
    options: LogSenderOptions,
    handle: Mutex<Handle>,
    token: CancellationToken,
    next_id: AtomicU64,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Auto-reconnecting WebSocket log sender.
///
/// Cloning is cheap, every clone drives the same connection.
#[derive(Clone)]
pub struct LogSender {
    inner: Arc<Inner>,
}

impl LogSender {
    /// Starts the reconnect loop. The first dial happens right away.
    pub fn spawn(options: LogSenderOptions, parent: &CancellationToken) -> Self {
        let sender = Self::new(options, parent.child_token());
        let task = tokio::spawn(reconnect_loop(sender.inner.clone()));
        *sender.inner.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        sender
    }

    fn new(options: LogSenderOptions, token: CancellationToken) -> Self {
        Self {
            inner: Arc::new(Inner {
                options,
                handle: Mutex::new(Handle::Disconnected),
                token,
                next_id: AtomicU64::new(1),
                task: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.handle().state()
    }

    /// Queues one line for the live connection. Never blocks: without a
    /// connection, or with a full buffer, the line is dropped.
    pub fn emit(&self, service: &str, message: &str, level: &str) {
        if self.inner.token.is_cancelled() {
            return;
        }
        let (id, frames) = match &*self.inner.handle() {
            Handle::Connected(connection) => (connection.id, connection.frames.clone()),
            _ => return,
        };

        let line = LogLine {
            agent_id: self.inner.options.agent_id.clone(),
            agent_name: self.inner.options.agent_name.clone(),
            timestamp: chrono::Utc::now().timestamp(),
            service: service.to_string(),
            message: message.to_string(),
            level: level.to_string(),
        };
        let Ok(text) = serde_json::to_string(&line) else {
            return;
        };

        match frames.try_send(Message::Text(text.into())) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Closed(_)) => {
                self.inner.disconnect(id);
            }
        }
    }

    /// Stops reconnecting and closes the live connection. Later `emit` calls are no-ops.
    pub fn shutdown(&self) {
        self.inner.token.cancel();
    }

    /// Returns once the reconnect loop has exited and the connection is closed.
    pub async fn wait(&self) {
        let task = self.inner.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(error = %e, "Log stream task ended abnormally");
            }
        }
    }
}

#[cfg(test)]
impl LogSender {
    /// A sender whose live connection writes into `frames`.
    pub(crate) fn with_test_connection(frames: mpsc::Sender<Message>) -> Self {
        let url = Url::parse("ws://127.0.0.1:9/ws/logs").unwrap();
        let sender = Self::new(
            LogSenderOptions {
                url,
                reconnect_interval: Duration::from_secs(5),
                agent_id: "id-1".to_string(),
                agent_name: "web-01".to_string(),
            },
            CancellationToken::new(),
        );
        *sender.inner.handle() = Handle::Connected(Connection {
            id: 7,
            frames,
            token: CancellationToken::new(),
            writer: None,
        });
        sender
    }
}

impl Inner {
    fn handle(&self) -> MutexGuard<'_, Handle> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves `Disconnected` to `Connecting`. Returns `false` in any other state.
    fn begin_connecting(&self) -> bool {
        let mut handle = self.handle();
        if matches!(*handle, Handle::Disconnected) {
            *handle = Handle::Connecting;
            return true;
        }
        false
    }

    fn abort_connecting(&self) {
        let mut handle = self.handle();
        if matches!(*handle, Handle::Connecting) {
            *handle = Handle::Disconnected;
        }
    }

    /// Tears down connection `id` if it is still the live one.
    fn disconnect(&self, id: u64) -> bool {
        let mut handle = self.handle();
        if !matches!(&*handle, Handle::Connected(connection) if connection.id == id) {
            return false;
        }
        let previous = mem::replace(&mut *handle, Handle::Disconnected);
        drop(handle);
        drop(previous);
        debug!(connection = id, "Log connection dropped");
        true
    }

    fn install(self: &Arc<Self>, ws: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Option<u64> {
        let mut handle = self.handle();
        if self.token.is_cancelled() {
            *handle = Handle::Disconnected;
            return None;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (outgoing, mut incoming) = ws.split();
        let (frames, receiver) = mpsc::channel::<Message>(FRAME_BUFFER);
        let token = self.token.child_token();

        // Spawned under the lock so neither task can disconnect before the
        // connection is installed.
        let writer = tokio::spawn(write_frames(self.clone(), id, outgoing, receiver, token.clone()));

        tokio::spawn({
            let inner = self.clone();
            let token = token.clone();
            async move {
                loop {
                    let next = tokio::select! {
                        biased;
                        _ = token.cancelled() => return,
                        next = incoming.next() => next,
                    };
                    match next {
                        Some(Ok(Message::Close(frame))) => {
                            debug!(connection = id, ?frame, "Log endpoint closed the connection");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            debug!(connection = id, error = %e, "Log connection read failed");
                            break;
                        }
                        None => break,
                    }
                }
                inner.disconnect(id);
            }
        });

        let previous = mem::replace(
            &mut *handle,
            Handle::Connected(Connection {
                id,
                frames,
                token,
                writer: Some(writer),
            }),
        );
        drop(handle);
        drop(previous);
        Some(id)
    }

    async fn close(&self) {
        let previous = mem::replace(&mut *self.handle(), Handle::Disconnected);
        if let Handle::Connected(mut connection) = previous {
            let writer = connection.writer.take();
            drop(connection);
            if let Some(writer) = writer {
                let _ = tokio::time::timeout(CLOSE_TIMEOUT, writer).await;
            }
            info!("Log stream closed");
        }
    }
}

/// Drains `frames` into the socket. A failed write tears the connection down.
async fn write_frames<S>(
    inner: Arc<Inner>,
    id: u64,
    mut outgoing: S,
    mut frames: mpsc::Receiver<Message>,
    token: CancellationToken,
) where
    S: Sink<Message> + Unpin,
    S::Error: fmt::Display,
{
    loop {
        let frame = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            frame = frames.recv() => frame,
        };
        let Some(frame) = frame else {
            break;
        };
        if let Err(e) = outgoing.send(frame).await {
            debug!(connection = id, error = %e, "Failed to write log frame");
            inner.disconnect(id);
            return;
        }
    }
    let _ = outgoing.close().await;
}

async fn reconnect_loop(inner: Arc<Inner>) {
    let url = inner.options.url.clone();
    let mut ticker = tokio::time::interval(inner.options.reconnect_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = inner.token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        if !inner.begin_connecting() {
            continue;
        }

        debug!(%url, "Connecting to log endpoint");
        let dialed = tokio::select! {
            biased;
            _ = inner.token.cancelled() => break,
            dialed = tokio::time::timeout(DIAL_TIMEOUT, connect_async(url.as_str())) => dialed,
        };
        match dialed {
            Ok(Ok((ws, _response))) => {
                if let Some(id) = inner.install(ws) {
                    info!(%url, connection = id, "Connected to log endpoint");
                }
            }
            Ok(Err(e)) => {
                inner.abort_connecting();
                debug!(%url, error = %e, "Failed to connect to log endpoint");
            }
            Err(_) => {
                inner.abort_connecting();
                debug!(%url, timeout = ?DIAL_TIMEOUT, "Timed out connecting to log endpoint");
            }
        }
    }

    inner.close().await;
}
