use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::StreamExt;
use protocol::{HostCommand, Request};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wire::{CodecError, Message, MessageCodec, MessageReader, MessageWriter, Reply, Transport};

use crate::{
    backend::Backend,
    busy::{BusyIndicator, BusyWatch},
    error::BridgeError,
    handler::HostHandler,
    pending::PendingRequests,
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// How long a request may take, from writing it to receiving its reply.
    /// `None` waits forever.
    pub request_timeout: Option<Duration>,
    /// Largest envelope accepted from the backend, in bytes.
    pub max_message_size: usize,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            max_message_size: wire::DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

struct Shared<W> {
    writer: Mutex<MessageWriter<W>>,
    pending: PendingRequests,
    busy: BusyIndicator,
    next_id: AtomicU64,
}

impl<W> Shared<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn write(&self, message: Message) -> Result<(), CodecError> {
        let mut writer = self.writer.lock().await;
        writer.send(message).await
    }

    fn route_reply(&self, reply: Reply) {
        let id = reply.id;
        if let Err(reply) = self.pending.complete(reply) {
            tracing::warn!(id, name = %reply.name, "dropping reply nobody is waiting for");
        }
    }

    async fn answer_host(
        &self,
        handler: &impl HostHandler,
        request: wire::Request,
    ) -> Result<(), CodecError> {
        let reply = match HostCommand::parse(&request.name, request.payload) {
            Ok(Some(command)) => {
                tracing::debug!(?command, "host command");
                Reply {
                    id: request.id,
                    payload: handler.handle(command),
                    name: request.name,
                }
            }
            Ok(None) => {
                tracing::debug!(name = %request.name, "ignoring unknown host command");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(error = %e, "malformed host command");
                Reply::error(request.id, e.to_string())
            }
        };
        self.write(Message::Reply(reply)).await
    }
}

/// The controller's end of the message bridge.
///
/// A reader task routes replies to their callers and answers host commands;
/// requests are written from whichever task calls [`Backend::send`].
pub struct Bridge<W> {
    shared: Arc<Shared<W>>,
    options: BridgeOptions,
    cancel_token: CancellationToken,
    reader_handle: Option<JoinHandle<()>>,
}

impl<W> Bridge<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Split `transport` and start the bridge on it.
    pub fn over<T>(transport: T, handler: impl HostHandler, options: BridgeOptions) -> Self
    where
        T: Transport<Write = W>,
    {
        let codec = MessageCodec::with_max_size(options.max_message_size);
        let (reader, writer) = wire::split(transport, codec);
        Self::spawn(reader, writer, handler, options)
    }

    // must be called from within a tokio runtime
    fn spawn<R>(
        reader: MessageReader<R>,
        writer: MessageWriter<W>,
        handler: impl HostHandler,
        options: BridgeOptions,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let shared = Arc::new(Shared {
            writer: Mutex::new(writer),
            pending: PendingRequests::new(),
            busy: BusyIndicator::new(),
            next_id: AtomicU64::new(1),
        });
        let cancel_token = CancellationToken::new();
        let reader_handle =
            Self::spawn_reader_task(reader, shared.clone(), handler, cancel_token.clone());

        Self {
            shared,
            options,
            cancel_token,
            reader_handle: Some(reader_handle),
        }
    }

    fn spawn_reader_task<R>(
        mut reader: MessageReader<R>,
        shared: Arc<Shared<W>>,
        handler: impl HostHandler,
        cancel: CancellationToken,
    ) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("reader task cancelled");
                        break;
                    }
                    msg = reader.next() => {
                        match msg {
                            Some(Ok(Message::Reply(reply))) => shared.route_reply(reply),
                            Some(Ok(Message::Request(request))) => {
                                if let Err(e) = shared.answer_host(&handler, request).await {
                                    tracing::error!(error = %e, "answering host command");
                                    break;
                                }
                            }
                            Some(Err(e)) => {
                                tracing::error!(error = %e, "transport error");
                                break;
                            }
                            None => {
                                tracing::debug!("transport closed");
                                break;
                            }
                        }
                    }
                }
            }
            shared.pending.close();
        })
    }

    /// Observe the loader indicator.
    pub fn busy(&self) -> BusyWatch {
        self.shared.busy.watch()
    }

    /// Number of requests still waiting for a reply.
    pub fn pending_requests(&self) -> usize {
        self.shared.pending.len()
    }

    /// Send `request` and wait for its reply, giving up when `cancel` fires.
    ///
    /// A reply that arrives after the caller gave up is discarded.
    #[tracing::instrument(skip_all, fields(verb = %request.verb()))]
    pub async fn send_cancellable(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Reply, BridgeError> {
        let verb = request.verb();
        let payload = request.payload()?;

        let _busy = self.shared.busy.begin();
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        let (reply_tx, reply_rx) = oneshot::channel();
        let _pending = self.shared.pending.register(id, reply_tx)?;

        let exchange = async {
            tracing::debug!(id, "sending request");
            let request = Message::Request(wire::Request {
                id,
                name: verb.as_str().to_string(),
                payload,
            });
            if let Err(e) = self.shared.write(request).await {
                return Err(BridgeError::from(e));
            }
            reply_rx.await.map_err(|_| BridgeError::Closed)
        };
        let bounded = async {
            match self.options.request_timeout {
                Some(after) => tokio::time::timeout(after, exchange)
                    .await
                    .unwrap_or_else(|_| Err(BridgeError::Timeout { verb, after })),
                None => exchange.await,
            }
        };

        // a stalled write holds the writer lock, so cancellation covers it too
        let reply = tokio::select! {
            _ = cancel.cancelled() => Err(BridgeError::Cancelled),
            reply = bounded => reply,
        }?;

        tracing::debug!(id, name = %reply.name, "reply received");
        Ok(reply)
    }

    /// Stop the reader task. Callers still waiting get [`BridgeError::Closed`].
    pub async fn shutdown(mut self) {
        self.cancel_token.cancel();
        if let Some(handle) = self.reader_handle.take() {
            let _ = handle.await;
        }
    }
}

impl<W> Backend for Bridge<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&self, request: Request) -> Result<Reply, BridgeError> {
        self.send_cancellable(request, &CancellationToken::new())
            .await
    }
}

impl<W> Drop for Bridge<W> {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
