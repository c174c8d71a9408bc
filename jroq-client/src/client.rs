//! Client codec over a broker channel
//!
//! This module provides the main `JroqClient` type: the outbound half of the
//! RPC bridge. A call is encoded as a [`CallEnvelope`], published to the
//! request queue with a correlation id and this client's private reply-to
//! queue, and the calling task suspends until the reply dispatcher resolves
//! its entry in the correlation table.
//!
//! # Lifecycle
//!
//! 1. **Connect**: declare the request queue and a private reply queue, and
//!    spawn the reply dispatcher
//! 2. **Call**: any number of tasks invoke [`JroqClient::call`] concurrently
//! 3. **Close**: stop the dispatcher and fail everything still pending
//!
//! # Cloning
//!
//! `JroqClient` is cheaply cloneable using `Arc` internally. All clones
//! share the channel, the correlation table and the admission gate, so a
//! client can be handed to many tasks without extra synchronization.
//!
//! # Ordering
//!
//! Replies arrive in whatever order the broker delivers them; correlation
//! is strictly by sequence id, never by arrival order.

use crate::correlation::CorrelationTable;
use crate::limiter::InFlightLimiter;
use crate::ClientMetrics;
use futures::StreamExt;
use jroq_core::broker::{BrokerChannel, DeliveryStream, MessageProperties};
use jroq_core::{codec, CallEnvelope, Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Client codec: synchronous calls over an asynchronous broker.
#[derive(Clone)]
pub struct JroqClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    channel: Arc<dyn BrokerChannel>,
    request_queue: String,
    reply_queue: String,
    calls: CorrelationTable,
    limiter: InFlightLimiter,
    call_timeout: Option<Duration>,
    closed: AtomicBool,
    dispatcher: JoinHandle<()>,
    metrics: Option<Arc<ClientMetrics>>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        // Backstop for clients dropped without close(): the dispatcher task
        // must not outlive the codec, and dropping the table wakes any
        // receiver still registered.
        self.dispatcher.abort();
    }
}

impl JroqClient {
    /// Create a client builder.
    pub fn builder(
        url: impl Into<String>,
        request_queue: impl Into<String>,
    ) -> crate::ClientBuilder {
        crate::ClientBuilder::new(url, request_queue)
    }

    /// Connect with defaults: AMQP broker at `url`, in-flight bound of
    /// [`crate::DEFAULT_IN_FLIGHT_BOUND`], 60 second call timeout.
    pub async fn connect(url: &str, request_queue: &str) -> Result<Self> {
        crate::ClientBuilder::new(url, request_queue).connect().await
    }

    pub(crate) async fn start(
        channel: Arc<dyn BrokerChannel>,
        request_queue: String,
        in_flight_bound: usize,
        call_timeout: Option<Duration>,
        metrics: Option<Arc<ClientMetrics>>,
    ) -> Result<Self> {
        // Declaring the request queue here too means either side may start
        // first; declares are idempotent.
        channel.declare_queue(&request_queue).await?;
        let reply_queue = channel.declare_queue("").await?;
        let deliveries = channel.consume(&reply_queue).await?;

        let calls = CorrelationTable::new();
        let dispatcher = tokio::spawn(Self::dispatch_replies(
            deliveries,
            calls.clone(),
            metrics.clone(),
        ));

        tracing::info!(
            request_queue = %request_queue,
            reply_queue = %reply_queue,
            "client codec ready"
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                channel,
                request_queue,
                reply_queue,
                calls,
                limiter: InFlightLimiter::new(in_flight_bound),
                call_timeout,
                closed: AtomicBool::new(false),
                dispatcher,
                metrics,
            }),
        })
    }

    /// Invoke a remote method and wait for its reply.
    ///
    /// Synchronous from the caller's point of view: the future resolves when
    /// this call's reply arrives, the call times out, or the codec is
    /// closed. Admission is gated by the in-flight limiter, so the
    /// (K+1)-th concurrent call waits for a slot before anything is
    /// published.
    ///
    /// # Errors
    ///
    /// - [`Error::Application`] / [`Error::MethodNotFound`] when the remote
    ///   handler failed or the method is not registered
    /// - [`Error::Broker`] when the publish failed (not retried here)
    /// - [`Error::Timeout`] when the configured per-call deadline elapsed
    /// - [`Error::TransportClosed`] when the codec was closed while waiting
    #[tracing::instrument(skip(self, params), fields(method = %method))]
    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R>
    where
        P: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(Error::TransportClosed);
        }

        // Held until this call resolves, releasing the slot for the next
        // admission.
        let _slot = self.inner.limiter.acquire().await?;
        let started = Instant::now();

        let id = self.inner.calls.next_id();
        let rx = self.inner.calls.register(id).await;
        if let Some(ref m) = self.inner.metrics {
            m.record_in_flight(self.inner.calls.pending_count().await as i64);
        }

        let params =
            serde_json::to_value(params).map_err(|e| Error::Serialization(e.to_string()))?;
        let envelope = CallEnvelope::new(id, method, Some(params));
        let payload = codec::encode_call(&envelope)?;
        let properties = MessageProperties {
            correlation_id: Some(id.to_string()),
            reply_to: Some(self.inner.reply_queue.clone()),
        };

        if let Err(e) = self
            .inner
            .channel
            .publish(&self.inner.request_queue, properties, payload)
            .await
        {
            self.inner.calls.discard(id).await;
            if let Some(ref m) = self.inner.metrics {
                m.record_error("publish");
            }
            tracing::error!(id, error = %e, "publish failed");
            return Err(e);
        }
        tracing::debug!(id, "call published, waiting for reply");

        let received = match self.inner.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    // A reply that still arrives later lands in the
                    // dispatcher's unknown-id path and is discarded.
                    self.inner.calls.discard(id).await;
                    if let Some(ref m) = self.inner.metrics {
                        m.record_call(method, "timeout", started.elapsed().as_secs_f64());
                    }
                    tracing::warn!(id, "call timed out");
                    return Err(Error::Timeout);
                }
            },
            None => rx.await,
        };

        // A dropped sender means the codec was torn down under us.
        let reply = received.map_err(|_| Error::TransportClosed)??;
        let duration = started.elapsed().as_secs_f64();

        if let Some(message) = reply.error {
            if let Some(ref m) = self.inner.metrics {
                m.record_call(method, "error", duration);
            }
            tracing::debug!(id, error = %message, "call failed remotely");
            return Err(Error::Application(message));
        }

        let value = reply
            .result
            .ok_or_else(|| Error::Protocol("reply carries neither result nor error".to_string()))?;
        let decoded =
            serde_json::from_value(value).map_err(|e| Error::Serialization(e.to_string()))?;

        if let Some(ref m) = self.inner.metrics {
            m.record_call(method, "success", duration);
        }
        tracing::debug!(id, duration_secs = duration, "call completed");
        Ok(decoded)
    }

    /// Close the codec.
    ///
    /// Idempotent. Stops the reply dispatcher, fails every outstanding call
    /// with [`Error::TransportClosed`], unblocks callers waiting for
    /// admission, and releases the broker channel. After close, further
    /// calls fail immediately.
    pub async fn close(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::info!(reply_queue = %self.inner.reply_queue, "closing client codec");

        self.inner.limiter.close();
        self.inner.dispatcher.abort();
        self.inner.calls.fail_all(Error::TransportClosed).await;
        self.inner.channel.close().await
    }

    /// Name of the request queue calls are published to.
    pub fn request_queue(&self) -> &str {
        &self.inner.request_queue
    }

    /// Name of this client's private reply queue.
    pub fn reply_queue(&self) -> &str {
        &self.inner.reply_queue
    }

    /// Number of calls currently awaiting a reply.
    pub async fn pending_calls(&self) -> usize {
        self.inner.calls.pending_count().await
    }

    /// The configured in-flight bound.
    pub fn in_flight_bound(&self) -> usize {
        self.inner.limiter.bound()
    }

    /// Reply dispatcher: runs for the codec's lifetime, matching incoming
    /// replies to pending calls.
    async fn dispatch_replies(
        mut deliveries: DeliveryStream,
        calls: CorrelationTable,
        metrics: Option<Arc<ClientMetrics>>,
    ) {
        while let Some(delivery) = deliveries.next().await {
            match codec::decode_reply(&delivery.payload) {
                Ok(reply) => {
                    let id = reply.id;
                    if !calls.resolve(id, reply).await {
                        // Normal race: the call timed out, was already
                        // resolved, or a duplicate redelivery arrived.
                        tracing::debug!(id, "reply without a matching pending call, discarded");
                        if let Some(ref m) = metrics {
                            m.record_discarded_reply();
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "malformed reply envelope, skipped");
                    if let Some(ref m) = metrics {
                        m.record_error("decode");
                    }
                }
            }
            if let Err(e) = delivery.ack().await {
                tracing::warn!(error = %e, "failed to ack reply");
            }
        }

        // The consumer stream only ends when the channel or connection is
        // gone; nothing pending can resolve anymore.
        tracing::info!("reply stream ended, failing outstanding calls");
        calls.fail_all(Error::TransportClosed).await;
    }
}
