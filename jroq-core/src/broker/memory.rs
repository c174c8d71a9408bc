//! In-process broker
//!
//! A minimal broker living entirely inside the current process: queues are
//! unbounded channels, routing is by queue name, acknowledgement is a no-op.
//! It exists so the codec pair can be exercised end-to-end without a running
//! AMQP broker, both by this workspace's test suites and by embedders who
//! want client and server in one process.
//!
//! Semantics mirror the AMQP default exchange where they matter to the
//! codecs: publishing to an undeclared queue drops the message, a private
//! queue gets a generated name, and publishing after shutdown is a transport
//! error.

use crate::broker::{Acker, BrokerChannel, Delivery, DeliveryStream, MessageProperties};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

struct QueueSlot {
    tx: mpsc::UnboundedSender<Delivery>,
    rx: Option<mpsc::UnboundedReceiver<Delivery>>,
}

#[derive(Default)]
struct Shared {
    queues: Mutex<HashMap<String, QueueSlot>>,
    generated: AtomicU64,
    closed: AtomicBool,
}

/// An in-process broker instance. Cheap to clone; all clones share the same
/// queues.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    shared: Arc<Shared>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a channel onto this broker.
    pub fn channel(&self) -> MemoryChannel {
        MemoryChannel {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Shut the broker down: subsequent declares and publishes fail with a
    /// transport error. Consumers keep draining whatever was already queued.
    pub fn shut_down(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
    }
}

/// A channel onto a [`MemoryBroker`].
#[derive(Clone)]
pub struct MemoryChannel {
    shared: Arc<Shared>,
}

struct MemoryAcker;

#[async_trait]
impl Acker for MemoryAcker {
    async fn ack(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl BrokerChannel for MemoryChannel {
    async fn declare_queue(&self, name: &str) -> Result<String> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(Error::Broker("broker closed".to_string()));
        }

        let name = if name.is_empty() {
            let n = self.shared.generated.fetch_add(1, Ordering::Relaxed);
            format!("gen.reply.{}", n)
        } else {
            name.to_string()
        };

        let mut queues = self.shared.queues.lock().await;
        queues.entry(name.clone()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            QueueSlot { tx, rx: Some(rx) }
        });

        Ok(name)
    }

    async fn publish(
        &self,
        routing_key: &str,
        properties: MessageProperties,
        payload: Vec<u8>,
    ) -> Result<()> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(Error::Broker("broker closed".to_string()));
        }

        let queues = self.shared.queues.lock().await;
        match queues.get(routing_key) {
            Some(slot) => {
                let delivery = Delivery::new(payload, properties, Box::new(MemoryAcker));
                if slot.tx.send(delivery).is_err() {
                    tracing::debug!(queue = %routing_key, "consumer gone, message dropped");
                }
                Ok(())
            }
            None => {
                // Default-exchange behavior: unroutable messages vanish.
                tracing::debug!(queue = %routing_key, "publish to undeclared queue, message dropped");
                Ok(())
            }
        }
    }

    async fn consume(&self, queue: &str) -> Result<DeliveryStream> {
        let mut queues = self.shared.queues.lock().await;
        let slot = queues
            .get_mut(queue)
            .ok_or_else(|| Error::Broker(format!("unknown queue {}", queue)))?;
        let rx = slot
            .rx
            .take()
            .ok_or_else(|| Error::Broker(format!("queue {} already has a consumer", queue)))?;

        Ok(Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|delivery| (delivery, rx))
        })))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
