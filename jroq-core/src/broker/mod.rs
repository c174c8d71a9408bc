//! Broker transport abstraction
//!
//! The codecs need five primitives from a message broker: declare a queue,
//! publish a payload to a destination, consume a queue as a stream of
//! deliveries, acknowledge a delivery, and close the channel. Everything
//! else a broker client offers is out of bounds, which keeps the codecs
//! portable across transports and lets the test suite run against the
//! in-process [`memory::MemoryBroker`] while production traffic goes through
//! the lapin-backed [`amqp::AmqpChannel`].
//!
//! Delivery ordering is whatever the broker provides; the codecs assume
//! at-least-once, unordered delivery and correlate strictly by sequence id.

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

pub mod amqp;
pub mod memory;

pub use amqp::{AmqpBroker, AmqpChannel};
pub use memory::{MemoryBroker, MemoryChannel};

/// Transport-level metadata attached to a published message.
///
/// The correlation id is distinct from the envelope's sequence id but by
/// convention carries the same value, so broker-side tooling can trace a
/// call without opening the payload. The reply-to address names the queue
/// the reply should be published to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageProperties {
    /// Correlation identifier echoed back on the reply
    pub correlation_id: Option<String>,
    /// Queue name the receiving side should reply to
    pub reply_to: Option<String>,
}

/// Acknowledgement handle for one delivery.
#[async_trait]
pub trait Acker: Send {
    /// Confirm the delivery to the broker so it is not redelivered.
    async fn ack(self: Box<Self>) -> Result<()>;
}

/// One message received from a consumed queue.
pub struct Delivery {
    /// Raw message body (an encoded envelope for codec traffic)
    pub payload: Vec<u8>,
    /// Transport metadata the publisher attached
    pub properties: MessageProperties,
    acker: Box<dyn Acker>,
}

impl Delivery {
    /// Assemble a delivery. Transport implementations call this; codec code
    /// only ever consumes deliveries.
    pub fn new(payload: Vec<u8>, properties: MessageProperties, acker: Box<dyn Acker>) -> Self {
        Self {
            payload,
            properties,
            acker,
        }
    }

    /// Acknowledge the delivery. Consumes the delivery: a message is acked
    /// at most once.
    pub async fn ack(self) -> Result<()> {
        self.acker.ack().await
    }
}

/// Stream of deliveries from one consumed queue.
pub type DeliveryStream = BoxStream<'static, Delivery>;

/// The broker channel primitives the codecs are written against.
///
/// Implementations must be safe for concurrent use: a client codec publishes
/// from many concurrent call sites over one channel while its dispatcher
/// consumes on the same channel.
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    /// Declare a queue and return its name.
    ///
    /// An empty `name` asks the broker for a private, exclusively owned
    /// queue (used for per-client reply queues); the generated name is
    /// returned. Declaring an existing queue is idempotent.
    async fn declare_queue(&self, name: &str) -> Result<String>;

    /// Publish a payload to the queue named by `routing_key`.
    ///
    /// Errors surface synchronously to the publishing call site; the codecs
    /// never retry on their own.
    async fn publish(
        &self,
        routing_key: &str,
        properties: MessageProperties,
        payload: Vec<u8>,
    ) -> Result<()>;

    /// Start consuming a declared queue.
    ///
    /// The stream ends when the channel or connection is torn down.
    async fn consume(&self, queue: &str) -> Result<DeliveryStream>;

    /// Close the channel. Outstanding consumers see their stream end.
    async fn close(&self) -> Result<()>;
}
