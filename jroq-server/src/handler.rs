//! Handler traits and types for RPC methods
//!
//! A handler is the unit of work the server codec dispatches a decoded call
//! to. Handlers are type-erased over `serde_json::Value` so one registry can
//! hold methods with arbitrary signatures; the typed adapter recovers strong
//! typing at the edge.
//!
//! # Creating Handlers
//!
//! 1. **from_fn**: wrap an async closure over raw JSON values
//! 2. **from_typed_fn**: wrap an async closure with automatic serde
//!    conversion of arguments and result
//!
//! Handlers must be `Send + Sync`: the server codec runs several of them
//! concurrently on a worker pool, and handlers must not assume serialized
//! execution. Under broker redelivery a handler may also run more than once
//! for the same call, so handlers should be idempotent where that matters.
//!
//! # Examples
//!
//! ```rust
//! use jroq_server::{from_fn, from_typed_fn};
//! use serde::Deserialize;
//!
//! let echo = from_fn(|params| async move {
//!     Ok(params.unwrap_or_default())
//! });
//!
//! #[derive(Deserialize)]
//! #[serde(rename_all = "PascalCase")]
//! struct MulArgs { a: i64, b: i64 }
//!
//! let mul = from_typed_fn(|args: MulArgs| async move {
//!     Ok(args.a * args.b)
//! });
//! ```

use jroq_core::{Error, Result};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// Result type for handler invocations: a pinned, boxed future so handlers
/// with different concrete future types share one registry slot.
pub type HandlerResult = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// Trait for RPC method handlers.
///
/// A returned `Err` becomes the application error carried in the reply
/// envelope; it is data to the transport, not a fault.
pub trait Handler: Send + Sync {
    /// Handle one call with its raw arguments.
    ///
    /// `params` is `None` when the call envelope carried no arguments.
    fn handle(&self, params: Option<Value>) -> HandlerResult;
}

/// Adapter implementing [`Handler`] for an async function over raw values.
pub struct FnHandler<F, Fut>
where
    F: Fn(Option<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    func: F,
}

impl<F, Fut> Handler for FnHandler<F, Fut>
where
    F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn handle(&self, params: Option<Value>) -> HandlerResult {
        Box::pin((self.func)(params))
    }
}

/// Create a handler from an async function that works with raw JSON values.
pub fn from_fn<F, Fut>(func: F) -> Box<dyn Handler>
where
    F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Box::new(FnHandler { func })
}

/// Create a handler with automatic serde conversion.
///
/// Arguments are deserialized into `P` (absent arguments deserialize from
/// null, which covers unit-like parameter types) and the return value is
/// serialized back to JSON. Conversion failures become
/// [`Error::Serialization`] on the way out and a serialization error on the
/// way in, both carried to the caller as application errors.
///
/// # Examples
///
/// ```rust
/// use jroq_server::from_typed_fn;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Deserialize)]
/// #[serde(rename_all = "PascalCase")]
/// struct MulArgs { a: i64, b: i64 }
///
/// let handler = from_typed_fn(|args: MulArgs| async move {
///     Ok(args.a * args.b)
/// });
/// ```
pub fn from_typed_fn<P, R, F, Fut>(func: F) -> Box<dyn Handler>
where
    P: serde::de::DeserializeOwned + Send + 'static,
    R: serde::Serialize + Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    use std::sync::Arc;
    // The closure is shared across invocations; Arc lets each call clone a
    // handle into its async block.
    let func = Arc::new(func);

    from_fn(move |params: Option<Value>| {
        let func = Arc::clone(&func);
        async move {
            let params: P = match params {
                Some(p) => serde_json::from_value(p)
                    .map_err(|e| Error::Serialization(format!("invalid arguments: {}", e)))?,
                None => serde_json::from_value(Value::Null)
                    .map_err(|e| Error::Serialization(format!("invalid arguments: {}", e)))?,
            };

            let result = func(params).await?;
            serde_json::to_value(result).map_err(|e| Error::Serialization(e.to_string()))
        }
    })
}
