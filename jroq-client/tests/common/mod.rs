//! Common test utilities for jroq-client integration tests
//!
//! Provides a small math server running over an in-process broker so the
//! client codec can be exercised end-to-end without external
//! infrastructure.

use jroq_client::{ClientBuilder, JroqClient};
use jroq_core::broker::MemoryBroker;
use jroq_core::Error;
use jroq_server::{from_fn, from_typed_fn, JroqServer, Registry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const RPC_QUEUE: &str = "testrpc";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MulArgs {
    pub a: i64,
    pub b: i64,
}

/// Registry with the methods the tests call.
pub fn math_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .service("Test")
        .method(
            "Mul",
            from_typed_fn(|args: MulArgs| async move { Ok(args.a * args.b) }),
        )
        .method(
            "Fail",
            from_fn(|_| async { Err(Error::Application("boom".to_string())) }),
        )
        .method(
            "Sleep",
            from_typed_fn(|millis: u64| async move {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                Ok(millis)
            }),
        );
    registry
}

/// Build and run a math server on the given broker.
pub async fn start_math_server(broker: &MemoryBroker) -> (Arc<JroqServer>, JoinHandle<()>) {
    let server = Arc::new(
        JroqServer::builder()
            .channel(Arc::new(broker.channel()))
            .queue(RPC_QUEUE)
            .registry(math_registry())
            .build()
            .await
            .expect("server should build"),
    );

    let run = {
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            let _ = server.run().await;
        })
    };
    (server, run)
}

/// Connect a client to the given broker with default settings.
pub async fn connect_client(broker: &MemoryBroker) -> JroqClient {
    ClientBuilder::with_channel(Arc::new(broker.channel()), RPC_QUEUE)
        .connect()
        .await
        .expect("client should connect")
}
