//! Shutdown semantics: close fails everything pending and nothing blocks
//! forever.

mod common;

use common::{connect_client, RPC_QUEUE};
use jroq_client::ClientBuilder;
use jroq_core::broker::MemoryBroker;
use jroq_core::Error;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_close_fails_all_pending_calls() {
    let broker = MemoryBroker::new();
    // No server consumes the queue, so every call stays pending until close.
    let client = ClientBuilder::with_channel(Arc::new(broker.channel()), RPC_QUEUE)
        .no_call_timeout()
        .connect()
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..5 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            client
                .call::<_, i64>("Test.Mul", serde_json::json!({"A": i, "B": i}))
                .await
        }));
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(client.pending_calls().await, 5);

    client.close().await.unwrap();

    for task in tasks {
        let result = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("caller should unblock promptly")
            .unwrap();
        assert!(matches!(result, Err(Error::TransportClosed)));
    }
    assert_eq!(client.pending_calls().await, 0);
}

#[tokio::test]
async fn test_close_unblocks_limiter_waiters() {
    let broker = MemoryBroker::new();
    let client = ClientBuilder::with_channel(Arc::new(broker.channel()), RPC_QUEUE)
        .in_flight_bound(2)
        .no_call_timeout()
        .connect()
        .await
        .unwrap();

    // Two calls occupy the in-flight slots; the third waits for admission.
    let mut tasks = Vec::new();
    for _ in 0..3 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            client
                .call::<_, i64>("Test.Mul", serde_json::json!({"A": 1, "B": 1}))
                .await
        }));
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(client.pending_calls().await, 2);

    client.close().await.unwrap();

    for task in tasks {
        let result = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("caller should unblock promptly")
            .unwrap();
        assert!(matches!(result, Err(Error::TransportClosed)));
    }
}

#[tokio::test]
async fn test_call_after_close_fails_immediately() {
    let broker = MemoryBroker::new();
    let client = connect_client(&broker).await;
    client.close().await.unwrap();

    let result: Result<i64, _> = client.call("Test.Mul", serde_json::json!({})).await;
    assert!(matches!(result, Err(Error::TransportClosed)));
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let broker = MemoryBroker::new();
    let client = connect_client(&broker).await;

    client.close().await.unwrap();
    client.close().await.unwrap();
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_publish_failure_surfaces_and_releases_the_slot() {
    let broker = MemoryBroker::new();
    let client = ClientBuilder::with_channel(Arc::new(broker.channel()), RPC_QUEUE)
        .in_flight_bound(1)
        .connect()
        .await
        .unwrap();

    broker.shut_down();

    // The failure is synchronous and the pending entry does not leak.
    let result: Result<i64, _> = client.call("Test.Mul", serde_json::json!({})).await;
    assert!(matches!(result, Err(Error::Broker(_))));
    assert_eq!(client.pending_calls().await, 0);

    // The single admission slot was released, so the next call reaches the
    // publish (and fails there) instead of blocking on admission.
    let result: Result<i64, _> = client.call("Test.Mul", serde_json::json!({})).await;
    assert!(matches!(result, Err(Error::Broker(_))));
}

#[tokio::test]
async fn test_timeout_fails_the_call_and_cleans_up() {
    let broker = MemoryBroker::new();
    let client = ClientBuilder::with_channel(Arc::new(broker.channel()), RPC_QUEUE)
        .call_timeout(Duration::from_millis(50))
        .connect()
        .await
        .unwrap();

    let result: Result<i64, _> = client.call("Test.Mul", serde_json::json!({})).await;
    assert!(matches!(result, Err(Error::Timeout)));
    assert_eq!(client.pending_calls().await, 0);

    client.close().await.unwrap();
}
