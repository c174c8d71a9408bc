//! Method registry for dispatch-by-name
//!
//! Maps dotted `Service.Method` names to handlers and routes decoded calls
//! to them. The registry is the dispatch half of the RPC runtime: the server
//! codec hands it a method name and raw arguments, and gets back a result
//! value or an error.
//!
//! Registries are cheaply cloneable (`Arc`-based) so every dispatch worker
//! shares one handler map without synchronization overhead.
//!
//! # Examples
//!
//! ```rust
//! use jroq_server::{Registry, from_typed_fn};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! #[serde(rename_all = "PascalCase")]
//! struct MulArgs { a: i64, b: i64 }
//!
//! let mut registry = Registry::new();
//! registry
//!     .service("Test")
//!     .method("Mul", from_typed_fn(|args: MulArgs| async move {
//!         Ok(args.a * args.b)
//!     }));
//!
//! assert!(registry.has_method("Test.Mul"));
//! ```

use crate::handler::Handler;
use jroq_core::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of RPC methods.
#[derive(Clone, Default)]
pub struct Registry {
    handlers: Arc<HashMap<String, Arc<dyn Handler>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a full dotted name.
    pub fn register(&mut self, method: impl Into<String>, handler: Box<dyn Handler>) {
        let handlers = Arc::make_mut(&mut self.handlers);
        handlers.insert(method.into(), Arc::from(handler));
    }

    /// Register a group of methods under one service name.
    ///
    /// Each `method("Mul", ...)` call on the returned registrar registers
    /// `"<service>.Mul"`.
    pub fn service(&mut self, name: impl Into<String>) -> ServiceRegistrar<'_> {
        ServiceRegistrar {
            registry: self,
            service: name.into(),
        }
    }

    /// Whether a handler is registered under `method`.
    pub fn has_method(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// All registered method names.
    pub fn methods(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    /// Dispatch a call to its handler.
    ///
    /// # Errors
    ///
    /// [`Error::MethodNotFound`] when no handler is registered; otherwise
    /// whatever the handler returns.
    pub async fn dispatch(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let handler = self
            .handlers
            .get(method)
            .cloned()
            .ok_or_else(|| Error::MethodNotFound(method.to_string()))?;
        handler.handle(params).await
    }
}

/// Registrar scoping method registration to one service name.
pub struct ServiceRegistrar<'a> {
    registry: &'a mut Registry,
    service: String,
}

impl ServiceRegistrar<'_> {
    /// Register `handler` as `<service>.<name>`.
    pub fn method(self, name: &str, handler: Box<dyn Handler>) -> Self {
        let full = format!("{}.{}", self.service, name);
        self.registry.register(full, handler);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{from_fn, from_typed_fn};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct MulArgs {
        a: i64,
        b: i64,
    }

    #[tokio::test]
    async fn test_register_and_dispatch() {
        let mut registry = Registry::new();
        registry.register(
            "Test.Mul",
            from_typed_fn(|args: MulArgs| async move { Ok(args.a * args.b) }),
        );

        assert!(registry.has_method("Test.Mul"));
        assert!(!registry.has_method("Test.Divide"));

        let result = registry
            .dispatch("Test.Mul", Some(serde_json::json!({"A": 6, "B": 7})))
            .await
            .unwrap();
        assert_eq!(result, serde_json::json!(42));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_method() {
        let registry = Registry::new();
        let result = registry.dispatch("Test.Divide", None).await;
        match result {
            Err(Error::MethodNotFound(name)) => assert_eq!(name, "Test.Divide"),
            other => panic!("expected MethodNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_service_registrar_builds_dotted_names() {
        let mut registry = Registry::new();
        registry
            .service("Test")
            .method(
                "Mul",
                from_typed_fn(|args: MulArgs| async move { Ok(args.a * args.b) }),
            )
            .method("Ping", from_fn(|_| async { Ok(serde_json::json!("pong")) }));

        assert!(registry.has_method("Test.Mul"));
        assert!(registry.has_method("Test.Ping"));

        let mut methods = registry.methods();
        methods.sort();
        assert_eq!(methods, vec!["Test.Mul", "Test.Ping"]);
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let mut registry = Registry::new();
        registry.register(
            "Test.Fail",
            from_fn(|_| async { Err(Error::Application("boom".to_string())) }),
        );

        let result = registry.dispatch("Test.Fail", None).await;
        assert!(matches!(result, Err(Error::Application(_))));
    }

    #[tokio::test]
    async fn test_clones_share_handlers() {
        let mut registry = Registry::new();
        registry.register("Test.Ping", from_fn(|_| async { Ok(serde_json::json!(1)) }));

        let clone = registry.clone();
        assert!(clone.has_method("Test.Ping"));
        assert_eq!(
            clone.dispatch("Test.Ping", None).await.unwrap(),
            serde_json::json!(1)
        );
    }
}
