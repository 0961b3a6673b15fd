//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use tokio::net::TcpListener;

use rabbit_topology::broker::{
    BrokerError, BrokerSession, ExchangeDeclaration, QueueBinding, QueueDeclaration,
};
use rabbit_topology::config::ExchangeKind;
use rabbit_topology::topology::ArgumentTable;

/// One call observed by [`RecordingSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    DeclareExchange {
        name: String,
        kind: ExchangeKind,
        durable: bool,
        auto_delete: bool,
        internal: bool,
        arguments: ArgumentTable,
    },
    DeclareQueue {
        name: String,
        durable: bool,
        auto_delete: bool,
        arguments: ArgumentTable,
    },
    Bind {
        queue: String,
        exchange: String,
        routing_key: String,
        arguments: ArgumentTable,
    },
    Close,
}

impl Op {
    /// Short form for order assertions, e.g. `queue:orders`.
    pub fn label(&self) -> String {
        match self {
            Op::DeclareExchange { name, .. } => format!("exchange:{}", name),
            Op::DeclareQueue { name, .. } => format!("queue:{}", name),
            Op::Bind {
                queue,
                exchange,
                routing_key,
                ..
            } => format!("bind:{}<-{}:{}", queue, exchange, routing_key),
            Op::Close => "close".to_string(),
        }
    }
}

/// Which call the recording session should refuse.
#[derive(Debug, Clone, PartialEq)]
pub enum FailOn {
    Exchange(String),
    Queue(String),
    Bind(String),
}

/// Broker session double that records every call in order.
pub struct RecordingSession {
    log: Arc<Mutex<Vec<Op>>>,
    fail_on: Option<FailOn>,
}

impl RecordingSession {
    pub fn new() -> (Self, Arc<Mutex<Vec<Op>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                log: log.clone(),
                fail_on: None,
            },
            log,
        )
    }

    /// Refuse the given call with a declare conflict, after recording it.
    pub fn failing_on(mut self, fail_on: FailOn) -> Self {
        self.fail_on = Some(fail_on);
        self
    }

    fn record(&self, op: Op, failure: Option<FailOn>) -> Result<(), BrokerError> {
        self.log.lock().unwrap().push(op.clone());
        if failure.is_some() && failure == self.fail_on {
            return Err(BrokerError::Conflict {
                entity: op.label(),
                reason: "inequivalent arg 'durable'".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BrokerSession for RecordingSession {
    async fn declare_exchange(
        &mut self,
        exchange: &ExchangeDeclaration<'_>,
    ) -> Result<(), BrokerError> {
        self.record(
            Op::DeclareExchange {
                name: exchange.name.to_string(),
                kind: exchange.kind,
                durable: exchange.durable,
                auto_delete: exchange.auto_delete,
                internal: exchange.internal,
                arguments: exchange.arguments.clone(),
            },
            Some(FailOn::Exchange(exchange.name.to_string())),
        )
    }

    async fn declare_queue(&mut self, queue: &QueueDeclaration<'_>) -> Result<(), BrokerError> {
        self.record(
            Op::DeclareQueue {
                name: queue.name.to_string(),
                durable: queue.durable,
                auto_delete: queue.auto_delete,
                arguments: queue.arguments.clone(),
            },
            Some(FailOn::Queue(queue.name.to_string())),
        )
    }

    async fn bind_queue(&mut self, binding: &QueueBinding<'_>) -> Result<(), BrokerError> {
        self.record(
            Op::Bind {
                queue: binding.queue.to_string(),
                exchange: binding.exchange.to_string(),
                routing_key: binding.routing_key.to_string(),
                arguments: binding.arguments.clone(),
            },
            Some(FailOn::Bind(binding.queue.to_string())),
        )
    }

    async fn close(self) -> Result<(), BrokerError> {
        self.record(Op::Close, None)
    }
}

pub fn labels(log: &Arc<Mutex<Vec<Op>>>) -> Vec<String> {
    log.lock().unwrap().iter().map(Op::label).collect()
}

/// A request received by the mock management API.
#[derive(Debug, Clone)]
pub struct Received {
    pub method: Method,
    pub path: String,
    pub body: serde_json::Value,
}

#[derive(Clone, Default)]
pub struct MockState {
    pub received: Arc<Mutex<Vec<Received>>>,
    /// Paths answered with a 400 "inequivalent arg" response.
    pub conflicts: Arc<Mutex<HashSet<String>>>,
}

/// `Authorization` header for guest/guest.
pub const GUEST_AUTH: &str = "Basic Z3Vlc3Q6Z3Vlc3Q=";

/// Start a mock RabbitMQ management API on an ephemeral port.
pub async fn start_mock_management() -> (SocketAddr, MockState) {
    let state = MockState::default();
    let app = Router::new().fallback(handle).with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, state)
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == GUEST_AUTH)
        .unwrap_or(false);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            r#"{"error":"not_authorised","reason":"Login failed"}"#.to_string(),
        );
    }

    let path = uri.path().to_string();
    let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    state.received.lock().unwrap().push(Received {
        method: method.clone(),
        path: path.clone(),
        body,
    });

    if state.conflicts.lock().unwrap().contains(&path) {
        return (
            StatusCode::BAD_REQUEST,
            r#"{"error":"bad_request","reason":"inequivalent arg 'durable' for queue in vhost '/': received 'true' but current is 'false'"}"#
                .to_string(),
        );
    }

    match (method, path.as_str()) {
        (Method::GET, "/api/whoami") => (
            StatusCode::OK,
            r#"{"name":"guest","tags":["administrator"]}"#.to_string(),
        ),
        (Method::PUT, p) if p.starts_with("/api/exchanges/") || p.starts_with("/api/queues/") => {
            (StatusCode::CREATED, String::new())
        }
        (Method::POST, p) if p.starts_with("/api/bindings/") => {
            (StatusCode::CREATED, String::new())
        }
        _ => (
            StatusCode::NOT_FOUND,
            r#"{"error":"Object Not Found","reason":"Not Found"}"#.to_string(),
        ),
    }
}
