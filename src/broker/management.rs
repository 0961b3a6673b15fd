//! Broker session over the RabbitMQ HTTP management API.
//!
//! # Responsibilities
//! - Authenticate against the management endpoint
//! - Translate declarations into management API calls
//! - Classify failures: conflict, connection, rejection
//!
//! # Endpoints
//! - `GET  /api/whoami` (connect)
//! - `PUT  /api/exchanges/{vhost}/{name}`
//! - `PUT  /api/queues/{vhost}/{name}`
//! - `POST /api/bindings/{vhost}/e/{exchange}/q/{queue}`
//!
//! # Design Decisions
//! - One request at a time, each bounded by the session timeout
//! - No retries: a failed call ends the run
//! - `400` with an "inequivalent" reason is a declare conflict

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};

use crate::broker::target::ConnectionTarget;
use crate::broker::{
    BrokerError, BrokerSession, ExchangeDeclaration, QueueBinding, QueueDeclaration,
};

/// Tunables for a management session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Upper bound for a single API call.
    pub request_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Authenticated session against one vhost.
pub struct ManagementSession {
    client: Client,
    target: ConnectionTarget,
}

impl ManagementSession {
    /// Open a session and verify the credentials.
    pub async fn connect(
        target: ConnectionTarget,
        options: SessionOptions,
    ) -> Result<Self, BrokerError> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        let response = client
            .get(target.api_url(&["whoami"]))
            .basic_auth(&target.username, Some(&target.password))
            .send()
            .await
            .map_err(|e| BrokerError::Connection(format!("{}: {}", target.endpoint, e)))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(BrokerError::Connection(format!(
                    "authentication failed for user `{}`",
                    target.username
                )));
            }
            status => {
                return Err(BrokerError::Connection(format!(
                    "{} answered HTTP {}",
                    target.endpoint,
                    status.as_u16()
                )));
            }
        }

        tracing::info!(
            endpoint = %target.endpoint,
            vhost = %target.vhost,
            user = %target.username,
            "Connected to broker"
        );

        Ok(Self { client, target })
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    async fn call(
        &self,
        method: Method,
        segments: &[&str],
        entity: String,
        body: Value,
    ) -> Result<(), BrokerError> {
        let url = self.target.api_url(segments);
        tracing::debug!(%method, path = url.path(), %body, "Management API call");

        let response = self
            .client
            .request(method, url)
            .basic_auth(&self.target.username, Some(&self.target.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| BrokerError::Connection(format!("{}: {}", entity, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        Err(classify_failure(entity, status, &text))
    }
}

#[async_trait]
impl BrokerSession for ManagementSession {
    async fn declare_exchange(
        &mut self,
        exchange: &ExchangeDeclaration<'_>,
    ) -> Result<(), BrokerError> {
        let body = json!({
            "type": exchange.kind.as_str(),
            "durable": exchange.durable,
            "auto_delete": exchange.auto_delete,
            "internal": exchange.internal,
            "arguments": exchange.arguments,
        });
        self.call(
            Method::PUT,
            &["exchanges", self.target.vhost.as_str(), exchange.name],
            format!("exchange `{}`", exchange.name),
            body,
        )
        .await
    }

    async fn declare_queue(&mut self, queue: &QueueDeclaration<'_>) -> Result<(), BrokerError> {
        let body = json!({
            "durable": queue.durable,
            "auto_delete": queue.auto_delete,
            "exclusive": false,
            "arguments": queue.arguments,
        });
        self.call(
            Method::PUT,
            &["queues", self.target.vhost.as_str(), queue.name],
            format!("queue `{}`", queue.name),
            body,
        )
        .await
    }

    async fn bind_queue(&mut self, binding: &QueueBinding<'_>) -> Result<(), BrokerError> {
        let body = json!({
            "routing_key": binding.routing_key,
            "arguments": binding.arguments,
        });
        self.call(
            Method::POST,
            &["bindings", self.target.vhost.as_str(), "e", binding.exchange, "q", binding.queue],
            format!("binding `{}` <- `{}`", binding.queue, binding.exchange),
            body,
        )
        .await
    }

    async fn close(self) -> Result<(), BrokerError> {
        tracing::debug!(endpoint = %self.target.endpoint, "Broker session closed");
        Ok(())
    }
}

/// Map a non-success response onto the broker error taxonomy.
fn classify_failure(entity: String, status: StatusCode, body: &str) -> BrokerError {
    let reason = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("reason").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    if status == StatusCode::BAD_REQUEST
        && (reason.contains("inequivalent") || reason.contains("PRECONDITION_FAILED"))
    {
        return BrokerError::Conflict { entity, reason };
    }

    BrokerError::Rejected {
        entity,
        status: status.as_u16(),
        reason,
    }
}
