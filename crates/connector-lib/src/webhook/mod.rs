//! Webhook dispatcher
//!
//! Handlers are registered with AM-Vision and recorded in a table before
//! the server starts. The server only ever reads that table, so inbound
//! hooks need no locking.

use crate::api::AmVisionApi;
use crate::error::DispatchError;
use crate::models::WebhookRegistration;
use crate::observability::ConnectorMetrics;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{error, info, warn};


/// Events AM-Vision can deliver
pub const EVENTS: &[&str] = &[
    "batch.started",
    "batch.ended",
    "batch.reset",
    "scan.captured",
    "scan.rejected",
    "scan.assigned",
    "scan.reassigned",
    "scan.unassigned",
    "auth.login_user",
    "auth.logout_user",
];

/// Path segment of the inbound hook endpoint
pub const HOOK_ENDPOINT: &str = "hook";

/// Returns true if AM-Vision can deliver this event
pub fn is_known_event(event: &str) -> bool {
    EVENTS.contains(&event)
}

/// Default callback URL for a connector listening on `ip:port`
pub fn callback_url(ip: &str, port: u16) -> String {
    format!("http://{}:{}/{}/", ip, port, HOOK_ENDPOINT)
}

/// Reacts to one kind of AM-Vision event
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an event; the returned text becomes the response body
    async fn handle(&self, event: &str, data: &Value) -> anyhow::Result<Option<String>>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&str, &Value) -> anyhow::Result<Option<String>> + Send + Sync,
{
    async fn handle(&self, event: &str, data: &Value) -> anyhow::Result<Option<String>> {
        (self.0)(event, data)
    }
}

/// Wrap a synchronous function as an event handler
pub fn handler_fn<F>(f: F) -> Arc<dyn EventHandler>
where
    F: Fn(&str, &Value) -> anyhow::Result<Option<String>> + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

/// Event name to handler mapping
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl HandlerTable {
    pub fn get(&self, event: &str) -> Option<&Arc<dyn EventHandler>> {
        self.handlers.get(event)
    }

    pub fn contains(&self, event: &str) -> bool {
        self.handlers.contains_key(event)
    }

    /// Registered event names, sorted
    pub fn events(&self) -> Vec<&str> {
        let mut events: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        events.sort_unstable();
        events
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Registers handlers with AM-Vision and routes inbound hooks to them
pub struct Dispatcher {
    api: Arc<dyn AmVisionApi>,
    endpoint_url: String,
    table: HandlerTable,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn AmVisionApi>, endpoint_url: impl Into<String>) -> Self {
        Self {
            api,
            endpoint_url: endpoint_url.into(),
            table: HandlerTable::default(),
        }
    }

    /// URL AM-Vision delivers hooks to
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub fn table(&self) -> &HandlerTable {
        &self.table
    }

    /// Register handlers for events.
    ///
    /// Unknown events are logged and skipped. An event that already has a
    /// handler is registered again and its handler replaced. Returns the
    /// number of handlers registered.
    pub async fn register_handlers<I, S>(&mut self, handlers: I) -> Result<usize, DispatchError>
    where
        I: IntoIterator<Item = (S, Arc<dyn EventHandler>)>,
        S: Into<String>,
    {
        let mut registered = 0;
        for (event, handler) in handlers {
            let event = event.into();
            if !is_known_event(&event) {
                error!(event = %event, "Invalid event, skipping");
                continue;
            }
            if self.table.contains(&event) {
                warn!(event = %event, "Overwriting existing handler");
            }

            info!(event = %event, target = %self.endpoint_url, "Registering handler");
            let registration = WebhookRegistration {
                event: event.clone(),
                target: self.endpoint_url.clone(),
            };
            self.api
                .register_webhook(&registration)
                .await
                .map_err(|source| DispatchError::Registration {
                    event: event.clone(),
                    source,
                })?;

            self.table.handlers.insert(event, handler);
            registered += 1;
        }
        Ok(registered)
    }

    /// Freeze the handler table into the connector's HTTP router
    pub fn into_router(self) -> Router {
        let state = Arc::new(HookState {
            table: self.table,
            metrics: ConnectorMetrics::new(),
        });

        Router::new()
            .route(&format!("/{}/", HOOK_ENDPOINT), post(on_hook))
            .route("/healthz", get(healthz))
            .route("/metrics", get(metrics))
            .with_state(state)
            .layer(CatchPanicLayer::custom(handle_panic))
    }
}

struct HookState {
    table: HandlerTable,
    metrics: ConnectorMetrics,
}

/// Metric label for an event name; arbitrary names collapse into one label
fn event_label(event: Option<&str>) -> &str {
    match event {
        Some(event) if is_known_event(event) => event,
        _ => "other",
    }
}

fn invalid_request(state: &HookState) -> Response {
    state.metrics.inc_hook("other", "invalid");
    (StatusCode::BAD_REQUEST, "Invalid request").into_response()
}

async fn on_hook(State(state): State<Arc<HookState>>, body: Bytes) -> Response {
    let post: Value = match serde_json::from_slice(&body) {
        Ok(post) => post,
        Err(_) => return invalid_request(&state),
    };
    let (hook, data) = match post.as_object() {
        Some(fields) => match (fields.get("hook"), fields.get("data")) {
            (Some(hook), Some(data)) => (hook, data),
            _ => return invalid_request(&state),
        },
        None => return invalid_request(&state),
    };

    let event = hook.get("event").and_then(Value::as_str);
    info!(event = ?event, "Received hook for event");

    let (event, handler) = match event.and_then(|e| state.table.get(e).map(|h| (e, h))) {
        Some(found) => found,
        None => {
            info!(event = ?event, "No handler registered for event");
            state.metrics.inc_hook(event_label(event), "unknown");
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    match handler.handle(event, data).await {
        Ok(body) => {
            state.metrics.inc_hook(event, "handled");
            (StatusCode::NO_CONTENT, body.unwrap_or_default()).into_response()
        }
        Err(e) => {
            error!(event = %event, error = ?e, "Error handling hook for event");
            state.metrics.inc_hook(event, "failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

async fn healthz(State(state): State<Arc<HookState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "events": state.table.events(),
    }))
}

async fn metrics(State(state): State<Arc<HookState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        state.metrics.render(),
    )
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %detail, "Hook handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}
