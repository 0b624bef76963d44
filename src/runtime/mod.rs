//! Serving the functions inside the managed function runtime
//!
//! A custom-runtime process polls the Runtime API for the next event,
//! hands it to a [`Handler`], and posts the result back:
//!
//! ```text
//! loop {
//!     GET  /2018-06-01/runtime/invocation/next          → event + request id
//!     handler.call(event)
//!     POST /2018-06-01/runtime/invocation/{id}/response  (or /error)
//! }
//! ```
//!
//! # Lifecycle
//!
//! The `next` call is a long poll: the platform freezes the process while
//! it waits and thaws it when an event arrives, so the HTTP client has no
//! timeout. Only one event is in flight at a time, and the platform will not
//! deliver another until the current one has been answered on either the
//! `response` or the `error` path.
//!
//! Handler failures are reported through `/error` and the loop moves on.
//! Losing the Runtime API itself (a transport error) ends the loop, because
//! it means the execution environment is shutting down.
//!
//! # Tracing
//!
//! Each event carries a `Lambda-Runtime-Trace-Id` header. It is exported as
//! `_X_AMZN_TRACE_ID` while the event is handled, which is where X-Ray aware
//! code (including scripts the agent executes) looks for it. Because events
//! are strictly sequential, a process-wide variable is safe here.

pub mod client;
pub mod handlers;

pub use client::{ErrorReport, NextInvocation, RuntimeClient, RuntimeError, RUNTIME_API_VERSION};
pub use handlers::{AgentHandler, FunctionKind, Handler, HandlerError, KbHandler};

use tracing::{error, info, info_span, Instrument};

/// Environment variable carrying the current invocation's trace header
pub const TRACE_ID_ENV: &str = "_X_AMZN_TRACE_ID";

/// Fetch one event, handle it, and report the outcome
pub async fn run_once(client: &RuntimeClient, handler: &dyn Handler) -> Result<(), RuntimeError> {
    let event = client.next_invocation().await?;
    export_trace_id(&event);

    let span = info_span!(
        "invocation",
        request_id = %event.request_id,
        xray_trace_id = event.trace_id.as_deref().unwrap_or("")
    );

    async {
        match handler.call(event.payload).await {
            Ok(response) => client.post_response(&event.request_id, &response).await,
            Err(e) => {
                error!(error = %e, "Handler failed");
                client
                    .post_error(&event.request_id, &ErrorReport::from_handler(&e))
                    .await
            }
        }
    }
    .instrument(span)
    .await
}

fn export_trace_id(event: &NextInvocation) {
    match &event.trace_id {
        Some(trace_id) => std::env::set_var(TRACE_ID_ENV, trace_id),
        None => std::env::remove_var(TRACE_ID_ENV),
    }
}

/// Serve events until the runtime API becomes unreachable
pub async fn run(client: &RuntimeClient, handler: &dyn Handler) -> Result<(), RuntimeError> {
    info!(function = handler.name(), "Runtime loop started");
    loop {
        match run_once(client, handler).await {
            Ok(()) => {}
            // Losing the runtime API means the sandbox is going away
            Err(e @ RuntimeError::Request(_)) => return Err(e),
            Err(e) => error!(error = %e, "Invocation was not completed"),
        }
    }
}
