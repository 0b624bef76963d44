//! Agent action-group functions
//!
//! The agent runtime decides intent and calls one of four functions:
//!
//! ```text
//! Agent runtime ──Invocation──► Dispatcher
//!                                   │
//!       ┌──────────────┬────────────┼──────────────────┬──────────────────────┐
//!       ▼              ▼            ▼                  ▼                      │
//! query_knowledge_  generate_   save_generated_   execute_generated_          │
//!      base           code          code              code                    │
//!       │              │            │                  │                      │
//!  kb function ──► recover ──►  temp file  ──►   interpreter + timeout        │
//!  (invoke)        chunks +                                                   │
//!                  template +                                                 │
//!                  model                                                      │
//!       └──────────────┴────────────┴──────────────────┴──► ResponseEnvelope ◄┘
//! ```
//!
//! Failures anywhere end up as an `error` field in the envelope body.

pub mod dispatcher;
pub mod error;
pub mod invocation;
pub mod knowledge;
pub mod profile;
pub mod recovery;

pub use dispatcher::{AgentFunction, Dispatcher};
pub use error::FunctionError;
pub use invocation::{Invocation, Parameter, ResponseEnvelope};
pub use knowledge::KbFunctionClient;
pub use profile::AgentProfile;
pub use recovery::{recover_chunks, ParseResult};
