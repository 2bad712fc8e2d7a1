//! Web server module for the job endpoint.
//!
//! This is the trust boundary of the worker:
//! - Every job request is authenticated against the raw body bytes before
//!   it is parsed and before any processing side effect
//! - Authentication failures get a generic rejection with no detail
//! - Processing failures come back stage-tagged for operator diagnosis

pub mod handlers;

pub use handlers::{health, process_resume, AppState, HealthResponse, ProcessResponse};
