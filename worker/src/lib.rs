//! Resumeflow - asynchronous resume processing worker.
//!
//! The worker receives signed job requests over HTTP, downloads the
//! referenced resume, normalizes it to a single PDF document, stores the
//! processed copy, and notifies the downstream service with a signed
//! webhook callback.
//!
//! ## Architecture
//!
//! ```text
//! Signed request → web (verify raw bytes) → pipeline
//!     pipeline: download → normalize → store → notify (signed webhook)
//! ```
//!
//! Both sides of the trust boundary use the same scheme: HMAC-SHA256 over
//! `timestamp + "." + body`, carried in the `x-signature-timestamp` and
//! `x-signature` headers, with a symmetric replay-tolerance window.

pub mod analyze;
pub mod config;
pub mod convert;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod signature;
pub mod storage;
pub mod transfer;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::PipelineError;
pub use models::{JobRequest, ProcessingResult, WebhookNotification};
pub use pipeline::ResumePipeline;
pub use storage::{artifact_key, LocalStorage, StorageGateway};
pub use transfer::TransferClient;
pub use web::AppState;
