//! Wire types for job requests, results, and webhook notifications.

use serde::{Deserialize, Serialize};
use url::Url;

/// A unit of work as received from the upstream platform.
///
/// Immutable once received; the pipeline consumes it exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    /// Job identifier assigned by the upstream platform
    pub job_id: i64,
    /// Owner of the source file
    pub owner_id: i64,
    /// Path of the original upload in the upstream system
    pub source_path: String,
    /// Where the source file can be fetched from
    pub download_url: Url,
    /// Filename as originally uploaded
    pub original_filename: String,
    /// Declared MIME type of the source file
    pub mime_type: String,
    /// Declared size in bytes
    pub size: u64,
}

/// Output of a completed job.
///
/// Constructed only after the artifact write succeeded; never mutated
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub job_id: i64,
    pub owner_id: i64,
    /// Path of the stored artifact, relative to the storage root
    pub stored_path: String,
    pub skills: Vec<String>,
    pub education: Vec<String>,
    pub experience: Vec<String>,
    pub feedback: Option<String>,
}

/// Wire projection of a [`ProcessingResult`] for the downstream webhook.
///
/// Identity fields carry over unchanged; the extraction fields are renamed
/// for the receiving contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookNotification {
    pub job_id: i64,
    pub owner_id: i64,
    pub stored_path: String,
    #[serde(default)]
    pub extracted_skills: Vec<String>,
    #[serde(default)]
    pub extracted_education: Vec<String>,
    #[serde(default)]
    pub extracted_experiences: Vec<String>,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl WebhookNotification {
    /// Build the outbound projection of a processing result.
    pub fn from_result(result: &ProcessingResult) -> Self {
        Self {
            job_id: result.job_id,
            owner_id: result.owner_id,
            stored_path: result.stored_path.clone(),
            extracted_skills: result.skills.clone(),
            extracted_education: result.education.clone(),
            extracted_experiences: result.experience.clone(),
            feedback: result.feedback.clone(),
        }
    }
}
