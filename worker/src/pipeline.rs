//! The processing pipeline.
//!
//! One job moves through a strict sequence: download → normalize → store →
//! notify, with optional extraction feeding the notification. Each stage
//! either completes or fails the whole job with a stage-tagged error; no
//! retry lives here, retry and backoff belong to the caller. The pipeline
//! is constructed explicitly with its collaborators; there are no globals.

use std::sync::Arc;

use tokio::task;
use tracing::{debug, info, warn};

use crate::analyze::{
    self, EntityExtractor, LayoutExtractor, RedactionEngine, ENTITY_LABELS,
};
use crate::config::Config;
use crate::convert::{ensure_pdf, PDF_MIME};
use crate::error::PipelineError;
use crate::models::{JobRequest, ProcessingResult, WebhookNotification};
use crate::signature::{SignedEnvelope, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::storage::{artifact_key, StorageGateway};
use crate::transfer::TransferClient;

/// Orchestrates the full life of one job.
///
/// Safe to share across concurrent jobs: the transport client is pooled and
/// the storage gateway is `Send + Sync` by contract. Collaborators are
/// optional; without them the webhook carries empty extraction fields.
pub struct ResumePipeline {
    secret: String,
    webhook_url: String,
    max_download_bytes: usize,
    transfer: TransferClient,
    storage: Arc<dyn StorageGateway>,
    layout: Option<Arc<dyn LayoutExtractor>>,
    entities: Option<Arc<dyn EntityExtractor>>,
    redactor: Option<Arc<dyn RedactionEngine>>,
}

impl ResumePipeline {
    /// Create a pipeline with no extraction or redaction collaborators.
    pub fn new(config: &Config, transfer: TransferClient, storage: Arc<dyn StorageGateway>) -> Self {
        Self {
            secret: config.signing_secret.clone(),
            webhook_url: config.webhook_url.clone(),
            max_download_bytes: config.max_download_bytes,
            transfer,
            storage,
            layout: None,
            entities: None,
            redactor: None,
        }
    }

    /// Attach a layout extractor. Extraction runs only when an entity
    /// extractor is attached as well.
    pub fn with_layout_extractor(mut self, extractor: Arc<dyn LayoutExtractor>) -> Self {
        self.layout = Some(extractor);
        self
    }

    /// Attach an entity extractor.
    pub fn with_entity_extractor(mut self, extractor: Arc<dyn EntityExtractor>) -> Self {
        self.entities = Some(extractor);
        self
    }

    /// Attach a redaction engine, applied to the normalized document before
    /// it is stored.
    pub fn with_redaction_engine(mut self, engine: Arc<dyn RedactionEngine>) -> Self {
        self.redactor = Some(engine);
        self
    }

    /// Process one job to a terminal state.
    ///
    /// The stored artifact is a prerequisite of any output: the result is
    /// constructed only after the storage write returns, and the webhook
    /// fires only after that.
    pub async fn process(&self, job: &JobRequest) -> Result<ProcessingResult, PipelineError> {
        info!(
            job_id = job.job_id,
            owner_id = job.owner_id,
            mime_type = %job.mime_type,
            declared_size = job.size,
            "job_started"
        );

        let original = self.download(job).await?;
        let document = self.normalize(job, original).await?;
        let (skills, education, experience, feedback) = self.extract(&document).await;
        let stored_path = self.store(job, document).await?;

        let result = ProcessingResult {
            job_id: job.job_id,
            owner_id: job.owner_id,
            stored_path,
            skills,
            education,
            experience,
            feedback,
        };

        self.notify(&result).await?;

        info!(
            job_id = result.job_id,
            stored_path = %result.stored_path,
            "job_completed"
        );

        Ok(result)
    }

    async fn download(&self, job: &JobRequest) -> Result<Vec<u8>, PipelineError> {
        let bytes = self
            .transfer
            .fetch(job.download_url.as_str())
            .await
            .map_err(|source| PipelineError::Download { source })?;

        if bytes.len() > self.max_download_bytes {
            return Err(PipelineError::Conversion {
                message: format!(
                    "file is {} bytes, over the {} byte limit",
                    bytes.len(),
                    self.max_download_bytes
                ),
            });
        }

        info!(job_id = job.job_id, body_length = bytes.len(), "job_downloaded");
        Ok(bytes)
    }

    /// Normalize the source bytes to a single PDF document, applying the
    /// redaction collaborator when one is attached.
    async fn normalize(&self, job: &JobRequest, original: Vec<u8>) -> Result<Vec<u8>, PipelineError> {
        let mime_type = job.mime_type.clone();

        // Image re-encoding is CPU-bound; keep it off the I/O threads.
        let document = task::spawn_blocking(move || ensure_pdf(&mime_type, original))
            .await
            .map_err(|e| PipelineError::Conversion {
                message: format!("conversion task failed: {}", e),
            })?
            .map_err(|e| PipelineError::Conversion {
                message: e.to_string(),
            })?;

        let document = match &self.redactor {
            Some(redactor) => {
                redactor
                    .redact(document)
                    .await
                    .map_err(|e| PipelineError::Conversion {
                        message: format!("redaction failed: {}", e),
                    })?
            }
            None => document,
        };

        info!(
            job_id = job.job_id,
            body_length = document.len(),
            "job_normalized"
        );
        Ok(document)
    }

    /// Best-effort extraction feeding the notification.
    ///
    /// Extraction has no side effects, so a collaborator failure degrades
    /// to empty output instead of failing a job whose artifact can still be
    /// stored and announced.
    async fn extract(
        &self,
        document: &[u8],
    ) -> (Vec<String>, Vec<String>, Vec<String>, Option<String>) {
        let (layout, entities) = match (&self.layout, &self.entities) {
            (Some(layout), Some(entities)) => (layout, entities),
            _ => return (Vec::new(), Vec::new(), Vec::new(), None),
        };

        let sections = match layout.extract(document).await {
            Ok(sections) => sections,
            Err(e) => {
                warn!(error = %e, "layout_extraction_failed");
                return (Vec::new(), Vec::new(), Vec::new(), None);
            }
        };

        let mut found = Vec::new();
        for section in &sections {
            let heading = analyze::normalize_heading(&section.heading);
            match entities.extract(&section.text, ENTITY_LABELS).await {
                Ok(mut labeled) => {
                    debug!(
                        section = %heading,
                        entity_count = labeled.len(),
                        "entities_extracted"
                    );
                    found.append(&mut labeled);
                }
                Err(e) => {
                    warn!(section = %heading, error = %e, "entity_extraction_failed");
                }
            }
        }

        let (skills, education, experience) = analyze::categorize_entities(&found);
        let skills = analyze::filter_sensitive(&skills);
        let education = analyze::filter_sensitive(&education);
        let experience = analyze::filter_sensitive(&experience);
        let feedback = analyze::build_feedback(&skills, &education, &experience);

        (skills, education, experience, feedback)
    }

    async fn store(&self, job: &JobRequest, document: Vec<u8>) -> Result<String, PipelineError> {
        let key = artifact_key(job.owner_id, job.job_id);
        let stored_path = self.storage.put(&key, document, PDF_MIME).await?;

        info!(job_id = job.job_id, stored_path = %stored_path, "job_stored");
        Ok(stored_path)
    }

    async fn notify(&self, result: &ProcessingResult) -> Result<(), PipelineError> {
        let notification = WebhookNotification::from_result(result);
        let body = serde_json::to_vec(&notification).map_err(|e| PipelineError::Notify {
            stored_path: result.stored_path.clone(),
            message: format!("failed to encode notification: {}", e),
        })?;

        // Fresh envelope per delivery; a (timestamp, signature) pair is
        // never reused.
        let envelope = SignedEnvelope::seal(&self.secret, body);

        let headers = [
            ("content-type", "application/json".to_string()),
            (TIMESTAMP_HEADER, envelope.timestamp.clone()),
            (SIGNATURE_HEADER, envelope.signature.clone()),
        ];

        self.transfer
            .post(&self.webhook_url, envelope.body, &headers)
            .await
            .map_err(|e| PipelineError::Notify {
                stored_path: result.stored_path.clone(),
                message: e.to_string(),
            })?;

        info!(
            job_id = result.job_id,
            webhook_url = %self.webhook_url,
            "job_notified"
        );
        Ok(())
    }
}
