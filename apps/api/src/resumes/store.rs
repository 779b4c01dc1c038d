//! Résumé record store. The one place that coordinates rows, stored files and
//! the extraction hook.
//!
//! Ordering rules:
//! - files are written before the row that references them; a failed row write
//!   removes the new file again,
//! - a replaced or deleted record's old file is released after the row change,
//!   best-effort,
//! - extraction never fails a create.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{AppError, FieldErrors};
use crate::extraction::{ExtractedFields, Extractor};
use crate::models::resume::{ExtractionState, Resume};
use crate::resumes::form::{Submission, Upload, NO_FILE_SUBMITTED};
use crate::resumes::query::ListQuery;
use crate::resumes::repository::ResumeRepository;
use crate::storage::{resume_upload_path, FileStorage};

#[derive(Clone)]
pub struct ResumeStore {
    repo: Arc<dyn ResumeRepository>,
    storage: Arc<dyn FileStorage>,
    extractor: Option<Arc<dyn Extractor>>,
    extraction_timeout: Duration,
}

impl ResumeStore {
    pub fn new(
        repo: Arc<dyn ResumeRepository>,
        storage: Arc<dyn FileStorage>,
        extractor: Option<Arc<dyn Extractor>>,
        extraction_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            storage,
            extractor,
            extraction_timeout,
        }
    }

    pub async fn create(&self, submission: Submission) -> Result<Resume, AppError> {
        let Submission { changes, file } = submission;
        let upload = file.ok_or_else(|| {
            AppError::Validation(FieldErrors::single("original_file", NO_FILE_SUBMITTED))
        })?;

        let key = self.store_file(&upload).await?;

        let mut resume = Resume::new(key.clone(), Utc::now());
        resume.apply(&changes);
        // Server-owned fields are never taken from the client.
        resume.full_text_content = None;
        resume.extraction_state = ExtractionState::Pending;

        let resume = match self.repo.insert(&resume).await {
            Ok(resume) => resume,
            Err(e) => {
                self.release_file(&key).await;
                return Err(e);
            }
        };
        info!(id = %resume.id, file = %resume.original_file, "Created resume");

        Ok(self.run_extraction(resume).await)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Resume>, AppError> {
        self.repo.list(query).await
    }

    pub async fn retrieve(&self, id: Uuid) -> Result<Resume, AppError> {
        self.repo
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
    }

    pub async fn update(&self, id: Uuid, submission: Submission) -> Result<Resume, AppError> {
        let Submission { mut changes, file } = submission;
        if file.is_some() {
            // Fail before writing a file for an id that does not exist.
            self.retrieve(id).await?;
        }

        let new_key = match file {
            Some(upload) => {
                let key = self.store_file(&upload).await?;
                changes.original_file = Some(key.clone());
                Some(key)
            }
            None => None,
        };

        let updated = match self.repo.update(id, &changes).await {
            Ok(Some(updated)) => updated,
            outcome => {
                if let Some(key) = &new_key {
                    self.release_file(key).await;
                }
                return match outcome {
                    Err(e) => Err(e),
                    _ => Err(AppError::NotFound(format!("Resume {id} not found"))),
                };
            }
        };

        // The key the row held at write time, not at request time.
        if new_key.is_some() && updated.previous_file != updated.resume.original_file {
            self.release_file(&updated.previous_file).await;
        }
        info!(id = %id, status = %updated.resume.status, "Updated resume");
        Ok(updated.resume)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let deleted = self
            .repo
            .delete(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
        self.release_file(&deleted.original_file).await;
        info!(id = %id, "Deleted resume");
        Ok(())
    }

    async fn store_file(&self, upload: &Upload) -> Result<String, AppError> {
        let key = resume_upload_path(&upload.filename);
        self.storage
            .put(&key, upload.data.clone(), upload.content_type.as_deref())
            .await?;
        info!(
            key = %key,
            bytes = upload.data.len(),
            "Stored upload '{}'",
            upload.filename
        );
        Ok(key)
    }

    async fn release_file(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            warn!(key, "Failed to release stored file: {e}");
        }
    }

    /// Invokes the hook and records its outcome. Always returns a record:
    /// on any failure the freshly inserted one is handed back untouched.
    async fn run_extraction(&self, resume: Resume) -> Resume {
        let (state, extracted) = match &self.extractor {
            Some(extractor) => self.extract(extractor, &resume).await,
            None => (ExtractionState::Skipped, None),
        };

        match self
            .repo
            .record_extraction(resume.id, state, extracted.as_ref())
            .await
        {
            Ok(Some(updated)) => updated,
            Ok(None) => resume,
            Err(e) => {
                warn!(id = %resume.id, "Failed to record extraction outcome: {e}");
                resume
            }
        }
    }

    async fn extract(
        &self,
        extractor: &Arc<dyn Extractor>,
        resume: &Resume,
    ) -> (ExtractionState, Option<ExtractedFields>) {
        let location = self.storage.locate(&resume.original_file);
        let extractor = Arc::clone(extractor);
        // Own task so a panicking hook is contained like an error.
        let task = tokio::spawn(async move { extractor.extract(&location).await });
        let abort = task.abort_handle();

        match timeout(self.extraction_timeout, task).await {
            Ok(Ok(Ok(Some(fields)))) => {
                info!(id = %resume.id, "Extraction completed");
                (ExtractionState::Completed, Some(fields))
            }
            Ok(Ok(Ok(None))) => (ExtractionState::Empty, None),
            Ok(Ok(Err(e))) => {
                warn!(id = %resume.id, "Extraction failed: {e:#}");
                (ExtractionState::Failed, None)
            }
            Ok(Err(e)) => {
                warn!(id = %resume.id, "Extraction task aborted: {e}");
                (ExtractionState::Failed, None)
            }
            Err(_) => {
                abort.abort();
                warn!(
                    id = %resume.id,
                    "Extraction timed out after {:?}",
                    self.extraction_timeout
                );
                (ExtractionState::Failed, None)
            }
        }
    }
}
