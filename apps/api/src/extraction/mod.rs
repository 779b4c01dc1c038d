//! Extraction hook: pluggable, best-effort enrichment of a freshly uploaded résumé.
//!
//! `ResumeStore` holds an `Option<Arc<dyn Extractor>>` and calls it once after a
//! record is created. Whatever the hook returns is merged non-destructively:
//! a value only lands in a field that is currently empty.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

#[cfg(test)]
use crate::models::resume::{Resume, ResumeChanges};
use crate::resumes::schema::ResumeField;
#[cfg(test)]
use crate::resumes::wire::text_of;
use crate::storage::FileLocation;

/// Structured values an extractor derived from a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExtractedFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub full_text: Option<String>,
}

/// Implement this to plug real parsing in without touching the store or handlers.
///
/// `Ok(None)` means "nothing found"; errors are logged by the caller and never
/// fail ingestion.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, location: &FileLocation) -> anyhow::Result<Option<ExtractedFields>>;
}

/// Default hook: records where the file landed and extracts nothing.
pub struct LoggingExtractor;

#[async_trait]
impl Extractor for LoggingExtractor {
    async fn extract(&self, location: &FileLocation) -> anyhow::Result<Option<ExtractedFields>> {
        info!(
            key = %location.key,
            "File stored at {}; no parser configured, skipping extraction",
            location.uri
        );
        Ok(None)
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

impl ExtractedFields {
    /// Non-blank extracted values paired with the record field they may fill.
    pub fn candidates(&self) -> Vec<(ResumeField, &str)> {
        [
            (ResumeField::FullName, &self.name),
            (ResumeField::Email, &self.email),
            (ResumeField::Phone, &self.phone),
            (ResumeField::FullTextContent, &self.full_text),
        ]
        .into_iter()
        .filter_map(|(field, value)| {
            let value = value.as_deref()?;
            (!is_blank(Some(value))).then_some((field, value))
        })
        .collect()
    }
}

/// Changes that write extracted values into the record's empty fields only.
///
/// Must be evaluated against the row as it is at write time. `PgResumeRepository`
/// does the same check inside its UPDATE; this is the in-memory form.
#[cfg(test)]
pub fn merge_extracted(resume: &Resume, extracted: &ExtractedFields) -> ResumeChanges {
    let mut changes = ResumeChanges::default();
    for (field, value) in extracted.candidates() {
        if !is_blank(text_of(resume, field)) {
            continue;
        }
        let slot = match field {
            ResumeField::FullName => &mut changes.full_name,
            ResumeField::Email => &mut changes.email,
            ResumeField::Phone => &mut changes.phone,
            ResumeField::FullTextContent => &mut changes.full_text_content,
            _ => continue,
        };
        *slot = Some(Some(value.to_string()));
    }
    changes
}
