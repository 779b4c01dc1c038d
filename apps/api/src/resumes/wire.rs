use serde_json::{json, Map, Value};

use crate::models::resume::{Resume, ResumeSource, ResumeStatus};
use crate::resumes::schema::{FieldKind, ResumeField, RESUME_FIELDS};

/// Textual value of a field as stored and searched. Choices yield their code.
pub fn text_of(resume: &Resume, field: ResumeField) -> Option<&str> {
    match field {
        ResumeField::FullName => resume.full_name.as_deref(),
        ResumeField::Email => resume.email.as_deref(),
        ResumeField::Phone => resume.phone.as_deref(),
        ResumeField::LinkedinUrl => resume.linkedin_url.as_deref(),
        ResumeField::EducationSummary => resume.education_summary.as_deref(),
        ResumeField::ExperienceSummary => resume.experience_summary.as_deref(),
        ResumeField::SkillsSummary => resume.skills_summary.as_deref(),
        ResumeField::FullTextContent => resume.full_text_content.as_deref(),
        ResumeField::OriginalFile => Some(&resume.original_file),
        ResumeField::Source => Some(resume.source.code()),
        ResumeField::Status => Some(resume.status.code()),
        ResumeField::Notes => resume.notes.as_deref(),
        ResumeField::ExtractionState => Some(resume.extraction_state.code()),
        ResumeField::Id
        | ResumeField::OriginalFileUrl
        | ResumeField::UploadedAt
        | ResumeField::UpdatedAt => None,
    }
}

fn label_of(resume: &Resume, field: ResumeField) -> Option<&'static str> {
    match field {
        ResumeField::Source => Some(resume.source.label()),
        ResumeField::Status => Some(resume.status.label()),
        _ => None,
    }
}

/// Absolute URL under which `/media/*key` serves a stored file.
pub fn file_url(base_url: &str, key: &str) -> String {
    format!("{}/media/{}", base_url.trim_end_matches('/'), key)
}

/// Encodes a record in wire form. Client-facing choices also get a `<name>_display` label.
pub fn encode_resume(resume: &Resume, base_url: Option<&str>) -> Value {
    let mut body = Map::new();
    for spec in RESUME_FIELDS {
        let value = match (spec.kind, spec.field) {
            (FieldKind::Id, _) => json!(resume.id),
            (FieldKind::Timestamp, ResumeField::UploadedAt) => json!(resume.uploaded_at),
            (FieldKind::Timestamp, _) => json!(resume.updated_at),
            (FieldKind::FileUrl, _) => base_url
                .map(|base| Value::String(file_url(base, &resume.original_file)))
                .unwrap_or(Value::Null),
            (_, field) => text_of(resume, field)
                .map(|text| Value::String(text.to_string()))
                .unwrap_or(Value::Null),
        };
        body.insert(spec.name.to_string(), value);

        if let Some(label) = label_of(resume, spec.field) {
            body.insert(format!("{}_display", spec.name), json!(label));
        }
    }
    Value::Object(body)
}

/// Both client-facing enumerations as `[{value, label}]` lists.
pub fn encode_choices() -> Value {
    let source: Vec<Value> = ResumeSource::ALL
        .into_iter()
        .map(|s| json!({ "value": s.code(), "label": s.label() }))
        .collect();
    let status: Vec<Value> = ResumeStatus::ALL
        .into_iter()
        .map(|s| json!({ "value": s.code(), "label": s.label() }))
        .collect();
    json!({ "source": source, "status": status })
}
