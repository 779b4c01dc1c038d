//! Request decoding for create/update.
//!
//! Accepts multipart, urlencoded and JSON bodies, normalises them to
//! `(name, RawValue)` pairs, then validates against the schema. Read-only and
//! unknown fields are dropped; bad values are collected per field.

use async_trait::async_trait;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use serde_json::{Map, Value};
use tracing::debug;
use validator::{ValidateEmail, ValidateUrl};

use crate::errors::{AppError, FieldErrors};
use crate::models::resume::{ResumeChanges, ResumeSource, ResumeStatus};
use crate::resumes::schema::{self, FieldKind, ResumeField};

pub const NO_FILE_SUBMITTED: &str = "No file was submitted.";

#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug)]
pub enum RawValue {
    Null,
    Text(String),
    File(Upload),
    /// A JSON value of a type no field accepts, named for error messages.
    Other(&'static str),
}

/// Validated create/update payload.
#[derive(Debug, Default)]
pub struct Submission {
    pub changes: ResumeChanges,
    pub file: Option<Upload>,
}

#[derive(Debug, Default)]
pub struct ResumeForm {
    values: Vec<(String, RawValue)>,
}

impl ResumeForm {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(name, value)| (name, RawValue::Text(value)))
                .collect(),
        }
    }

    pub fn from_json(body: Map<String, Value>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let mut values = Vec::with_capacity(body.len());
        for (name, value) in body {
            let raw = match value {
                Value::Null => RawValue::Null,
                Value::String(s) => RawValue::Text(s),
                Value::Number(n) => RawValue::Text(n.to_string()),
                Value::Bool(_) => RawValue::Other("boolean"),
                Value::Array(_) => RawValue::Other("array"),
                Value::Object(object) if name == "original_file" => match decode_json_file(&object) {
                    Ok(upload) => RawValue::File(upload),
                    Err(message) => {
                        errors.add(&name, message);
                        continue;
                    }
                },
                Value::Object(_) => RawValue::Other("object"),
            };
            values.push((name, raw));
        }
        errors.into_result(Self { values })
    }

    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut values = Vec::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name.is_empty() {
                continue;
            }
            match field.file_name().map(String::from) {
                Some(filename) => {
                    let content_type = field.content_type().map(String::from);
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Read error: {e}")))?;
                    // Browsers send an empty, unnamed part when no file was chosen.
                    if filename.is_empty() && data.is_empty() {
                        continue;
                    }
                    values.push((
                        name,
                        RawValue::File(Upload {
                            filename,
                            content_type,
                            data,
                        }),
                    ));
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Read error: {e}")))?;
                    values.push((name, RawValue::Text(text)));
                }
            }
        }
        Ok(Self { values })
    }

    /// Validates every writable field. Later duplicates win.
    pub fn into_submission(self) -> Result<Submission, FieldErrors> {
        self.validate(false)
    }

    /// Like `into_submission`, and a missing file is reported with the other
    /// field errors.
    pub fn into_new_submission(self) -> Result<Submission, FieldErrors> {
        self.validate(true)
    }

    fn validate(self, require_file: bool) -> Result<Submission, FieldErrors> {
        let mut submission = Submission::default();
        let mut errors = FieldErrors::default();

        for (name, value) in self.values {
            let Some(spec) = schema::field(&name) else {
                debug!(field = %name, "Ignoring unknown field");
                continue;
            };
            if !spec.is_writable() {
                debug!(field = %name, "Ignoring read-only field");
                continue;
            }

            match spec.kind {
                FieldKind::File => match value {
                    RawValue::File(upload) if upload.data.is_empty() => {
                        errors.add(spec.name, "The submitted file is empty.")
                    }
                    RawValue::File(upload) => submission.file = Some(upload),
                    RawValue::Null => {}
                    RawValue::Text(text) if text.is_empty() => {}
                    _ => errors.add(
                        spec.name,
                        "The submitted data was not a file. Check the encoding type on the form.",
                    ),
                },
                FieldKind::Choice => match value {
                    RawValue::Text(code) => {
                        let changes = &mut submission.changes;
                        let parsed = match spec.field {
                            ResumeField::Source => code
                                .parse::<ResumeSource>()
                                .map(|v| changes.source = Some(v)),
                            ResumeField::Status => code
                                .parse::<ResumeStatus>()
                                .map(|v| changes.status = Some(v)),
                            _ => Ok(()),
                        };
                        if let Err(e) = parsed {
                            errors.add(spec.name, e.to_string());
                        }
                    }
                    RawValue::Null => errors.add(spec.name, "This field may not be null."),
                    RawValue::File(_) => errors.add(spec.name, "\"file\" is not a valid choice."),
                    RawValue::Other(kind) => {
                        errors.add(spec.name, format!("\"{kind}\" is not a valid choice."))
                    }
                },
                FieldKind::Text { .. }
                | FieldKind::Email { .. }
                | FieldKind::Url { .. }
                | FieldKind::LongText => match value {
                    RawValue::Null => set_text(&mut submission.changes, spec.field, None),
                    RawValue::Text(text) => {
                        let text = text.trim().to_string();
                        match check_text(spec.kind, &text) {
                            Ok(()) => set_text(&mut submission.changes, spec.field, Some(text)),
                            Err(message) => errors.add(spec.name, message),
                        }
                    }
                    RawValue::File(_) | RawValue::Other(_) => {
                        errors.add(spec.name, "Not a valid string.")
                    }
                },
                FieldKind::Id | FieldKind::FileUrl | FieldKind::Timestamp => {}
            }
        }

        if require_file && submission.file.is_none() && !errors.contains("original_file") {
            errors.add("original_file", NO_FILE_SUBMITTED);
        }
        errors.into_result(submission)
    }
}

#[async_trait]
impl<S> FromRequest<S> for ResumeForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Self::from_multipart(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self::from_pairs(pairs))
        } else if content_type.is_empty() {
            // No declared type: an empty body is an empty form, anything else must be JSON.
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            if body.iter().all(u8::is_ascii_whitespace) {
                return Ok(Self::default());
            }
            let body: Map<String, Value> = serde_json::from_slice(&body)
                .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?;
            Self::from_json(body).map_err(AppError::Validation)
        } else {
            let Json(body) = Json::<Map<String, Value>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Self::from_json(body).map_err(AppError::Validation)
        }
    }
}

/// `{"name": "cv.pdf", "content": "<base64>"}`
fn decode_json_file(object: &Map<String, Value>) -> Result<Upload, String> {
    let filename = object
        .get("name")
        .and_then(Value::as_str)
        .ok_or("File object needs a \"name\" string.")?;
    let content = object
        .get("content")
        .and_then(Value::as_str)
        .ok_or("File object needs a base64 \"content\" string.")?;
    let data = BASE64
        .decode(content)
        .map_err(|e| format!("File content is not valid base64: {e}"))?;
    Ok(Upload {
        filename: filename.to_string(),
        content_type: object
            .get("content_type")
            .and_then(Value::as_str)
            .map(String::from),
        data: Bytes::from(data),
    })
}

fn check_text(kind: FieldKind, text: &str) -> Result<(), String> {
    let max_len = match kind {
        FieldKind::Text { max_len } | FieldKind::Email { max_len } | FieldKind::Url { max_len } => {
            Some(max_len)
        }
        _ => None,
    };
    if let Some(max_len) = max_len {
        if text.chars().count() > max_len {
            return Err(format!(
                "Ensure this field has no more than {max_len} characters."
            ));
        }
    }
    if text.is_empty() {
        return Ok(());
    }
    match kind {
        FieldKind::Email { .. } if !text.validate_email() => {
            Err("Enter a valid email address.".to_string())
        }
        FieldKind::Url { .. } if !text.validate_url() => Err("Enter a valid URL.".to_string()),
        _ => Ok(()),
    }
}

fn set_text(changes: &mut ResumeChanges, field: ResumeField, value: Option<String>) {
    let slot = match field {
        ResumeField::FullName => &mut changes.full_name,
        ResumeField::Email => &mut changes.email,
        ResumeField::Phone => &mut changes.phone,
        ResumeField::LinkedinUrl => &mut changes.linkedin_url,
        ResumeField::EducationSummary => &mut changes.education_summary,
        ResumeField::ExperienceSummary => &mut changes.experience_summary,
        ResumeField::SkillsSummary => &mut changes.skills_summary,
        ResumeField::Notes => &mut changes.notes,
        _ => return,
    };
    *slot = Some(value);
}
