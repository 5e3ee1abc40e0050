//! HTTP request body builder.
//!
//! Turns the domain [`RequestBody`] into something reqwest can send.
//! File parts given by path are read here, so a missing attachment
//! surfaces as a [`BodyBuildError`] before anything is sent.

use std::path::Path;

use cadastre_domain::{FormPart, MultipartForm, RequestBody};
use reqwest::multipart::{Form, Part};

/// Error type for body building operations.
#[derive(Debug, thiserror::Error)]
pub enum BodyBuildError {
    /// Failed to read a file part.
    #[error("failed to read {path}: {message}")]
    FileRead {
        /// File that failed.
        path: String,
        /// Underlying error.
        message: String,
    },

    /// A part declared an unusable MIME type.
    #[error("invalid MIME type {mime} for part {part}")]
    InvalidMime {
        /// Part name.
        part: String,
        /// The rejected MIME type.
        mime: String,
    },

    /// The JSON body could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A body ready to attach to a reqwest request.
pub enum BuiltBody {
    /// No body.
    None,
    /// Text body with its content type.
    Text {
        /// The body content.
        content: String,
        /// The content type.
        content_type: String,
    },
    /// Multipart form data.
    Multipart(Form),
}

impl BuiltBody {
    /// Content type to send, unless the transport chooses it.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Text { content_type, .. } => Some(content_type),
            // reqwest sets multipart content type with the boundary
            Self::None | Self::Multipart(_) => None,
        }
    }
}

/// Builds a sendable body.
///
/// Raw bodies are sent verbatim, without validation, so deliberately
/// malformed JSON reaches the server as written.
///
/// # Errors
///
/// Returns an error if a file part cannot be read or declares an invalid
/// MIME type.
pub async fn build_body(body: &RequestBody) -> Result<BuiltBody, BodyBuildError> {
    match body {
        RequestBody::None => Ok(BuiltBody::None),
        RequestBody::Json(value) => {
            let content = serde_json::to_string(value)
                .map_err(|e| BodyBuildError::Serialization(e.to_string()))?;
            Ok(BuiltBody::Text {
                content,
                content_type: mime::APPLICATION_JSON.to_string(),
            })
        }
        RequestBody::Raw {
            content,
            content_type,
        } => Ok(BuiltBody::Text {
            content: content.clone(),
            content_type: content_type.clone(),
        }),
        RequestBody::Multipart(form) => Ok(BuiltBody::Multipart(build_multipart_form(form).await?)),
    }
}

/// Build a multipart form, reading file parts given by path.
async fn build_multipart_form(form: &MultipartForm) -> Result<Form, BodyBuildError> {
    let mut multipart = Form::new();
    for part in form.parts() {
        multipart = match part {
            FormPart::Text { name, value } => multipart.text(name.clone(), value.clone()),
            FormPart::File {
                name,
                file_name,
                content_type,
                content,
            } => {
                let part = file_part(name, content.clone(), file_name.clone(), content_type)?;
                multipart.part(name.clone(), part)
            }
            FormPart::FilePath { name, path } => {
                let (content, file_name, content_type) = read_file(path).await?;
                let part = file_part(name, content, file_name, &content_type)?;
                multipart.part(name.clone(), part)
            }
        };
    }
    Ok(multipart)
}

fn file_part(
    name: &str,
    content: Vec<u8>,
    file_name: String,
    content_type: &str,
) -> Result<Part, BodyBuildError> {
    Part::bytes(content)
        .file_name(file_name)
        .mime_str(content_type)
        .map_err(|_| BodyBuildError::InvalidMime {
            part: name.to_string(),
            mime: content_type.to_string(),
        })
}

/// Reads a file and guesses its name and MIME type from the path.
async fn read_file(path: &Path) -> Result<(Vec<u8>, String, String), BodyBuildError> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|e| BodyBuildError::FileRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_string();
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();
    Ok((content, file_name, content_type))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[tokio::test]
    async fn test_build_json_body() {
        let body = RequestBody::json(serde_json::json!({"verified": true}));
        match build_body(&body).await.unwrap() {
            BuiltBody::Text {
                content,
                content_type,
            } => {
                assert_eq!(content_type, "application/json");
                assert_eq!(content, r#"{"verified":true}"#);
            }
            _ => panic!("Expected Text body"),
        }
    }

    #[tokio::test]
    async fn test_raw_body_is_not_validated() {
        let body = RequestBody::raw("{invalid json", "application/json");
        match build_body(&body).await.unwrap() {
            BuiltBody::Text { content, .. } => assert_eq!(content, "{invalid json"),
            _ => panic!("Expected Text body"),
        }
    }

    #[tokio::test]
    async fn test_multipart_reads_file_parts() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"%PDF-1.4").unwrap();
        let form = MultipartForm::default()
            .text("uidSPUnit", "abc")
            .file_path("governor_decree", file.path());

        let built = build_body(&RequestBody::Multipart(form)).await.unwrap();
        assert_eq!(built.content_type(), None);
        assert!(matches!(built, BuiltBody::Multipart(_)));
    }

    #[tokio::test]
    async fn test_missing_file_part_is_an_error() {
        let form = MultipartForm::default().file_path("governor_decree", "/nonexistent/plan.pdf");
        let err = build_body(&RequestBody::Multipart(form)).await.err().unwrap();
        assert!(matches!(err, BodyBuildError::FileRead { .. }));
    }

    #[tokio::test]
    async fn test_invalid_mime_is_an_error() {
        let form = MultipartForm::default().file("screenshot", "a.png", "not a mime", vec![1]);
        let err = build_body(&RequestBody::Multipart(form)).await.err().unwrap();
        assert!(matches!(err, BodyBuildError::InvalidMime { .. }));
    }

    #[tokio::test]
    async fn test_read_file_guesses_mime() {
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        let (_, name, mime) = read_file(file.path()).await.unwrap();
        assert!(name.ends_with(".png"));
        assert_eq!(mime, "image/png");
    }
}
