//! HTTP Request body types

use std::path::PathBuf;

use serde_json::{Map, Value};

/// One part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Plain text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// In-memory file attachment.
    File {
        /// Field name.
        name: String,
        /// File name sent in the part's `Content-Disposition`.
        file_name: String,
        /// MIME type of the content.
        content_type: String,
        /// Raw file bytes.
        content: Vec<u8>,
    },
    /// File attachment read from disk when the request is sent.
    FilePath {
        /// Field name.
        name: String,
        /// Path to the file.
        path: PathBuf,
    },
}

impl FormPart {
    /// Returns the field name of this part.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } | Self::FilePath { name, .. } => name,
        }
    }

    /// Returns true if this part carries a file.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File { .. } | Self::FilePath { .. })
    }
}

/// An ordered multipart form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    /// Creates an empty form.
    #[must_use]
    pub const fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Builds a form from JSON fields plus file parts.
    ///
    /// Strings are sent as-is, scalars in their JSON text form, and objects or
    /// arrays (geometry, ownership lists) are serialized to a JSON string.
    /// Null fields are omitted.
    #[must_use]
    pub fn from_fields(fields: &Map<String, Value>, files: Vec<FormPart>) -> Self {
        let mut form = Self::new();
        for (name, value) in fields {
            if let Some(text) = field_text(value) {
                form = form.text(name.clone(), text);
            }
        }
        form.parts.extend(files);
        form
    }

    /// Appends a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Appends a JSON value serialized to a string.
    #[must_use]
    pub fn json(self, name: impl Into<String>, value: &Value) -> Self {
        self.text(name, value.to_string())
    }

    /// Appends an in-memory file.
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            content,
        });
        self
    }

    /// Appends a file that is read from disk at send time.
    #[must_use]
    pub fn file_path(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.parts.push(FormPart::FilePath {
            name: name.into(),
            path: path.into(),
        });
        self
    }

    /// Appends an already-built part.
    #[must_use]
    pub fn part(mut self, part: FormPart) -> Self {
        self.parts.push(part);
        self
    }

    /// Returns the parts in order.
    #[must_use]
    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// Returns the text value of the first field named `name`.
    #[must_use]
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            FormPart::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Returns true if any part carries a file.
    #[must_use]
    pub fn has_files(&self) -> bool {
        self.parts.iter().any(FormPart::is_file)
    }
}

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            Some(value.to_string())
        }
    }
}

/// HTTP request body.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    /// No body
    #[default]
    None,
    /// JSON document, sent as `application/json`.
    Json(Value),
    /// Raw content with an explicit content type.
    Raw {
        /// The body content.
        content: String,
        /// The content type (e.g., "text/plain").
        content_type: String,
    },
    /// Multipart form data; the boundary is chosen by the transport.
    Multipart(MultipartForm),
}

impl RequestBody {
    /// Creates a JSON body.
    #[must_use]
    pub const fn json(value: Value) -> Self {
        Self::Json(value)
    }

    /// Creates a raw body that is sent verbatim.
    #[must_use]
    pub fn raw(content: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::Raw {
            content: content.into(),
            content_type: content_type.into(),
        }
    }

    /// Returns the content type for this body, if any.
    ///
    /// Multipart returns `None` because the transport sets it with the boundary.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Json(_) => Some("application/json"),
            Self::Raw { content_type, .. } => Some(content_type),
            Self::None | Self::Multipart(_) => None,
        }
    }

    /// Returns true if this body is empty.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_fields_serializes_json_values() {
        let fields = json!({
            "address": "test address",
            "law_accordance_id": 1,
            "location": {"type": "Polygon", "coordinates": [[[70.0, 40.0]]]},
            "mulk_egalari": [{"mulk_egasi": "A", "mulk_egasi_stir": "111"}],
            "edit_note": null
        });
        let Value::Object(map) = fields else {
            unreachable!()
        };

        let form = MultipartForm::from_fields(&map, Vec::new());

        assert_eq!(form.text_value("address"), Some("test address"));
        assert_eq!(form.text_value("law_accordance_id"), Some("1"));
        assert_eq!(
            form.text_value("location"),
            Some(r#"{"coordinates":[[[70.0,40.0]]],"type":"Polygon"}"#)
        );
        assert_eq!(
            form.text_value("mulk_egalari"),
            Some(r#"[{"mulk_egasi":"A","mulk_egasi_stir":"111"}]"#)
        );
        assert_eq!(form.text_value("edit_note"), None);
        assert!(!form.has_files());
    }

    #[test]
    fn test_file_parts() {
        let form = MultipartForm::new()
            .text("spaceImageId", "TEST_IMAGE_123")
            .file("screenshot", "shot.png", "image/png", vec![1, 2, 3])
            .file_path("governor_decree", "/tmp/decree.pdf");

        assert!(form.has_files());
        assert_eq!(form.parts().len(), 3);
        assert_eq!(form.parts()[1].name(), "screenshot");
    }

    #[test]
    fn test_content_type() {
        assert_eq!(
            RequestBody::json(json!({})).content_type(),
            Some("application/json")
        );
        assert_eq!(RequestBody::raw("x", "text/plain").content_type(), Some("text/plain"));
        assert_eq!(RequestBody::Multipart(MultipartForm::new()).content_type(), None);
        assert!(RequestBody::None.is_none());
    }
}
