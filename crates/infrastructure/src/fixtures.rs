//! Attachments used by upload scenarios.

use std::path::Path;

use cadastre_domain::FormPart;

/// A valid 1x1 RGBA PNG.
pub const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

/// A minimal single-page PDF.
pub const STUB_PDF: &[u8] = b"%PDF-1.4
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj
3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 72 72] >> endobj
trailer << /Root 1 0 R >>
%%EOF
";

/// The PNG as a form part named `name`.
#[must_use]
pub fn png_part(name: &str) -> FormPart {
    FormPart::File {
        name: name.to_string(),
        file_name: "test_screenshot.png".to_string(),
        content_type: mime::IMAGE_PNG.to_string(),
        content: PNG_1X1.to_vec(),
    }
}

/// A PDF part: the configured file when it exists, else [`STUB_PDF`].
#[must_use]
pub fn pdf_part(name: &str, file_name: &str, configured: Option<&Path>) -> FormPart {
    match configured.filter(|path| path.is_file()) {
        Some(path) => FormPart::FilePath {
            name: name.to_string(),
            path: path.to_path_buf(),
        },
        None => FormPart::File {
            name: name.to_string(),
            file_name: file_name.to_string(),
            content_type: mime::APPLICATION_PDF.to_string(),
            content: STUB_PDF.to_vec(),
        },
    }
}

/// The configured attachment, only if it exists on disk.
#[must_use]
pub fn configured_attachment(configured: Option<&Path>) -> Option<&Path> {
    configured.filter(|path| path.is_file())
}
