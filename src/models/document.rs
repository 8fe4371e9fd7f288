//! Source documents and their per-page extraction results.
//!
//! A `SourceDocument` carries the original bytes (base64) and, once
//! extraction succeeds, the complete ordered list of `PageResult`s.
//! The page list is only ever replaced as a whole.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Media types rendered page by page.
const PAGED_MEDIA_TYPES: &[&str] = &["application/pdf", "application/x-pdf"];

/// Fallback when neither content sniffing nor the extension yields a type.
const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// How a document is routed through the extraction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    /// A single bitmap, recognized as-is.
    Image,
    /// A document of independently renderable pages.
    Paged,
}

impl MediaClass {
    /// Classify a MIME type. Parameters (`; charset=...`) are ignored.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let normalized = media_type
            .split(';')
            .next()
            .unwrap_or(media_type)
            .trim()
            .to_lowercase();

        if normalized.starts_with("image/") {
            Some(MediaClass::Image)
        } else if PAGED_MEDIA_TYPES.contains(&normalized.as_str()) {
            Some(MediaClass::Paged)
        } else {
            None
        }
    }
}

/// An uploaded unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    id: String,
    file_name: String,
    media_type: String,
    encoded_content: String,
    #[serde(default)]
    pages: Vec<PageResult>,
}

impl SourceDocument {
    /// Create a document from raw bytes. The caller assigns the ID.
    pub fn new(
        id: impl Into<String>,
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        content: &[u8],
    ) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            media_type: media_type.into(),
            encoded_content: STANDARD.encode(content),
            pages: Vec::new(),
        }
    }

    /// Create a document from content that is already base64-encoded.
    pub fn from_encoded(
        id: impl Into<String>,
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        encoded_content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            media_type: media_type.into(),
            encoded_content: encoded_content.into(),
            pages: Vec::new(),
        }
    }

    /// Read a file from disk, detecting its media type and assigning a fresh ID.
    ///
    /// Magic bytes win over the file extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read(path)?;
        let media_type = detect_media_type(path, &content);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(
            uuid::Uuid::new_v4().to_string(),
            file_name,
            media_type,
            &content,
        ))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn encoded_content(&self) -> &str {
        &self.encoded_content
    }

    /// Extraction results, ordered by page number. Empty before extraction.
    pub fn pages(&self) -> &[PageResult] {
        &self.pages
    }

    pub fn media_class(&self) -> Option<MediaClass> {
        MediaClass::from_media_type(&self.media_type)
    }

    /// Decode the original document bytes.
    pub fn decoded_content(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.encoded_content.trim())
    }

    /// Replace the page collection in full.
    pub fn with_pages(mut self, pages: Vec<PageResult>) -> Self {
        self.pages = pages;
        self
    }
}

/// Extraction output for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    page_number: u32,
    extracted_text_json: String,
    rendered_image_encoded: String,
    rendered_image_ref: String,
}

impl PageResult {
    pub(crate) fn new(
        page_number: u32,
        extracted_text_json: String,
        image: &[u8],
        image_mime_type: &str,
    ) -> Self {
        let rendered_image_encoded = STANDARD.encode(image);
        let rendered_image_ref = format!(
            "data:{};base64,{}",
            image_mime_type, rendered_image_encoded
        );
        Self {
            page_number,
            extracted_text_json,
            rendered_image_encoded,
            rendered_image_ref,
        }
    }

    /// 1-based page number.
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Structured payload as JSON text.
    pub fn extracted_text_json(&self) -> &str {
        &self.extracted_text_json
    }

    /// Base64 of the bitmap that was recognized.
    pub fn rendered_image_encoded(&self) -> &str {
        &self.rendered_image_encoded
    }

    /// `data:` URL of the same bitmap.
    pub fn rendered_image_ref(&self) -> &str {
        &self.rendered_image_ref
    }

    /// Decode the rendered bitmap bytes.
    pub fn rendered_image(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.rendered_image_encoded)
    }

    /// Parse the structured payload.
    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.extracted_text_json)
    }
}

fn detect_media_type(path: &Path, content: &[u8]) -> String {
    if let Some(kind) = infer::get(content) {
        return kind.mime_type().to_string();
    }
    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| UNKNOWN_MEDIA_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_media_class_routing() {
        assert_eq!(
            MediaClass::from_media_type("image/png"),
            Some(MediaClass::Image)
        );
        assert_eq!(
            MediaClass::from_media_type("IMAGE/JPEG"),
            Some(MediaClass::Image)
        );
        assert_eq!(
            MediaClass::from_media_type("application/pdf; name=x.pdf"),
            Some(MediaClass::Paged)
        );
        assert_eq!(MediaClass::from_media_type("text/plain"), None);
        assert_eq!(MediaClass::from_media_type(""), None);
    }

    #[test]
    fn test_new_encodes_content() {
        let doc = SourceDocument::new("doc-1", "a.png", "image/png", b"abc");
        assert_eq!(doc.encoded_content(), "YWJj");
        assert_eq!(doc.decoded_content().unwrap(), b"abc");
        assert!(doc.pages().is_empty());
    }

    #[test]
    fn test_with_pages_replaces_wholesale() {
        let doc = SourceDocument::new("doc-1", "a.pdf", "application/pdf", b"%PDF");
        let first = doc.with_pages(vec![
            PageResult::new(1, "{}".to_string(), b"one", "image/jpeg"),
            PageResult::new(2, "{}".to_string(), b"two", "image/jpeg"),
        ]);
        assert_eq!(first.pages().len(), 2);

        let second = first.with_pages(vec![PageResult::new(
            1,
            "{}".to_string(),
            b"again",
            "image/jpeg",
        )]);
        assert_eq!(second.pages().len(), 1);
        assert_eq!(second.pages()[0].rendered_image().unwrap(), b"again");
    }

    #[test]
    fn test_page_result_image_ref() {
        let page = PageResult::new(3, "{}".to_string(), b"abc", "image/jpeg");
        assert_eq!(page.page_number(), 3);
        assert_eq!(page.rendered_image_encoded(), "YWJj");
        assert_eq!(page.rendered_image_ref(), "data:image/jpeg;base64,YWJj");
    }

    #[test]
    fn test_serializes_camel_case() {
        let doc = SourceDocument::new("doc-1", "a.png", "image/png", b"abc").with_pages(vec![
            PageResult::new(1, "{}".to_string(), b"abc", "image/png"),
        ]);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["fileName"], "a.png");
        assert_eq!(json["mediaType"], "image/png");
        assert_eq!(json["encodedContent"], "YWJj");
        assert_eq!(json["pages"][0]["pageNumber"], 1);
        assert_eq!(json["pages"][0]["renderedImageEncoded"], "YWJj");
    }

    #[test]
    fn test_deserialize_without_pages() {
        let doc: SourceDocument = serde_json::from_str(
            r#"{"id":"x","fileName":"f.png","mediaType":"image/png","encodedContent":"YWJj"}"#,
        )
        .unwrap();
        assert_eq!(doc.id(), "x");
        assert!(doc.pages().is_empty());
    }

    #[test]
    fn test_from_path_sniffs_magic_bytes() {
        let temp = TempDir::new().unwrap();
        // Extension says PDF, content says PNG.
        let path = temp.path().join("scan.pdf");
        std::fs::write(&path, PNG_MAGIC).unwrap();

        let doc = SourceDocument::from_path(&path).unwrap();
        assert_eq!(doc.media_type(), "image/png");
        assert_eq!(doc.file_name(), "scan.pdf");
        assert!(!doc.id().is_empty());
    }

    #[test]
    fn test_from_path_falls_back_to_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        std::fs::write(&path, b"plain words").unwrap();

        let doc = SourceDocument::from_path(&path).unwrap();
        assert_eq!(doc.media_type(), "text/plain");
        assert_eq!(doc.media_class(), None);
    }
}
