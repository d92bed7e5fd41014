//! Request and response model for online processing.
//!
//! Field names follow the REST (JSON) mapping of the service's
//! `ProcessRequest` / `ProcessResponse` messages. Unknown response fields are
//! ignored so newer service output does not break decoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize, Serializer};

use crate::ProcessError;

/// Unparsed file bytes plus their declared MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    #[serde(serialize_with = "as_base64")]
    pub content: Vec<u8>,
    pub mime_type: String,
}

impl RawDocument {
    /// Wrap `content`; empty content is rejected.
    ///
    /// The MIME type is passed through verbatim; the service decides whether
    /// it matches the bytes.
    pub fn new(content: Vec<u8>, mime_type: impl Into<String>) -> Result<Self, ProcessError> {
        if content.is_empty() {
            return Err(ProcessError::EmptyDocument);
        }
        Ok(Self {
            content,
            mime_type: mime_type.into(),
        })
    }
}

fn as_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

/// A single online-processing request addressed to one processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    /// Full resource name of the processor.
    pub name: String,
    pub raw_document: RawDocument,
}

/// Wire response. `document` is absent only when the service returns an
/// empty message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    #[serde(default)]
    pub document: Option<Document>,
}

/// The processed document as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    pub text: String,
    pub mime_type: Option<String>,
    pub pages: Vec<Page>,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    /// 1-based page number.
    pub page_number: u32,
    pub dimension: Option<Dimension>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Dimension {
    pub width: f32,
    pub height: f32,
    pub unit: String,
}

/// An extracted entity (e.g. `invoice_id`, `total_amount`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub mention_text: String,
    pub confidence: f32,
}

/// Read-only view over a successful response, owned by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingResult {
    document: Document,
}

impl ProcessingResult {
    /// Extracted text; empty when the service returned none.
    pub fn text(&self) -> &str {
        &self.document.text
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

impl From<ProcessResponse> for ProcessingResult {
    fn from(resp: ProcessResponse) -> Self {
        Self {
            document: resp.document.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_rejected() {
        let err = RawDocument::new(Vec::new(), "application/pdf").unwrap_err();
        assert!(matches!(err, ProcessError::EmptyDocument));
    }

    #[test]
    fn request_wire_shape() {
        let req = ProcessRequest {
            name: "projects/p/locations/us/processors/x".into(),
            raw_document: RawDocument::new(b"%PDF-1.7".to_vec(), "application/pdf").unwrap(),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["name"], "projects/p/locations/us/processors/x");
        assert_eq!(v["rawDocument"]["mimeType"], "application/pdf");
        assert_eq!(v["rawDocument"]["content"], "JVBERi0xLjc=");
    }

    #[test]
    fn response_with_structure() {
        let json = r#"{
            "document": {
                "mimeType": "application/pdf",
                "text": "Invoice 42\nTotal: 10.00\n",
                "pages": [
                    {"pageNumber": 1, "dimension": {"width": 612, "height": 792, "unit": "points"}, "layout": {}}
                ],
                "entities": [
                    {"type": "invoice_id", "mentionText": "42", "confidence": 0.98, "id": "0"}
                ],
                "uri": ""
            },
            "humanReviewStatus": {"state": "SKIPPED"}
        }"#;
        let resp: ProcessResponse = serde_json::from_str(json).unwrap();
        let result = ProcessingResult::from(resp);
        assert_eq!(result.text(), "Invoice 42\nTotal: 10.00\n");

        let doc = result.document();
        assert_eq!(doc.mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].page_number, 1);
        assert_eq!(doc.pages[0].dimension.as_ref().unwrap().unit, "points");
        assert_eq!(doc.entities[0].entity_type, "invoice_id");
        assert_eq!(doc.entities[0].mention_text, "42");
    }

    #[test]
    fn missing_document_yields_empty_text() {
        let resp: ProcessResponse = serde_json::from_str("{}").unwrap();
        let result = ProcessingResult::from(resp);
        assert_eq!(result.text(), "");
        assert!(result.document().pages.is_empty());
    }

    #[test]
    fn document_without_text_field() {
        let resp: ProcessResponse =
            serde_json::from_str(r#"{"document": {"pages": []}}"#).unwrap();
        assert_eq!(ProcessingResult::from(resp).text(), "");
    }
}
