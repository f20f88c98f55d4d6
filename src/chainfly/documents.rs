use crate::chainfly::client::{segment, ApiClient};
use crate::chainfly::error::{ApiError, ApiResult};
use crate::chainfly::types::{Document, DocumentType, OcrResult};
use reqwest::multipart::{Form, Part};
use std::path::Path;

/// Uploads above this are refused before anything is sent.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub struct DocumentsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn documents(&self) -> DocumentsApi<'_> {
        DocumentsApi { client: self }
    }
}

impl DocumentsApi<'_> {
    /// Multipart upload with fields `file`, `document_type` and, when given,
    /// `loan_application_id`.
    pub async fn upload(
        &self,
        file_name: &str,
        content: Vec<u8>,
        document_type: DocumentType,
        loan_application_id: Option<&str>,
    ) -> ApiResult<Document> {
        check_size(file_name, content.len() as u64)?;

        let part = Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        let mut form = Form::new()
            .part("file", part)
            .text("document_type", document_type.as_str());
        if let Some(id) = loan_application_id {
            form = form.text("loan_application_id", id.to_string());
        }
        self.client.upload("/documents/upload", form).await
    }

    /// Read a local file and upload it under its own file name. The size
    /// limit is checked from metadata before the file is read.
    pub async fn upload_path(
        &self,
        path: &Path,
        document_type: DocumentType,
        loan_application_id: Option<&str>,
    ) -> ApiResult<Document> {
        let unreadable =
            |e: std::io::Error| ApiError::InvalidRequest(format!("Cannot read {}: {e}", path.display()));
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin");

        let meta = tokio::fs::metadata(path).await.map_err(unreadable)?;
        check_size(file_name, meta.len())?;
        let content = tokio::fs::read(path).await.map_err(unreadable)?;
        self.upload(file_name, content, document_type, loan_application_id)
            .await
    }

    pub async fn get(&self, id: &str) -> ApiResult<Document> {
        self.client
            .get(&format!("/documents/{}", segment(id)))
            .await
    }

    pub async fn ocr(&self, id: &str) -> ApiResult<OcrResult> {
        self.client
            .post_empty(&format!("/documents/{}/ocr", segment(id)))
            .await
    }
}

fn check_size(file_name: &str, len: u64) -> ApiResult<()> {
    if len > MAX_UPLOAD_BYTES as u64 {
        return Err(ApiError::InvalidRequest(format!(
            "File size must be less than 10MB ({file_name} is {len} bytes)"
        )));
    }
    Ok(())
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "xml" => "application/xml",
        _ => "application/octet-stream",
    }
}
