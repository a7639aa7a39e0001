// src/services/pdf.rs

use crate::error::AppError;

const UNREADABLE_PDF: &str =
    "Failed to parse PDF. Ensure it contains selectable text (not scanned images).";

/// Extracts plain text from an uploaded PDF.
///
/// Runs on the blocking pool. The extractor can panic on malformed files, which is
/// reported the same way as a read error.
pub async fn extract_text(bytes: Vec<u8>) -> Result<String, AppError> {
    let size = bytes.len();

    let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| {
            tracing::warn!(size, "PDF extractor aborted: {}", e);
            AppError::Extraction(UNREADABLE_PDF.to_string())
        })?;

    match extracted {
        Ok(text) => {
            tracing::debug!(size, chars = text.len(), "extracted text from PDF");
            Ok(text)
        }
        Err(e) => {
            tracing::warn!(size, "PDF text extraction failed: {}", e);
            Err(AppError::Extraction(UNREADABLE_PDF.to_string()))
        }
    }
}
