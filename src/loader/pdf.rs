//! PDF text extraction.

use super::{persist_upload, SourceDocument, UploadedFile};
use crate::error::{HjelperError, Result};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Extract one document per page from a PDF upload.
///
/// The upload is written to a temporary file for the duration of the
/// extraction and deleted afterwards.
#[instrument(skip(file, temp_dir), fields(name = %file.name, bytes = file.len()))]
pub async fn load_pdf(file: &UploadedFile, temp_dir: &Path) -> Result<Vec<SourceDocument>> {
    let tmp = persist_upload(file, temp_dir, ".pdf")?;
    let path: PathBuf = tmp.path().to_path_buf();
    let name = file.name.clone();

    // pdf-extract is synchronous and may panic on malformed input
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
        .await
        .map_err(|e| HjelperError::Pdf(format!("{}: extraction aborted: {}", name, e)))?
        .map_err(|e| HjelperError::Pdf(format!("{}: {}", name, e)))?;

    drop(tmp);

    let pages = split_pages(&text, &file.name);
    info!("Extracted {} page(s)", pages.len());
    Ok(pages)
}

/// Load every upload and concatenate their pages in upload order.
pub async fn load_pdfs(files: &[UploadedFile], temp_dir: &Path) -> Result<Vec<SourceDocument>> {
    let loaded = futures::future::try_join_all(files.iter().map(|f| load_pdf(f, temp_dir))).await?;
    Ok(loaded.into_iter().flatten().collect())
}

/// pdf-extract separates pages with form feeds.
fn split_pages(text: &str, source: &str) -> Vec<SourceDocument> {
    let trimmed = text.strip_suffix('\x0c').unwrap_or(text);
    trimmed
        .split('\x0c')
        .enumerate()
        .map(|(page, content)| SourceDocument::new(content, source, page))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pages_on_form_feed() {
        let pages = split_pages("first page\x0csecond page\x0c", "report.pdf");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0], SourceDocument::new("first page", "report.pdf", 0));
        assert_eq!(pages[1].page, 1);
        assert_eq!(pages[1].content, "second page");
    }

    #[test]
    fn test_single_page_without_separator() {
        let pages = split_pages("only page", "a.pdf");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page, 0);
    }

    #[tokio::test]
    async fn test_malformed_pdf_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = UploadedFile::new("broken.pdf", b"this is not a pdf".to_vec());

        let err = load_pdf(&file, dir.path()).await.unwrap_err();
        assert!(matches!(err, HjelperError::Pdf(_)));
        assert!(err.to_string().contains("broken.pdf"));

        // Temp copy is gone even though extraction failed
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
