//! Shared helpers for the ragkit demos.
//!
//! [`load_document`] turns a file path into a [`Document`]. Plain text is read
//! as is; `.pdf` files are converted page by page when the `pdf` feature is
//! enabled. [`load_reviews`] reads the labelled review CSV used by the
//! sentiment demo.

use std::path::Path;

use anyhow::{Context, Result};
use ragkit_rag::Document;
use serde::Deserialize;

/// One row of a labelled review file.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelledReview {
    pub review: String,
    pub sentiment: String,
}

/// Read a CSV file with `review` and `sentiment` header columns.
///
/// Extra columns are ignored; a row missing either field is an error naming
/// its row number.
pub fn load_reviews(path: &Path) -> Result<Vec<LabelledReview>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("failed to open {}", path.display()))?;
    reader
        .deserialize::<LabelledReview>()
        .enumerate()
        .map(|(n, row)| row.with_context(|| format!("{}: invalid review on row {}", path.display(), n + 1)))
        .collect()
}

/// Load `path` as a document whose id is the path itself.
///
/// The `source` metadata key holds the path; PDF documents also carry
/// `pages`, the number of pages that produced text.
pub fn load_document(path: &Path) -> Result<Document> {
    let id = path.display().to_string();
    let is_pdf = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    let document = if is_pdf {
        let (text, pages) = pdf::extract_text(path)?;
        Document::new(&id, text).with_metadata("pages", pages.to_string())
    } else {
        let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {id}"))?;
        Document::new(&id, text)
    };

    Ok(document.with_metadata("source", id))
}

#[cfg(feature = "pdf")]
mod pdf {
    use std::path::Path;

    use anyhow::{Context, Result, anyhow, bail};
    use pdf_oxide::PdfDocument;
    use pdf_oxide::converters::ConversionOptions;
    use tracing::debug;

    /// Extract the text of every page, returning the joined text and the
    /// number of pages that had any.
    pub fn extract_text(path: &Path) -> Result<(String, usize)> {
        let name = path.to_str().with_context(|| format!("{} is not valid UTF-8", path.display()))?;
        let mut document = PdfDocument::open(name).map_err(|e| anyhow!("failed to open {name}: {e}"))?;
        let page_count = document.page_count().map_err(|e| anyhow!("failed to read {name}: {e}"))?;

        let options = ConversionOptions { include_images: false, ..ConversionOptions::default() };
        let mut pages = Vec::new();
        for page_index in 0..page_count {
            let text = document
                .to_markdown(page_index, &options)
                .map_err(|e| anyhow!("failed to extract page {} of {name}: {e}", page_index + 1))?;
            if !text.trim().is_empty() {
                pages.push(text.trim_end().to_string());
            }
        }

        if pages.is_empty() {
            bail!("{name} has no extractable text");
        }
        debug!(path = name, page_count, text_pages = pages.len(), "extracted pdf text");
        Ok((pages.join("\n"), pages.len()))
    }
}

#[cfg(not(feature = "pdf"))]
mod pdf {
    use std::path::Path;

    use anyhow::{Result, bail};

    pub fn extract_text(path: &Path) -> Result<(String, usize)> {
        bail!("{} is a PDF; rebuild the demos with `--features pdf` to read it", path.display())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn data(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
    }

    #[test]
    fn text_file_becomes_document() {
        let path = data("transfer_learning.txt");
        let document = load_document(&path).unwrap();

        assert_eq!(document.id, path.display().to_string());
        assert!(document.text.contains("Transfer learning"));
        assert_eq!(document.metadata.get("source"), Some(&document.id));
        assert!(!document.metadata.contains_key("pages"));
    }

    #[test]
    fn reviews_csv_has_labelled_rows() {
        let reviews = load_reviews(&data("reviews.csv")).unwrap();

        assert_eq!(reviews.len(), 6);
        assert_eq!(reviews[0].sentiment, "positive");
        assert_eq!(reviews[1].sentiment, "negative");
        // quoted field with embedded commas
        assert_eq!(
            reviews[2].review,
            "A warm, funny and surprisingly moving story. I would happily watch it again."
        );
    }

    #[test]
    fn reviews_csv_without_sentiment_column_is_rejected() {
        let path = std::env::temp_dir().join(format!("ragkit-reviews-{}.csv", std::process::id()));
        std::fs::write(&path, "review,rating\nGreat film,5\n").unwrap();

        let result = load_reviews(&path);
        std::fs::remove_file(&path).ok();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_document(&data("missing.txt")).is_err());
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn missing_pdf_is_an_error() {
        let err = load_document(&data("missing.pdf")).unwrap_err();
        assert!(err.to_string().contains("missing.pdf"));
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn pdf_without_feature_is_rejected() {
        let err = load_document(&data("notes.PDF")).unwrap_err();
        assert!(err.to_string().contains("--features pdf"));
    }
}
