use crate::error::ExtractionError;
use lopdf::Document;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

pub trait PdfExtractor {
    /// Returns every page in page order. Pages without extractable text
    /// carry an empty string rather than failing the document.
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, ExtractionError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, ExtractionError> {
        let document =
            Document::load(path).map_err(|error| ExtractionError::PdfParse(error.to_string()))?;

        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            let text = match document.extract_text(&[page_no]) {
                Ok(text) => text,
                Err(error) => {
                    debug!(page = page_no, %error, "page has no extractable text");
                    String::new()
                }
            };
            pages.push(PageText {
                number: page_no,
                text,
            });
        }

        Ok(pages)
    }
}

/// Concatenates page texts, each followed by a newline, and trims the result.
pub fn join_pages(pages: &[PageText]) -> String {
    let mut text = String::new();
    for page in pages {
        text.push_str(&page.text);
        text.push('\n');
    }
    text.trim().to_string()
}

pub fn extract_text(path: &Path) -> Result<String, ExtractionError> {
    extract_text_with(&LopdfExtractor, path)
}

pub fn extract_text_with<E>(extractor: &E, path: &Path) -> Result<String, ExtractionError>
where
    E: PdfExtractor + ?Sized,
{
    if !path.exists() {
        return Err(ExtractionError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no such file: {}", path.display()),
        )));
    }
    let pages = extractor.extract_pages(path)?;
    Ok(join_pages(&pages))
}
