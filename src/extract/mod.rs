pub mod pdf;

use async_trait::async_trait;
use select::document::Document;
use select::predicate::{Attr, Class, Name, Predicate};
use spider::website::Website;
use std::time::Duration;

use self::pdf::{strip_query, PdfTextExtractor};

const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Content extractor interface: plain-text body for an announcement URL.
/// Returns an empty string on total failure; never raises to the caller.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> String;
}

/// Extraction over the provider's rendered announcement page.
///
/// The notice body is client-rendered, so the page is loaded through a
/// browser-capable fetch rather than a bare HTTP GET. The rendered document
/// then runs through an ordered strategy list: the tagged PDF anchor first
/// (PDF content is authoritative when both exist), then the known notice
/// container. No whole-page fallback.
pub struct PageContentExtractor {
    pdf: PdfTextExtractor,
}

impl PageContentExtractor {
    pub fn new(pdf_max_chars: usize) -> anyhow::Result<Self> {
        Ok(PageContentExtractor {
            pdf: PdfTextExtractor::new(pdf_max_chars)?,
        })
    }

    async fn render_page(&self, url: &str) -> Option<String> {
        let mut website = Website::new(url);
        website
            .with_respect_robots_txt(false)
            .with_request_timeout(Some(PAGE_TIMEOUT))
            .with_limit(1);

        website.scrape().await;

        website
            .get_pages()
            .and_then(|pages| pages.iter().next().map(|page| page.get_html()))
            .filter(|html| !html.is_empty())
    }
}

#[async_trait]
impl ContentExtractor for PageContentExtractor {
    #[tracing::instrument(skip(self), fields(url = %url))]
    async fn extract(&self, url: &str) -> String {
        let Some(html) = self.render_page(url).await else {
            tracing::warn!("announcement page failed to render");
            return String::new();
        };

        // Strategy 1: tagged PDF anchor. When the anchor resolves to a .pdf
        // resource the PDF rendition is authoritative, even if its text
        // turns out empty.
        if let Some(href) = find_pdf_href(&html) {
            let canonical = strip_query(&href);
            if canonical.ends_with(".pdf") {
                tracing::debug!(pdf = %canonical, "delegating to PDF extractor");
                return self.pdf.extract_pdf(&canonical).await;
            }
        }

        // Strategy 2: known notice-body container.
        if let Some(body) = notice_container_text(&html) {
            return body;
        }

        tracing::debug!("no extractable content on page");
        String::new()
    }
}

/// Href of the provider's single tagged PDF anchor, if present.
pub fn find_pdf_href(html: &str) -> Option<String> {
    let document = Document::from_read(html.as_bytes()).ok()?;
    document
        .find(Name("a").and(Class("pdf-link")))
        .next()
        .and_then(|node| node.attr("href"))
        .map(|href| href.to_string())
}

/// Trimmed inner text of the provider's notice-body container.
pub fn notice_container_text(html: &str) -> Option<String> {
    let document = Document::from_read(html.as_bytes()).ok()?;
    document
        .find(Attr("id", "notice_content"))
        .next()
        .map(|node| node.text().trim().to_string())
        .filter(|text| !text.is_empty())
}
