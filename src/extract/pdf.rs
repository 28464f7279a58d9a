use reqwest::Client;
use std::time::Duration;
use url::Url;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads a PDF resource and yields cleaned, length-capped plain text.
/// Every failure path collapses to an empty string; callers treat empty as
/// "no content for this document".
pub struct PdfTextExtractor {
    client: Client,
    max_chars: usize,
}

impl PdfTextExtractor {
    pub fn new(max_chars: usize) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(DOWNLOAD_TIMEOUT).build()?;
        Ok(PdfTextExtractor { client, max_chars })
    }

    #[tracing::instrument(skip(self), fields(pdf_url = %pdf_url))]
    pub async fn extract_pdf(&self, pdf_url: &str) -> String {
        // Provider PDF links carry signing/query parameters that must be
        // dropped to get the stable canonical resource.
        let canonical = strip_query(pdf_url);

        match self.try_extract(&canonical).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "PDF extraction failed");
                String::new()
            }
        }
    }

    async fn try_extract(&self, url: &str) -> anyhow::Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("PDF download returned status {}", status);
        }

        let bytes = response.bytes().await?;

        // PDF parsing is CPU-bound; keep it off the async executor.
        let text =
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                .await??;

        Ok(clean_pdf_text(&text, self.max_chars))
    }
}

/// Collapse whitespace runs, then remove all spaces entirely. The target
/// language is logographic, so spaces carry no word boundaries; the
/// canonical cleaned form has none. Truncation is a hard cutoff at the
/// character boundary.
pub fn clean_pdf_text(raw: &str, max_chars: usize) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned: String = collapsed.chars().filter(|c| *c != ' ').collect();
    cleaned.chars().take(max_chars).collect()
}

/// Strip query string and fragment, leaving the canonical resource URL.
pub fn strip_query(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .to_string(),
    }
}
