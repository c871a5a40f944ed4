use async_trait::async_trait;
use folio_api::LinkMetadata;
use reqwest::Url;
use scraper::{Html, Selector};
use std::fmt::{Display, Formatter};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Upstream answered outside 2xx.
    Status(u16),
    /// Transport failure, including the 5-second timeout.
    Transport(String),
    Parse(String),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(code) => write!(f, "upstream returned status {code}"),
            Self::Transport(msg) => write!(f, "fetch failed: {msg}"),
            Self::Parse(msg) => write!(f, "metadata parse failed: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Seam for the outbound page fetch, so tests substitute canned markup the
/// way the store tests substitute a fake backend.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError>;
}

pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Parse(e.to_string()))
}

/// Extracts `{name, favicon_url}` from fetched markup. Site name prefers
/// `og:site_name` over `<title>`; the favicon falls back through
/// `rel="icon"`, `rel="shortcut icon"`, `/favicon.ico`.
pub fn parse_metadata(html: &str, page_url: &Url) -> Result<LinkMetadata, FetchError> {
    let doc = Html::parse_document(html);

    let og_site = selector(r#"meta[property="og:site_name"]"#)?;
    let title = selector("title")?;
    let name = doc
        .select(&og_site)
        .next()
        .and_then(|el| el.value().attr("content").map(str::to_string))
        .or_else(|| doc.select(&title).next().map(|el| el.text().collect()))
        .unwrap_or_default()
        .trim()
        .to_string();

    let icon = selector(r#"link[rel="icon"]"#)?;
    let shortcut = selector(r#"link[rel="shortcut icon"]"#)?;
    let favicon = doc
        .select(&icon)
        .next()
        .and_then(|el| el.value().attr("href"))
        .or_else(|| doc.select(&shortcut).next().and_then(|el| el.value().attr("href")))
        .unwrap_or("/favicon.ico");

    Ok(LinkMetadata {
        name,
        favicon_url: resolve_favicon(favicon, page_url),
    })
}

/// Absolute URLs pass through, protocol-relative paths pin to https, and
/// everything else resolves against the fetched origin (not the page path).
fn resolve_favicon(raw: &str, page_url: &Url) -> String {
    if raw.starts_with("http") {
        return raw.to_string();
    }
    if let Some(rest) = raw.strip_prefix("//") {
        return format!("https://{rest}");
    }
    let origin = format!("{}://{}", page_url.scheme(), page_url.authority());
    if raw.starts_with('/') {
        format!("{origin}{raw}")
    } else {
        format!("{origin}/{raw}")
    }
}
