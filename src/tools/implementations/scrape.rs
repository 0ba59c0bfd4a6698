//! Wikipedia scrape tool
//!
//! Fetches an article and extracts its title, paragraph text and image URLs.

use crate::errors::ToolError;
use crate::net::BROWSER_HEADERS;
use crate::tools::implementations::html;
use crate::tools::types::{parse_input, require_text, Operation, OperationContext};
use crate::types::Request;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

/// Maximum characters of article text returned
pub const MAX_TEXT_CHARS: usize = 50_000;

/// Maximum number of image URLs returned
pub const MAX_IMAGES: usize = 20;

#[derive(Debug, Deserialize)]
struct RawScrapeInput {
    url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeInput {
    pub url: Url,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeOutput {
    pub title: String,
    pub text: String,
    pub images: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ScrapeOperation;

#[async_trait]
impl Operation for ScrapeOperation {
    type Input = ScrapeInput;
    type Output = ScrapeOutput;

    fn name(&self) -> &'static str {
        "scrape"
    }

    fn validate(&self, request: &Request) -> Result<ScrapeInput, ToolError> {
        let raw: RawScrapeInput = parse_input(request)?;
        let url = parse_http_url("url", require_text("url", raw.url)?)?;
        Ok(ScrapeInput { url })
    }

    async fn execute(
        &self,
        input: ScrapeInput,
        ctx: OperationContext,
    ) -> Result<ScrapeOutput, ToolError> {
        let body = ctx.fetcher().get(input.url.as_str(), BROWSER_HEADERS).await?;
        let page = String::from_utf8(body.to_vec()).map_err(|e| {
            ToolError::decode_failed("Response body is not valid UTF-8 text").caused_by(e)
        })?;

        Ok(extract_article(&page, &input.url))
    }
}

/// Extract title, text and images from an article page
pub fn extract_article(page: &str, base: &Url) -> ScrapeOutput {
    let title = html::extract_title(page);
    let region = html::content_region(page);

    let text: String = html::extract_paragraphs(region)
        .join("\n\n")
        .chars()
        .take(MAX_TEXT_CHARS)
        .collect();

    let images = html::extract_image_sources(region)
        .iter()
        .filter_map(|src| resolve_image_url(src, base))
        .take(MAX_IMAGES)
        .collect();

    ScrapeOutput {
        title,
        text,
        images,
    }
}

/// Resolve protocol-relative and relative image sources against the page URL
pub fn resolve_image_url(src: &str, base: &Url) -> Option<String> {
    if let Some(rest) = src.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }
    if src.starts_with("http") {
        return Some(src.to_string());
    }
    base.join(src).ok().map(String::from)
}

/// Parse an absolute http(s) URL or fail with `INPUT_INVALID`
pub(crate) fn parse_http_url(field: &str, raw: String) -> Result<Url, ToolError> {
    let invalid = |reason: String| {
        ToolError::input_invalid(format!("`{}` must be an absolute http(s) URL", field))
            .with_details(serde_json::json!({ "field": field, "reason": reason }))
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use serde_json::json;

    fn request(value: serde_json::Value) -> Request {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_validate_requires_url() {
        let err = ScrapeOperation.validate(&request(json!({}))).unwrap_err();
        assert_eq!(err.code, ErrorCode::InputInvalid);
        assert_eq!(err.message, "`url` is required");
    }

    #[test]
    fn test_validate_rejects_non_http() {
        let err = ScrapeOperation
            .validate(&request(json!({"url": "ftp://example.com/x"})))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InputInvalid);

        let err = ScrapeOperation
            .validate(&request(json!({"url": "not a url"})))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InputInvalid);
    }

    #[test]
    fn test_validate_accepts_https() {
        let input = ScrapeOperation
            .validate(&request(json!({"url": "https://en.wikipedia.org/wiki/Alan_Turing"})))
            .unwrap();
        assert_eq!(input.url.host_str(), Some("en.wikipedia.org"));
    }

    #[test]
    fn test_resolve_image_url() {
        let base = Url::parse("https://en.wikipedia.org/wiki/Alan_Turing").unwrap();

        assert_eq!(
            resolve_image_url("//upload.wikimedia.org/a.jpg", &base).unwrap(),
            "https://upload.wikimedia.org/a.jpg"
        );
        assert_eq!(
            resolve_image_url("http://cdn.example/b.png", &base).unwrap(),
            "http://cdn.example/b.png"
        );
        assert_eq!(
            resolve_image_url("/static/c.png", &base).unwrap(),
            "https://en.wikipedia.org/static/c.png"
        );
    }

    #[test]
    fn test_extract_article_caps_images_and_text() {
        let base = Url::parse("https://en.wikipedia.org/wiki/X").unwrap();
        let long_paragraph = "a".repeat(MAX_TEXT_CHARS + 10);
        let images: String = (0..30)
            .map(|i| format!(r#"<img src="/img/{}.png">"#, i))
            .collect();
        let page = format!(
            r#"<h1 id="firstHeading">X</h1><div id="mw-content-text"><p>{}</p>{}</div>"#,
            long_paragraph, images
        );

        let out = extract_article(&page, &base);
        assert_eq!(out.title, "X");
        assert_eq!(out.text.chars().count(), MAX_TEXT_CHARS);
        assert_eq!(out.images.len(), MAX_IMAGES);
        assert_eq!(out.images[0], "https://en.wikipedia.org/img/0.png");
    }

    #[test]
    fn test_extract_article_ignores_page_footer() {
        let base = Url::parse("https://en.wikipedia.org/wiki/X").unwrap();
        let page = r#"<h1 id="firstHeading">X</h1><div id="mw-content-text"><p>Body.</p></div><div id="footer"><p>This page was last edited on 1 May.</p><img src="/static/images/footer/wikimedia-button.svg"></div>"#;

        let out = extract_article(page, &base);
        assert_eq!(out.text, "Body.");
        assert!(out.images.is_empty());
    }
}
