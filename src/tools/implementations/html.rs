//! Lightweight HTML extraction for article pages
//!
//! Pattern-based rather than a full DOM: good enough for MediaWiki markup,
//! where the interesting parts are `#firstHeading`, `<title>`, and the `<p>`
//! and `<img>` elements under `#mw-content-text`.

use regex::Regex;
use std::sync::OnceLock;

fn first_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<h1\b[^>]*\bid\s*=\s*["']firstHeading["'][^>]*>(.*?)</h1>"#)
            .expect("html pattern is valid")
    })
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>")
            .expect("html pattern is valid")
    })
}

fn content_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<([a-z][a-z0-9]*)\b[^>]*\bid\s*=\s*["']mw-content-text["'][^>]*>"#)
            .expect("html pattern is valid")
    })
}

fn element_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(/?)([a-z][a-z0-9]*)\b[^>]*>").expect("html pattern is valid")
    })
}

fn paragraph_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<p\b[^>]*>(.*?)</p>").expect("html pattern is valid")
    })
}

fn img_src_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<img\b[^>]*?\bsrc\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("html pattern is valid")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("html pattern is valid"))
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);")
            .expect("html pattern is valid")
    })
}

/// Page title: `#firstHeading` text, else `<title>`
pub fn extract_title(html: &str) -> String {
    let from = |re: &Regex| {
        re.captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| clean_text(m.as_str()))
            .filter(|text| !text.is_empty())
    };

    from(first_heading_re())
        .or_else(|| from(title_re()))
        .unwrap_or_default()
}

/// The `#mw-content-text` element up to its matching close tag
///
/// Falls back to the whole document when the element is absent, and to the
/// rest of the document when its close tag never arrives.
pub fn content_region(html: &str) -> &str {
    let Some(caps) = content_start_re().captures(html) else {
        return html;
    };
    let (Some(open), Some(name)) = (caps.get(0), caps.get(1)) else {
        return html;
    };

    let body_start = open.end();
    let mut depth = 1usize;
    for tag in element_tag_re().captures_iter(&html[body_start..]) {
        if !tag[2].eq_ignore_ascii_case(name.as_str()) {
            continue;
        }
        let Some(whole) = tag.get(0) else {
            continue;
        };
        if tag[1].is_empty() {
            // `<div/>` opens nothing
            if !whole.as_str().ends_with("/>") {
                depth += 1;
            }
            continue;
        }
        depth -= 1;
        if depth == 0 {
            return &html[open.start()..body_start + whole.end()];
        }
    }
    &html[open.start()..]
}

/// Trimmed text of every non-empty paragraph
pub fn extract_paragraphs(region: &str) -> Vec<String> {
    paragraph_re()
        .captures_iter(region)
        .filter_map(|caps| caps.get(1))
        .map(|m| clean_text(m.as_str()))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Raw `src` attribute of every `<img>`
pub fn extract_image_sources(region: &str) -> Vec<String> {
    img_src_re()
        .captures_iter(region)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|src| !src.is_empty())
        .collect()
}

/// Strip tags, decode entities and collapse runs of whitespace
pub fn clean_text(fragment: &str) -> String {
    let stripped = tag_re().replace_all(fragment, "");
    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode named and numeric character references
pub fn decode_entities(text: &str) -> String {
    entity_re()
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    "ndash" => Some('–'),
                    "mdash" => Some('—'),
                    _ => None,
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>Alan Turing - Wikipedia</title></head>
<body>
<h1 id="firstHeading" class="firstHeading"><span>Alan Turing</span></h1>
<p>Outside content</p>
<div id="mw-content-text" class="mw-body-content">
  <p>Alan Mathison <b>Turing</b> was an English mathematician &amp; computer scientist.</p>
  <p>   </p>
  <p class="x">He was born in <a href="/wiki/London">London</a>&#46;</p>
  <img src="//upload.wikimedia.org/a.jpg" alt="a">
  <img alt='b' src='/static/b.png'>
</div>
</body></html>"#;

    #[test]
    fn test_title_prefers_first_heading() {
        assert_eq!(extract_title(PAGE), "Alan Turing");
    }

    #[test]
    fn test_title_falls_back_to_title_tag() {
        let html = "<html><head><title> Only Title </title></head><body></body></html>";
        assert_eq!(extract_title(html), "Only Title");
        assert_eq!(extract_title("<p>no title</p>"), "");
    }

    #[test]
    fn test_paragraphs_limited_to_content_region() {
        let paragraphs = extract_paragraphs(content_region(PAGE));
        assert_eq!(
            paragraphs,
            vec![
                "Alan Mathison Turing was an English mathematician & computer scientist.",
                "He was born in London.",
            ]
        );
    }

    #[test]
    fn test_content_region_stops_at_matching_close() {
        let html = r#"<div id="mw-content-text"><p>Body.</p></div><div id="footer"><p>This page was last edited on 1 May.</p><img src="/static/images/footer/wikimedia-button.svg"></div>"#;
        let region = content_region(html);
        assert_eq!(extract_paragraphs(region), vec!["Body."]);
        assert!(extract_image_sources(region).is_empty());
    }

    #[test]
    fn test_content_region_counts_nested_elements() {
        let html = r#"<div id="mw-content-text"><div class="infobox"><div><p>Inner.</p></div></div><div/><p>Outer.</p></div><p>Footer.</p>"#;
        assert_eq!(extract_paragraphs(content_region(html)), vec!["Inner.", "Outer."]);
    }

    #[test]
    fn test_content_region_unclosed_runs_to_end() {
        let html = r#"<div id="mw-content-text"><div><p>One.</p></div><p>Two.</p>"#;
        assert_eq!(extract_paragraphs(content_region(html)), vec!["One.", "Two."]);
    }

    #[test]
    fn test_content_region_missing_uses_document() {
        let html = "<p>one</p><p>two</p>";
        assert_eq!(extract_paragraphs(content_region(html)), vec!["one", "two"]);
    }

    #[test]
    fn test_image_sources() {
        let sources = extract_image_sources(content_region(PAGE));
        assert_eq!(sources, vec!["//upload.wikimedia.org/a.jpg", "/static/b.png"]);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &lt;b&gt; &#x41;&#66; &unknown;"), "a <b> AB &unknown;");
    }
}
