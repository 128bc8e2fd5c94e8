use anyhow::{Context, Result};
use reqwest::Client;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Extraction rules, highest priority first. Every rule is applied; later
/// rules may match elements already captured by earlier ones.
pub const EXTRACTION_RULES: [&str; 6] = [
    "article",
    "div.article-content",
    "div.content",
    r#"div[class*="article"]"#,
    r#"div[class*="content"]"#,
    "p",
];

/// Fragments shorter than this many characters are dropped
pub const MIN_FRAGMENT_CHARS: usize = 50;
/// Upper bound on the extracted article, in characters
pub const MAX_ARTICLE_CHARS: usize = 10_000;

/// Elements whose text never reaches the reader
const INVISIBLE_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Fetches a page and returns the raw body.
///
/// A non-2xx status is logged but not treated as a failure; the body of an
/// error page simply tends to extract to nothing.
pub async fn fetch_page(url: &str, user_agent: &str, timeout_secs: Option<u64>) -> Result<String> {
    let parsed = url::Url::parse(url.trim()).context("failed to parse article URL")?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("unsupported URL scheme: {}", parsed.scheme());
    }

    let mut builder = Client::builder().user_agent(user_agent);
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build().context("failed to build reqwest client")?;

    let response = client
        .get(parsed)
        .send()
        .await
        .context("failed to fetch article page")?;

    let status = response.status();
    if !status.is_success() {
        warn!(%url, %status, "article fetch returned non-success status");
    }

    let body = response.text().await.context("failed to read response body")?;
    debug!(%url, bytes = body.len(), "fetched article page");
    Ok(body)
}

/// Visible text of an element: script/style contents skipped, whitespace collapsed.
fn visible_text(element: ElementRef<'_>) -> String {
    let inside_invisible = element
        .ancestors()
        .filter_map(|ancestor| ancestor.value().as_element())
        .any(|el| is_invisible(el.name()));
    if inside_invisible {
        return String::new();
    }

    // Depth-first, in document order; hidden subtrees are never entered
    let mut pieces: Vec<&str> = Vec::new();
    let mut stack = vec![*element];
    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => pieces.extend(text.split_whitespace()),
            Node::Element(el) if is_invisible(el.name()) => {}
            _ => stack.extend(node.children().rev()),
        }
    }
    pieces.join(" ")
}

fn is_invisible(name: &str) -> bool {
    INVISIBLE_ELEMENTS.contains(&name)
}

/// Extracts article text from raw HTML.
///
/// Returns an empty string when nothing survives the rules and the length
/// filter; callers treat that as an extraction failure.
pub fn extract_article_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut fragments: Vec<String> = Vec::new();
    for rule in EXTRACTION_RULES {
        let selector = match Selector::parse(rule) {
            Ok(selector) => selector,
            Err(e) => {
                warn!(rule, error = %e, "skipping unparsable extraction rule");
                continue;
            }
        };
        let before = fragments.len();
        for element in document.select(&selector) {
            let text = visible_text(element);
            if text.chars().count() >= MIN_FRAGMENT_CHARS {
                fragments.push(text);
            }
        }
        debug!(rule, matched = fragments.len() - before, "extraction rule applied");
    }

    let mut seen = HashSet::new();
    fragments.retain(|fragment| seen.insert(fragment.clone()));

    let joined = fragments.join(" ");
    let total_chars = joined.chars().count();
    info!(fragments = fragments.len(), chars = total_chars, "extracted article text");

    if total_chars > MAX_ARTICLE_CHARS {
        joined.chars().take(MAX_ARTICLE_CHARS).collect()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(tag: &str) -> String {
        format!("{tag}: this sentence is comfortably longer than the fifty character minimum.")
    }

    #[test]
    fn test_no_matching_elements_yields_empty() {
        let html = "<html><body><span>nothing here</span><div>also nothing</div></body></html>";
        assert_eq!(extract_article_text(html), "");
    }

    #[test]
    fn test_short_fragments_are_dropped() {
        let html = "<p>too short to keep</p><p>also short</p>";
        assert_eq!(extract_article_text(html), "");
    }

    #[test]
    fn test_fragment_of_exactly_fifty_chars_is_kept() {
        let fifty = "a".repeat(MIN_FRAGMENT_CHARS);
        let forty_nine = "b".repeat(MIN_FRAGMENT_CHARS - 1);
        let html = format!("<p>{fifty}</p><p>{forty_nine}</p>");
        assert_eq!(extract_article_text(&html), fifty);
    }

    #[test]
    fn test_same_element_matched_by_several_rules_appears_once() {
        let body = sentence("body");
        let html = format!("<div class=\"article-content\"><p>{body}</p></div>");
        // matched by div.article-content, both class* rules and p
        assert_eq!(extract_article_text(&html), body);
    }

    #[test]
    fn test_all_rules_applied_in_priority_order() {
        let lead = sentence("lead");
        let other = sentence("other");
        let html = format!(
            "<html><body><p>{other}</p><article><p>{lead}</p></article></body></html>"
        );
        // article rule first, then the standalone paragraph found by "p"
        assert_eq!(extract_article_text(&html), format!("{lead} {other}"));
    }

    #[test]
    fn test_whitespace_collapsed_and_scripts_ignored() {
        let html = r#"<article>
            <h1>Headline   of the   day</h1>
            <script>var tracking = "this must never show up in the output text";</script>
            <p>The body   spans
               several lines and is long enough to be kept.</p>
        </article>"#;
        let text = extract_article_text(html);
        assert!(!text.contains("tracking"));
        assert!(text.starts_with("Headline of the day The body spans several lines"));
        assert!(!text.contains("  "));
    }

    #[test]
    fn test_hidden_subtrees_skipped_at_any_depth() {
        let body = sentence("body");
        let html = format!(
            "<article><div><span><style>.ad {{ display: none; }}</style>\
             <noscript><p>Please enable JavaScript to read this article in full.</p></noscript>\
             </span>{body}</div></article>"
        );
        assert_eq!(extract_article_text(&html), body);
    }

    #[test]
    fn test_deeply_nested_article_is_extracted() {
        let body = sentence("deep");
        let depth = 1_000;
        let html = format!(
            "<article>{}<p>{body}</p>{}</article>",
            "<div>".repeat(depth),
            "</div>".repeat(depth)
        );
        assert_eq!(extract_article_text(&html), body);
    }

    #[test]
    fn test_output_is_bounded_in_characters() {
        // multi-byte characters, so a byte-based cut would differ
        let paragraph = "가".repeat(3_000);
        let html: String = (0..5).map(|i| format!("<p>{paragraph}{i}</p>")).collect();
        let text = extract_article_text(&html);
        assert_eq!(text.chars().count(), MAX_ARTICLE_CHARS);
    }

    #[test]
    fn test_duplicate_fragments_collapse_to_first() {
        let repeated = sentence("repeated");
        let html = format!("<p>{repeated}</p><p>{}</p><p>{repeated}</p>", sentence("middle"));
        let text = extract_article_text(&html);
        assert_eq!(text.matches(&repeated).count(), 1);
        assert!(text.starts_with(&repeated));
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_http_scheme() {
        let err = fetch_page("ftp://example.com/a", DEFAULT_USER_AGENT, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unsupported URL scheme"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_malformed_url() {
        assert!(fetch_page("not a url", DEFAULT_USER_AGENT, None).await.is_err());
    }
}
