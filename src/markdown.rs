//! Markdown to plain-text derivation
//!
//! Streamed questions and feedback arrive as markdown. For narration and
//! for the logged question text we want text content only: render the
//! markdown to HTML, then extract the text the way a DOM `textContent`
//! read would, dropping all formatting.

use pulldown_cmark::{html, Options, Parser};
use scraper::Html;

/// Render markdown to an HTML fragment
#[must_use]
pub fn render(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::empty());
    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, parser);
    out
}

/// Derive plain text from markdown, stripping all formatting
///
/// Mid-stream fragments with unterminated markdown tokens render
/// best-effort; only the final post-stream call is authoritative.
#[must_use]
pub fn to_plain_text(markdown: &str) -> String {
    let fragment = Html::parse_fragment(&render(markdown));
    let text: String = fragment.root_element().text().collect();
    normalize_whitespace(&text)
}

/// Collapse rendered block boundaries into single spaces or newlines
fn normalize_whitespace(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        lines.push(trimmed.to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_emphasis_and_headings() {
        let plain = to_plain_text("## Question\n\nTell me about **your** _experience_.");
        assert_eq!(plain, "Question\nTell me about your experience.");
    }

    #[test]
    fn strips_list_markers() {
        let plain = to_plain_text("- one\n- two\n");
        assert_eq!(plain, "one\ntwo");
    }

    #[test]
    fn link_text_survives_without_url() {
        let plain = to_plain_text("See [our site](https://example.com) today.");
        assert_eq!(plain, "See our site today.");
    }

    #[test]
    fn raw_html_is_not_executed_into_output() {
        // Script bodies render as markup, but tags never survive extraction
        let plain = to_plain_text("hello <b>world</b>");
        assert!(plain.contains("hello"));
        assert!(!plain.contains('<'));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(to_plain_text(""), "");
    }

    #[test]
    fn unterminated_tokens_render_best_effort() {
        let plain = to_plain_text("Tell me **about");
        assert!(plain.contains("about"));
    }
}
