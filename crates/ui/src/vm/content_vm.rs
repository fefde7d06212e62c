use std::collections::{HashMap, HashSet};

/// Render a lesson description or body for `dangerous_inner_html`.
///
/// The backend stores either markdown or an HTML fragment from its editor.
/// Both end up sanitized.
#[must_use]
pub fn lesson_text_html(input: &str) -> Option<String> {
    if input.trim().is_empty() {
        return None;
    }
    let html = if looks_like_html(input) {
        sanitize_html(input)
    } else {
        markdown_to_html(input)
    };
    (!html.trim().is_empty()).then_some(html)
}

#[must_use]
pub fn markdown_to_html(input: &str) -> String {
    let mut options = pulldown_cmark::Options::empty();
    options.insert(pulldown_cmark::Options::ENABLE_STRIKETHROUGH);
    options.insert(pulldown_cmark::Options::ENABLE_TABLES);

    let parser = pulldown_cmark::Parser::new_ext(input, options);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    sanitize_html(&html)
}

#[must_use]
pub fn sanitize_html(html: &str) -> String {
    let tags: HashSet<&str> = [
        "p", "div", "span", "br", "em", "strong", "b", "i", "u", "del", "code", "pre",
        "blockquote", "ul", "ol", "li", "a", "h3", "h4", "table", "thead", "tbody", "tr", "th",
        "td",
    ]
    .into_iter()
    .collect();

    let mut attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    attributes.insert("a", ["href"].into_iter().collect());

    ammonia::Builder::new()
        .tags(tags)
        .tag_attributes(attributes)
        .link_rel(Some("noopener noreferrer"))
        .clean(html)
        .to_string()
}

#[must_use]
pub fn looks_like_html(input: &str) -> bool {
    let lower = input.trim_start().to_ascii_lowercase();
    let Some(start) = lower.find('<') else {
        return false;
    };
    if !lower[start + 1..].contains('>') {
        return false;
    }

    ["<p", "<div", "<span", "<br", "<a ", "<ul", "<ol", "<strong", "<em"]
        .iter()
        .any(|tag| lower.contains(tag))
}

#[cfg(test)]
mod tests {
    use super::{lesson_text_html, looks_like_html, markdown_to_html};

    #[test]
    fn html_detection_requires_known_tags() {
        assert!(looks_like_html("<p>Hello</p>"));
        assert!(looks_like_html("Intro <strong>now</strong>"));
        assert!(!looks_like_html("2 < 3 > 1"));
        assert!(!looks_like_html("**bold**"));
    }

    #[test]
    fn markdown_is_rendered_and_sanitized() {
        let html = markdown_to_html("**Knife** grip\n\n[Link](javascript:alert(1))");
        assert!(html.contains("<strong>Knife</strong>"));
        assert!(html.contains("Link"));
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn editor_html_drops_scripts() {
        let html = lesson_text_html("<p>Hi</p><script>alert(1)</script>").unwrap();
        assert_eq!(html, "<p>Hi</p>");
    }

    #[test]
    fn blank_text_renders_nothing() {
        assert_eq!(lesson_text_html("   \n"), None);
    }
}
