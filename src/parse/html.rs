//! HTML parsing and visible text extraction

use super::{normalize_blocks, ParsedPage};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose contents are never rendered as text
const HIDDEN_TAGS: &[&str] = &["head", "script", "style", "noscript", "template", "svg"];

/// Elements that start and end a text block
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dd", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table",
    "tr", "ul",
];

/// Parse an HTML page into visible text and resolved links
pub fn parse_page(content: &str, page_url: &str) -> ParsedPage {
    let document = Html::parse_document(content);

    let title = Selector::parse("title")
        .ok()
        .and_then(|s| {
            document
                .select(&s)
                .next()
                .map(|t| t.text().collect::<String>().trim().to_string())
        })
        .filter(|t| !t.is_empty());

    ParsedPage {
        title,
        text: visible_text(&document),
        links: resolve_links(&document, page_url),
    }
}

/// Extract just the visible text of an HTML page
pub fn page_text(content: &str) -> String {
    visible_text(&Html::parse_document(content))
}

/// Extract every `<a href>` target of a page, resolved against the page URL
pub fn page_links(content: &str, page_url: &str) -> Vec<String> {
    resolve_links(&Html::parse_document(content), page_url)
}

fn visible_text(document: &Html) -> String {
    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);
    normalize_blocks(&raw)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if HIDDEN_TAGS.contains(&name) {
        return;
    }
    if name == "br" {
        out.push('\n');
        return;
    }

    let is_block = BLOCK_TAGS.contains(&name);
    if is_block {
        out.push_str("\n\n");
    }

    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        }
    }

    if is_block {
        out.push_str("\n\n");
    }
}

fn resolve_links(document: &Html, page_url: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let base = Url::parse(page_url).ok();

    document
        .select(&selector)
        .filter_map(|elem| elem.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .filter_map(|href| match &base {
            Some(base) => base.join(href).ok(),
            None => Url::parse(href).ok(),
        })
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(|url| url.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_basic() {
        let html = r#"
        <!DOCTYPE html>
        <html>
        <head><title>FAQ</title><style>body { color: red; }</style></head>
        <body>
            <h2>How do I register?</h2>
            <p>Use the   online
               form.</p>
            <script>var hidden = "nope";</script>
            <a href="/faq/travel">Travel</a>
        </body>
        </html>
        "#;

        let page = parse_page(html, "https://example.com/faq/");

        assert_eq!(page.title.as_deref(), Some("FAQ"));
        assert!(page.text.starts_with("How do I register?\n\nUse the online\nform."));
        assert!(!page.text.contains("hidden"));
        assert!(!page.text.contains("color"));
        assert_eq!(page.links, vec!["https://example.com/faq/travel".to_string()]);
    }

    #[test]
    fn test_blocks_are_separated_by_one_blank_line() {
        let html = "<div><div><p>Q1</p></div></div><div><p>A1</p></div><ul><li>Q2</li><li>A2</li></ul>";
        assert_eq!(page_text(html), "Q1\n\nA1\n\nQ2\n\nA2");
    }

    #[test]
    fn test_br_is_a_line_break() {
        let html = "<p>line one<br>line two</p>";
        assert_eq!(page_text(html), "line one\nline two");
    }

    #[test]
    fn test_links_resolve_against_page_url() {
        let html = r#"
        <a href="next">Relative</a>
        <a href="/root">Absolute path</a>
        <a href="https://external.com/page">External</a>
        <a href="mailto:team@example.com">Mail</a>
        <a href="javascript:void(0)">Script</a>
        <a href="">Empty</a>
        "#;

        let links = page_links(html, "https://example.com/faq/index.html");

        assert_eq!(
            links,
            vec![
                "https://example.com/faq/next".to_string(),
                "https://example.com/root".to_string(),
                "https://external.com/page".to_string(),
            ]
        );
    }
}
