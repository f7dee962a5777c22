//! Page parsing and text normalisation
//!
//! Pages are reduced to visible text where every block-level element
//! becomes a paragraph separated from its neighbours by one blank line.

mod html;

pub use html::*;

/// A parsed HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Contents of `<title>`, if any
    pub title: Option<String>,

    /// Visible text, paragraphs separated by blank lines
    pub text: String,

    /// Absolute http(s) link targets in document order
    pub links: Vec<String>,
}

/// Collapse whitespace inside lines and runs of blank lines between them
pub fn normalize_blocks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_blank = false;

    for line in text.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }

        if !out.is_empty() {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        out.push_str(&line);
        pending_blank = false;
    }

    out
}
