//! Markup <-> block tree conversion and XHTML-style serialization
//!
//! Parsing goes through html5ever (via scraper), so lax markup is repaired
//! the way a browser would; serialization always closes void elements and
//! escapes text, which makes the output well-formed XML.

use crate::types::Block;
use scraper::{Html, Selector};

/// Elements whose text is emitted verbatim
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Parse a markup fragment into top-level blocks
pub fn parse_fragment(markup: &str) -> Vec<Block> {
    let fragment = Html::parse_fragment(markup);
    fragment
        .root_element()
        .children()
        .filter_map(node_to_block)
        .collect()
}

/// Parse a full document and return the children of `<body>`
///
/// Whitespace-only text at either edge of the body is dropped so that
/// wrapping and unwrapping content is stable across save/open cycles.
pub fn parse_body(html: &str) -> Vec<Block> {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").expect("static selector");

    let mut blocks: Vec<Block> = match document.select(&body_selector).next() {
        Some(body) => body.children().filter_map(node_to_block).collect(),
        None => Vec::new(),
    };

    while matches!(blocks.first(), Some(Block::Text { text }) if text.trim().is_empty()) {
        blocks.remove(0);
    }
    while matches!(blocks.last(), Some(Block::Text { text }) if text.trim().is_empty()) {
        blocks.pop();
    }
    blocks
}

/// Parse a full document and serialize it back as XHTML
///
/// The doctype is normalized to `<!DOCTYPE html>`.
pub fn normalize_document(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();

    let has_doctype = document
        .tree
        .root()
        .children()
        .any(|n| matches!(n.value(), scraper::Node::Doctype(_)));
    if has_doctype {
        out.push_str("<!DOCTYPE html>");
    }

    if let Some(root) = node_to_block(*document.root_element()) {
        write_block(&root, &mut out);
    }
    out
}

/// Convert a parsed node into a block (doctypes and processing instructions are dropped)
fn node_to_block(node: ego_tree::NodeRef<scraper::Node>) -> Option<Block> {
    match node.value() {
        scraper::Node::Text(text) => Some(Block::text(text.text.to_string())),
        scraper::Node::Comment(comment) => Some(Block::comment(comment.comment.to_string())),
        scraper::Node::Element(el) => {
            let attributes = el
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            let children = node.children().filter_map(node_to_block).collect();
            Some(Block::Element {
                name: el.name().to_string(),
                attributes,
                children,
            })
        }
        _ => None,
    }
}

/// Serialize blocks into markup
pub fn write_blocks(blocks: &[Block], out: &mut String) {
    for block in blocks {
        write_block(block, out);
    }
}

fn write_block(block: &Block, out: &mut String) {
    match block {
        Block::Text { text } => out.push_str(&escape_text(text)),
        Block::Comment { text } => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Block::Element {
            name,
            attributes,
            children,
        } => {
            out.push('<');
            out.push_str(name);
            for (key, value) in attributes {
                out.push_str(&format!(" {}=\"{}\"", key, escape_attr(value)));
            }

            if block.is_void() && children.is_empty() {
                out.push_str(" />");
                return;
            }
            out.push('>');

            if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                for child in children {
                    match child {
                        Block::Text { text } => out.push_str(text),
                        other => write_block(other, out),
                    }
                }
            } else {
                write_blocks(children, out);
            }

            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

/// Escape text content
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value (double-quoted)
pub fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

/// Escape text for XML templates (descriptor, nav)
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fragment_keeps_comments_and_attributes() {
        let blocks = parse_fragment(
            r#"<!-- wp:paragraph --><p class="lead">Hi &amp; bye</p><!-- /wp:paragraph -->"#,
        );

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], Block::comment(" wp:paragraph "));
        assert_eq!(blocks[1].attr("class"), Some("lead"));
        assert_eq!(blocks[1].text_content(), "Hi & bye");
    }

    #[test]
    fn test_void_elements_self_close() {
        let mut out = String::new();
        let blocks = parse_fragment(r#"<p>a<br>b<img src="x.png" alt="a &quot;b&quot;"></p>"#);
        write_blocks(&blocks, &mut out);
        assert_eq!(out, r#"<p>a<br />b<img alt="a &quot;b&quot;" src="x.png" /></p>"#);
    }

    #[test]
    fn test_lax_markup_is_repaired() {
        let mut out = String::new();
        write_blocks(&parse_fragment("<p>one<p>two"), &mut out);
        assert_eq!(out, "<p>one</p><p>two</p>");
    }

    #[test]
    fn test_style_text_is_not_escaped() {
        let mut out = String::new();
        write_blocks(&parse_fragment("<div><style>a > b { color: red }</style></div>"), &mut out);
        assert_eq!(out, "<div><style>a > b { color: red }</style></div>");
    }

    #[test]
    fn test_normalize_document_is_idempotent() {
        let source = "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\" \"x\">\
            <html lang=\"en\"><head><title>T</title><meta charset=\"utf-8\"></head>\
            <body><p>hello</body></html>";

        let once = normalize_document(source);
        assert!(once.starts_with("<!DOCTYPE html><html lang=\"en\"><head>"));
        assert!(once.contains("<meta charset=\"utf-8\" />"));
        assert!(once.contains("<p>hello</p>"));
        assert_eq!(normalize_document(&once), once);
    }

    #[test]
    fn test_parse_body_trims_edge_whitespace() {
        let blocks = parse_body("<html><body>\n<p>a</p>\n\n</body></html>");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name(), Some("p"));
    }
}
