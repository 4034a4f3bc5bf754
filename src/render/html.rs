//! HTML adapter for the block tree
//!
//! Maps rendered blocks to markup, used by `history export`. Escaping of
//! the three HTML-sensitive characters happens here, on text spans, before
//! any markup is emitted. Block and inline structure is decided first, so
//! user or service text can never inject tags.

use super::{Block, CitationsBlock, FollowUpsBlock, Inline, RenderedMessage};
use crate::store::Conversation;

/// Escape `&`, `<`, and `>` for HTML output
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn inlines_to_html(spans: &[Inline]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Inline::Text(t) => out.push_str(&escape_html(t)),
            Inline::Bold(inner) => {
                out.push_str("<strong>");
                out.push_str(&inlines_to_html(inner));
                out.push_str("</strong>");
            }
            Inline::Italic(inner) => {
                out.push_str("<em>");
                out.push_str(&inlines_to_html(inner));
                out.push_str("</em>");
            }
            Inline::Code(code) => {
                out.push_str("<code>");
                out.push_str(&escape_html(code));
                out.push_str("</code>");
            }
            Inline::LineBreak => out.push_str("<br>"),
        }
    }
    out
}

fn block_to_html(block: &Block) -> String {
    match block {
        Block::Paragraph(spans) => format!("<p>{}</p>", inlines_to_html(spans)),
        Block::Heading { level, content } => {
            format!("<h{0}>{1}</h{0}>", level, inlines_to_html(content))
        }
        Block::List(items) => {
            let body: String = items
                .iter()
                .map(|item| format!("<li>{}</li>", inlines_to_html(item)))
                .collect();
            format!("<ul>{}</ul>", body)
        }
        Block::Quote(spans) => format!("<blockquote>{}</blockquote>", inlines_to_html(spans)),
        Block::Callout(inner) => {
            format!("<div class=\"no-answer\">{}</div>", blocks_to_html(inner))
        }
    }
}

/// Render a block sequence to an HTML fragment
pub fn blocks_to_html(blocks: &[Block]) -> String {
    blocks.iter().map(block_to_html).collect()
}

fn citations_to_html(citations: &CitationsBlock) -> String {
    let mut out = String::new();
    out.push_str("<details><summary>");
    out.push_str(&escape_html(&citations.header));
    out.push_str("</summary>");
    for card in &citations.cards {
        out.push_str("<div class=\"source-card\"><strong>");
        out.push_str(&escape_html(&card.doc_name));
        out.push_str("</strong><div>");
        out.push_str(&escape_html(&card.meta));
        out.push_str("</div>");
        if let Some(snippet) = &card.snippet {
            out.push_str("<blockquote>");
            out.push_str(&escape_html(snippet));
            out.push_str("</blockquote>");
        }
        out.push_str("</div>");
    }
    out.push_str("</details>");
    out
}

fn follow_ups_to_html(follow_ups: &FollowUpsBlock) -> String {
    let body: String = follow_ups
        .items
        .iter()
        .map(|item| format!("<li>{}</li>", escape_html(item)))
        .collect();
    format!("<ul class=\"follow-ups\">{}</ul>", body)
}

fn message_to_html(role: &str, rendered: &RenderedMessage) -> String {
    let mut out = format!("<div class=\"message {}\">", escape_html(role));
    out.push_str(&blocks_to_html(&rendered.blocks));
    if let Some(citations) = &rendered.citations {
        out.push_str(&citations_to_html(citations));
    }
    if let Some(follow_ups) = &rendered.follow_ups {
        out.push_str(&follow_ups_to_html(follow_ups));
    }
    out.push_str("</div>");
    out
}

/// Render a whole conversation to a standalone HTML document
pub fn conversation_to_html(conversation: &Conversation) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>");
    out.push_str(&escape_html(&conversation.title));
    out.push_str("</title></head>\n<body>\n<h1>");
    out.push_str(&escape_html(&conversation.title));
    out.push_str("</h1>\n");

    for message in &conversation.messages {
        let rendered = super::render_message(message);
        out.push_str(&message_to_html(&message.role, &rendered));
        out.push('\n');
    }

    out.push_str("</body></html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_content;
    use crate::store::ChatMessage;

    #[test]
    fn test_escape_html_covers_the_three_characters() {
        assert_eq!(escape_html("a & b < c > d"), "a &amp; b &lt; c &gt; d");
    }

    #[test]
    fn test_escape_is_applied_to_text_spans() {
        let blocks = render_content("AC&DC <tags> stay literal");
        assert_eq!(
            blocks_to_html(&blocks),
            "<p>AC&amp;DC &lt;tags&gt; stay literal</p>"
        );
    }

    #[test]
    fn test_bold_and_code_markup() {
        let blocks = render_content("**bold** and `code<b>`");
        assert_eq!(
            blocks_to_html(&blocks),
            "<p><strong>bold</strong> and <code>code&lt;b&gt;</code></p>"
        );
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(blocks_to_html(&render_content("## Title")), "<h3>Title</h3>");
        assert_eq!(blocks_to_html(&render_content("### Sub")), "<h4>Sub</h4>");
    }

    #[test]
    fn test_list_markup() {
        assert_eq!(
            blocks_to_html(&render_content("- a\n- b")),
            "<ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_quote_markup() {
        assert_eq!(
            blocks_to_html(&render_content("> noted")),
            "<blockquote>noted</blockquote>"
        );
    }

    #[test]
    fn test_line_break_markup() {
        assert_eq!(
            blocks_to_html(&render_content("one\ntwo")),
            "<p>one<br>two</p>"
        );
    }

    #[test]
    fn test_callout_markup() {
        let html = blocks_to_html(&render_content(
            "I cannot find a definitive answer in the provided policy wording.",
        ));
        assert!(html.starts_with("<div class=\"no-answer\">"));
        assert!(html.ends_with("</div>"));
    }

    #[test]
    fn test_conversation_export_contains_both_roles() {
        let mut conv = Conversation::new("id");
        conv.push(ChatMessage::user("Is wear and tear covered?"));
        conv.push(ChatMessage::assistant("No, it is **excluded**.", vec![], vec![]));

        let html = conversation_to_html(&conv);
        assert!(html.contains("<div class=\"message user\">"));
        assert!(html.contains("<div class=\"message assistant\">"));
        assert!(html.contains("<strong>excluded</strong>"));
        assert!(html.contains("<title>Is wear and tear covered?</title>"));
    }
}
