//! Answer text to content blocks
//!
//! An explicit line/paragraph scanner over the markdown subset the
//! answering service emits. Block detection is line-based, not a full
//! grammar: nested lists, ordered lists, tables, and links pass through as
//! literal text.
//!
//! Inline precedence is fixed: bold is recognized before italic (so `**`
//! is never consumed as two italics), italic only applies to a single `*`
//! not immediately adjacent to another `*`, and code spans come last.
//! Escaping of HTML-sensitive characters is a markup concern and happens
//! in the [`super::html`] adapter, after block structure is decided.

use super::{Block, Inline};

/// Marker phrases indicating the service found no definitive answer.
/// Matching is a plain substring test against the raw answer text.
const NO_ANSWER_MARKERS: [&str; 2] = ["I cannot find a definitive answer", "I couldn't find"];

/// Start of the textual citation section some answers carry. The
/// structured source list supersedes it, so it is stripped from the body.
const SOURCES_MARKER: &str = "\nSources:";

/// Render raw answer text into content blocks
///
/// A no-answer response (detected by marker phrase) is wrapped in a single
/// [`Block::Callout`]; in both cases any trailing `\nSources:` section is
/// stripped before block parsing.
///
/// # Examples
///
/// ```
/// use poliqa::render::{render_content, Block};
///
/// let blocks = render_content("Wear and tear is excluded.\nSources: [1] Policy.pdf");
/// assert_eq!(blocks.len(), 1);
/// assert!(matches!(blocks[0], Block::Paragraph(_)));
/// ```
pub fn render_content(text: &str) -> Vec<Block> {
    let body = strip_sources_section(text);
    let blocks = parse_blocks(body);

    if is_no_answer(text) {
        vec![Block::Callout(blocks)]
    } else {
        blocks
    }
}

/// Whether the answer text contains a no-answer marker phrase
pub fn is_no_answer(text: &str) -> bool {
    NO_ANSWER_MARKERS.iter().any(|m| text.contains(m))
}

/// Strip the trailing textual `Sources:` section, if any
fn strip_sources_section(text: &str) -> &str {
    match text.find(SOURCES_MARKER) {
        Some(idx) => text[..idx].trim_end(),
        None => text,
    }
}

/// Whether a line opens a non-paragraph block
fn is_block_start(line: &str) -> bool {
    line.starts_with("## ")
        || line.starts_with("### ")
        || line.starts_with("> ")
        || line.starts_with("- ")
}

fn parse_blocks(text: &str) -> Vec<Block> {
    let lines: Vec<&str> = text.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if line.trim().is_empty() {
            i += 1;
            continue;
        }

        // `### ` must be checked before `## `; a `#### ` line matches
        // neither and falls through as literal paragraph text.
        if let Some(rest) = line.strip_prefix("### ") {
            blocks.push(Block::Heading {
                level: 4,
                content: parse_inline(rest),
            });
            i += 1;
        } else if let Some(rest) = line.strip_prefix("## ") {
            blocks.push(Block::Heading {
                level: 3,
                content: parse_inline(rest),
            });
            i += 1;
        } else if let Some(rest) = line.strip_prefix("> ") {
            blocks.push(Block::Quote(parse_inline(rest)));
            i += 1;
        } else if line.starts_with("- ") {
            let mut items = Vec::new();
            while i < lines.len() {
                match lines[i].strip_prefix("- ") {
                    Some(rest) => {
                        items.push(parse_inline(rest));
                        i += 1;
                    }
                    None => break,
                }
            }
            blocks.push(Block::List(items));
        } else {
            // Paragraph: consecutive plain lines joined by soft breaks,
            // terminated by a blank line or the start of another block.
            let mut spans = Vec::new();
            while i < lines.len() {
                let l = lines[i];
                if l.trim().is_empty() || is_block_start(l) {
                    break;
                }
                if !spans.is_empty() {
                    spans.push(Inline::LineBreak);
                }
                spans.extend(parse_inline(l));
                i += 1;
            }
            blocks.push(Block::Paragraph(spans));
        }
    }

    blocks
}

/// Parse inline spans with full precedence (bold, italic, code)
pub fn parse_inline(text: &str) -> Vec<Inline> {
    parse_spans(text, true, true)
}

fn parse_spans(text: &str, allow_bold: bool, allow_italic: bool) -> Vec<Inline> {
    let chars: Vec<char> = text.chars().collect();
    let mut out: Vec<Inline> = Vec::new();
    let mut buf = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '*' && allow_bold && i + 1 < chars.len() && chars[i + 1] == '*' {
            match find_double_star(&chars, i + 2) {
                Some(j) if j > i + 2 => {
                    flush_text(&mut buf, &mut out);
                    let inner: String = chars[i + 2..j].iter().collect();
                    out.push(Inline::Bold(parse_spans(&inner, false, true)));
                    i = j + 2;
                }
                _ => {
                    // Unclosed `**`: both stars are literal, and neither
                    // may open an italic (adjacent-star rule).
                    buf.push_str("**");
                    i += 2;
                }
            }
        } else if c == '*' && allow_italic && (i + 1 >= chars.len() || chars[i + 1] != '*') {
            // Single-star italic: the inner text may not contain `*`, and
            // the closing star must not be adjacent to another `*`.
            match chars[i + 1..].iter().position(|&ch| ch == '*') {
                Some(offset) if offset > 0 => {
                    let j = i + 1 + offset;
                    if j + 1 < chars.len() && chars[j + 1] == '*' {
                        buf.push('*');
                        i += 1;
                    } else {
                        flush_text(&mut buf, &mut out);
                        let inner: String = chars[i + 1..j].iter().collect();
                        out.push(Inline::Italic(parse_spans(&inner, false, false)));
                        i = j + 1;
                    }
                }
                _ => {
                    buf.push('*');
                    i += 1;
                }
            }
        } else if c == '`' {
            match chars[i + 1..].iter().position(|&ch| ch == '`') {
                Some(offset) if offset > 0 => {
                    let j = i + 1 + offset;
                    flush_text(&mut buf, &mut out);
                    out.push(Inline::Code(chars[i + 1..j].iter().collect()));
                    i = j + 1;
                }
                _ => {
                    buf.push('`');
                    i += 1;
                }
            }
        } else {
            buf.push(c);
            i += 1;
        }
    }

    flush_text(&mut buf, &mut out);
    out
}

fn find_double_star(chars: &[char], from: usize) -> Option<usize> {
    if chars.len() < 2 {
        return None;
    }
    (from..chars.len() - 1).find(|&k| chars[k] == '*' && chars[k + 1] == '*')
}

fn flush_text(buf: &mut String, out: &mut Vec<Inline>) {
    if !buf.is_empty() {
        out.push(Inline::Text(std::mem::take(buf)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn test_single_paragraph() {
        let blocks = render_content("Wear and tear is excluded.");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![text("Wear and tear is excluded.")])]
        );
    }

    #[test]
    fn test_blank_lines_split_paragraphs() {
        let blocks = render_content("First paragraph.\n\n\nSecond paragraph.");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], Block::Paragraph(vec![text("First paragraph.")]));
        assert_eq!(blocks[1], Block::Paragraph(vec![text("Second paragraph.")]));
    }

    #[test]
    fn test_single_newline_becomes_line_break() {
        let blocks = render_content("line one\nline two");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("line one"),
                Inline::LineBreak,
                text("line two"),
            ])]
        );
    }

    #[test]
    fn test_double_hash_is_level_3_heading() {
        let blocks = render_content("## Coverage");
        assert_eq!(
            blocks,
            vec![Block::Heading {
                level: 3,
                content: vec![text("Coverage")],
            }]
        );
    }

    #[test]
    fn test_triple_hash_is_level_4_heading() {
        let blocks = render_content("### Exclusions");
        assert_eq!(
            blocks,
            vec![Block::Heading {
                level: 4,
                content: vec![text("Exclusions")],
            }]
        );
    }

    #[test]
    fn test_quadruple_hash_passes_through_as_text() {
        let blocks = render_content("#### Not a heading");
        assert_eq!(blocks, vec![Block::Paragraph(vec![text("#### Not a heading")])]);
    }

    #[test]
    fn test_heading_terminates_paragraph_without_blank_line() {
        let blocks = render_content("intro text\n## Heading");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], Block::Paragraph(vec![text("intro text")]));
        assert!(matches!(blocks[1], Block::Heading { level: 3, .. }));
    }

    #[test]
    fn test_quote_lines_are_individual_blocks() {
        let blocks = render_content("> first\n> second");
        assert_eq!(
            blocks,
            vec![
                Block::Quote(vec![text("first")]),
                Block::Quote(vec![text("second")]),
            ]
        );
    }

    #[test]
    fn test_contiguous_list_items_coalesce() {
        let blocks = render_content("- one\n- two\n- three");
        assert_eq!(
            blocks,
            vec![Block::List(vec![
                vec![text("one")],
                vec![text("two")],
                vec![text("three")],
            ])]
        );
    }

    #[test]
    fn test_separated_lists_stay_separate() {
        let blocks = render_content("- one\n\ntext between\n\n- two");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], Block::List(vec![vec![text("one")]]));
        assert_eq!(blocks[2], Block::List(vec![vec![text("two")]]));
    }

    #[test]
    fn test_ordered_list_passes_through_as_text() {
        let blocks = render_content("1. first\n2. second");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("1. first"),
                Inline::LineBreak,
                text("2. second"),
            ])]
        );
    }

    #[test]
    fn test_bold_span() {
        let blocks = render_content("this is **important** here");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("this is "),
                Inline::Bold(vec![text("important")]),
                text(" here"),
            ])]
        );
    }

    #[test]
    fn test_italic_span() {
        let blocks = render_content("an *emphasized* word");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("an "),
                Inline::Italic(vec![text("emphasized")]),
                text(" word"),
            ])]
        );
    }

    #[test]
    fn test_bold_takes_precedence_over_italic() {
        let blocks = render_content("**bold** and *italic*");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                Inline::Bold(vec![text("bold")]),
                text(" and "),
                Inline::Italic(vec![text("italic")]),
            ])]
        );
    }

    #[test]
    fn test_italic_inside_bold() {
        let blocks = render_content("**outer *inner* text**");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![Inline::Bold(vec![
                text("outer "),
                Inline::Italic(vec![text("inner")]),
                text(" text"),
            ])])]
        );
    }

    #[test]
    fn test_unclosed_bold_is_literal() {
        let blocks = render_content("a ** dangling");
        assert_eq!(blocks, vec![Block::Paragraph(vec![text("a ** dangling")])]);
    }

    #[test]
    fn test_lone_star_is_literal() {
        let blocks = render_content("3 * 4 = 12");
        // The first `*` finds no closing star before the line ends, and
        // no italic forms across the `=`... the second star candidate has
        // no partner at all.
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            Block::Paragraph(spans) => {
                // "3 * 4 = 12" contains two spaces around `*`; the span
                // between the star and line end has no second star, so all
                // text stays literal.
                assert_eq!(spans, &vec![text("3 * 4 = 12")]);
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_inline_code_span() {
        let blocks = render_content("see `clause 3.2` for details");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("see "),
                Inline::Code("clause 3.2".to_string()),
                text(" for details"),
            ])]
        );
    }

    #[test]
    fn test_code_content_is_literal() {
        let blocks = render_content("`**not bold**`");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![Inline::Code("**not bold**".to_string())])]
        );
    }

    #[test]
    fn test_sources_suffix_stripped() {
        let blocks = render_content("No, wear and tear is excluded. \nSources: [1] Policy.pdf p.12");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![text("No, wear and tear is excluded.")])]
        );
    }

    #[test]
    fn test_no_answer_marker_produces_callout() {
        let blocks =
            render_content("I cannot find a definitive answer in the provided policy wording.");
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            Block::Callout(inner) => {
                assert_eq!(inner.len(), 1);
                assert!(matches!(inner[0], Block::Paragraph(_)));
            }
            other => panic!("expected callout, got {:?}", other),
        }
    }

    #[test]
    fn test_second_no_answer_marker_detected() {
        let blocks = render_content(
            "I couldn't find anything related to that in the loaded policy documents.",
        );
        assert!(matches!(blocks[0], Block::Callout(_)));
    }

    #[test]
    fn test_no_answer_callout_strips_sources_suffix() {
        let text_in = "I cannot find a definitive answer in the provided policy wording.\nSources: [1] Policy.pdf";
        let blocks = render_content(text_in);
        match &blocks[0] {
            Block::Callout(inner) => match &inner[0] {
                Block::Paragraph(spans) => {
                    assert_eq!(
                        spans,
                        &vec![text(
                            "I cannot find a definitive answer in the provided policy wording."
                        )]
                    );
                }
                other => panic!("expected paragraph, got {:?}", other),
            },
            other => panic!("expected callout, got {:?}", other),
        }
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let input = "## Summary\n\n**Cover** applies to *sudden* loss.\n- item\n- item two\n\n> note";
        assert_eq!(render_content(input), render_content(input));
    }

    #[test]
    fn test_link_syntax_passes_through() {
        let blocks = render_content("see [the PDS](https://example.com)");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![text("see [the PDS](https://example.com)")])]
        );
    }
}
