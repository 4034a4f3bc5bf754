//! Citation metadata to renderable cards
//!
//! Builds the collapsible "Sources Referenced" block from the structured
//! source list. Sources are rendered exactly as the service ordered them;
//! deduplication is the service's responsibility, not the client's.

use crate::store::Source;

/// Maximum snippet length before truncation, ellipsis excluded
const SNIPPET_MAX_CHARS: usize = 200;

/// One renderable citation card
#[derive(Debug, Clone, PartialEq)]
pub struct CitationCard {
    /// Document the citation points into
    pub doc_name: String,
    /// Metadata line: clause, section, page, score joined by ` · `
    pub meta: String,
    /// Quoted excerpt, truncated to 200 characters
    pub snippet: Option<String>,
}

/// The collapsible citations block attached after answer content
#[derive(Debug, Clone, PartialEq)]
pub struct CitationsBlock {
    /// Header summarizing the count, e.g. "2 Sources Referenced"
    pub header: String,
    /// Per-source cards in service order
    pub cards: Vec<CitationCard>,
    /// Blocks start collapsed; toggling is a presentation concern
    pub collapsed: bool,
}

/// Build the citations block, or `None` when there are no sources
///
/// Each card's metadata line is assembled in fixed order: clause (prefixed
/// `§`), section label, `Page N`, then `Score: P%` (only when a score is
/// present, rounded to the nearest integer percent), joined with ` · `.
///
/// # Examples
///
/// ```
/// use poliqa::render::format_citations;
/// use poliqa::store::Source;
///
/// let sources = vec![Source {
///     doc_name: "Policy.pdf".to_string(),
///     section: None,
///     clause: Some("3.2".to_string()),
///     page: 12,
///     score: Some(0.81),
///     snippet: None,
/// }];
/// let block = format_citations(&sources).unwrap();
/// assert_eq!(block.header, "1 Source Referenced");
/// assert_eq!(block.cards[0].meta, "§3.2 · Page 12 · Score: 81%");
/// ```
pub fn format_citations(sources: &[Source]) -> Option<CitationsBlock> {
    if sources.is_empty() {
        return None;
    }

    let header = if sources.len() == 1 {
        "1 Source Referenced".to_string()
    } else {
        format!("{} Sources Referenced", sources.len())
    };

    let cards = sources.iter().map(citation_card).collect();

    Some(CitationsBlock {
        header,
        cards,
        collapsed: true,
    })
}

fn citation_card(source: &Source) -> CitationCard {
    let mut parts: Vec<String> = Vec::new();

    if let Some(clause) = source.clause.as_deref().filter(|c| !c.is_empty()) {
        parts.push(format!("§{}", clause));
    }
    if let Some(section) = source.section.as_deref().filter(|s| !s.is_empty()) {
        parts.push(section.to_string());
    }
    parts.push(format!("Page {}", source.page));
    if let Some(score) = source.score {
        parts.push(format!("Score: {}%", (score * 100.0).round() as i64));
    }

    CitationCard {
        doc_name: source.doc_name.clone(),
        meta: parts.join(" · "),
        snippet: source
            .snippet
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(quoted_snippet),
    }
}

fn quoted_snippet(snippet: &str) -> String {
    let count = snippet.chars().count();
    if count > SNIPPET_MAX_CHARS {
        let head: String = snippet.chars().take(SNIPPET_MAX_CHARS).collect();
        format!("\"{}...\"", head)
    } else {
        format!("\"{}\"", snippet)
    }
}
