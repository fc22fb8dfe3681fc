//! Jump-to-evidence lookup of a quoted sentence inside a source document
//!
//! Matching is case-insensitive over ASCII only. `to_ascii_lowercase` keeps
//! every byte offset and char boundary of the original text, so offsets found
//! in the folded copy slice the original body directly. Non-ASCII letters are
//! compared as-is.

use shared_types::{LocateResult, SearchResult, SourceDocument, SourceLibrary};
use tracing::debug;

use crate::patterns::{
    FALLBACK_PHRASE_WORDS, HIGHLIGHT_CLOSE, HIGHLIGHT_OPEN, SENTENCE_NOT_FOUND, SOURCE_NOT_FOUND,
};

/// Find `sentence` in `body` and return a highlighted context window.
///
/// Tries the whole trimmed sentence first. If that is absent and the
/// sentence has at least three words, each run of three consecutive words is
/// tried in query order and the first one present wins.
pub fn locate(sentence: &str, body: &str, context_radius: usize) -> LocateResult {
    let needle = sentence.trim().to_ascii_lowercase();
    if needle.is_empty() || body.is_empty() {
        return LocateResult::miss();
    }

    let haystack = body.to_ascii_lowercase();

    if let Some(start) = haystack.find(&needle) {
        return hit(body, start, start + needle.len(), context_radius);
    }

    let words: Vec<&str> = needle.split_whitespace().collect();
    if words.len() >= FALLBACK_PHRASE_WORDS {
        for window in words.windows(FALLBACK_PHRASE_WORDS) {
            let phrase = window.join(" ");
            if let Some(start) = haystack.find(&phrase) {
                debug!("Exact sentence missing, matched phrase '{}'", phrase);
                return hit(body, start, start + phrase.len(), context_radius);
            }
        }
    }

    LocateResult::miss()
}

/// Resolve a fact's `document_title` against the library: file name first,
/// then document title.
pub fn resolve_document<'a>(
    library: &'a SourceLibrary,
    document_title: &str,
) -> Option<&'a SourceDocument> {
    library
        .get(document_title)
        .or_else(|| library.values().find(|doc| doc.title == document_title))
}

/// Search a fact's source sentence in the document it cites
pub fn search_library(
    library: &SourceLibrary,
    sentence: &str,
    document_title: &str,
    context_radius: usize,
) -> SearchResult {
    let (context, position) = match resolve_document(library, document_title) {
        Some(doc) => {
            let located = locate(sentence, &doc.content, context_radius);
            match located.context {
                Some(context) if located.found => (context, located.position),
                _ => (SENTENCE_NOT_FOUND.to_string(), None),
            }
        }
        None => (SOURCE_NOT_FOUND.to_string(), None),
    };

    SearchResult {
        sentence: sentence.to_string(),
        document: document_title.to_string(),
        context,
        position,
    }
}

/// Build the window around `body[start..end]` with the match wrapped in the
/// highlight marker. `start` and `end` must lie on char boundaries.
fn hit(body: &str, start: usize, end: usize, context_radius: usize) -> LocateResult {
    let window_start = step_back(body, start, context_radius);
    let window_end = step_forward(body, end, context_radius);

    let context = format!(
        "{}{}{}{}{}",
        &body[window_start..start],
        HIGHLIGHT_OPEN,
        &body[start..end],
        HIGHLIGHT_CLOSE,
        &body[end..window_end]
    );

    LocateResult {
        found: true,
        context: Some(context),
        position: Some(body[..start].chars().count()),
    }
}

/// Byte index `chars` characters before `from`, clipped to the start
fn step_back(text: &str, from: usize, chars: usize) -> usize {
    if chars == 0 {
        return from;
    }
    text[..from]
        .char_indices()
        .rev()
        .take(chars)
        .last()
        .map_or(from, |(i, _)| i)
}

/// Byte index `chars` characters after `from`, clipped to the end
fn step_forward(text: &str, from: usize, chars: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(i, _)| from + i)
}
