//! Fixed markers, field lists and strings shared by the parser, locator and
//! fact review

/// Structural line kinds recognized in a mind map outline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingKind {
    Title,
    DocumentStart,
    InsightStart,
    SubNodeTitle,
    SubNodeContent,
}

/// Heading markers in match order. A line is structural only when it starts
/// with one of these exactly, glyph included.
pub const HEADING_MARKERS: &[(&str, HeadingKind)] = &[
    ("# 🔍", HeadingKind::Title),
    ("## 📋", HeadingKind::DocumentStart),
    ("### 🎯", HeadingKind::InsightStart),
    ("#### 🔸", HeadingKind::SubNodeTitle),
    ("##### ", HeadingKind::SubNodeContent),
];

/// Used when the outline has no title line
pub const DEFAULT_OUTLINE_TITLE: &str = "Integrated Controls Framework Overview";

pub const AUDIT_CONTEXT: &str =
    "Comprehensive framework covering security, data governance, risk management and audit controls";

pub const DOCUMENT_TYPE: &str = "Policy Document";

/// Length of generated document identifiers
pub const DOCUMENT_ID_LEN: usize = 8;

/// Fields whose values are known to drift between documents. Only these can
/// be reported as inconsistent.
pub const VOLATILE_FIELDS: &[&str] = &[
    "security_training_frequency",
    "information_security_risk_assessment_frequency",
    "recovery_time_objective",
    "password_minimum_length",
];

pub const HIGHLIGHT_OPEN: &str = r#"<span class="highlighted-sentence">"#;
pub const HIGHLIGHT_CLOSE: &str = "</span>";

/// Characters of surrounding text kept on each side of a located match
pub const DEFAULT_CONTEXT_RADIUS: usize = 200;

/// Number of consecutive query words tried when the full sentence is absent
pub const FALLBACK_PHRASE_WORDS: usize = 3;

pub const SENTENCE_NOT_FOUND: &str = "Sentence not found in document";
pub const SOURCE_NOT_FOUND: &str = "Source document not found";

/// Characters of document text shown in source previews
pub const PREVIEW_CHARS: usize = 2000;
