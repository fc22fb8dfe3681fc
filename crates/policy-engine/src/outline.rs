//! Mind map outline parser
//!
//! Turns the five-level heading outline into Document -> Insight -> SubNode
//! records in a single forward scan. Lines that don't start with one of the
//! markers in [`HEADING_MARKERS`] are ignored, as are lines whose parent
//! level hasn't been opened yet.

use shared_types::{Document, Insight, LoadedOutline, Outline, OutlineStats, SubNode};
use uuid::Uuid;

use crate::patterns::{
    HeadingKind, AUDIT_CONTEXT, DEFAULT_OUTLINE_TITLE, DOCUMENT_ID_LEN, DOCUMENT_TYPE,
    HEADING_MARKERS,
};

/// A classified outline line, carrying the trimmed text after its marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineLine<'a> {
    Title(&'a str),
    DocumentStart(&'a str),
    InsightStart(&'a str),
    SubNodeTitle(&'a str),
    SubNodeContent(&'a str),
    Unstructured,
}

/// Classify a single line. Leading and trailing whitespace is ignored.
pub fn classify(line: &str) -> OutlineLine<'_> {
    let line = line.trim();

    for (marker, kind) in HEADING_MARKERS {
        if let Some(rest) = line.strip_prefix(marker) {
            let text = rest.trim();
            return match kind {
                HeadingKind::Title => OutlineLine::Title(text),
                HeadingKind::DocumentStart => OutlineLine::DocumentStart(text),
                HeadingKind::InsightStart => OutlineLine::InsightStart(text),
                HeadingKind::SubNodeTitle => OutlineLine::SubNodeTitle(text),
                HeadingKind::SubNodeContent => OutlineLine::SubNodeContent(text),
            };
        }
    }

    OutlineLine::Unstructured
}

/// Parse outline markdown into a tree. Never fails; empty input yields the
/// default title and no documents.
pub fn parse(markdown: &str) -> Outline {
    let mut builder = OutlineBuilder::default();
    for line in markdown.lines() {
        builder.feed(classify(line));
    }
    builder.finish()
}

/// Parse and keep the source text alongside the tree
pub fn load(markdown: String) -> LoadedOutline {
    let outline = parse(&markdown);
    LoadedOutline { markdown, outline }
}

/// Counts shown next to the rendered mind map
pub fn stats(outline: &Outline, markdown: &str) -> OutlineStats {
    let insights = outline.documents.iter().map(|d| d.insights.len()).sum();
    let sub_nodes = outline
        .documents
        .iter()
        .flat_map(|d| d.insights.iter())
        .map(|i| i.sub_nodes.len())
        .sum();

    OutlineStats {
        documents: outline.documents.len(),
        insights,
        sub_nodes,
        words: markdown.split_whitespace().count(),
    }
}

fn generate_document_id() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(DOCUMENT_ID_LEN)
        .collect()
}

#[derive(Default)]
struct OutlineBuilder {
    title: Option<String>,
    documents: Vec<Document>,
    current_document: Option<Document>,
    current_insight: Option<Insight>,
}

impl OutlineBuilder {
    fn feed(&mut self, line: OutlineLine<'_>) {
        match line {
            OutlineLine::Title(text) => {
                if self.title.is_none() {
                    self.title = Some(text.to_string());
                }
            }
            OutlineLine::DocumentStart(text) => {
                self.close_document();
                self.current_document = Some(Document {
                    id: generate_document_id(),
                    title: text.to_string(),
                    kind: DOCUMENT_TYPE.to_string(),
                    insights: Vec::new(),
                });
            }
            OutlineLine::InsightStart(text) => {
                self.close_insight();
                // An insight needs a document to belong to
                if self.current_document.is_some() {
                    self.current_insight = Some(Insight::new(text));
                }
            }
            OutlineLine::SubNodeTitle(text) => {
                if let Some(insight) = self.current_insight.as_mut() {
                    insight.sub_nodes.push(SubNode::new(text));
                }
            }
            OutlineLine::SubNodeContent(text) => {
                if let Some(sub_node) = self
                    .current_insight
                    .as_mut()
                    .and_then(|insight| insight.sub_nodes.last_mut())
                {
                    sub_node.content = text.to_string();
                }
            }
            OutlineLine::Unstructured => {}
        }
    }

    fn close_insight(&mut self) {
        if let Some(insight) = self.current_insight.take() {
            if let Some(document) = self.current_document.as_mut() {
                document.insights.push(insight);
            }
        }
    }

    fn close_document(&mut self) {
        self.close_insight();
        if let Some(document) = self.current_document.take() {
            self.documents.push(document);
        }
    }

    fn finish(mut self) -> Outline {
        self.close_document();
        Outline {
            unified_title: self
                .title
                .unwrap_or_else(|| DEFAULT_OUTLINE_TITLE.to_string()),
            audit_context: AUDIT_CONTEXT.to_string(),
            documents: self.documents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const SAMPLE: &str = "\
# 🔍 Unified Controls Map

## 📋 Access Management Policy
### 🎯 Access Reviews
#### 🔸 Review cadence
##### Semi-annual access reviews by system owners
#### 🔸 MFA
##### Required for privileged accounts
### 🎯 Passwords
#### 🔸 Minimum length
##### 15 characters

## 📋 Disaster Recovery Plan
### 🎯 Objectives
#### 🔸 RTO
##### 72 hours
";

    /// Title/content view of a tree, ids dropped
    fn shape(outline: &Outline) -> Vec<(String, Vec<(String, Vec<(String, String)>)>)> {
        outline
            .documents
            .iter()
            .map(|d| {
                (
                    d.title.clone(),
                    d.insights
                        .iter()
                        .map(|i| {
                            (
                                i.title.clone(),
                                i.sub_nodes
                                    .iter()
                                    .map(|s| (s.title.clone(), s.content.clone()))
                                    .collect(),
                            )
                        })
                        .collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_classify_recognizes_each_marker() {
        assert_eq!(classify("# 🔍 Title"), OutlineLine::Title("Title"));
        assert_eq!(classify("## 📋 Doc"), OutlineLine::DocumentStart("Doc"));
        assert_eq!(classify("### 🎯 Insight"), OutlineLine::InsightStart("Insight"));
        assert_eq!(classify("#### 🔸 Sub"), OutlineLine::SubNodeTitle("Sub"));
        assert_eq!(classify("##### body text"), OutlineLine::SubNodeContent("body text"));
        assert_eq!(classify("   ## 📋 Indented  "), OutlineLine::DocumentStart("Indented"));
    }

    #[test]
    fn test_classify_rejects_wrong_glyph() {
        assert_eq!(classify("## 📄 Not a document"), OutlineLine::Unstructured);
        assert_eq!(classify("### Plain insight"), OutlineLine::Unstructured);
        assert_eq!(classify("# Title without glyph"), OutlineLine::Unstructured);
        assert_eq!(classify("plain paragraph"), OutlineLine::Unstructured);
        assert_eq!(classify(""), OutlineLine::Unstructured);
    }

    #[test]
    fn test_parse_sample_tree() {
        let outline = parse(SAMPLE);

        assert_eq!(outline.unified_title, "Unified Controls Map");
        assert_eq!(outline.audit_context, AUDIT_CONTEXT);
        assert_eq!(
            shape(&outline),
            vec![
                (
                    "Access Management Policy".to_string(),
                    vec![
                        (
                            "Access Reviews".to_string(),
                            vec![
                                (
                                    "Review cadence".to_string(),
                                    "Semi-annual access reviews by system owners".to_string()
                                ),
                                ("MFA".to_string(), "Required for privileged accounts".to_string()),
                            ]
                        ),
                        (
                            "Passwords".to_string(),
                            vec![("Minimum length".to_string(), "15 characters".to_string())]
                        ),
                    ]
                ),
                (
                    "Disaster Recovery Plan".to_string(),
                    vec![(
                        "Objectives".to_string(),
                        vec![("RTO".to_string(), "72 hours".to_string())]
                    )]
                ),
            ]
        );
    }

    #[test]
    fn test_documents_get_short_ids_and_fixed_type() {
        let outline = parse(SAMPLE);
        for doc in &outline.documents {
            assert_eq!(doc.id.len(), DOCUMENT_ID_LEN);
            assert!(doc.id.chars().all(|c| c.is_ascii_hexdigit()));
            assert_eq!(doc.kind, DOCUMENT_TYPE);
        }
    }

    #[test]
    fn test_empty_input_yields_default_title() {
        let outline = parse("");
        assert_eq!(outline.unified_title, DEFAULT_OUTLINE_TITLE);
        assert!(outline.documents.is_empty());
    }

    #[test]
    fn test_first_title_wins() {
        let outline = parse("# 🔍 First\n# 🔍 Second\n");
        assert_eq!(outline.unified_title, "First");
    }

    #[test]
    fn test_last_content_line_wins() {
        let outline = parse(
            "## 📋 Doc\n### 🎯 Insight\n#### 🔸 Sub\n##### first\n##### second\n",
        );
        let sub = &outline.documents[0].insights[0].sub_nodes[0];
        assert_eq!(sub.content, "second");
    }

    #[test]
    fn test_orphan_content_line_is_dropped() {
        let outline = parse(
            "## 📋 Doc\n### 🎯 Insight\n##### orphan\n#### 🔸 Sub\n",
        );
        let insight = &outline.documents[0].insights[0];
        assert_eq!(insight.sub_nodes.len(), 1);
        assert_eq!(insight.sub_nodes[0].content, "");
    }

    #[test]
    fn test_sub_node_without_insight_is_dropped() {
        let outline = parse("## 📋 Doc\n#### 🔸 Lost\n##### lost content\n");
        assert_eq!(outline.documents.len(), 1);
        assert!(outline.documents[0].insights.is_empty());
    }

    #[test]
    fn test_insight_before_any_document_is_dropped() {
        let outline = parse("### 🎯 Early\n#### 🔸 Sub\n## 📋 Doc\n");
        assert_eq!(outline.documents.len(), 1);
        assert!(outline.documents[0].insights.is_empty());
    }

    #[test]
    fn test_insight_stays_with_its_document() {
        let outline = parse("## 📋 A\n### 🎯 In A\n## 📋 B\n### 🎯 In B\n");
        assert_eq!(outline.documents[0].insights.len(), 1);
        assert_eq!(outline.documents[0].insights[0].title, "In A");
        assert_eq!(outline.documents[1].insights.len(), 1);
        assert_eq!(outline.documents[1].insights[0].title, "In B");
    }

    #[test]
    fn test_content_does_not_leak_across_insights() {
        let outline = parse(
            "## 📋 Doc\n### 🎯 One\n#### 🔸 Sub\n### 🎯 Two\n##### stray\n",
        );
        let doc = &outline.documents[0];
        assert_eq!(doc.insights[0].sub_nodes[0].content, "");
        assert!(doc.insights[1].sub_nodes.is_empty());
    }

    #[test]
    fn test_stats_counts_tree_and_words() {
        let outline = parse(SAMPLE);
        let stats = stats(&outline, SAMPLE);
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.insights, 3);
        assert_eq!(stats.sub_nodes, 4);
        assert_eq!(stats.words, SAMPLE.split_whitespace().count());
    }

    fn outline_text() -> impl Strategy<Value = String> {
        let line = prop_oneof![
            "[A-Za-z ]{1,20}".prop_map(|t| format!("## 📋 {}", t)),
            "[A-Za-z ]{1,20}".prop_map(|t| format!("### 🎯 {}", t)),
            "[A-Za-z ]{1,20}".prop_map(|t| format!("#### 🔸 {}", t)),
            "[A-Za-z ]{1,20}".prop_map(|t| format!("##### {}", t)),
            "[A-Za-z #]{0,20}",
        ];
        prop::collection::vec(line, 0..40).prop_map(|lines| lines.join("\n"))
    }

    proptest! {
        /// Property: one document per document-start line, in source order
        #[test]
        fn document_count_matches_headings(text in outline_text()) {
            let expected: Vec<String> = text
                .lines()
                .filter_map(|l| match classify(l) {
                    OutlineLine::DocumentStart(t) => Some(t.to_string()),
                    _ => None,
                })
                .collect();
            let outline = parse(&text);
            let titles: Vec<String> = outline.documents.iter().map(|d| d.title.clone()).collect();
            prop_assert_eq!(titles, expected);
        }

        /// Property: parsing twice gives the same titles and contents
        #[test]
        fn parse_is_deterministic_up_to_ids(text in outline_text()) {
            prop_assert_eq!(shape(&parse(&text)), shape(&parse(&text)));
        }

        /// Property: arbitrary text never panics
        #[test]
        fn arbitrary_text_handled(text in ".{0,200}") {
            let _ = parse(&text);
        }
    }
}
