use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

// ============================================================
// Outline tree
// ============================================================

/// Leaf of the outline: a titled note with optional one-line content
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubNode {
    #[serde(rename = "sub_title")]
    pub title: String,
    #[serde(rename = "sub_content", default)]
    pub content: String,
}

impl SubNode {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Insight {
    #[serde(rename = "node_title")]
    pub title: String,
    #[serde(default)]
    pub sub_nodes: Vec<SubNode>,
}

impl Insight {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sub_nodes: Vec::new(),
        }
    }
}

/// One policy document in the outline
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Document {
    #[serde(rename = "document_id")]
    pub id: String,
    #[serde(rename = "document_title")]
    pub title: String,
    #[serde(rename = "document_type")]
    pub kind: String,
    #[serde(rename = "audit_insights", default)]
    pub insights: Vec<Insight>,
}

/// Parsed outline wrapped with its collection-level title and context
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Outline {
    pub unified_title: String,
    pub audit_context: String,
    pub documents: Vec<Document>,
}

/// Raw markdown together with the tree parsed from it
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoadedOutline {
    pub markdown: String,
    pub outline: Outline,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OutlineStats {
    pub documents: usize,
    pub insights: usize,
    pub sub_nodes: usize,
    pub words: usize,
}

// ============================================================
// Facts
// ============================================================

/// One (policy field, document) value extracted from a policy document
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fact {
    #[serde(deserialize_with = "scalar_as_string")]
    pub value: String,
    pub document_title: String,
    #[serde(default)]
    pub fact_name: String,
    #[serde(default = "not_available")]
    pub source_sentence: String,
    #[serde(default = "not_available")]
    pub context: String,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub reference: String,
}

impl Fact {
    /// True when the fact carries a sentence worth searching for
    pub fn has_source_sentence(&self) -> bool {
        is_searchable_sentence(&self.source_sentence)
    }
}

/// Placeholder used by the fact index for missing text fields
pub const NOT_AVAILABLE: &str = "N/A";

/// False for blank sentences and the [`NOT_AVAILABLE`] placeholder
pub fn is_searchable_sentence(sentence: &str) -> bool {
    let sentence = sentence.trim();
    !sentence.is_empty() && sentence != NOT_AVAILABLE
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Fact values and references show up as strings, numbers or booleans
/// depending on the extractor that produced the index.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected a scalar value, found {}",
            other
        ))),
    }
}

/// Field name -> facts, in document appearance order
pub type FactIndex = IndexMap<String, Vec<Fact>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Consistent,
    Inconsistent,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FactMetrics {
    pub total: usize,
    pub inconsistent: usize,
    pub consistent: usize,
    /// Percentage of consistent fields, 0 when there are no fields
    pub consistency_rate: f64,
}

/// A field group prepared for display
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FieldView {
    pub field_name: String,
    pub display_name: String,
    pub status: FieldStatus,
    pub facts: Vec<Fact>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FactsOverview {
    pub metrics: FactMetrics,
    pub fields: Vec<FieldView>,
    pub inconsistent_fields: Vec<String>,
    pub consistent_fields: Vec<String>,
}

// ============================================================
// Source documents
// ============================================================

/// Full text of a policy document, used to jump to a fact's evidence
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceDocument {
    pub title: String,
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub version: String,
}

/// File name -> document
pub type SourceLibrary = IndexMap<String, SourceDocument>;

// ============================================================
// Sentence search
// ============================================================

/// Outcome of locating a sentence inside a document body
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LocateResult {
    pub found: bool,
    /// Window of original text around the match, match wrapped in the highlight marker
    pub context: Option<String>,
    /// Character offset of the match start in the document body
    pub position: Option<usize>,
}

impl LocateResult {
    pub fn miss() -> Self {
        Self {
            found: false,
            context: None,
            position: None,
        }
    }
}

/// Last search performed in a session
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SearchResult {
    pub sentence: String,
    pub document: String,
    pub context: String,
    pub position: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_accepts_numeric_value_and_missing_sentence() {
        let fact: Fact = serde_json::from_str(
            r#"{"value": 15, "document_title": "access_management_policy.md", "reference": 3}"#,
        )
        .unwrap();

        assert_eq!(fact.value, "15");
        assert_eq!(fact.reference, "3");
        assert_eq!(fact.source_sentence, NOT_AVAILABLE);
        assert!(!fact.has_source_sentence());
    }

    #[test]
    fn test_searchable_sentences() {
        assert!(is_searchable_sentence("RTO is 72 hours"));
        assert!(!is_searchable_sentence(""));
        assert!(!is_searchable_sentence("   "));
        assert!(!is_searchable_sentence(" N/A "));
    }

    #[test]
    fn test_fact_rejects_nested_value() {
        let parsed = serde_json::from_str::<Fact>(r#"{"value": [1, 2], "document_title": "x"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_fact_index_keeps_field_order() {
        let index: FactIndex = serde_json::from_str(
            r#"{
                "zeta": [{"value": "a", "document_title": "d"}],
                "alpha": [{"value": "b", "document_title": "d"}]
            }"#,
        )
        .unwrap();

        let keys: Vec<&str> = index.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_document_uses_export_field_names() {
        let doc = Document {
            id: "abcd1234".to_string(),
            title: "Access Policy".to_string(),
            kind: "Policy Document".to_string(),
            insights: vec![Insight {
                title: "Reviews".to_string(),
                sub_nodes: vec![SubNode::new("Quarterly")],
            }],
        };

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["document_id"], "abcd1234");
        assert_eq!(json["document_type"], "Policy Document");
        assert_eq!(json["audit_insights"][0]["node_title"], "Reviews");
        assert_eq!(json["audit_insights"][0]["sub_nodes"][0]["sub_title"], "Quarterly");
        assert_eq!(json["audit_insights"][0]["sub_nodes"][0]["sub_content"], "");
    }

    #[test]
    fn test_source_document_type_field() {
        let doc: SourceDocument = serde_json::from_str(
            r#"{"title": "DR Plan", "content": "text", "type": "Operational Plan", "version": 3.0}"#,
        )
        .unwrap();

        assert_eq!(doc.kind, "Operational Plan");
        assert_eq!(doc.version, "3.0");
        assert_eq!(doc.last_updated, "");
    }
}
