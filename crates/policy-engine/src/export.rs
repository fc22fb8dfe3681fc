//! Download payloads and file names for outline, facts and source exports

use serde::Serialize;
use uuid::Uuid;

use crate::assets::AssetError;

/// Kinds of file the dashboard offers for download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    OutlineMarkdown,
    OutlineJson,
    Facts,
    Sources,
}

impl ExportKind {
    fn prefix(self) -> &'static str {
        match self {
            ExportKind::OutlineMarkdown => "mindmap",
            ExportKind::OutlineJson => "mindmap_data",
            ExportKind::Facts => "facts_data",
            ExportKind::Sources => "policy_sources",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ExportKind::OutlineMarkdown => "md",
            _ => "json",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportKind::OutlineMarkdown => "text/markdown; charset=utf-8",
            _ => "application/json",
        }
    }

    /// File name with a fresh 8-hex-digit suffix, e.g. `facts_data_1a2b3c4d.json`
    pub fn file_name(self) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}_{}.{}", self.prefix(), &suffix[..8], self.extension())
    }
}

/// Pretty-printed JSON body for a download
pub fn to_pretty_json<T: Serialize>(value: &T, what: &str) -> Result<String, AssetError> {
    serde_json::to_string_pretty(value).map_err(|source| AssetError::Serialize {
        what: what.to_string(),
        source,
    })
}
