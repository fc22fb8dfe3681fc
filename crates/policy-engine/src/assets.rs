//! Flat-file assets: outline markdown, fact index and source documents
//!
//! A missing file is never an error. The outline falls back to empty text,
//! the fact index to an empty map, and the source library to per-file
//! placeholders or the embedded sample library. Files that exist but can't
//! be read or decoded are reported as [`AssetError`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use shared_types::{FactIndex, SourceDocument, SourceLibrary};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {origin}: {source}")]
    MalformedJson {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize {what}: {source}")]
    Serialize {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Policy library compiled into the binary, used when no sources are on disk
const SAMPLE_SOURCES: &str = include_str!("../assets/sample_sources.json");

/// Metadata for a policy file expected in the policies directory
#[derive(Debug, Clone, Copy)]
pub struct PolicyFile {
    pub filename: &'static str,
    pub title: &'static str,
    pub kind: &'static str,
    pub last_updated: &'static str,
    pub version: &'static str,
}

pub const POLICY_MANIFEST: &[PolicyFile] = &[
    PolicyFile {
        filename: "access_management_policy.md",
        title: "Access Management Policy",
        kind: "Policy Document",
        last_updated: "2024-03-15",
        version: "2.1",
    },
    PolicyFile {
        filename: "antivirus_management_procedure.md",
        title: "Antivirus Management Procedure",
        kind: "Procedure Document",
        last_updated: "2024-02-20",
        version: "1.0",
    },
    PolicyFile {
        filename: "data_management_policy.md",
        title: "Data Management Policy",
        kind: "Policy Document",
        last_updated: "2024-01-10",
        version: "1.2",
    },
    PolicyFile {
        filename: "disaster_recovery_plan.md",
        title: "Disaster Recovery Plan",
        kind: "Operational Plan",
        last_updated: "2024-04-05",
        version: "3.0",
    },
    PolicyFile {
        filename: "encryption_management.md",
        title: "Encryption Management Procedure",
        kind: "Procedure Document",
        last_updated: "2024-03-01",
        version: "4.0",
    },
    PolicyFile {
        filename: "information_security_policy.md",
        title: "Information Security Policy",
        kind: "Policy Document",
        last_updated: "2024-02-15",
        version: "1.0",
    },
    PolicyFile {
        filename: "risk_management_assessment_and_treatment_policy.md",
        title: "Risk Management Assessment and Treatment Policy",
        kind: "Risk Management Policy",
        last_updated: "2024-01-25",
        version: "2.0",
    },
    PolicyFile {
        filename: "vendor_management_policy.md",
        title: "Vendor Management Policy",
        kind: "Risk Management Policy",
        last_updated: "2024-03-20",
        version: "1.8",
    },
];

/// Read a whole file, mapping "not found" to `None`
fn read_optional(path: &Path) -> Result<Option<String>, AssetError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(AssetError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Outline markdown, or empty text when the file is absent
pub fn read_outline(path: &Path) -> Result<String, AssetError> {
    match read_optional(path)? {
        Some(text) => Ok(text),
        None => {
            info!("Outline {} not found, using empty outline", path.display());
            Ok(String::new())
        }
    }
}

/// Decode a fact index from JSON bytes, e.g. an uploaded replacement
pub fn parse_fact_index(bytes: &[u8], origin: &str) -> Result<FactIndex, AssetError> {
    serde_json::from_slice(bytes).map_err(|source| AssetError::MalformedJson {
        origin: origin.to_string(),
        source,
    })
}

/// Fact index from disk, or an empty index when the file is absent
pub fn load_fact_index(path: &Path) -> Result<FactIndex, AssetError> {
    match read_optional(path)? {
        Some(text) => parse_fact_index(text.as_bytes(), &path.display().to_string()),
        None => {
            info!("Fact index {} not found, using empty index", path.display());
            Ok(FactIndex::new())
        }
    }
}

pub fn sample_library() -> Result<SourceLibrary, AssetError> {
    serde_json::from_str(SAMPLE_SOURCES).map_err(|source| AssetError::MalformedJson {
        origin: "embedded sample sources".to_string(),
        source,
    })
}

/// Source library lookup order: the sources JSON file, then the manifest
/// files in `policies_dir`, then the embedded sample library.
pub fn load_source_library(
    sources_path: &Path,
    policies_dir: &Path,
) -> Result<SourceLibrary, AssetError> {
    if let Some(text) = read_optional(sources_path)? {
        return serde_json::from_str(&text).map_err(|source| AssetError::MalformedJson {
            origin: sources_path.display().to_string(),
            source,
        });
    }

    if policies_dir.is_dir() {
        return load_policy_directory(policies_dir);
    }

    info!(
        "No sources at {} or {}, using embedded sample library",
        sources_path.display(),
        policies_dir.display()
    );
    sample_library()
}

/// Read every manifest file from `dir`. Missing or unreadable files get
/// placeholder content so the library always lists the full manifest.
pub fn load_policy_directory(dir: &Path) -> Result<SourceLibrary, AssetError> {
    let mut library = SourceLibrary::new();

    for policy in POLICY_MANIFEST {
        let path = dir.join(policy.filename);
        let content = match read_optional(&path) {
            Ok(Some(text)) => text,
            Ok(None) => {
                warn!("Policy file '{}' not found in {}", policy.filename, dir.display());
                format!(
                    "Content for {} not found. Please ensure the file {} exists in the {} directory.",
                    policy.title,
                    policy.filename,
                    dir.display()
                )
            }
            Err(err) => {
                warn!("{}", err);
                format!("Error loading content: {}", err)
            }
        };

        library.insert(
            policy.filename.to_string(),
            SourceDocument {
                title: policy.title.to_string(),
                content,
                kind: policy.kind.to_string(),
                last_updated: policy.last_updated.to_string(),
                version: policy.version.to_string(),
            },
        );
    }

    Ok(library)
}
