pub mod assets;
pub mod export;
pub mod facts;
pub mod locator;
pub mod outline;
pub mod patterns;

use std::path::PathBuf;

use shared_types::{FactIndex, LoadedOutline, SearchResult, SourceLibrary};

pub use assets::AssetError;

/// Where the dashboard's flat-file assets live
#[derive(Debug, Clone)]
pub struct AssetPaths {
    pub outline: PathBuf,
    pub facts: PathBuf,
    pub sources: PathBuf,
    pub policies_dir: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            outline: PathBuf::from("mindmap.md"),
            facts: PathBuf::from("factIndex.json"),
            sources: PathBuf::from("source_documents.json"),
            policies_dir: PathBuf::from("policies"),
        }
    }
}

/// PolicyEngine entry point. Assets are read fresh on every call.
#[derive(Debug, Clone, Default)]
pub struct PolicyEngine {
    paths: AssetPaths,
}

impl PolicyEngine {
    pub fn new(paths: AssetPaths) -> Self {
        Self { paths }
    }

    /// Read and parse the mind map outline. Document ids are regenerated on
    /// every load.
    pub fn load_outline(&self) -> Result<LoadedOutline, AssetError> {
        let markdown = assets::read_outline(&self.paths.outline)?;
        Ok(outline::load(markdown))
    }

    pub fn load_facts(&self) -> Result<FactIndex, AssetError> {
        assets::load_fact_index(&self.paths.facts)
    }

    pub fn load_sources(&self) -> Result<SourceLibrary, AssetError> {
        assets::load_source_library(&self.paths.sources, &self.paths.policies_dir)
    }

    /// Find a fact's source sentence in the document it cites
    pub fn search(
        &self,
        sentence: &str,
        document_title: &str,
        context_radius: usize,
    ) -> Result<SearchResult, AssetError> {
        let library = self.load_sources()?;
        Ok(locator::search_library(
            &library,
            sentence,
            document_title,
            context_radius,
        ))
    }
}
