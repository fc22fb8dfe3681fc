pub mod types;

pub use types::{
    is_searchable_sentence, Document, Fact, FactIndex, FactMetrics, FactsOverview, FieldStatus,
    FieldView, Insight, LoadedOutline, LocateResult, Outline, OutlineStats, SearchResult,
    SourceDocument, SourceLibrary, SubNode, NOT_AVAILABLE,
};
