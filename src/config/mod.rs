//! Parsing configuration: documents, template grammar, generation,
//! retrieval and caching.

pub mod cache;
pub mod compiler;
pub mod store;
pub mod template;
pub mod types;

pub use cache::ConfigCache;
pub use compiler::{ScopeParserTemplate, TemplateCompiler};
pub use store::{ConfigStore, FileConfigStore, LayeredStore, ScopeTemplateStore, CONFIG_DIR_ENV};
pub use template::{scan_template, ScannedTemplate, SegmentKind, TemplateSegment};
pub use types::{ParsingConfig, RawParserConfig, RawSlotSpec, SlotExpression, SlotKind, SlotSpec};
