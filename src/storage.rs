//! Text formats, the filesystem and external tools.

mod annotations;
pub use annotations::annotate;

/// Markdown parsing of requirement documents.
pub mod markdown;
pub use markdown::{MarkdownRequirement, ParseError};

/// Loading linked repositories.
pub mod repository;
pub use repository::LoadError;

/// Function taggers.
pub mod tagger;
pub use tagger::{SymbolTagger, TagLocation};

/// Building graphs from files.
pub mod workspace;
pub use workspace::{build_graph, BuildError};
