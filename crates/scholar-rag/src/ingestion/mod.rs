//! Document ingestion pipeline: parsing and chunking

mod chunker;
mod parser;
mod pipeline;

pub use chunker::TextChunker;
pub use parser::{FileParser, ParsedDocument};
pub use pipeline::{CorpusStats, IngestPipeline};
