//! Recursive character text chunking with overlap

use std::collections::VecDeque;

use crate::types::{Chunk, ChunkSource, Document};
use super::parser::ParsedDocument;

/// Separator ladder, tried from coarsest to finest. A level is used when the
/// text contains it; oversized pieces fall through to the next level, ending
/// with a hard character split.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Text chunker with configurable size and overlap
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
    /// Minimum chunk size
    min_size: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size.saturating_sub(1)),
            min_size: 50,
        }
    }

    /// Set the minimum chunk size
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    /// Chunk a parsed document into `Chunk`s with source metadata
    pub fn chunk_document(&self, doc: &Document, parsed: &ParsedDocument) -> Vec<Chunk> {
        let pieces = self.split_text(&parsed.content);

        let mut chunks: Vec<Chunk> = Vec::with_capacity(pieces.len());
        let mut search_from = 0usize;

        for piece in pieces {
            if piece.len() < self.min_size {
                continue;
            }

            // Pieces are verbatim substrings, so offsets can be recovered by
            // scanning forward from the previous chunk's start.
            let char_start = parsed.content[search_from..]
                .find(&piece)
                .map(|pos| search_from + pos)
                .unwrap_or(search_from);
            let char_end = char_start + piece.len();
            search_from = char_start + 1;

            let source = ChunkSource {
                filename: doc.filename.clone(),
                file_type: doc.file_type.clone(),
                page_number: None,
                page_count: parsed.total_pages,
            };

            chunks.push(Chunk::new(
                doc.id,
                piece,
                source,
                char_start,
                char_end,
                chunks.len() as u32,
            ));
        }

        let total = chunks.len() as u32;
        for chunk in &mut chunks {
            chunk.total_chunks = total;
        }

        chunks
    }

    /// Split text into overlapping pieces of at most `chunk_size` characters
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // Pick the first separator present in the text
        let (sep, remaining) = match separators.iter().position(|s| text.contains(s)) {
            Some(idx) => (Some(separators[idx]), &separators[idx + 1..]),
            None => (None, &separators[0..0]),
        };

        let parts = match sep {
            Some(sep) => split_keep_separator(text, sep),
            None => hard_split(text, self.chunk_size),
        };

        let mut final_chunks = Vec::new();
        let mut good_splits: Vec<String> = Vec::new();

        for part in parts {
            if part.len() <= self.chunk_size {
                good_splits.push(part);
            } else {
                if !good_splits.is_empty() {
                    final_chunks.extend(self.merge_splits(&good_splits));
                    good_splits.clear();
                }
                if remaining.is_empty() {
                    final_chunks.extend(hard_split(&part, self.chunk_size));
                } else {
                    final_chunks.extend(self.split_recursive(&part, remaining));
                }
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// Merge small splits into chunks near the target size, carrying an
    /// overlap window between consecutive chunks
    fn merge_splits(&self, splits: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for split in splits {
            if total + split.len() > self.chunk_size && !window.is_empty() {
                chunks.push(window.iter().copied().collect::<String>());

                // Shrink the window down to the overlap budget
                while total > self.overlap
                    || (total + split.len() > self.chunk_size && total > 0)
                {
                    let front = match window.pop_front() {
                        Some(f) => f,
                        None => break,
                    };
                    total -= front.len();
                }
            }

            window.push_back(split);
            total += split.len();
        }

        if !window.is_empty() {
            chunks.push(window.iter().copied().collect::<String>());
        }

        chunks
    }
}

/// Split text on a separator, keeping the separator at the end of each part
fn split_keep_separator(text: &str, sep: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;

    for (idx, _) in text.match_indices(sep) {
        let end = idx + sep.len();
        parts.push(text[start..end].to_string());
        start = end;
    }

    if start < text.len() {
        parts.push(text[start..].to_string());
    }

    parts
}

/// Split text into fixed-size pieces at character boundaries
fn hard_split(text: &str, size: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + size.max(1)).min(text.len());
        while !text.is_char_boundary(end) {
            end += 1;
        }
        parts.push(text[start..end].to_string());
        start = end;
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::parser::hash_content;
    use crate::types::FileType;

    fn parsed(content: &str) -> ParsedDocument {
        ParsedDocument {
            file_type: FileType::Txt,
            content: content.to_string(),
            content_hash: hash_content(content),
            total_pages: None,
        }
    }

    fn doc() -> Document {
        Document::new(
            "notes.txt".to_string(),
            FileType::Txt,
            "hash".to_string(),
            1024,
        )
    }

    #[test]
    fn short_text_is_single_chunk() {
        let chunker = TextChunker::new(1000, 200);
        let pieces = chunker.split_text("A single short paragraph about sorting algorithms.");
        assert_eq!(pieces.len(), 1);
    }

    #[test]
    fn chunks_respect_size_limit() {
        let chunker = TextChunker::new(100, 20);
        let sentence = "Merge sort divides the input into halves. ";
        let text = sentence.repeat(30);
        let pieces = chunker.split_text(&text);

        assert!(pieces.len() > 1);
        for piece in &pieces {
            assert!(piece.len() <= 100, "piece too long: {}", piece.len());
        }
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let chunker = TextChunker::new(100, 40);
        let sentence = "Quick sort picks a pivot element. ";
        let text = sentence.repeat(20);
        let pieces = chunker.split_text(&text);

        assert!(pieces.len() > 1);
        // The tail of each chunk reappears at the head of the next
        for pair in pieces.windows(2) {
            let tail: String = pair[0]
                .chars()
                .rev()
                .take(20)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            assert!(
                pair[1].contains(tail.trim()),
                "no overlap between consecutive chunks"
            );
        }
    }

    #[test]
    fn splits_on_paragraphs_first() {
        let chunker = TextChunker::new(80, 0);
        let text = "First paragraph about data structures and their role.\n\n\
                    Second paragraph about algorithm complexity analysis.";
        let pieces = chunker.split_text(text);

        assert_eq!(pieces.len(), 2);
        assert!(pieces[0].starts_with("First paragraph"));
        assert!(pieces[1].starts_with("Second paragraph"));
    }

    #[test]
    fn hard_splits_unbroken_text() {
        let chunker = TextChunker::new(50, 0).with_min_size(1);
        let text = "x".repeat(180);
        let pieces = chunker.split_text(&text);

        assert_eq!(pieces.len(), 4);
        assert!(pieces.iter().all(|p| p.len() <= 50));
    }

    #[test]
    fn multibyte_text_does_not_panic() {
        let chunker = TextChunker::new(40, 10);
        let text = "Curva de Bézier é usada em computação gráfica. ".repeat(10);
        let pieces = chunker.split_text(&text);
        assert!(!pieces.is_empty());
    }

    #[test]
    fn chunk_document_sets_indices_and_totals() {
        let chunker = TextChunker::new(100, 20);
        let sentence = "Hash tables offer constant-time lookups on average. ";
        let content = sentence.repeat(15);
        let parsed = parsed(&content);
        let doc = doc();

        let chunks = chunker.chunk_document(&doc, &parsed);

        assert!(chunks.len() > 1);
        let total = chunks.len() as u32;
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i as u32);
            assert_eq!(chunk.total_chunks, total);
            assert_eq!(chunk.document_id, doc.id);
            assert_eq!(chunk.source.filename, "notes.txt");
            assert_eq!(
                &content[chunk.char_start..chunk.char_end],
                chunk.content.as_str()
            );
        }
    }

    #[test]
    fn skips_chunks_below_min_size() {
        let chunker = TextChunker::new(100, 0).with_min_size(30);
        let parsed = parsed("tiny\n\nA considerably longer paragraph that clears the minimum.");
        let chunks = chunker.chunk_document(&doc(), &parsed);

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].content.starts_with("A considerably"));
    }
}
