use crate::error::IndexingError;
use tracing::warn;

pub const DEFAULT_CHUNK_SIZE: usize = 1_000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ".", "!", "?"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Tried most specific first.
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Recursive separator-aware splitter. All lengths are in chars.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: ChunkingConfig,
}

impl TextSplitter {
    pub fn new(config: ChunkingConfig) -> Result<Self, IndexingError> {
        if config.chunk_size == 0 {
            return Err(IndexingError::InvalidChunkConfig(
                "chunk_size must be positive".to_string(),
            ));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(IndexingError::InvalidChunkConfig(format!(
                "chunk_overlap {} must be smaller than chunk_size {}",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.separators.iter().any(|separator| separator.is_empty()) {
            return Err(IndexingError::InvalidChunkConfig(
                "separators must not be empty strings".to_string(),
            ));
        }
        Ok(Self { config })
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.config.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|separator| text.contains(separator.as_str()));
        let (pieces, remaining) = match position {
            Some(index) => (
                split_keeping_separator(text, &separators[index]),
                &separators[index + 1..],
            ),
            None if text.is_empty() => (Vec::new(), &separators[..0]),
            None => (vec![text], &separators[..0]),
        };

        let mut chunks = Vec::new();
        let mut small = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.config.chunk_size {
                small.push(piece);
                continue;
            }

            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }

            if remaining.is_empty() {
                chunks.extend(self.hard_split(piece));
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }

        chunks
    }

    /// Greedily packs pieces up to `chunk_size`, carrying trailing pieces of
    /// at most `chunk_overlap` chars into the next chunk.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut chunks = Vec::new();
        let mut window: Vec<(&str, usize)> = Vec::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > size {
                if total > size {
                    warn!(total, size, "merged chunk exceeds the configured size");
                }
                if !window.is_empty() {
                    push_joined(&mut chunks, &window);
                    while total > overlap || (total > 0 && total + len > size) {
                        let (_, dropped) = window.remove(0);
                        total -= dropped;
                    }
                }
            }
            window.push((piece, len));
            total += len;
        }

        push_joined(&mut chunks, &window);
        chunks
    }

    fn hard_split(&self, piece: &str) -> Vec<String> {
        let size = self.config.chunk_size;
        let stride = size - self.config.chunk_overlap;
        let chars: Vec<char> = piece.chars().collect();

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + size).min(chars.len());
            let chunk: String = chars[start..end].iter().collect();
            let trimmed = chunk.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }
            if end == chars.len() {
                break;
            }
            start += stride;
        }
        chunks
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            config: ChunkingConfig::default(),
        }
    }
}

pub fn chunk_text(text: &str) -> Vec<String> {
    TextSplitter::default().split(text)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Cuts `text` before every occurrence of `separator`, leaving the separator
/// at the start of the following piece. Empty pieces are dropped.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (index, _) in text.match_indices(separator) {
        if index > start {
            pieces.push(&text[start..index]);
        }
        start = index;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn push_joined(chunks: &mut Vec<String>, window: &[(&str, usize)]) {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
