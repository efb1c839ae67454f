//! Paragraph-boundary text chunker.
//!
//! Splits a document's body text into [`DocChunk`]s that respect a
//! configurable `max_tokens` limit. Splitting occurs on paragraph
//! boundaries (`\n\n`) to preserve semantic coherence within each chunk;
//! oversized paragraphs are hard-split at whitespace boundaries.

use crate::models::DocChunk;

/// Approximate chars-per-token ratio, shared with the memory token estimator.
pub(crate) const CHARS_PER_TOKEN: usize = 4;

/// Split text into chunks on paragraph boundaries, respecting max_tokens.
/// Every chunk carries the source path of the document it came from.
pub fn chunk_text(source: &str, text: &str, max_tokens: usize) -> Vec<DocChunk> {
    let max_chars = max_tokens * CHARS_PER_TOKEN;

    if text.trim().is_empty() {
        return Vec::new();
    }

    let paragraphs: Vec<&str> = text.split("\n\n").collect();
    let mut chunks = Vec::new();
    let mut current_buf = String::new();

    for para in paragraphs {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        // If adding this paragraph would exceed max, flush current buffer
        let would_be = if current_buf.is_empty() {
            trimmed.len()
        } else {
            current_buf.len() + 2 + trimmed.len() // +2 for \n\n separator
        };

        if would_be > max_chars && !current_buf.is_empty() {
            chunks.push(make_chunk(source, &current_buf));
            current_buf.clear();
        }

        // If a single paragraph exceeds max, hard-split it
        if trimmed.len() > max_chars {
            if !current_buf.is_empty() {
                chunks.push(make_chunk(source, &current_buf));
                current_buf.clear();
            }
            let mut remaining = trimmed;
            while !remaining.is_empty() {
                let split_at = floor_char_boundary(remaining, remaining.len().min(max_chars));
                // Prefer a newline or space boundary
                let actual_split = if split_at < remaining.len() {
                    remaining[..split_at]
                        .rfind('\n')
                        .or_else(|| remaining[..split_at].rfind(' '))
                        .map(|pos| pos + 1)
                        .unwrap_or(split_at)
                } else {
                    split_at
                };
                let piece = &remaining[..actual_split];
                chunks.push(make_chunk(source, piece.trim()));
                remaining = &remaining[actual_split..];
            }
        } else {
            if !current_buf.is_empty() {
                current_buf.push_str("\n\n");
            }
            current_buf.push_str(trimmed);
        }
    }

    if !current_buf.is_empty() {
        chunks.push(make_chunk(source, &current_buf));
    }

    chunks
}

/// Largest char boundary at or below `index`, so hard splits never land
/// inside a multibyte character. Never returns 0 for a non-empty string:
/// a split that makes no progress would loop forever, so at minimum the
/// first character is taken whole.
fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut boundary = index;
    while boundary > 0 && !text.is_char_boundary(boundary) {
        boundary -= 1;
    }
    if boundary == 0 {
        boundary = text
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(text.len());
    }
    boundary
}

fn make_chunk(source: &str, text: &str) -> DocChunk {
    DocChunk {
        text: text.to_string(),
        source: source.to_string(),
    }
}
