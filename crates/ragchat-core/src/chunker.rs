//! Paragraph- and sentence-aware text splitter.
//!
//! Sizes are measured in characters so that multibyte scripts are split on
//! code point boundaries.

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1500;

/// A break point is only used if it lies beyond this fraction of the window.
const MIN_BREAK_RATIO: f64 = 0.3;

/// Split `text` into trimmed, non-empty chunks of at most `chunk_size` characters.
///
/// Each window prefers to end after its last paragraph break (`"\n\n"`), then
/// after its last sentence end (`". "`), and otherwise is cut at the window size.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let min_break = (chunk_size as f64 * MIN_BREAK_RATIO) as usize;

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let rest = &text[start..];
        let window_end = match rest.char_indices().nth(chunk_size) {
            Some((idx, _)) => idx,
            None => {
                push_trimmed(&mut chunks, rest);
                break;
            }
        };

        let window = &rest[..window_end];
        let beyond_min = |pos: &usize| window[..*pos].chars().count() > min_break;

        let end = if let Some(pos) = window.rfind("\n\n").filter(beyond_min) {
            pos + 2
        } else if let Some(pos) = window.rfind(". ").filter(beyond_min) {
            pos + 1
        } else {
            window_end
        };

        push_trimmed(&mut chunks, &rest[..end]);
        start += end;
    }

    chunks
}

fn push_trimmed(chunks: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        chunks.push(piece.to_string());
    }
}
