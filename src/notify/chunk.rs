use serde_json::json;

use crate::constants::BLOCK_DELIMITER;
use crate::logging;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSegment {
    /// 1-based position in the run.
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub truncated: bool,
}

/// Splits report text on lines that are exactly the block delimiter.
/// Blocks are trimmed and empty ones dropped.
pub fn split_blocks(report: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in report.lines() {
        if line.trim() == BLOCK_DELIMITER {
            push_block(&mut blocks, &current);
            current.clear();
        } else {
            current.push(line);
        }
    }
    push_block(&mut blocks, &current);
    blocks
}

fn push_block(blocks: &mut Vec<String>, lines: &[&str]) {
    let block = lines.join("\n");
    let block = block.trim();
    if !block.is_empty() {
        blocks.push(block.to_string());
    }
}

/// Greedily packs whole blocks into segments of at most `max_length`
/// characters. A block longer than `max_length` still becomes one segment.
pub fn pack_blocks(report: &str, max_length: usize) -> Vec<String> {
    let mut segments = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0usize;

    for block in split_blocks(report) {
        let candidate = format!("{block}\n\n{BLOCK_DELIMITER}\n\n");
        let candidate_len = candidate.chars().count();

        if buffer_len > 0 && buffer_len + candidate_len > max_length {
            segments.push(buffer.trim_end().to_string());
            buffer = candidate;
            buffer_len = candidate_len;
        } else {
            buffer.push_str(&candidate);
            buffer_len += candidate_len;
        }
    }

    if !buffer.trim().is_empty() {
        segments.push(buffer.trim_end().to_string());
    }
    segments
}

/// Prefixes each segment with its `(i/total)` header and cuts anything
/// past `hard_limit` characters.
pub fn number_segments<F>(segments: Vec<String>, hard_limit: usize, header: F) -> Vec<MessageSegment>
where
    F: Fn(usize, usize) -> String,
{
    let total = segments.len();
    segments
        .into_iter()
        .enumerate()
        .map(|(offset, body)| {
            let index = offset + 1;
            let mut text = header(index, total);
            text.push_str(&body);

            let truncated = text.chars().count() > hard_limit;
            if truncated {
                logging::warn(
                    "chunk.truncated",
                    "Segment exceeds channel limit, truncating",
                    json!({ "index": index, "total": total, "limit": hard_limit }),
                );
                text = truncate_chars(&text, hard_limit);
            }

            MessageSegment {
                index,
                total,
                text,
                truncated,
            }
        })
        .collect()
}

pub fn plain_header(index: usize, total: usize) -> String {
    format!("({index}/{total})\n")
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
