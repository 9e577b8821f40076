//! Text normalization shared by extraction and re-injection.
//!
//! Two normal forms exist. The block form is applied when a document is
//! linearized: blank lines disappear and every line is trimmed. The match
//! form is the input of the content hash: it keeps interior blank lines so
//! that a translation supplied for a multi-paragraph unit still hashes to the
//! same key when the regenerated document is scanned.

use crate::util::sha1_hex;

pub const CONTENT_HASH_HEX_LEN: usize = 40;
pub const KEY_DIGEST_HEX_LEN: usize = 12;

const NBSP: char = '\u{00a0}';

/// Normal form of a paragraph as it enters the block stream.
pub fn normalize_block_text(raw: &str) -> String {
    let cleaned = raw.replace(NBSP, " ");

    cleaned
        .split('\n')
        .map(|line| collapse_runs(line.trim(), |ch| ch == ' ' || ch == '\t'))
        .filter(|line| !line.is_empty())
        .collect::<Vec<String>>()
        .join("\n")
}

pub fn normalize_case_insensitive(raw: &str) -> String {
    normalize_block_text(raw).to_lowercase()
}

/// Normal form used for content hashing. Idempotent.
pub fn normalize(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines = unified
        .split('\n')
        .map(|line| {
            collapse_runs(line, is_match_space)
                .trim_matches(is_match_space)
                .to_string()
        })
        .collect::<Vec<String>>();

    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    let leading_blank = lines.iter().take_while(|line| line.is_empty()).count();

    lines[leading_blank..].join("\n")
}

/// SHA-1 of the match form, `CONTENT_HASH_HEX_LEN` lowercase hex digits.
pub fn content_hash(text: &str) -> String {
    sha1_hex(&normalize(text))
}

/// Short digest behind content-addressed unit keys.
pub fn key_digest(section_id: &str, kind: &str, text: &str) -> String {
    let mut digest = sha1_hex(&format!("{section_id}\n{kind}\n{text}"));
    digest.truncate(KEY_DIGEST_HEX_LEN);
    digest
}

/// Merges consecutive non-blank lines with a single space. Blank lines stay
/// as paragraph boundaries.
pub fn join_hard_wrapped_lines(text: &str) -> String {
    let mut out = Vec::<String>::new();
    let mut buffer = Vec::<&str>::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !buffer.is_empty() {
                out.push(buffer.join(" "));
                buffer.clear();
            }
            out.push(String::new());
            continue;
        }
        buffer.push(line);
    }

    if !buffer.is_empty() {
        out.push(buffer.join(" "));
    }

    out.join("\n").trim().to_string()
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn is_match_space(ch: char) -> bool {
    ch == ' ' || ch == '\t' || ch == NBSP
}

fn collapse_runs(input: &str, is_space: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;

    for ch in input.chars() {
        if is_space(ch) {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(ch);
            in_run = false;
        }
    }

    out
}
