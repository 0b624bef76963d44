//! Recovering chunk lists from string parameters
//!
//! The agent runtime only carries strings, so `generate_code` receives the
//! chunks from an earlier `query_knowledge_base` call as text the model
//! copied into its call. That text is often not valid JSON: single quotes,
//! Python literals, escaped quotes, or plain prose.
//!
//! Recovery is tried in order until one tier yields chunks:
//!
//! ```text
//! 1. strict   ── serde_json on the trimmed text
//! 2. relaxed  ── json5 on the text, then on quote-normalized variants
//! 3. fallback ── the whole text becomes a single chunk
//! ```

use serde_json::Value;
use tracing::{debug, warn};

use crate::knowledge::Chunk;
use crate::metrics::CHUNK_RECOVERY_TOTAL;

/// Outcome of chunk recovery
#[derive(Debug, Clone, PartialEq)]
pub enum ParseResult {
    /// The text parsed into a list of chunk-like records
    Structured(Vec<Chunk>),
    /// Nothing parsed; the trimmed raw text is kept as-is
    Fallback(String),
}

impl ParseResult {
    /// Chunks to use as generation context
    ///
    /// A fallback becomes one text-only chunk, so malformed input always
    /// yields a non-empty list.
    pub fn into_chunks(self) -> Vec<Chunk> {
        match self {
            ParseResult::Structured(chunks) => chunks,
            ParseResult::Fallback(text) => vec![Chunk::from_text(text)],
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, ParseResult::Structured(_))
    }
}

/// Recover a chunk list from `raw`; never fails
pub fn recover_chunks(raw: &str) -> ParseResult {
    let trimmed = raw.trim();

    if let Some(chunks) = serde_json::from_str::<Value>(trimmed)
        .ok()
        .and_then(|v| chunks_from_value(&v))
    {
        record("strict", chunks.len());
        return ParseResult::Structured(chunks);
    }

    let literal = normalize_literal(trimmed);
    let relaxed = [trimmed, literal.as_str()]
        .into_iter()
        .find_map(|candidate| json5::from_str::<Value>(candidate).ok())
        .or_else(|| serde_json::from_str::<Value>(&swap_quotes(trimmed)).ok())
        .and_then(|v| chunks_from_value(&v));

    if let Some(chunks) = relaxed {
        record("relaxed", chunks.len());
        return ParseResult::Structured(chunks);
    }

    warn!(len = trimmed.len(), "Could not parse chunks, using raw text");
    CHUNK_RECOVERY_TOTAL.with_label_values(&["fallback"]).inc();
    ParseResult::Fallback(trimmed.to_string())
}

fn record(tier: &str, count: usize) {
    debug!(tier, chunks = count, "Recovered chunks");
    CHUNK_RECOVERY_TOTAL.with_label_values(&[tier]).inc();
}

/// Interpret a parsed value as chunks
///
/// Lists map element-wise, `{"chunks": [...]}` unwraps, a lone object is one
/// chunk. Scalars aren't chunk lists.
fn chunks_from_value(value: &Value) -> Option<Vec<Chunk>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(text) => Chunk::from_text(text.clone()),
                    Value::Object(_) => Chunk::from_value(item),
                    other => Chunk::from_text(other.to_string()),
                })
                .collect(),
        ),
        Value::Object(map) => match map.get("chunks") {
            Some(inner @ Value::Array(_)) => chunks_from_value(inner),
            _ => Some(vec![Chunk::from_value(value)]),
        },
        _ => None,
    }
}

/// Rewrite a Python-style literal into JSON5-compatible text
///
/// The agent runtime often hands back the chunk list as Python `repr`
/// output rather than JSON, sometimes with typographic quotes the model
/// substituted along the way:
///
/// ```text
/// [{'text': 'Say "hi"', 'score': 0.5, 'location': None}]
///   ↓
/// [{"text": "Say \"hi\"", "score": 0.5, "location": null}]
/// ```
///
/// # How the scan works
///
/// A single pass tracks whether we are inside a string and which character
/// closes it (`'`, `"`, `’` or `”`):
///
/// - Outside a string, an opening quote of any kind becomes `"`, and bare
///   identifiers are read whole so that `None`/`True`/`False` map to
///   `null`/`true`/`false` while other words (`NoneType`, `Trueish`) pass
///   through unchanged.
/// - Inside a string, the closing quote becomes `"`, a literal `"` is
///   escaped, `\'` loses its backslash (it needs none between double
///   quotes), other escapes are kept, and raw newlines become `\n`.
///
/// A string still open at the end of input is closed, so truncated text
/// at least reaches the parser balanced; whether it then parses is up to
/// the caller's next tier.
fn normalize_literal(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 16);
    let mut chars = input.chars().peekable();
    let mut closing: Option<char> = None;

    while let Some(c) = chars.next() {
        match closing {
            Some(close) => match c {
                '\\' => match chars.next() {
                    // \' needs no escape inside a double-quoted string
                    Some('\'') => out.push('\''),
                    Some(next) => {
                        out.push('\\');
                        out.push(next);
                    }
                    None => out.push_str("\\\\"),
                },
                c if c == close => {
                    out.push('"');
                    closing = None;
                }
                '"' => out.push_str("\\\""),
                '\n' => out.push_str("\\n"),
                _ => out.push(c),
            },
            None => match c {
                '\'' | '"' | '\u{2018}' | '\u{201C}' => {
                    closing = Some(match c {
                        '\u{2018}' => '\u{2019}',
                        '\u{201C}' => '\u{201D}',
                        other => other,
                    });
                    out.push('"');
                }
                c if c.is_alphabetic() || c == '_' => {
                    let mut word = String::from(c);
                    while let Some(&next) = chars.peek() {
                        if next.is_alphanumeric() || next == '_' {
                            word.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    out.push_str(match word.as_str() {
                        "None" => "null",
                        "True" => "true",
                        "False" => "false",
                        _ => word.as_str(),
                    });
                }
                _ => out.push(c),
            },
        }
    }

    // Close a string left open so the parser sees balanced quotes
    if closing.is_some() {
        out.push('"');
    }
    out
}

/// Blunt normalization: every `'` to `"`, then `\"` to `"`
///
/// Breaks apostrophes in text but repairs over-escaped JSON.
fn swap_quotes(input: &str) -> String {
    input.replace('\'', "\"").replace("\\\"", "\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_json() {
        let result = recover_chunks(r#" [{"text": "GET /status", "score": 0.9}] "#);
        let ParseResult::Structured(chunks) = result else {
            panic!("expected structured result");
        };
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "GET /status");
        assert_eq!(chunks[0].score, 0.9);
    }

    #[test]
    fn test_single_quoted_literal() {
        let chunks = recover_chunks("[{'text': 'POST /notify', 'score': 0.5}]").into_chunks();
        assert_eq!(chunks[0].text, "POST /notify");
        assert_eq!(chunks[0].score, 0.5);
    }

    #[test]
    fn test_python_repr_with_none_and_inner_quotes() {
        let raw = r#"[{'text': 'Send "Bearer" header', 'score': None, 'metadata': {'ok': True}}]"#;
        let result = recover_chunks(raw);
        assert!(result.is_structured());

        let chunks = result.into_chunks();
        assert_eq!(chunks[0].text, "Send \"Bearer\" header");
        assert_eq!(chunks[0].score, 0.0);
        assert_eq!(chunks[0].metadata["ok"], true);
    }

    #[test]
    fn test_escaped_quotes() {
        let raw = r#"[{\"text\": \"escaped chunk\", \"score\": 0.3}]"#;
        let chunks = recover_chunks(raw).into_chunks();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "escaped chunk");
    }

    #[test]
    fn test_typographic_quotes() {
        let raw = "[{\u{201C}text\u{201D}: \u{201C}smart quotes\u{201D}}]";
        let chunks = recover_chunks(raw).into_chunks();
        assert_eq!(chunks[0].text, "smart quotes");
    }

    #[test]
    fn test_wrapped_chunks_object() {
        let raw = r#"{"chunks": [{"text": "a"}, {"text": "b"}], "status": "ok"}"#;
        let chunks = recover_chunks(raw).into_chunks();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].text, "b");
    }

    #[test]
    fn test_list_of_strings() {
        let chunks = recover_chunks(r#"["first passage", "second passage"]"#).into_chunks();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "first passage");
        assert!(chunks[0].metadata.is_empty());
    }

    #[test]
    fn test_prose_falls_back() {
        let raw = "  The camera status endpoint returns signalStrength as a percentage.  ";
        let result = recover_chunks(raw);
        assert_eq!(
            result,
            ParseResult::Fallback(
                "The camera status endpoint returns signalStrength as a percentage.".to_string()
            )
        );

        let chunks = result.into_chunks();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].score, 0.0);
        assert!(chunks[0].metadata.is_empty());
    }

    #[test]
    fn test_malformed_inputs_never_yield_empty() {
        let inputs = [
            "",
            "[{'text': 'unterminated",
            "{{{{",
            "it's a 'mixed\" bag",
            "42",
            "null",
            "[{'text': 'it's broken'}]",
        ];
        for raw in inputs {
            let chunks = recover_chunks(raw).into_chunks();
            assert!(!chunks.is_empty(), "no chunks for {:?}", raw);
        }
    }

    #[test]
    fn test_normalize_literal_leaves_string_contents() {
        assert_eq!(
            normalize_literal("{'a': 'None of True'}"),
            r#"{"a": "None of True"}"#
        );
        assert_eq!(normalize_literal("[None, False]"), "[null, false]");
        assert_eq!(normalize_literal(r"['it\'s']"), r#"["it's"]"#);
        assert_eq!(normalize_literal("[NoneType, Trueish]"), "[NoneType, Trueish]");
        assert_eq!(
            normalize_literal("{\u{2018}text\u{2019}: \u{201C}a\u{201D}}"),
            r#"{"text": "a"}"#
        );
        assert_eq!(normalize_literal("['open"), r#"["open""#);
    }
}
