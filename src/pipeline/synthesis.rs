//! Synthesizer internals: evidence context, prompt construction, output
//! validation, and citation enforcement.
//!
//! Everything here is pure so the degraded-output and citation rules can
//! be tested without a model. Parse and schema failures never fail the
//! stage; they substitute a low-confidence payload instead.

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::Source;

/// Per-source evidence budget in the prompt.
pub const EVIDENCE_CHARS_PER_SOURCE: usize = 1_800;

/// Hard cap on the total evidence context.
pub const MAX_CONTEXT_CHARS: usize = 14_000;

/// Token budget for the completion.
pub const SYNTHESIS_MAX_TOKENS: u32 = 900;

/// The structure the model is asked to return.
#[derive(Debug, Serialize, Deserialize)]
pub struct SynthesisOutput {
    pub summary: String,
    pub key_points: Vec<String>,
    pub risks: Vec<String>,
    pub recommendation: String,
    /// 0.0 to 1.0.
    pub confidence: f64,
}

/// Citation metrics computed while enforcing the citation rules.
#[derive(Debug, Clone)]
pub struct CitationReport {
    pub unique_sources_cited: usize,
    pub coverage_ratio: f64,
    /// 1-based indices of sources actually cited.
    pub cited_indices: BTreeSet<usize>,
}

/// Bound a text to `max_chars`, marking the cut.
pub fn compact(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let kept: String = trimmed
        .chars()
        .take(max_chars.saturating_sub(20))
        .collect();
    format!("{} ...[truncated]", kept.trim_end())
}

/// Concatenate per-source evidence blocks the model can cite by `[n]`.
///
/// Prefers raw content over the summary and keeps each block bounded; the
/// whole context is hard-capped afterwards.
pub fn build_context(sources: &[Source]) -> String {
    let blocks: Vec<String> = sources
        .iter()
        .enumerate()
        .map(|(idx, source)| {
            let n = idx + 1;
            let title = if source.title.trim().is_empty() {
                source.url.as_str()
            } else {
                source.title.trim()
            };

            let raw = source.raw_content.as_deref().unwrap_or("").trim();
            let summary = source.summary.as_deref().unwrap_or("").trim();
            let evidence = if !raw.is_empty() {
                raw
            } else if !summary.is_empty() {
                summary
            } else {
                "(No content available for this source.)"
            };

            format!(
                "[{n}] {title}\nURL: {url}\nEVIDENCE (use for citations): {evidence}",
                url = source.url,
                evidence = compact(evidence, EVIDENCE_CHARS_PER_SOURCE),
            )
        })
        .collect();

    compact(&blocks.join("\n\n"), MAX_CONTEXT_CHARS)
}

/// Build the synthesis prompt with the fixed JSON schema demand.
pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        r#"You are an expert research assistant.

Your job:
- Answer the research question using ONLY the evidence excerpts below.
- Every key point and every risk MUST include citations like [1], [2], etc.
- Prefer citing the most relevant sources; don't cite if you truly have no evidence.

Return a JSON object that matches EXACTLY this schema:

{{
"summary": string,
"key_points": [string, ...],
"risks": [string, ...],
"recommendation": string,
"confidence": number
}}

Rules:
- Output MUST be valid JSON only. No markdown. No extra text.
- Put citations directly inside the strings, e.g. "X is true because ... [1][3]"
- Confidence must be 0.0 to 1.0

Research question:
{query}

Evidence sources:
{context}
"#
    )
}

fn parse_failure_payload() -> Value {
    json!({
        "summary": "Failed to parse model output as JSON.",
        "key_points": [],
        "risks": ["Model returned invalid JSON."],
        "recommendation": "Try running synthesis again or adjust prompt constraints.",
        "confidence": 0.2,
    })
}

fn schema_failure_payload() -> Value {
    json!({
        "summary": "Model output did not match required schema.",
        "key_points": [],
        "risks": ["Schema validation failed."],
        "recommendation": "Try running synthesis again or refine the prompt/schema.",
        "confidence": 0.2,
    })
}

/// Parse and validate a completion.
///
/// Returns the output payload plus the parse error, if any. A payload is
/// always returned: invalid JSON and schema mismatches degrade to a fixed
/// low-confidence payload rather than failing the stage.
pub fn parse_completion(raw: &str) -> (Value, Option<String>) {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => return (parse_failure_payload(), Some(err.to_string())),
    };

    match serde_json::from_value::<SynthesisOutput>(parsed) {
        Ok(output) if (0.0..=1.0).contains(&output.confidence) => {
            match serde_json::to_value(&output) {
                Ok(payload) => (payload, None),
                Err(err) => (schema_failure_payload(), Some(format!("schema_error={err}"))),
            }
        }
        Ok(output) => (
            schema_failure_payload(),
            Some(format!(
                "schema_error=confidence {} out of range 0.0..=1.0",
                output.confidence
            )),
        ),
        Err(err) => (schema_failure_payload(), Some(format!("schema_error={err}"))),
    }
}

fn string_items(payload: &Value, key: &str) -> Vec<(usize, String)> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .filter_map(|(idx, item)| item.as_str().map(|s| (idx, s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn cap_confidence(payload: &mut Value, cap: f64) {
    let current = payload
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.5);
    payload["confidence"] = json!(current.min(cap));
}

fn push_warning(payload: &mut Value, warning: Value) {
    match payload.get_mut("_warnings").and_then(Value::as_array_mut) {
        Some(warnings) => warnings.push(warning),
        None => {
            payload["_warnings"] = json!([warning]);
        }
    }
}

/// Apply the citation rules to a validated payload.
///
/// Key points or risks without a `[n]` marker record a `missing_citations`
/// warning and cap confidence at 0.3; citing fewer than 40% of three or
/// more sources records `low_source_coverage` and caps confidence at 0.4.
pub fn enforce_citations(payload: &mut Value, source_count: usize) -> CitationReport {
    let citation = Regex::new(r"\[(\d+)\]").unwrap();

    let key_points = string_items(payload, "key_points");
    let risks = string_items(payload, "risks");

    let mut missing: Vec<String> = Vec::new();
    for (idx, text) in &key_points {
        if !citation.is_match(text) {
            missing.push(format!("key_points[{idx}]"));
        }
    }
    for (idx, text) in &risks {
        if !citation.is_match(text) {
            missing.push(format!("risks[{idx}]"));
        }
    }

    if !missing.is_empty() {
        cap_confidence(payload, 0.3);
        push_warning(payload, json!({"type": "missing_citations", "fields": missing}));
    }

    let mut cited_indices: BTreeSet<usize> = BTreeSet::new();
    for (_, text) in key_points.iter().chain(risks.iter()) {
        for capture in citation.captures_iter(text) {
            if let Ok(n) = capture[1].parse::<usize>() {
                if (1..=source_count).contains(&n) {
                    cited_indices.insert(n);
                }
            }
        }
    }

    let coverage_ratio = if source_count > 0 {
        cited_indices.len() as f64 / source_count as f64
    } else {
        0.0
    };

    if source_count >= 3 && coverage_ratio < 0.4 {
        cap_confidence(payload, 0.4);
        push_warning(
            payload,
            json!({"type": "low_source_coverage", "coverage_ratio": coverage_ratio}),
        );
    }

    CitationReport {
        unique_sources_cited: cited_indices.len(),
        coverage_ratio,
        cited_indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn source(title: &str, raw: Option<&str>, summary: Option<&str>) -> Source {
        let mut s = Source::new(
            Uuid::new_v4(),
            format!("https://example.com/{}", title),
            title.to_string(),
        );
        s.raw_content = raw.map(str::to_string);
        s.summary = summary.map(str::to_string);
        s
    }

    #[test]
    fn test_compact_short_text_untouched() {
        assert_eq!(compact("  hello  ", 100), "hello");
    }

    #[test]
    fn test_compact_marks_truncation() {
        let text = "x".repeat(100);
        let compacted = compact(&text, 50);
        assert!(compacted.ends_with(" ...[truncated]"));
        assert!(compacted.chars().count() <= 50);
    }

    #[test]
    fn test_build_context_prefers_raw_content() {
        let sources = vec![
            source("a", Some("raw text a"), Some("summary a")),
            source("b", None, Some("summary b")),
            source("c", None, None),
        ];
        let context = build_context(&sources);
        assert!(context.contains("[1] a"));
        assert!(context.contains("raw text a"));
        assert!(!context.contains("summary a"));
        assert!(context.contains("summary b"));
        assert!(context.contains("(No content available for this source.)"));
    }

    #[test]
    fn test_build_context_is_capped() {
        let long = "word ".repeat(10_000);
        let sources = vec![
            source("a", Some(&long), None),
            source("b", Some(&long), None),
            source("c", Some(&long), None),
            source("d", Some(&long), None),
            source("e", Some(&long), None),
            source("f", Some(&long), None),
            source("g", Some(&long), None),
            source("h", Some(&long), None),
            source("i", Some(&long), None),
        ];
        let context = build_context(&sources);
        assert!(context.chars().count() <= MAX_CONTEXT_CHARS);
    }

    #[test]
    fn test_parse_completion_valid() {
        let raw = r#"{"summary":"s","key_points":["a [1]"],"risks":["r [2]"],"recommendation":"do it","confidence":0.8}"#;
        let (payload, parse_error) = parse_completion(raw);
        assert!(parse_error.is_none());
        assert_eq!(payload["summary"], "s");
        assert_eq!(payload["confidence"], 0.8);
    }

    #[test]
    fn test_parse_completion_invalid_json_degrades() {
        let (payload, parse_error) = parse_completion("not json");
        assert_eq!(payload["summary"], "Failed to parse model output as JSON.");
        assert_eq!(payload["confidence"], 0.2);
        assert!(parse_error.is_some());
    }

    #[test]
    fn test_parse_completion_schema_mismatch_degrades() {
        let (payload, parse_error) = parse_completion(r#"{"summary": "only a summary"}"#);
        assert_eq!(payload["summary"], "Model output did not match required schema.");
        assert_eq!(payload["confidence"], 0.2);
        assert!(parse_error.unwrap().starts_with("schema_error="));
    }

    #[test]
    fn test_parse_completion_confidence_out_of_range_degrades() {
        let raw = r#"{"summary":"s","key_points":[],"risks":[],"recommendation":"r","confidence":1.7}"#;
        let (payload, parse_error) = parse_completion(raw);
        assert_eq!(payload["summary"], "Model output did not match required schema.");
        assert!(parse_error.unwrap().contains("out of range"));
    }

    #[test]
    fn test_missing_citations_warn_and_cap() {
        let mut payload = json!({
            "summary": "s",
            "key_points": ["first point", "second point", "cited point [1]"],
            "risks": ["a risk [2]"],
            "recommendation": "r",
            "confidence": 0.9,
        });
        let report = enforce_citations(&mut payload, 2);

        let warnings = payload["_warnings"].as_array().unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0]["type"], "missing_citations");
        assert_eq!(
            warnings[0]["fields"],
            json!(["key_points[0]", "key_points[1]"])
        );
        assert_eq!(payload["confidence"], 0.3);
        assert_eq!(report.unique_sources_cited, 2);
        assert_eq!(report.coverage_ratio, 1.0);
    }

    #[test]
    fn test_low_coverage_warns_and_caps() {
        let mut payload = json!({
            "summary": "s",
            "key_points": ["a [1]", "b [1]"],
            "risks": ["c [1]"],
            "recommendation": "r",
            "confidence": 0.9,
        });
        let report = enforce_citations(&mut payload, 4);

        assert_eq!(report.unique_sources_cited, 1);
        assert_eq!(report.coverage_ratio, 0.25);
        let warnings = payload["_warnings"].as_array().unwrap();
        assert_eq!(warnings[0]["type"], "low_source_coverage");
        assert_eq!(payload["confidence"], 0.4);
    }

    #[test]
    fn test_out_of_range_citations_ignored() {
        let mut payload = json!({
            "summary": "s",
            "key_points": ["a [1][7]", "b [0]"],
            "risks": [],
            "recommendation": "r",
            "confidence": 0.9,
        });
        let report = enforce_citations(&mut payload, 2);
        assert_eq!(report.unique_sources_cited, 1);
        assert!(report.cited_indices.contains(&1));
    }

    #[test]
    fn test_fully_cited_payload_untouched() {
        let mut payload = json!({
            "summary": "s",
            "key_points": ["a [1]", "b [2]"],
            "risks": ["c [3]"],
            "recommendation": "r",
            "confidence": 0.9,
        });
        let report = enforce_citations(&mut payload, 3);

        assert!(payload.get("_warnings").is_none());
        assert_eq!(payload["confidence"], 0.9);
        assert_eq!(report.unique_sources_cited, 3);
        assert_eq!(report.coverage_ratio, 1.0);
    }

    #[test]
    fn test_prompt_carries_query_and_context() {
        let prompt = build_prompt("why hydrate", "[1] evidence");
        assert!(prompt.contains("why hydrate"));
        assert!(prompt.contains("[1] evidence"));
        assert!(prompt.contains("valid JSON only"));
    }
}
