//! Response Normalizer
//!
//! Shapes free-form language-model output into a [`FactCheckResult`].
//! Models are asked for one exact JSON object but routinely wrap it in
//! markdown fences, prepend prose, or ignore the format entirely, so
//! normalization never fails:
//!
//! 1. Strip code fences anywhere in the text.
//! 2. Parse the span from the first `{` to the last `}` as a JSON object.
//! 3. Otherwise fall back to a line-oriented section scanner.
//!
//! The score is clamped to `0..=100` on the text path only; the JSON path keeps
//! whatever integer the model produced unless [`ScoreClamp::Always`] is used.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fact_check::FactCheckResult;

/// Score used when the model gives none or gives something non-numeric.
pub const DEFAULT_TRUTH_SCORE: i64 = 50;

pub const NO_ANALYSIS: &str = "No analysis provided";
pub const NO_EVIDENCE: &str = "No evidence provided";
pub const NO_SOURCE_CREDIBILITY: &str = "No source credibility assessment provided";
pub const NO_CONTEXTUAL_NOTES: &str = "No contextual notes provided";

/// Placeholders used by the text fallback for its two prose sections.
pub const ANALYSIS_NOT_PROVIDED: &str = "Analysis not provided";
pub const EVIDENCE_NOT_PROVIDED: &str = "Evidence not provided";

/// When the truth score is forced into `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreClamp {
    /// Clamp only scores recovered by the text fallback.
    #[default]
    FallbackOnly,
    /// Clamp on both paths.
    Always,
}

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"```[A-Za-z]*\s*\n?").expect("fence pattern is valid"))
}

fn artifact_line_pattern() -> &'static Regex {
    static ARTIFACT: OnceLock<Regex> = OnceLock::new();
    ARTIFACT.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*(?:\][ \t]*,[ \t]*\}|\}|\])[ \t]*$").expect("artifact pattern is valid")
    })
}

fn label_pattern() -> &'static Regex {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    LABEL.get_or_init(|| {
        Regex::new(r"(?i)\b(truth\s*score|analysis|evidence|sources?|corrections?|score|truth)\s*:")
            .expect("label pattern is valid")
    })
}

fn digit_run_pattern() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"\d+").expect("digit pattern is valid"))
}

/// Normalize raw provider output with the default score policy.
pub fn normalize(raw: &str) -> FactCheckResult {
    normalize_with(raw, ScoreClamp::default())
}

/// Normalize raw provider output.
pub fn normalize_with(raw: &str, clamp: ScoreClamp) -> FactCheckResult {
    let cleaned = strip_code_fences(raw);

    if let Some(object) = extract_json_object(&cleaned)
        .and_then(|span| serde_json::from_str::<Map<String, Value>>(span).ok())
    {
        let mut result = from_json_object(&object);
        if clamp == ScoreClamp::Always {
            result.truth_score = result.truth_score.clamp(0, 100);
        }
        return result;
    }

    tracing::debug!("provider output is not a JSON object, using text fallback");
    parse_text_fallback(&cleaned)
}

/// Remove markdown code-fence delimiters (with or without a language tag).
///
/// Already-clean text comes back unchanged apart from surrounding whitespace.
pub fn strip_code_fences(content: &str) -> String {
    fence_pattern().replace_all(content, "").trim().to_string()
}

/// The span from the first `{` through the last `}`, if both exist in order.
pub fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

fn from_json_object(object: &Map<String, Value>) -> FactCheckResult {
    FactCheckResult {
        truth_score: coerce_score(object.get("truthScore")),
        analysis: text_field(object.get("analysis"), NO_ANALYSIS),
        evidence: text_field(object.get("evidence"), NO_EVIDENCE),
        sources: list_field(object.get("sources")),
        corrections: list_field(object.get("corrections")),
        source_credibility: text_field(object.get("sourceCredibility"), NO_SOURCE_CREDIBILITY),
        contextual_notes: text_field(object.get("contextualNotes"), NO_CONTEXTUAL_NOTES),
    }
}

/// Integer coercion with the leniency of a leading-integer parse:
/// `85`, `85.9`, `"85"` and `"85%"` all become 85.
fn coerce_score(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(DEFAULT_TRUTH_SCORE),
        Some(Value::String(s)) => parse_leading_int(s).unwrap_or(DEFAULT_TRUTH_SCORE),
        _ => DEFAULT_TRUTH_SCORE,
    }
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let run: &str = &digits[..digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len())];
    if run.is_empty() {
        return None;
    }

    let magnitude = saturating_digits(run);
    Some(if negative { -magnitude } else { magnitude })
}

fn saturating_digits(run: &str) -> i64 {
    run.bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    })
}

fn clean_text(text: &str) -> String {
    let without_fences = fence_pattern().replace_all(text, "");
    artifact_line_pattern()
        .replace_all(&without_fences, "")
        .trim()
        .to_string()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(clean_text(s)),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_field(value: Option<&Value>, placeholder: &str) -> String {
    value
        .and_then(scalar_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

fn list_field(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_text)
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Analysis,
    Evidence,
    Sources,
    Corrections,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Section(Section),
    Score,
}

impl Label {
    /// Classify a header line by keyword containment, in precedence order.
    fn from_header(lower: &str) -> Option<Self> {
        if lower.contains("analysis") {
            Some(Label::Section(Section::Analysis))
        } else if lower.contains("evidence") {
            Some(Label::Section(Section::Evidence))
        } else if lower.contains("source") {
            Some(Label::Section(Section::Sources))
        } else if lower.contains("correction") {
            Some(Label::Section(Section::Corrections))
        } else if lower.contains("score") || lower.contains("truth") {
            Some(Label::Score)
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
struct TextScan {
    section: Option<Section>,
    analysis: String,
    evidence: String,
    sources: Vec<String>,
    corrections: Vec<String>,
    score: Option<i64>,
}

impl TextScan {
    fn push_content(&mut self, text: &str) {
        match self.section {
            Some(Section::Analysis) => append_prose(&mut self.analysis, text),
            Some(Section::Evidence) => append_prose(&mut self.evidence, text),
            Some(Section::Sources) => {
                if text.contains("http") {
                    self.sources.push(text.to_string());
                }
            }
            Some(Section::Corrections) => self.corrections.push(text.to_string()),
            None => {
                if self.analysis.is_empty() {
                    self.analysis = text.to_string();
                }
            }
        }
    }

    fn take_score(&mut self, text: &str) {
        if let Some(run) = digit_run_pattern().find(text) {
            self.score = Some(saturating_digits(run.as_str()));
        }
    }

    fn apply(&mut self, label: Label, content: &str) {
        match label {
            Label::Score => self.take_score(content),
            Label::Section(section) => {
                self.section = Some(section);
                if !content.is_empty() {
                    self.push_content(content);
                }
            }
        }
    }

    fn scan_line(&mut self, line: &str) {
        let labels: Vec<_> = label_pattern().captures_iter(line).collect();

        if labels.is_empty() {
            match Label::from_header(&line.to_lowercase()) {
                Some(Label::Score) => self.take_score(line),
                Some(label) => self.apply(label, ""),
                None => self.push_content(line),
            }
            return;
        }

        let first = labels[0].get(0).map_or(0, |m| m.start());
        let prefix = line[..first].trim();
        if prefix.chars().any(char::is_alphanumeric) {
            self.push_content(prefix);
        }

        for (i, caps) in labels.iter().enumerate() {
            let (Some(whole), Some(keyword)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let end = labels
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(line.len(), |m| m.start());
            let content = line[whole.end()..end]
                .trim()
                .trim_start_matches(['*', '#'])
                .trim();

            let lower = keyword.as_str().to_lowercase();
            if let Some(label) = Label::from_header(&lower) {
                self.apply(label, content);
            }
        }
    }

    fn finish(self) -> FactCheckResult {
        let or_placeholder = |s: String, placeholder: &str| {
            if s.is_empty() {
                placeholder.to_string()
            } else {
                s
            }
        };

        FactCheckResult {
            truth_score: self.score.unwrap_or(DEFAULT_TRUTH_SCORE).clamp(0, 100),
            analysis: or_placeholder(self.analysis, ANALYSIS_NOT_PROVIDED),
            evidence: or_placeholder(self.evidence, EVIDENCE_NOT_PROVIDED),
            sources: self.sources,
            corrections: self.corrections,
            source_credibility: NO_SOURCE_CREDIBILITY.to_string(),
            contextual_notes: NO_CONTEXTUAL_NOTES.to_string(),
        }
    }
}

fn append_prose(buffer: &mut String, text: &str) {
    if !buffer.is_empty() {
        buffer.push(' ');
    }
    buffer.push_str(text);
}

/// Heuristic extraction for output that is not a JSON object.
///
/// Lines naming a section (`Analysis`, `Evidence`, `Sources`, `Corrections`)
/// switch the active section; `Label: text` pairs may also appear inline.
/// Score lines contribute their first digit run.
pub fn parse_text_fallback(content: &str) -> FactCheckResult {
    let mut scan = TextScan::default();
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        scan.scan_line(line);
    }
    scan.finish()
}
