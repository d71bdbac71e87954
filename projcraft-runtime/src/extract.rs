//! # Structured-Response Extractor
//!
//! Model output is supposed to carry a JSON object, but it often arrives
//! wrapped in prose or markdown fences. Extraction is permissive about the
//! wrapping and strict about the payload: the whole text is tried first, then
//! the slice from the first `{` to the last `}`. Nothing is repaired.

use crate::error::Error;
use serde_json::{Map, Value};
use std::fmt;

/// A structured payload recovered from model output
pub type Structured = Map<String, Value>;

/// Why no payload could be recovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// No `{ ... }` pair exists in the text
    NoPayload,
    /// The candidate slice is not valid JSON
    Malformed(String),
    /// The text parsed, but not to an object
    NotAnObject,
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPayload => write!(f, "no structured payload in response"),
            Self::Malformed(e) => write!(f, "malformed structured payload: {}", e),
            Self::NotAnObject => write!(f, "structured payload is not an object"),
        }
    }
}

impl std::error::Error for ExtractionFailure {}

impl ExtractionFailure {
    pub fn into_error(self) -> Error {
        Error::extraction_failed(self.to_string()).set_source(self)
    }
}

/// Recover the structured payload embedded in `text`.
pub fn extract(text: &str) -> Result<Structured, ExtractionFailure> {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text.trim()) {
        return Ok(map);
    }

    let fragment = json_fragment(text).ok_or(ExtractionFailure::NoPayload)?;
    match serde_json::from_str::<Value>(fragment) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ExtractionFailure::NotAnObject),
        Err(e) => Err(ExtractionFailure::Malformed(e.to_string())),
    }
}

/// Slice from the first `{` to the last `}`, inclusive
fn json_fragment(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start <= end {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Body of the first fenced block when `text` opens with a markdown fence.
///
/// Text that does not start with a fence, or whose fence never closes, is
/// returned unchanged.
pub fn strip_code_fences(text: &str) -> &str {
    if !text.trim_start().starts_with("```") {
        return text;
    }

    let mut offset = 0;
    let mut body_start = None;
    for line in text.split_inclusive('\n') {
        if line.trim().starts_with("```") {
            match body_start {
                None => body_start = Some(offset + line.len()),
                Some(start) => return text[start..offset].trim_end_matches(['\n', '\r']),
            }
        }
        offset += line.len();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Structured {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_direct_parse() {
        let map = extract(r#"{"project_name": "CalcApp", "features": ["add"]}"#).unwrap();
        assert_eq!(map["project_name"], "CalcApp");
    }

    #[test]
    fn test_fenced_payload_matches_unwrapped() {
        let raw = r#"{"project_type": "single_file", "estimated_files": 1}"#;
        let fenced = format!("```json\n{}\n```", raw);
        let chatty = format!("Sure! Here is the plan:\n{}\nLet me know.", fenced);

        let expected = extract(raw).unwrap();
        assert_eq!(extract(&fenced).unwrap(), expected);
        assert_eq!(extract(&chatty).unwrap(), expected);
    }

    #[test]
    fn test_no_braces() {
        assert_eq!(extract("I cannot help with that."), Err(ExtractionFailure::NoPayload));
        assert_eq!(extract("} backwards {"), Err(ExtractionFailure::NoPayload));
    }

    #[test]
    fn test_malformed_payload_is_not_repaired() {
        let err = extract(r#"here: {"a": 1,}"#).unwrap_err();
        assert!(matches!(err, ExtractionFailure::Malformed(_)));

        let err = extract(r#"{'single': 'quotes'}"#).unwrap_err();
        assert!(matches!(err, ExtractionFailure::Malformed(_)));
    }

    #[test]
    fn test_array_is_sliced_to_inner_object() {
        let map = extract(r#"[{"a": 1}]"#).unwrap();
        assert_eq!(map["a"], 1);

        let err = extract(r#"[{"a": 1}, {"b": 2}]"#).unwrap_err();
        assert!(matches!(err, ExtractionFailure::Malformed(_)));
    }

    #[test]
    fn test_extraction_is_idempotent_on_stage_payloads() {
        let payloads = [
            json!({"project_name": "TodoApp", "features": ["Add tasks", "List tasks"], "estimated_files": 6}),
            json!({"architecture_pattern": "MVC", "file_structure": {"root": ["README.md"], "backend": ["app.py"]}}),
            json!({"notes": [{"path": "main.py", "note": "add docstring {braces} inside"}]}),
            json!({"empty": {}, "nested": {"deep": {"deeper": [1, 2, {"x": null}]}}}),
        ];
        for payload in payloads {
            let x = object(payload);
            let compact = serde_json::to_string(&x).unwrap();
            let pretty = serde_json::to_string_pretty(&x).unwrap();
            assert_eq!(extract(&compact).unwrap(), x);
            assert_eq!(extract(&pretty).unwrap(), x);
            assert_eq!(extract(&format!("```json\n{}\n```", pretty)).unwrap(), x);
        }
    }

    #[test]
    fn test_failure_converts_to_error() {
        let err = ExtractionFailure::NoPayload.into_error();
        assert_eq!(err.kind(), projcraft_error::ErrorKind::ExtractionFailed);
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```python\nprint('hi')\n```\n"), "print('hi')");
        assert_eq!(strip_code_fences("```\na\nb\n```\ntrailing prose"), "a\nb");
        assert_eq!(strip_code_fences("print('no fence')"), "print('no fence')");
        assert_eq!(strip_code_fences("```python\nunterminated"), "```python\nunterminated");
    }
}
