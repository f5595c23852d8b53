use crate::error::ParserError;
use serde::Deserialize;
use serde_json::Value;

/// Parse the structured payload out of raw CLI output.
///
/// Claude's `--output-format json` wraps the answer in `{"result": "..."}`;
/// anything else is searched for a JSON object directly.
pub fn parse_completion(raw: &str) -> Result<Value, ParserError> {
    #[derive(Deserialize)]
    struct ClaudeOutput {
        result: String,
    }

    // Try Claude format first
    if let Ok(claude_out) = serde_json::from_str::<ClaudeOutput>(raw) {
        if let Some(json) = extract_json(&claude_out.result) {
            return Ok(serde_json::from_str(&json)?);
        }
    }

    let json = extract_json(raw).ok_or(ParserError::NoJson)?;
    Ok(serde_json::from_str(&json)?)
}

/// Extract JSON object from a string that might contain markdown code blocks
pub fn extract_json(s: &str) -> Option<String> {
    // First try: the whole string is valid JSON
    if s.trim().starts_with('{') && serde_json::from_str::<Value>(s.trim()).is_ok() {
        return Some(s.trim().to_string());
    }

    // Second try: extract from markdown code block
    let re = regex::Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").ok()?;
    for cap in re.captures_iter(s) {
        let potential_json = cap.get(1)?.as_str().trim();
        if potential_json.starts_with('{') && serde_json::from_str::<Value>(potential_json).is_ok()
        {
            return Some(potential_json.to_string());
        }
    }

    // Third try: first balanced object, skipping braces inside strings
    let brace_start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s[brace_start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let potential_json = &s[brace_start..brace_start + i + 1];
                    if serde_json::from_str::<Value>(potential_json).is_ok() {
                        return Some(potential_json.to_string());
                    }
                    return None;
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_direct_json() {
        let value = parse_completion(r#"{"summary": "stable", "score": 3}"#).unwrap();
        assert_eq!(value["summary"], "stable");
    }

    #[test]
    fn test_parse_claude_wrapped() {
        let raw = r#"{"type": "result", "result": "{\"summary\": \"stable\"}", "session_id": "abc"}"#;
        let value = parse_completion(raw).unwrap();
        assert_eq!(value["summary"], "stable");
    }

    #[test]
    fn test_parse_claude_wrapped_markdown() {
        let raw = r#"{"result": "Here it is:\n```json\n{\"summary\": \"ok\"}\n```"}"#;
        let value = parse_completion(raw).unwrap();
        assert_eq!(value["summary"], "ok");
    }

    #[test]
    fn test_parse_markdown_wrapped() {
        let md = r#"
Analysis below.

```json
{"overallTrend": "stable", "keyChanges": []}
```
"#;
        let value = parse_completion(md).unwrap();
        assert_eq!(value["overallTrend"], "stable");
    }

    #[test]
    fn test_extract_with_braces_in_strings() {
        let raw = r#"Result: {"note": "contains } brace", "n": 1} trailing"#;
        let json = extract_json(raw).unwrap();
        assert_eq!(json, r#"{"note": "contains } brace", "n": 1}"#);
    }

    #[test]
    fn test_no_json() {
        assert!(matches!(
            parse_completion("I could not complete this request."),
            Err(ParserError::NoJson)
        ));
    }
}
