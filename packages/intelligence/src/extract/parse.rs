//! Model-output parsing.
//!
//! Models told to emit bare JSON still wrap it in Markdown code fences
//! often enough that stripping them is mandatory, not defensive.

use crate::types::analysis::AnalysisResult;

/// Strip a surrounding Markdown code fence, with or without a language tag.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag line ("json", "javascript", or empty).
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };

    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse a model response into an analysis.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, serde_json::Error> {
    serde_json::from_str(strip_code_fence(raw))
}

/// Whether the response is the explicit nothing-here protocol reply: both
/// mandatory keys present and null. A response that merely omits them is an
/// incomplete answer, not a verdict.
pub fn declares_no_signal(raw: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(strip_code_fence(raw)).is_ok_and(|v| {
        v.get("sentiment").map_or(false, serde_json::Value::is_null)
            && v.get("category").map_or(false, serde_json::Value::is_null)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::analysis::Urgency;

    #[test]
    fn test_bare_json() {
        let analysis = parse_analysis(r#"{"sentiment": "High Urgency", "category": "flood"}"#).unwrap();
        assert_eq!(analysis.sentiment, Some(Urgency::High));
        assert!(!analysis.is_empty());
    }

    #[test]
    fn test_fenced_json_with_language_tag() {
        let raw = "```json\n{\"sentiment\": \"Low Urgency\", \"category\": \"weather\"}\n```";
        let analysis = parse_analysis(raw).unwrap();
        assert_eq!(analysis.category.as_deref(), Some("weather"));
    }

    #[test]
    fn test_fenced_json_without_language_tag() {
        let raw = "```\n{\"sentiment\": \"Moderate Urgency\", \"category\": \"crime\"}\n```";
        assert!(parse_analysis(raw).is_ok());
    }

    #[test]
    fn test_null_signal_parses_as_empty() {
        let analysis = parse_analysis(r#"{"sentiment": null, "category": null}"#).unwrap();
        assert!(analysis.is_empty());
    }

    #[test]
    fn test_explicit_nulls_declare_no_signal() {
        assert!(declares_no_signal(r#"{"sentiment": null, "category": null}"#));
        assert!(declares_no_signal("```json\n{\"sentiment\": null, \"category\": null}\n```"));
    }

    #[test]
    fn test_omitted_fields_do_not_declare_no_signal() {
        assert!(!declares_no_signal("{}"));
        assert!(!declares_no_signal(r#"{"sentiment": null}"#));
        assert!(!declares_no_signal(r#"{"sentiment": "Low Urgency", "category": "weather"}"#));
        assert!(!declares_no_signal("not json"));
    }

    #[test]
    fn test_prose_is_an_error() {
        assert!(parse_analysis("Sure! Here is the analysis you asked for.").is_err());
    }

    #[test]
    fn test_unknown_sentiment_label_is_an_error() {
        assert!(parse_analysis(r#"{"sentiment": "Critical", "category": "x"}"#).is_err());
    }
}
