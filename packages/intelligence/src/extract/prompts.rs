//! Prompt assembly for structured extraction.

/// Input text beyond this is cut before prompting; model context budgets
/// are spent on the lede, not on comment sections.
pub const MAX_INPUT_CHARS: usize = 12_000;

const BASE_PROMPT: &str = r#"You are a news intelligence analyst. Analyze the article and respond with a single JSON object, no prose, with these fields:
- "sentiment": exactly one of "High Urgency", "Moderate Urgency", "Low Urgency"
- "category": a short topical category for the story
- "detected_niche": one of "crime", "politics", "business", "energy", "motoring", "sports", "brics", "general"
- "summary": 2-3 sentence factual summary
- "location": most specific place the story concerns, or null
- "entities": array of {"name", "type"} for notable entities
- "incidents": array of {"type", "description", "location", "date", "severity"} (severity 1-3)
- "people": array of {"name", "role", "status", "details"}
- "organizations": array of {"name", "type", "details"}
- "niche_data": object with any niche-specific fields described below

If the article carries no actionable intelligence, return {"sentiment": null, "category": null}."#;

/// Niche-specific addenda appended to the base prompt.
fn niche_addendum(niche: &str) -> Option<&'static str> {
    match niche {
        "crime" => Some(
            "Crime focus: every distinct incident goes in \"incidents\" with its own \
             location and date. Severity 3 for violence or fatalities, 2 for serious \
             property crime, 1 otherwise. Name suspects and victims in \"people\" with \
             their status (arrested, charged, sought, victim).",
        ),
        "politics" => Some(
            "Politics focus: in \"niche_data\" set \"election_related\" (boolean) and \
             \"policy_area\". Record officeholders and candidates in \"people\" with \
             their office or candidacy as role.",
        ),
        "business" => Some(
            "Business focus: in \"niche_data\" set \"companies\" (array of names) and \
             \"market_impact\" (one sentence). Deals, results and insolvencies are the \
             signal; product puffery is not.",
        ),
        "energy" => Some(
            "Energy focus: in \"niche_data\" set \"energy_type\" and \"project_stage\". \
             Capacity figures and regulatory decisions matter; include them in the summary.",
        ),
        "motoring" => Some(
            "Motoring focus: in \"niche_data\" set \"vehicle_types\" (array) and \
             \"affects_drivers\" (boolean). Road closures, fuel prices and recalls are \
             high-value.",
        ),
        _ => None,
    }
}

/// Build the system prompt for a niche.
pub fn system_prompt(niche: &str) -> String {
    match niche_addendum(niche) {
        Some(addendum) => format!("{BASE_PROMPT}\n\n{addendum}"),
        None => BASE_PROMPT.to_string(),
    }
}

/// Build the user prompt, truncating oversized article text.
pub fn user_prompt(title: &str, text: &str) -> String {
    format!("Title: {title}\n\nArticle text:\n{}", truncate_input(text))
}

/// Cut text to the input budget on a char boundary.
pub fn truncate_input(text: &str) -> &str {
    match text.char_indices().nth(MAX_INPUT_CHARS) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_has_niche_addendum() {
        assert!(system_prompt("crime").contains("Severity 3"));
        assert!(system_prompt("politics").contains("election_related"));
        assert_eq!(system_prompt("general"), BASE_PROMPT);
        assert_eq!(system_prompt("unknown-niche"), BASE_PROMPT);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let text = "\u{00e9}".repeat(MAX_INPUT_CHARS + 100);
        let cut = truncate_input(&text);
        assert_eq!(cut.chars().count(), MAX_INPUT_CHARS);
    }

    #[test]
    fn test_short_input_untouched() {
        assert_eq!(truncate_input("short"), "short");
    }

    #[test]
    fn test_user_prompt_includes_title() {
        let prompt = user_prompt("Big story", "Body text.");
        assert!(prompt.starts_with("Title: Big story"));
        assert!(prompt.contains("Body text."));
    }
}
