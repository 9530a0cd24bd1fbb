//! Prompt templates for AI operations
//!
//! Builds structured prompts for requirement extraction, providing context
//! from the need document.

use crate::models::Need;

/// Truncation limit for document bodies embedded in prompts
const MAX_BODY_CHARS: usize = 12_000;

fn body_excerpt(need: &Need) -> &str {
    let body = need.body.as_str();
    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Build the prompt that lists requirement titles in a need document
pub fn build_titles_prompt(need: &Need) -> String {
    format!(
        r#"You are analyzing a client requirements document for a software project estimation tool.

## Document: {}

{}

## Task

List every discrete, implementable requirement described in this document. Each title should be short (under 12 words) and name one unit of scope.

Respond with ONLY a JSON object in this exact format:
{{
  "titles": ["<title 1>", "<title 2>", ...]
}}"#,
        need.name,
        body_excerpt(need)
    )
}

/// Build the prompt that writes the body text for one extracted title
pub fn build_description_prompt(title: &str, need: &Need) -> String {
    format!(
        r#"You are writing a requirement description for a software project estimation tool.

## Source document: {}

{}

## Task

Write a concise description (2-4 sentences) of the requirement titled "{}", using only information from the source document. Describe what must be built, not how.

Respond with ONLY a JSON object in this exact format:
{{
  "description": "<the description>"
}}"#,
        need.name,
        body_excerpt(need),
        title
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_prompts_embed_context() {
        let need = Need::new(
            "Invoicing".into(),
            "The system shall send invoices.".into(),
            Uuid::new_v4(),
        );

        let titles = build_titles_prompt(&need);
        assert!(titles.contains("Invoicing"));
        assert!(titles.contains("send invoices"));

        let description = build_description_prompt("Send invoices", &need);
        assert!(description.contains("\"Send invoices\""));
        assert!(description.contains("send invoices"));
    }

    #[test]
    fn test_long_body_is_truncated() {
        let need = Need::new("n".into(), "x".repeat(MAX_BODY_CHARS * 2), Uuid::new_v4());
        let prompt = build_titles_prompt(&need);
        assert!(prompt.len() < MAX_BODY_CHARS + 1_000);
    }
}
