//! Response parsing
//!
//! Parses JSON responses from the AI into structured data types.

use serde::{Deserialize, Serialize};

use crate::ai::client::AiError;

/// Response from the title extraction call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitlesResponse {
    pub titles: Vec<String>,
}

/// Response from the description call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptionResponse {
    pub description: String,
}

/// Extract JSON from a response that may contain markdown code blocks
fn extract_json(response: &str) -> &str {
    // Look for JSON in a markdown code block
    if let Some(start) = response.find("```json") {
        let json_start = start + 7; // Skip "```json"
        if let Some(end) = response[json_start..].find("```") {
            return response[json_start..json_start + end].trim();
        }
    }

    // Look for a generic code block
    if let Some(start) = response.find("```") {
        let code_start = start + 3;
        // Skip language identifier if present
        let json_start = if let Some(newline) = response[code_start..].find('\n') {
            code_start + newline + 1
        } else {
            code_start
        };
        if let Some(end) = response[json_start..].find("```") {
            return response[json_start..json_start + end].trim();
        }
    }

    // Try to find a JSON object directly
    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end > start {
                return &response[start..=end];
            }
        }
    }

    response.trim()
}

/// Parse the titles response
pub fn parse_titles_response(response: &str) -> Result<TitlesResponse, AiError> {
    let json = extract_json(response);
    let parsed: TitlesResponse = serde_json::from_str(json)
        .map_err(|e| AiError::InvalidResponse(format!("titles: {}", e)))?;

    let titles: Vec<String> = parsed
        .titles
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    Ok(TitlesResponse { titles })
}

/// Parse the description response
pub fn parse_description_response(response: &str) -> Result<DescriptionResponse, AiError> {
    let json = extract_json(response);
    serde_json::from_str(json).map_err(|e| AiError::InvalidResponse(format!("description: {}", e)))
}
