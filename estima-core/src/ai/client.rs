//! AI client
//!
//! Handles communication with Claude via the `claude` CLI.

use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;

use crate::ai::prompts;
use crate::ai::responses::{self, DescriptionResponse, TitlesResponse};
use crate::models::Need;

/// Errors that can occur during AI operations
#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI integration not configured - claude CLI not found")]
    NotConfigured,

    #[error("claude CLI execution failed: {0}")]
    CliExecFailed(String),

    #[error("Invalid response from AI: {0}")]
    InvalidResponse(String),
}

impl AiError {
    /// Whether a retry with backoff can plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::NotConfigured => false,
            AiError::CliExecFailed(_) | AiError::InvalidResponse(_) => true,
        }
    }
}

/// AI operation mode
#[derive(Debug, Clone, Default)]
pub enum AiMode {
    /// Use the claude CLI with the --print flag
    ClaudeCli { path: PathBuf },
    /// AI features disabled
    #[default]
    Disabled,
}

/// AI client for extraction and description calls
#[derive(Debug, Clone)]
pub struct AiClient {
    mode: AiMode,
}

impl Default for AiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AiClient {
    /// Create a new AI client with auto-detected mode
    pub fn new() -> Self {
        let mode = Self::detect_mode();
        Self { mode }
    }

    /// Create a client with a specific mode
    pub fn with_mode(mode: AiMode) -> Self {
        Self { mode }
    }

    /// Detect the best available AI mode
    fn detect_mode() -> AiMode {
        if let Some(path) = Self::find_claude_cli() {
            return AiMode::ClaudeCli { path };
        }
        AiMode::Disabled
    }

    /// Find the claude CLI executable
    fn find_claude_cli() -> Option<PathBuf> {
        // First check if 'claude' is in PATH
        if let Ok(output) = Command::new("which").arg("claude").output() {
            if output.status.success() {
                let path_str = String::from_utf8_lossy(&output.stdout);
                let path = PathBuf::from(path_str.trim());
                if path.exists() {
                    return Some(path);
                }
            }
        }

        // Check common locations
        let candidates = ["/usr/local/bin/claude", "/usr/bin/claude"];
        for candidate in candidates {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Some(path);
            }
        }

        // Check home directory npm global
        if let Ok(home) = std::env::var("HOME") {
            let npm_global = PathBuf::from(home).join(".npm-global/bin/claude");
            if npm_global.exists() {
                return Some(npm_global);
            }
        }

        None
    }

    /// Check if AI features are available
    pub fn is_available(&self) -> bool {
        match &self.mode {
            AiMode::ClaudeCli { path } => path.exists(),
            AiMode::Disabled => false,
        }
    }

    /// Get a description of the current mode
    pub fn mode_description(&self) -> String {
        match &self.mode {
            AiMode::ClaudeCli { path } => format!("Claude CLI ({})", path.display()),
            AiMode::Disabled => "Disabled".to_string(),
        }
    }

    /// List the requirement titles found in a need's document body
    pub fn extract_titles(&self, need: &Need) -> Result<TitlesResponse, AiError> {
        let prompt = prompts::build_titles_prompt(need);
        let response = self.send_request(&prompt)?;
        responses::parse_titles_response(&response)
    }

    /// Write the requirement body for one extracted title
    pub fn describe_requirement(
        &self,
        title: &str,
        need: &Need,
    ) -> Result<DescriptionResponse, AiError> {
        let prompt = prompts::build_description_prompt(title, need);
        let response = self.send_request(&prompt)?;
        responses::parse_description_response(&response)
    }

    /// Send a request to the AI
    fn send_request(&self, prompt: &str) -> Result<String, AiError> {
        match &self.mode {
            AiMode::ClaudeCli { path } => self.send_cli_request(path, prompt),
            AiMode::Disabled => Err(AiError::NotConfigured),
        }
    }

    /// Send request via the claude CLI
    fn send_cli_request(&self, cli_path: &PathBuf, prompt: &str) -> Result<String, AiError> {
        // --print for non-interactive output, -p to pass the prompt
        let output = Command::new(cli_path)
            .arg("--print")
            .arg("-p")
            .arg(prompt)
            .output()
            .map_err(|e| AiError::CliExecFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AiError::CliExecFailed(format!(
                "Exit code: {:?}, stderr: {}",
                output.status.code(),
                stderr
            )));
        }

        let response = String::from_utf8_lossy(&output.stdout).to_string();

        if response.is_empty() {
            return Err(AiError::InvalidResponse(
                "Empty response from CLI".to_string(),
            ));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_detection() {
        let client = AiClient::new();
        // Just ensure it doesn't panic
        let _ = client.is_available();
        let _ = client.mode_description();
    }

    #[test]
    fn test_disabled_mode() {
        let client = AiClient::with_mode(AiMode::Disabled);
        assert!(!client.is_available());
        assert_eq!(client.mode_description(), "Disabled");

        let need = Need::new("n".into(), "body".into(), uuid::Uuid::new_v4());
        let err = client.extract_titles(&need).unwrap_err();
        assert!(matches!(err, AiError::NotConfigured));
        assert!(!err.is_retryable());
    }
}
