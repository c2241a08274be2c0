//! Free-text task extraction.
//!
//! An external text model reads daily-log prose and proposes task
//! candidates. The transport is a chat-completions call instructed to
//! answer with a strict JSON payload; parsing that payload is a pure
//! function with its own tests, so the network client stays thin.

use anyhow::{Context, Result};
use serde::Deserialize;
use sprig_core::config::ExtractConfig;
use sprig_core::model::suggestion::SuggestionCandidate;
use std::time::Duration;
use tracing::debug;

const SYSTEM_PROMPT: &str =
    "Read over the following user logs and extract any to-do items and tasks.";

const GUIDELINES: &str = "<guidelines>\n\
    - Provide your response in English (even if the input is in another language).\n\
    - The logs are a diary: do not extract to-do items from the past, or items \
    about regular day-to-day activities (e.g. a daily schedule).\n\
    - Items about housekeeping belong to the 'Family' category.\n\
    - If there are no TODOs reply with an empty list.\n\
    - Reply with only a JSON object of the form \
    {\"todos\": [{\"name\": ..., \"type\": ..., \"priority\": ..., \"project\": ...}]} \
    where type is one of ['Personal', 'Work', 'Family'], priority is one of \
    ['Low', 'Medium', 'High'] (assume 'Medium' if unspecified), and project is \
    null unless explicitly named.\n\
    </guidelines>";

/// Produces task candidates from free text. Empty input or no findings
/// yield an empty list, never an error.
pub trait TaskExtractor {
    /// # Errors
    ///
    /// Fails when the upstream service is unreachable or answers with a
    /// payload that cannot be parsed. The caller's ledger is untouched.
    fn extract_tasks(&self, free_text: &str) -> Result<Vec<SuggestionCandidate>>;
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
pub struct RemoteExtractor {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct ExtractionPayload {
    #[serde(default)]
    todos: Vec<SuggestionCandidate>,
}

impl RemoteExtractor {
    #[must_use]
    pub fn from_config(config: &ExtractConfig) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: std::env::var(&config.api_key_env).ok(),
        }
    }
}

impl TaskExtractor for RemoteExtractor {
    fn extract_tasks(&self, free_text: &str) -> Result<Vec<SuggestionCandidate>> {
        if free_text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!("{GUIDELINES}\n\n<logs>\n{free_text}\n</logs>"),
                },
            ],
            "response_format": { "type": "json_object" },
        });

        let mut request = self.agent.post(&self.endpoint);
        if let Some(key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {key}"));
        }

        let response: ChatResponse = request
            .send_json(&body)
            .context("task extraction request failed")?
            .into_json()
            .context("task extraction response was not valid JSON")?;

        let content = response
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .context("task extraction response had no choices")?;

        let candidates = parse_extraction(content)?;
        debug!(count = candidates.len(), "extracted task candidates");
        Ok(candidates)
    }
}

/// Parse the model's JSON answer into candidates.
///
/// Tolerates a markdown code fence around the object, since models
/// emit one even when told not to.
pub fn parse_extraction(content: &str) -> Result<Vec<SuggestionCandidate>> {
    let stripped = strip_code_fence(content.trim());
    let payload: ExtractionPayload =
        serde_json::from_str(stripped).context("parse task extraction payload")?;
    Ok(payload
        .todos
        .into_iter()
        .filter(|candidate| !candidate.name.trim().is_empty())
        .collect())
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .strip_suffix("```")
        .map_or(content, str::trim_end)
}

#[cfg(test)]
mod tests {
    use super::parse_extraction;
    use sprig_core::model::task::{Priority, TaskKind};

    #[test]
    fn parses_well_formed_payload() {
        let content = r#"{"todos": [
            {"name": "book dentist", "type": "Family", "priority": "High", "project": null},
            {"name": "draft q3 report", "type": "Work", "priority": "Medium", "project": "q3"}
        ]}"#;
        let candidates = parse_extraction(content).expect("parse");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].kind, TaskKind::Family);
        assert_eq!(candidates[1].project.as_deref(), Some("q3"));
    }

    #[test]
    fn empty_todo_list_is_not_an_error() {
        let candidates = parse_extraction(r#"{"todos": []}"#).expect("parse");
        assert!(candidates.is_empty());
    }

    #[test]
    fn missing_todos_key_means_no_findings() {
        let candidates = parse_extraction("{}").expect("parse");
        assert!(candidates.is_empty());
    }

    #[test]
    fn tolerates_fenced_json_block() {
        let content = "```json\n{\"todos\": [{\"name\": \"buy milk\"}]}\n```";
        let candidates = parse_extraction(content).expect("parse");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "buy milk");
        assert_eq!(candidates[0].priority, Priority::Medium);
    }

    #[test]
    fn nameless_findings_are_filtered_out() {
        let content = r#"{"todos": [{"name": "  "}, {"name": "real task"}]}"#;
        let candidates = parse_extraction(content).expect("parse");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "real task");
    }

    #[test]
    fn garbage_payload_is_an_error() {
        assert!(parse_extraction("the dog ate my tasks").is_err());
    }
}
