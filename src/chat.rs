use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::currency::format_grouped;
use crate::error::{AppError, AppResult};
use crate::transparency::{self, PortalQuery, PortalSettings, PublicDepartment};

pub const SYSTEM_PROMPT: &str =
    "You are an assistant that answers questions about the ACEAR Institute website.";
pub const FALLBACK_REPLY: &str = "Sorry, I could not generate a response.";
pub const PROMPT_REQUIRED: &str = "Prompt is required";
const MAX_TOKENS: u32 = 256;
const FUNDING_KEYWORDS: [&str; 4] = ["funding", "allocated", "budget", "spent"];

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Chat provider API key not configured")]
    MissingApiKey,
    #[error("{0}")]
    Api(String),
}

/// A completion backend. `Ok(None)` means the provider answered with no text.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<Option<String>, ChatError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    config: LlmConfig,
    http: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn new(config: LlmConfig) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .user_agent("finance-transparency/0.1")
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { config, http })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatProvider {
    async fn complete(&self, system: &str, prompt: &str) -> Result<Option<String>, ChatError> {
        let key = self.config.api_key.as_deref().ok_or(ChatError::MissingApiKey)?;
        let body = CompletionRequest {
            model: &self.config.model,
            messages: [
                Message { role: "system", content: system },
                Message { role: "user", content: prompt },
            ],
            max_tokens: MAX_TOKENS,
        };

        let resp = self.http.post(self.endpoint()).bearer_auth(key).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Failed to get response from chat provider".to_string());
            warn!(%status, %detail, "chat provider error");
            return Err(ChatError::Api(detail));
        }

        let parsed: CompletionResponse = resp.json().await?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty()))
    }
}

fn has_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| w == word)
}

/// First department named in the prompt, provided the prompt also asks about money.
/// Names match case-insensitively; codes only as a capitalised whole word ("ME", not "me").
pub fn match_department<'a>(prompt: &str, departments: &'a [PublicDepartment]) -> Option<&'a PublicDepartment> {
    let lower = prompt.to_lowercase();
    if !FUNDING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return None;
    }
    departments.iter().find(|d| {
        lower.contains(&d.name.to_lowercase()) || has_word(prompt, &d.code.to_uppercase())
    })
}

pub fn funding_answer(d: &PublicDepartment) -> String {
    format!(
        "The current funding portfolio for the {} department is as follows:\n\nAllocated: ${}\nSpent: ${}\nDescription: {}",
        d.name,
        format_grouped(d.allocated),
        format_grouped(d.spent),
        d.description
    )
}

/// Answers from the store when the prompt is a department funding question,
/// otherwise asks the provider.
pub async fn answer(
    pool: &Pool<Sqlite>,
    provider: &dyn ChatProvider,
    settings: PortalSettings,
    prompt: &str,
) -> AppResult<String> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::validation(PROMPT_REQUIRED));
    }

    let departments = transparency::public_departments(pool, settings, &PortalQuery::default()).await?;
    if let Some(dept) = match_department(prompt, &departments) {
        debug!(department = %dept.code, "answered from store");
        return Ok(funding_answer(dept));
    }

    match provider.complete(SYSTEM_PROMPT, prompt).await {
        Ok(Some(text)) => Ok(text),
        Ok(None) => Ok(FALLBACK_REPLY.to_string()),
        Err(e) => Err(AppError::Upstream(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::DepartmentType;
    use rust_decimal::Decimal;
    use std::collections::BTreeSet;

    fn dept(name: &str, code: &str) -> PublicDepartment {
        PublicDepartment {
            id: 1,
            name: name.into(),
            code: code.into(),
            dept_type: DepartmentType::Academic,
            description: "Department of Computer Science and Engineering.".into(),
            allocated: Decimal::from(2_000_000),
            spent: Decimal::from(1_500_000),
            utilization: Decimal::from(75),
            vendors: vec![],
            fund_ids: BTreeSet::new(),
        }
    }

    #[test]
    fn funding_question_matches_by_name_or_code() {
        let depts = vec![dept("Computer Science", "CS"), dept("Mechanical Engineering", "ME")];
        assert_eq!(match_department("What is the budget of computer science?", &depts).unwrap().code, "CS");
        assert_eq!(match_department("how much has ME spent", &depts).unwrap().code, "ME");
    }

    #[test]
    fn code_must_be_a_whole_word() {
        let depts = vec![dept("Mechanical Engineering", "ME")];
        assert!(match_department("tell me about the budget", &depts).is_none());
        assert!(match_department("budget for HOME office", &depts).is_none());
    }

    #[test]
    fn no_money_keyword_means_no_match() {
        let depts = vec![dept("Computer Science", "CS")];
        assert!(match_department("Who leads computer science?", &depts).is_none());
    }

    #[test]
    fn answer_text_uses_grouped_amounts() {
        let text = funding_answer(&dept("Computer Science", "CS"));
        assert_eq!(
            text,
            "The current funding portfolio for the Computer Science department is as follows:\n\nAllocated: $2,000,000\nSpent: $1,500,000\nDescription: Department of Computer Science and Engineering."
        );
    }

    #[tokio::test]
    async fn provider_without_key_reports_missing_key() {
        let provider = OpenAiCompatProvider::new(LlmConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9".into(),
            model: "m".into(),
        })
        .unwrap();
        let err = provider.complete(SYSTEM_PROMPT, "hi").await.unwrap_err();
        assert!(matches!(err, ChatError::MissingApiKey));
    }
}
