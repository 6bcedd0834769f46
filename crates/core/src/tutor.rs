use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::lesson::{ChatMessage, ExerciseSet, Lesson, LessonParams, Sender, Translation};
use crate::level::EnglishLevel;
use crate::prompts::{self, PromptBook};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_LESSON_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_FAST_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error("The AI returned an invalid format. Please try again.")]
    InvalidFormat(#[source] serde_json::Error),
    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("The AI returned an empty response.")]
    EmptyResponse,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Everything the app asks of the language model.
///
/// `TutorClient` talks to Gemini; `OfflineTutor` answers locally. Tests use
/// the generated `MockTutor`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Tutor: Send + Sync {
    async fn generate_lesson(&self, params: &LessonParams) -> Result<Lesson, TutorError>;

    async fn generate_more_exercises(
        &self,
        level: EnglishLevel,
        topic: &str,
        vocabulary: &str,
    ) -> Result<ExerciseSet, TutorError>;

    async fn define_word(&self, word: &str) -> Result<String, TutorError>;

    async fn translate_and_define(&self, spanish_word: &str) -> Result<Translation, TutorError>;

    /// One multi-turn chat reply. `history` ends with the user's new message.
    async fn chat(
        &self,
        system_instruction: &str,
        history: &[ChatMessage],
    ) -> Result<String, TutorError>;
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// `Tutor` backed by the Gemini `generateContent` REST endpoint.
pub struct TutorClient {
    client: Client,
    api_key: SecretString,
    base_url: String,
    lesson_model: String,
    fast_model: String,
    prompts: PromptBook,
}

impl TutorClient {
    pub fn new(api_key: SecretString, prompts: PromptBook) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            lesson_model: DEFAULT_LESSON_MODEL.to_string(),
            fast_model: DEFAULT_FAST_MODEL.to_string(),
            prompts,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_models(mut self, lesson_model: &str, fast_model: &str) -> Self {
        self.lesson_model = lesson_model.to_string();
        self.fast_model = fast_model.to_string();
        self
    }

    async fn generate(&self, model: &str, body: Value) -> Result<String, TutorError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        tracing::debug!("POST {}", url);

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&raw)
                .map(|b| b.error.message)
                .unwrap_or(raw);
            tracing::error!("Gemini returned {} for {}: {}", status, model, message);
            return Err(TutorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let resp = resp.json::<GenerateContentResponse>().await?;
        let text = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(TutorError::EmptyResponse);
        }
        Ok(text)
    }

    async fn generate_json<T: DeserializeOwned>(
        &self,
        model: &str,
        prompt: String,
        schema: Value,
    ) -> Result<T, TutorError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            }
        });
        let text = self.generate(model, body).await?;
        parse_json_response(&text)
    }
}

/// Parses a model reply that was requested as JSON.
pub fn parse_json_response<T: DeserializeOwned>(text: &str) -> Result<T, TutorError> {
    serde_json::from_str(text.trim()).map_err(|e| {
        tracing::error!("Failed to parse JSON response: {}", e);
        TutorError::InvalidFormat(e)
    })
}

fn chat_role(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "user",
        Sender::Ai => "model",
    }
}

#[async_trait]
impl Tutor for TutorClient {
    async fn generate_lesson(&self, params: &LessonParams) -> Result<Lesson, TutorError> {
        tracing::info!("Generating {} lesson on '{}'", params.level.code(), params.topic);
        self.generate_json(
            &self.lesson_model,
            self.prompts.lesson_prompt(params),
            prompts::lesson_schema(),
        )
        .await
    }

    async fn generate_more_exercises(
        &self,
        level: EnglishLevel,
        topic: &str,
        vocabulary: &str,
    ) -> Result<ExerciseSet, TutorError> {
        self.generate_json(
            &self.fast_model,
            self.prompts.more_exercises_prompt(level, topic, vocabulary),
            prompts::exercise_set_schema(),
        )
        .await
    }

    async fn define_word(&self, word: &str) -> Result<String, TutorError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": self.prompts.definition_prompt(word) }] }]
        });
        self.generate(&self.fast_model, body).await
    }

    async fn translate_and_define(&self, spanish_word: &str) -> Result<Translation, TutorError> {
        self.generate_json(
            &self.fast_model,
            self.prompts.translation_prompt(spanish_word),
            prompts::translation_schema(),
        )
        .await
    }

    async fn chat(
        &self,
        system_instruction: &str,
        history: &[ChatMessage],
    ) -> Result<String, TutorError> {
        let contents: Vec<Value> = history
            .iter()
            .map(|m| json!({ "role": chat_role(m.sender), "parts": [{ "text": m.text }] }))
            .collect();
        let body = json!({
            "contents": contents,
            "systemInstruction": { "parts": [{ "text": system_instruction }] },
        });
        self.generate(&self.fast_model, body).await
    }
}
