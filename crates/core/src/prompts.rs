//! Prompt templates and response schemas.
//!
//! Templates use `{level}`, `{topic}`, `{vocabulary}`, `{word_count}` and
//! `{word}` placeholders. The built-in defaults can be overridden one by one
//! with `<name>.md` files in a prompts directory.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Value, json};

use crate::lesson::LessonParams;
use crate::level::EnglishLevel;

pub const LESSON: &str = "lesson";
pub const MORE_EXERCISES: &str = "more_exercises";
pub const DEFINITION: &str = "definition";
pub const TRANSLATION: &str = "translation";
pub const CHAT_PERSONA: &str = "chat_persona";
pub const VOICE_PERSONA: &str = "voice_persona";

const DEFAULT_LESSON: &str = r#"Generate a custom English lesson for a student with level {level}.
The topic is: "{topic}".
The vocabulary to focus on is: "{vocabulary}".
The paragraph should be about {word_count} words.

Follow these specific instructions for each section:
- **grammarAndUsage**: Provide a comprehensive and clear explanation of the topic. If the topic has sub-types (like different conditional clauses), explain each one. Use Markdown for formatting. Use bold titles for sub-sections (e.g., **First Conditional**). For each grammar point, provide a clear example sentence. Ensure there are double line breaks between different topics for clear separation.
- **exercises**: Create a mix of fill-in-the-blank and multiple-choice exercises as per the schema. The fill-in-the-blank question must include '____' as a placeholder.
- **dialogue**: Write a natural dialogue. Each speaker's turn must be followed by a double newline to ensure proper separation (e.g., A: ...\n\nB: ...).
- **vocabularyDefinitions**: For each word in the provided vocabulary list ("{vocabulary}"), provide a simple, concise definition suitable for a {level} learner. Structure this as an array of objects, where each object has a "word" and a "definition" key.

Please structure the entire output according to the provided JSON schema."#;

const DEFAULT_MORE_EXERCISES: &str = r#"Generate a new set of English exercises for a student with level {level}.
The topic is: "{topic}".
The exercises should be related to the vocabulary: "{vocabulary}".
Generate 2 new fill-in-the-blank exercises and 2 new multiple-choice exercises.
The fill-in-the-blank question must include '____' as a placeholder."#;

const DEFAULT_DEFINITION: &str =
    r#"Provide a simple, clear definition for the English word: "{word}"."#;

const DEFAULT_TRANSLATION: &str = r#"Translate the Spanish word "{word}" into English. Then, provide a simple definition for the English translation."#;

const DEFAULT_CHAT_PERSONA: &str = r#"You are Lexi, a friendly and patient AI English tutor. Your goal is to help the user practice their English conversation skills.
- Keep your responses concise and easy to understand.
- Gently correct any significant grammatical mistakes the user makes, but do it in a natural, conversational way. For example, instead of "That's wrong," you could say, "That's a great point! Another way to say that could be...".
- Ask open-ended questions to encourage the user to speak more.
- Be encouraging and positive."#;

const DEFAULT_VOICE_PERSONA: &str = "You are Lexi, a friendly and patient AI English tutor. Your goal is to help the user practice their English conversation skills. Keep your responses concise and natural.";

/// Loads every `*.md` file in `dir_path`, keyed by file stem.
pub fn load_prompts(dir_path: &Path) -> Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();

    for entry in fs::read_dir(dir_path)
        .with_context(|| format!("Failed to read prompts directory: {}", dir_path.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem for prompt file")?
                .to_string();

            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;

            prompts.insert(prompt_key, content.trim_end().to_string());
        }
    }

    Ok(prompts)
}

#[derive(Debug, Clone)]
pub struct PromptBook {
    templates: HashMap<String, String>,
}

impl Default for PromptBook {
    fn default() -> Self {
        let templates = [
            (LESSON, DEFAULT_LESSON),
            (MORE_EXERCISES, DEFAULT_MORE_EXERCISES),
            (DEFINITION, DEFAULT_DEFINITION),
            (TRANSLATION, DEFAULT_TRANSLATION),
            (CHAT_PERSONA, DEFAULT_CHAT_PERSONA),
            (VOICE_PERSONA, DEFAULT_VOICE_PERSONA),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { templates }
    }
}

impl PromptBook {
    /// Built-in templates, with any matching files from `dir_path` taking precedence.
    /// Files whose stem is not a known template name are ignored.
    pub fn with_overrides(dir_path: &Path) -> Result<Self> {
        let mut book = Self::default();
        for (name, template) in load_prompts(dir_path)? {
            if book.templates.contains_key(&name) {
                tracing::info!("Using prompt override for '{}'", name);
                book.templates.insert(name, template);
            } else {
                tracing::warn!("Ignoring unknown prompt file '{}.md'", name);
            }
        }
        Ok(book)
    }

    fn template(&self, name: &str) -> &str {
        self.templates.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn lesson_prompt(&self, params: &LessonParams) -> String {
        fill(
            self.template(LESSON),
            &[
                ("level", params.level.label()),
                ("topic", &params.topic),
                ("vocabulary", &params.vocabulary),
                ("word_count", &params.word_count.to_string()),
            ],
        )
    }

    pub fn more_exercises_prompt(&self, level: EnglishLevel, topic: &str, vocabulary: &str) -> String {
        fill(
            self.template(MORE_EXERCISES),
            &[
                ("level", level.label()),
                ("topic", topic),
                ("vocabulary", vocabulary),
            ],
        )
    }

    pub fn definition_prompt(&self, word: &str) -> String {
        fill(self.template(DEFINITION), &[("word", word.trim())])
    }

    pub fn translation_prompt(&self, spanish_word: &str) -> String {
        fill(self.template(TRANSLATION), &[("word", spanish_word.trim())])
    }

    pub fn chat_persona(&self) -> &str {
        self.template(CHAT_PERSONA)
    }

    pub fn voice_persona(&self) -> &str {
        self.template(VOICE_PERSONA)
    }
}

fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{}}}", key), value)
        })
}

fn exercise_properties() -> Value {
    json!({
        "fillInTheBlankExercises": {
            "type": "ARRAY",
            "description": "An array of 2-3 fill-in-the-blank exercises. The question should contain a blank space represented by '____'.",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "question": { "type": "STRING" },
                    "correctAnswer": { "type": "STRING" }
                },
                "required": ["question", "correctAnswer"]
            }
        },
        "multipleChoiceExercises": {
            "type": "ARRAY",
            "description": "An array of 2-3 multiple-choice questions. Provide 4 options for each.",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "question": { "type": "STRING" },
                    "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "correctAnswer": { "type": "STRING" }
                },
                "required": ["question", "options", "correctAnswer"]
            }
        }
    })
}

/// Response schema for a full lesson.
pub fn lesson_schema() -> Value {
    let mut properties = exercise_properties();
    if let Value::Object(map) = &mut properties {
        map.insert(
            "grammarAndUsage".to_string(),
            json!({
                "type": "STRING",
                "description": "A comprehensive and clear explanation of the grammar topic. Use Markdown for formatting. Use bold titles for sub-sections (e.g., **First Conditional**). Explain all relevant sub-topics (e.g., if the topic is 'conditionals', explain zero, first, second, third, and mixed conditionals). Provide at least one clear example sentence for each point explained. Ensure ample line breaks between topics for readability."
            }),
        );
        map.insert(
            "dialogue".to_string(),
            json!({
                "type": "STRING",
                "description": "A short, natural-sounding dialogue between two people (e.g., A and B) on the given topic. Use the provided vocabulary. Ensure there is a double newline character ('\\n\\n') after each speaker's line to create a proper line break. For example: A: Hello!\\n\\nB: Hi there!."
            }),
        );
        map.insert(
            "paragraph".to_string(),
            json!({
                "type": "STRING",
                "description": "A short paragraph on the given topic, using the provided vocabulary. The paragraph should be approximately the specified word count and suitable for the learner's level."
            }),
        );
        map.insert(
            "vocabularyDefinitions".to_string(),
            json!({
                "type": "ARRAY",
                "description": "An array of objects, where each object contains a vocabulary word from the user's list and its corresponding simple definition, appropriate for the user's English level.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "word": { "type": "STRING", "description": "A vocabulary word from the user's list." },
                        "definition": { "type": "STRING", "description": "The definition of the word." }
                    },
                    "required": ["word", "definition"]
                }
            }),
        );
    }
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": [
            "grammarAndUsage",
            "fillInTheBlankExercises",
            "multipleChoiceExercises",
            "dialogue",
            "paragraph",
            "vocabularyDefinitions"
        ]
    })
}

/// Response schema for an extra batch of exercises.
pub fn exercise_set_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": exercise_properties(),
        "required": ["fillInTheBlankExercises", "multipleChoiceExercises"]
    })
}

pub fn translation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "translation": { "type": "STRING" },
            "definition": { "type": "STRING" }
        },
        "required": ["translation", "definition"]
    })
}
