use serde::{Deserialize, Serialize};

use crate::level::EnglishLevel;

/// Placeholder that marks the gap in a fill-in-the-blank question.
pub const BLANK: &str = "____";

pub const MIN_WORD_COUNT: u32 = 50;
pub const MAX_WORD_COUNT: u32 = 1000;
pub const DEFAULT_WORD_COUNT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillInTheBlankExercise {
    pub question: String,
    pub correct_answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceExercise {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyDefinition {
    pub word: String,
    pub definition: String,
}

/// A generated lesson, exactly as the model returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub grammar_and_usage: String,
    pub fill_in_the_blank_exercises: Vec<FillInTheBlankExercise>,
    pub multiple_choice_exercises: Vec<MultipleChoiceExercise>,
    pub dialogue: String,
    pub paragraph: String,
    pub vocabulary_definitions: Vec<VocabularyDefinition>,
}

impl Lesson {
    /// Appends a fresh batch of exercises after the existing ones.
    pub fn append_exercises(&mut self, more: ExerciseSet) {
        self.fill_in_the_blank_exercises
            .extend(more.fill_in_the_blank_exercises);
        self.multiple_choice_exercises
            .extend(more.multiple_choice_exercises);
    }

    pub fn exercise_count(&self) -> usize {
        self.fill_in_the_blank_exercises.len() + self.multiple_choice_exercises.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSet {
    pub fill_in_the_blank_exercises: Vec<FillInTheBlankExercise>,
    pub multiple_choice_exercises: Vec<MultipleChoiceExercise>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LessonParamsError {
    #[error("Please fill in both Topic and Vocabulary fields.")]
    MissingFields,
    #[error("The paragraph word count must be at least 50.")]
    WordCountTooSmall,
    #[error("The paragraph word count can be at most 1000.")]
    WordCountTooLarge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonParams {
    pub level: EnglishLevel,
    pub topic: String,
    pub vocabulary: String,
    pub word_count: u32,
}

impl LessonParams {
    pub fn new(level: EnglishLevel, topic: &str, vocabulary: &str, word_count: u32) -> Self {
        Self {
            level,
            topic: topic.trim().to_string(),
            vocabulary: vocabulary.trim().to_string(),
            word_count,
        }
    }

    pub fn validate(&self) -> Result<(), LessonParamsError> {
        if self.topic.trim().is_empty() || self.vocabulary.trim().is_empty() {
            return Err(LessonParamsError::MissingFields);
        }
        if self.word_count < MIN_WORD_COUNT {
            return Err(LessonParamsError::WordCountTooSmall);
        }
        if self.word_count > MAX_WORD_COUNT {
            return Err(LessonParamsError::WordCountTooLarge);
        }
        Ok(())
    }

    /// The comma-separated vocabulary list, trimmed, without empty entries.
    pub fn vocabulary_words(&self) -> Vec<&str> {
        self.vocabulary
            .split(',')
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLesson {
    pub id: String,
    pub params: LessonParams,
    pub lesson: Lesson,
}

impl SavedLesson {
    /// One-line description used in history listings.
    pub fn summary(&self) -> String {
        let words = self.params.vocabulary_words();
        let mut vocabulary = words.iter().take(3).copied().collect::<Vec<_>>().join(", ");
        if words.len() > 3 {
            vocabulary.push_str("...");
        }
        format!("Level: {} · Vocabulary: {}", self.params.level, vocabulary)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: &str) -> Self {
        Self {
            sender: Sender::User,
            text: text.to_string(),
        }
    }

    pub fn ai(text: &str) -> Self {
        Self {
            sender: Sender::Ai,
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub translation: String,
    pub definition: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(question: &str, answer: &str) -> FillInTheBlankExercise {
        FillInTheBlankExercise {
            question: question.to_string(),
            correct_answer: answer.to_string(),
        }
    }

    #[test]
    fn test_lesson_json_uses_camel_case() {
        let json = r#"{
            "grammarAndUsage": "**Past Simple**",
            "fillInTheBlankExercises": [{"question": "I ____ home.", "correctAnswer": "went"}],
            "multipleChoiceExercises": [{"question": "Pick", "options": ["a", "b"], "correctAnswer": "a"}],
            "dialogue": "A: Hi\n\nB: Hello",
            "paragraph": "Text",
            "vocabularyDefinitions": [{"word": "home", "definition": "where you live"}]
        }"#;
        let lesson: Lesson = serde_json::from_str(json).unwrap();
        assert_eq!(lesson.fill_in_the_blank_exercises[0].correct_answer, "went");
        assert_eq!(lesson.vocabulary_definitions[0].word, "home");
        assert_eq!(lesson.exercise_count(), 2);
    }

    #[test]
    fn test_append_exercises_keeps_existing() {
        let mut lesson = Lesson {
            grammar_and_usage: String::new(),
            fill_in_the_blank_exercises: vec![fill("one ____", "1")],
            multiple_choice_exercises: vec![],
            dialogue: String::new(),
            paragraph: String::new(),
            vocabulary_definitions: vec![],
        };
        lesson.append_exercises(ExerciseSet {
            fill_in_the_blank_exercises: vec![fill("two ____", "2")],
            multiple_choice_exercises: vec![MultipleChoiceExercise {
                question: "q".to_string(),
                options: vec!["x".to_string()],
                correct_answer: "x".to_string(),
            }],
        });
        assert_eq!(lesson.fill_in_the_blank_exercises.len(), 2);
        assert_eq!(lesson.fill_in_the_blank_exercises[0].correct_answer, "1");
        assert_eq!(lesson.multiple_choice_exercises.len(), 1);
    }

    #[test]
    fn test_validate_params() {
        let ok = LessonParams::new(EnglishLevel::B1, "Travel", "passport", 100);
        assert_eq!(ok.validate(), Ok(()));

        let blank = LessonParams::new(EnglishLevel::B1, "  ", "passport", 100);
        assert_eq!(blank.validate(), Err(LessonParamsError::MissingFields));
        assert_eq!(
            blank.validate().unwrap_err().to_string(),
            "Please fill in both Topic and Vocabulary fields."
        );

        let short = LessonParams::new(EnglishLevel::B1, "Travel", "passport", 40);
        assert_eq!(short.validate(), Err(LessonParamsError::WordCountTooSmall));

        let long = LessonParams::new(EnglishLevel::B1, "Travel", "passport", MAX_WORD_COUNT + 1);
        assert_eq!(long.validate(), Err(LessonParamsError::WordCountTooLarge));
        let longest = LessonParams::new(EnglishLevel::B1, "Travel", "passport", MAX_WORD_COUNT);
        assert_eq!(longest.validate(), Ok(()));
    }

    #[test]
    fn test_summary_truncates_vocabulary() {
        let saved = SavedLesson {
            id: "1".to_string(),
            params: LessonParams::new(
                EnglishLevel::A2,
                "Travel",
                "passport, booking, destination, explore",
                100,
            ),
            lesson: Lesson {
                grammar_and_usage: String::new(),
                fill_in_the_blank_exercises: vec![],
                multiple_choice_exercises: vec![],
                dialogue: String::new(),
                paragraph: String::new(),
                vocabulary_definitions: vec![],
            },
        };
        assert_eq!(
            saved.summary(),
            "Level: A2 - Elementary · Vocabulary: passport, booking, destination..."
        );
    }

    #[test]
    fn test_sender_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::ai("hi")).unwrap();
        assert_eq!(json, r#"{"sender":"ai","text":"hi"}"#);
    }
}
