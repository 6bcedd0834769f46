//! A `Tutor` that never leaves the machine.
//!
//! Output is built from the request itself, so the same input always gives
//! the same lesson. Useful for demos and for trying the CLI without a key.

use async_trait::async_trait;

use crate::lesson::{
    BLANK, ChatMessage, ExerciseSet, FillInTheBlankExercise, Lesson, LessonParams,
    MAX_WORD_COUNT, MultipleChoiceExercise, Sender, Translation, VocabularyDefinition,
};
use crate::level::EnglishLevel;
use crate::tutor::{Tutor, TutorError};

const FALLBACK_WORDS: [&str; 4] = ["practice", "question", "answer", "sentence"];

#[derive(Debug, Default, Clone)]
pub struct OfflineTutor;

impl OfflineTutor {
    pub fn new() -> Self {
        Self
    }
}

fn words_of(vocabulary: &str) -> Vec<String> {
    let words: Vec<String> = vocabulary
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    if words.is_empty() {
        FALLBACK_WORDS.iter().map(|w| w.to_string()).collect()
    } else {
        words
    }
}

fn definition_for(word: &str) -> String {
    format!("a word used when talking about \"{}\" in everyday English", word)
}

fn fill_in_the_blank(topic: &str, words: &[String], offset: usize) -> Vec<FillInTheBlankExercise> {
    (0..2)
        .map(|i| {
            let word = &words[(offset + i) % words.len()];
            FillInTheBlankExercise {
                question: format!("When we talk about {}, the word {} is useful.", topic, BLANK),
                correct_answer: word.clone(),
            }
        })
        .collect()
}

fn multiple_choice(words: &[String], offset: usize) -> Vec<MultipleChoiceExercise> {
    (0..2)
        .map(|i| {
            let answer = words[(offset + i) % words.len()].clone();
            let mut options = vec![answer.clone()];
            for filler in FALLBACK_WORDS {
                if options.len() == 4 {
                    break;
                }
                if !options.iter().any(|o| o.eq_ignore_ascii_case(filler)) {
                    options.push(filler.to_string());
                }
            }
            // Keep the answer away from a fixed slot.
            let slot = (offset + i) % options.len();
            options.swap(0, slot);
            MultipleChoiceExercise {
                question: format!("Which word means {}?", definition_for(&answer)),
                options,
                correct_answer: answer,
            }
        })
        .collect()
}

fn paragraph(topic: &str, words: &[String], word_count: u32) -> String {
    let mut sentences = Vec::new();
    let mut count = 0usize;
    let mut i = 0usize;
    let target = word_count.min(MAX_WORD_COUNT) as usize;
    while count < target {
        let sentence = format!(
            "Talking about {} often means using the word {}.",
            topic,
            words[i % words.len()]
        );
        count += sentence.split_whitespace().count();
        sentences.push(sentence);
        i += 1;
    }
    sentences.join(" ")
}

#[async_trait]
impl Tutor for OfflineTutor {
    async fn generate_lesson(&self, params: &LessonParams) -> Result<Lesson, TutorError> {
        let words = words_of(&params.vocabulary);
        let topic = &params.topic;
        Ok(Lesson {
            grammar_and_usage: format!(
                "**{topic}**\n\nThis {level} lesson looks at *{topic}*. Read the example and notice how the vocabulary is used.\n\nExample: *I want to learn about {topic}.*",
                level = params.level.code(),
            ),
            fill_in_the_blank_exercises: fill_in_the_blank(topic, &words, 0),
            multiple_choice_exercises: multiple_choice(&words, 0),
            dialogue: format!(
                "A: Do you know much about {topic}?\n\nB: A little. I know the word \"{}\".\n\nA: Great, let's practice it together!",
                words[0]
            ),
            paragraph: paragraph(topic, &words, params.word_count),
            vocabulary_definitions: words
                .iter()
                .map(|w| VocabularyDefinition {
                    word: w.clone(),
                    definition: definition_for(w),
                })
                .collect(),
        })
    }

    async fn generate_more_exercises(
        &self,
        _level: EnglishLevel,
        topic: &str,
        vocabulary: &str,
    ) -> Result<ExerciseSet, TutorError> {
        let words = words_of(vocabulary);
        Ok(ExerciseSet {
            fill_in_the_blank_exercises: fill_in_the_blank(topic, &words, 1),
            multiple_choice_exercises: multiple_choice(&words, 1),
        })
    }

    async fn define_word(&self, word: &str) -> Result<String, TutorError> {
        Ok(format!("**{}**: {}.", word.trim(), definition_for(word.trim())))
    }

    async fn translate_and_define(&self, spanish_word: &str) -> Result<Translation, TutorError> {
        let word = spanish_word.trim();
        Ok(Translation {
            translation: format!("({})", word),
            definition: format!("No dictionary is available offline for \"{}\".", word),
        })
    }

    async fn chat(
        &self,
        _system_instruction: &str,
        history: &[ChatMessage],
    ) -> Result<String, TutorError> {
        let last = history
            .iter()
            .rev()
            .find(|m| m.sender == Sender::User)
            .map(|m| m.text.trim())
            .unwrap_or_default();
        if last.is_empty() {
            return Ok("What would you like to talk about?".to_string());
        }
        Ok(format!(
            "That's interesting! You said: \"{}\". Can you tell me more about it?",
            last
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lesson_covers_every_vocabulary_word() {
        let tutor = OfflineTutor::new();
        let params = LessonParams::new(EnglishLevel::A2, "Travel", "passport, booking, destination", 60);
        let lesson = tutor.generate_lesson(&params).await.unwrap();

        let defined: Vec<_> = lesson
            .vocabulary_definitions
            .iter()
            .map(|d| d.word.as_str())
            .collect();
        assert_eq!(defined, vec!["passport", "booking", "destination"]);
        assert!(lesson.paragraph.split_whitespace().count() >= 60);
        for ex in &lesson.fill_in_the_blank_exercises {
            assert!(ex.question.contains(BLANK));
        }
        for ex in &lesson.multiple_choice_exercises {
            assert_eq!(ex.options.len(), 4);
            assert!(ex.options.contains(&ex.correct_answer));
        }
    }

    #[tokio::test]
    async fn test_paragraph_length_is_capped() {
        let tutor = OfflineTutor::new();
        let params = LessonParams::new(EnglishLevel::B1, "Food", "spicy", u32::MAX);
        let lesson = tutor.generate_lesson(&params).await.unwrap();
        let words = lesson.paragraph.split_whitespace().count();
        assert!(words >= MAX_WORD_COUNT as usize);
        assert!(words < MAX_WORD_COUNT as usize + 20);
    }

    #[tokio::test]
    async fn test_lesson_is_deterministic() {
        let tutor = OfflineTutor::new();
        let params = LessonParams::new(EnglishLevel::B1, "Food", "spicy", 50);
        assert_eq!(
            tutor.generate_lesson(&params).await.unwrap(),
            tutor.generate_lesson(&params).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_more_exercises_differ_from_first_batch() {
        let tutor = OfflineTutor::new();
        let params = LessonParams::new(EnglishLevel::B1, "Food", "spicy, sweet", 50);
        let lesson = tutor.generate_lesson(&params).await.unwrap();
        let more = tutor
            .generate_more_exercises(params.level, &params.topic, &params.vocabulary)
            .await
            .unwrap();
        assert_eq!(more.fill_in_the_blank_exercises.len(), 2);
        assert_eq!(more.multiple_choice_exercises.len(), 2);
        assert_ne!(
            more.fill_in_the_blank_exercises[0].correct_answer,
            lesson.fill_in_the_blank_exercises[0].correct_answer
        );
    }

    #[tokio::test]
    async fn test_chat_echoes_last_user_message() {
        let tutor = OfflineTutor::new();
        let reply = tutor
            .chat("persona", &[ChatMessage::user("I like football")])
            .await
            .unwrap();
        assert!(reply.contains("I like football"));
    }
}
