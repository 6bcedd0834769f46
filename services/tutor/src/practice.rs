//! Interactive exercise practice on stdin/stdout.

use std::io::{BufRead, Write};

use anyhow::Result;
use tutor_core::Lesson;
use tutor_core::exercise::{
    CheckStatus, FillInTheBlankAttempt, MultipleChoiceAttempt, OptionState, PracticeScore,
};

use crate::render::{option_letter, title};

const FILL_IN_ATTEMPTS: usize = 2;

/// Reads one line. `None` at end of input.
fn read_answer<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn parse_choice(answer: &str, option_count: usize) -> Option<usize> {
    let answer = answer.trim().to_lowercase();
    let index = match answer.parse::<usize>() {
        Ok(n) => n.checked_sub(1)?,
        Err(_) => {
            let mut chars = answer.chars();
            let letter = chars.next()?;
            if chars.next().is_some() || !letter.is_ascii_lowercase() {
                return None;
            }
            (letter as u8 - b'a') as usize
        }
    };
    (index < option_count).then_some(index)
}

/// Walks through every exercise of `lesson`. Stops early at end of input.
pub fn run_practice<R: BufRead, W: Write>(
    lesson: &Lesson,
    input: &mut R,
    out: &mut W,
) -> Result<PracticeScore> {
    let mut score = PracticeScore::default();

    if !lesson.fill_in_the_blank_exercises.is_empty() {
        writeln!(out, "{}", title("Fill in the Blank", '-'))?;
    }
    for (i, exercise) in lesson.fill_in_the_blank_exercises.iter().enumerate() {
        let mut attempt = FillInTheBlankAttempt::new(exercise);
        let (before, after) = attempt.question_parts();
        writeln!(out, "{}. {}[____]{}", i + 1, before, after)?;

        for tries in 1..=FILL_IN_ATTEMPTS {
            write!(out, "Your answer: ")?;
            out.flush()?;
            let Some(answer) = read_answer(input)? else {
                return Ok(score);
            };
            attempt.set_input(&answer);
            match attempt.check() {
                CheckStatus::Correct => {
                    writeln!(out, "Correct!")?;
                    break;
                }
                _ if tries < FILL_IN_ATTEMPTS => writeln!(out, "Not quite, try again.")?,
                _ => writeln!(out, "Not quite. The answer is: {}", attempt.correct_answer())?,
            }
        }
        score.record(attempt.status() == CheckStatus::Correct);
        writeln!(out)?;
    }

    if !lesson.multiple_choice_exercises.is_empty() {
        writeln!(out, "{}", title("Multiple Choice", '-'))?;
    }
    for (i, exercise) in lesson.multiple_choice_exercises.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, exercise.question)?;
        if exercise.options.is_empty() {
            tracing::warn!("Skipping multiple-choice question {} without options", i + 1);
            writeln!(out, "(This question has no options, skipping it.)\n")?;
            continue;
        }
        let mut attempt = MultipleChoiceAttempt::new(exercise);
        for (j, option) in exercise.options.iter().enumerate() {
            writeln!(out, "   {}) {}", option_letter(j), option)?;
        }

        while !attempt.can_reveal() {
            write!(out, "Your choice: ")?;
            out.flush()?;
            let Some(answer) = read_answer(input)? else {
                return Ok(score);
            };
            match parse_choice(&answer, exercise.options.len()) {
                Some(index) => {
                    attempt.select(index);
                }
                None => writeln!(out, "Please pick one of the listed options.")?,
            }
        }
        attempt.reveal();

        for (j, option) in exercise.options.iter().enumerate() {
            let mark = match attempt.option_state(j) {
                OptionState::Correct => "✓",
                OptionState::WrongSelection => "✗",
                OptionState::Neutral | OptionState::Selected => " ",
            };
            writeln!(out, " {} {}) {}", mark, option_letter(j), option)?;
        }
        score.record(attempt.is_correct());
        writeln!(out)?;
    }

    writeln!(
        out,
        "Score: {}/{} ({}%)",
        score.correct,
        score.total,
        score.percent()
    )?;
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tutor_core::{FillInTheBlankExercise, MultipleChoiceExercise};

    fn lesson() -> Lesson {
        Lesson {
            grammar_and_usage: String::new(),
            fill_in_the_blank_exercises: vec![
                FillInTheBlankExercise {
                    question: "She ____ to work.".to_string(),
                    correct_answer: "walks".to_string(),
                },
                FillInTheBlankExercise {
                    question: "They ____ happy.".to_string(),
                    correct_answer: "are".to_string(),
                },
            ],
            multiple_choice_exercises: vec![MultipleChoiceExercise {
                question: "Pick the noun".to_string(),
                options: vec!["run".to_string(), "table".to_string(), "blue".to_string()],
                correct_answer: "table".to_string(),
            }],
            dialogue: String::new(),
            paragraph: String::new(),
            vocabulary_definitions: vec![],
        }
    }

    #[test]
    fn test_full_session_scores_answers() -> Result<()> {
        let lesson = lesson();
        let mut input = Cursor::new("Walks \nis\nam\nz\nc\n");
        let mut out = Vec::new();

        let score = run_practice(&lesson, &mut input, &mut out)?;
        let out = String::from_utf8(out)?;

        assert_eq!(score, PracticeScore { correct: 1, total: 3 });
        assert!(out.contains("1. She [____] to work."));
        assert!(out.contains("Not quite. The answer is: are"));
        assert!(out.contains("Please pick one of the listed options."));
        assert!(out.contains(" ✓ b) table"));
        assert!(out.contains(" ✗ c) blue"));
        assert!(out.ends_with("Score: 1/3 (33%)\n"));
        Ok(())
    }

    #[test]
    fn test_end_of_input_stops_early() -> Result<()> {
        let lesson = lesson();
        let mut input = Cursor::new("walks\n");
        let mut out = Vec::new();
        let score = run_practice(&lesson, &mut input, &mut out)?;
        assert_eq!(score, PracticeScore { correct: 1, total: 1 });
        Ok(())
    }

    #[test]
    fn test_question_without_options_is_skipped() -> Result<()> {
        let mut lesson = lesson();
        lesson.fill_in_the_blank_exercises.clear();
        lesson.multiple_choice_exercises.insert(
            0,
            MultipleChoiceExercise {
                question: "Nothing to pick".to_string(),
                options: vec![],
                correct_answer: "x".to_string(),
            },
        );
        let mut input = Cursor::new("b
");
        let mut out = Vec::new();

        let score = run_practice(&lesson, &mut input, &mut out)?;
        let out = String::from_utf8(out)?;
        assert_eq!(score, PracticeScore { correct: 1, total: 1 });
        assert!(out.contains("no options, skipping"));
        Ok(())
    }

    #[test]
    fn test_long_option_lists_are_lettered_like_the_lesson_view() -> Result<()> {
        let options: Vec<String> = (0..200).map(|n| format!("option {}", n)).collect();
        let lesson = Lesson {
            fill_in_the_blank_exercises: vec![],
            multiple_choice_exercises: vec![MultipleChoiceExercise {
                question: "Pick the last one".to_string(),
                correct_answer: "option 199".to_string(),
                options,
            }],
            ..lesson()
        };
        let mut input = Cursor::new("200
");
        let mut out = Vec::new();

        let score = run_practice(&lesson, &mut input, &mut out)?;
        let out = String::from_utf8(out)?;
        assert_eq!(score, PracticeScore { correct: 1, total: 1 });
        assert!(out.contains(&format!("   {}) option 199", option_letter(199))));
        Ok(())
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("B", 4), Some(1));
        assert_eq!(parse_choice(" 3 ", 4), Some(2));
        assert_eq!(parse_choice("0", 4), None);
        assert_eq!(parse_choice("e", 4), None);
        assert_eq!(parse_choice("ab", 4), None);
        assert_eq!(parse_choice("", 4), None);
    }
}
