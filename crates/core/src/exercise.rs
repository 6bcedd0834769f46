//! Answer checking for lesson exercises.

use crate::lesson::{BLANK, FillInTheBlankExercise, MultipleChoiceExercise};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckStatus {
    #[default]
    Unchecked,
    Correct,
    Incorrect,
}

/// How an option is shown once the answer is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    Neutral,
    Selected,
    Correct,
    WrongSelection,
}

pub struct FillInTheBlankAttempt<'a> {
    exercise: &'a FillInTheBlankExercise,
    input: String,
    status: CheckStatus,
}

impl<'a> FillInTheBlankAttempt<'a> {
    pub fn new(exercise: &'a FillInTheBlankExercise) -> Self {
        Self {
            exercise,
            input: String::new(),
            status: CheckStatus::Unchecked,
        }
    }

    /// Text before and after the first blank. A question without a blank
    /// yields the whole question and an empty tail.
    pub fn question_parts(&self) -> (&str, &str) {
        self.exercise
            .question
            .split_once(BLANK)
            .unwrap_or((self.exercise.question.as_str(), ""))
    }

    /// Replaces the typed answer. Any earlier verdict no longer applies.
    pub fn set_input(&mut self, input: &str) {
        self.input = input.to_string();
        self.status = CheckStatus::Unchecked;
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn check(&mut self) -> CheckStatus {
        let given = self.input.trim().to_lowercase();
        let expected = self.exercise.correct_answer.trim().to_lowercase();
        self.status = if given == expected {
            CheckStatus::Correct
        } else {
            CheckStatus::Incorrect
        };
        self.status
    }

    pub fn status(&self) -> CheckStatus {
        self.status
    }

    pub fn correct_answer(&self) -> &str {
        &self.exercise.correct_answer
    }
}

pub struct MultipleChoiceAttempt<'a> {
    exercise: &'a MultipleChoiceExercise,
    selected: Option<usize>,
    revealed: bool,
}

impl<'a> MultipleChoiceAttempt<'a> {
    pub fn new(exercise: &'a MultipleChoiceExercise) -> Self {
        Self {
            exercise,
            selected: None,
            revealed: false,
        }
    }

    /// Selects the option at `index`. Ignored once revealed or when out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if self.revealed || index >= self.exercise.options.len() {
            return false;
        }
        self.selected = Some(index);
        true
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.exercise.options.get(i))
            .map(String::as_str)
    }

    pub fn can_reveal(&self) -> bool {
        self.selected.is_some() && !self.revealed
    }

    pub fn reveal(&mut self) -> bool {
        if !self.can_reveal() {
            return false;
        }
        self.revealed = true;
        true
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_correct(&self) -> bool {
        self.selected() == Some(self.exercise.correct_answer.as_str())
    }

    pub fn option_state(&self, index: usize) -> OptionState {
        let Some(option) = self.exercise.options.get(index) else {
            return OptionState::Neutral;
        };
        let is_selected = self.selected == Some(index);
        if !self.revealed {
            return if is_selected {
                OptionState::Selected
            } else {
                OptionState::Neutral
            };
        }
        if *option == self.exercise.correct_answer {
            OptionState::Correct
        } else if is_selected {
            OptionState::WrongSelection
        } else {
            OptionState::Neutral
        }
    }
}

/// Running tally for a practice session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PracticeScore {
    pub correct: usize,
    pub total: usize,
}

impl PracticeScore {
    pub fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.correct * 100) as f64 / self.total as f64).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill() -> FillInTheBlankExercise {
        FillInTheBlankExercise {
            question: "Yesterday I ____ to the market.".to_string(),
            correct_answer: "Went".to_string(),
        }
    }

    fn choice() -> MultipleChoiceExercise {
        MultipleChoiceExercise {
            question: "Which is a past tense verb?".to_string(),
            options: vec!["go".into(), "went".into(), "going".into(), "goes".into()],
            correct_answer: "went".to_string(),
        }
    }

    #[test]
    fn test_fill_in_check_ignores_case_and_spaces() {
        let exercise = fill();
        let mut attempt = FillInTheBlankAttempt::new(&exercise);
        assert_eq!(attempt.status(), CheckStatus::Unchecked);

        attempt.set_input("  wENT ");
        assert_eq!(attempt.check(), CheckStatus::Correct);

        attempt.set_input("go");
        assert_eq!(attempt.status(), CheckStatus::Unchecked);
        assert_eq!(attempt.check(), CheckStatus::Incorrect);
    }

    #[test]
    fn test_question_parts_split_on_first_blank() {
        let exercise = fill();
        let attempt = FillInTheBlankAttempt::new(&exercise);
        assert_eq!(attempt.question_parts(), ("Yesterday I ", " to the market."));

        let no_blank = FillInTheBlankExercise {
            question: "No gap here".to_string(),
            correct_answer: "x".to_string(),
        };
        assert_eq!(
            FillInTheBlankAttempt::new(&no_blank).question_parts(),
            ("No gap here", "")
        );
    }

    #[test]
    fn test_reveal_requires_selection() {
        let exercise = choice();
        let mut attempt = MultipleChoiceAttempt::new(&exercise);
        assert!(!attempt.reveal());

        assert!(attempt.select(0));
        assert_eq!(attempt.option_state(0), OptionState::Selected);
        assert!(attempt.select(2));
        assert_eq!(attempt.selected(), Some("going"));
        assert!(attempt.reveal());
        assert!(!attempt.reveal());

        assert!(!attempt.select(1), "selection is frozen after reveal");
        assert_eq!(attempt.option_state(1), OptionState::Correct);
        assert_eq!(attempt.option_state(2), OptionState::WrongSelection);
        assert_eq!(attempt.option_state(0), OptionState::Neutral);
        assert!(!attempt.is_correct());
    }

    #[test]
    fn test_out_of_range_selection_is_rejected() {
        let exercise = choice();
        let mut attempt = MultipleChoiceAttempt::new(&exercise);
        assert!(!attempt.select(9));
        assert!(!attempt.can_reveal());
    }

    #[test]
    fn test_score_percent() {
        let mut score = PracticeScore::default();
        assert_eq!(score.percent(), 0);
        score.record(true);
        score.record(false);
        score.record(true);
        assert_eq!(score, PracticeScore { correct: 2, total: 3 });
        assert_eq!(score.percent(), 67);
    }
}
