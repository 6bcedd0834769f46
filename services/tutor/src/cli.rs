use clap::{Args, Parser, Subcommand, ValueEnum};
use tutor_core::EnglishLevel;
use tutor_core::lesson::DEFAULT_WORD_COUNT;

#[derive(Parser, Debug)]
#[command(name = "english-tutor", version, about = "Practice English with Lexi, an AI tutor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate, revisit and practice lessons
    #[command(subcommand)]
    Lesson(LessonCommand),
    /// Show or clear the saved lessons
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Look up an English word
    Define { word: String },
    /// Translate a Spanish word and define it in English
    Translate { word: String },
    /// Text conversation practice
    Chat,
    /// Spoken conversation practice
    Voice(VoiceArgs),
    /// List audio input and output devices
    Devices,
}

#[derive(Subcommand, Debug)]
pub enum LessonCommand {
    /// Generate a new lesson
    New(NewLessonArgs),
    /// Add more exercises to a saved lesson
    More {
        /// Position in the history listing, or the lesson topic
        lesson: String,
        #[arg(long, value_enum, default_value_t = Section::Exercises)]
        section: Section,
    },
    /// Show a saved lesson
    Show {
        lesson: String,
        #[arg(long, value_enum, default_value_t = Section::All)]
        section: Section,
    },
    /// Work through the exercises of a saved lesson
    Practice { lesson: String },
}

#[derive(Args, Debug)]
pub struct NewLessonArgs {
    /// e.g. "Past Simple vs. Present Perfect"
    #[arg(long)]
    pub topic: String,
    /// Comma-separated words, e.g. "explore, journey, destination"
    #[arg(long)]
    pub vocabulary: String,
    #[arg(long, default_value_t = EnglishLevel::default(), value_parser = parse_level)]
    pub level: EnglishLevel,
    /// Approximate length of the reading paragraph
    #[arg(long, default_value_t = DEFAULT_WORD_COUNT)]
    pub word_count: u32,
    #[arg(long, value_enum, default_value_t = Section::All)]
    pub section: Section,
    /// Start practicing the exercises right after generating
    #[arg(long)]
    pub practice: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    List,
    Clear,
}

#[derive(Args, Debug, Default)]
pub struct VoiceArgs {
    /// Microphone to use instead of the default input device
    #[arg(long)]
    pub input_device: Option<String>,
    /// Speaker to use instead of the default output device
    #[arg(long)]
    pub output_device: Option<String>,
    /// Mute the microphone while Lexi is speaking
    #[arg(long)]
    pub half_duplex: bool,
}

/// Which part of a lesson to print.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    All,
    Content,
    Exercises,
    Vocabulary,
}

fn parse_level(s: &str) -> Result<EnglishLevel, String> {
    s.parse().map_err(|e: tutor_core::level::ParseLevelError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_lesson_new_defaults() {
        let cli = Cli::try_parse_from([
            "english-tutor",
            "lesson",
            "new",
            "--topic",
            "Travel",
            "--vocabulary",
            "passport, booking",
        ])
        .unwrap();
        match cli.command {
            Command::Lesson(LessonCommand::New(args)) => {
                assert_eq!(args.level, EnglishLevel::B1);
                assert_eq!(args.word_count, 100);
                assert_eq!(args.section, Section::All);
                assert!(!args.practice);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_level_accepts_code_or_label() {
        let cli = Cli::try_parse_from([
            "english-tutor", "lesson", "new", "--topic", "t", "--vocabulary", "v", "--level", "c2",
            "--section", "exercises",
        ])
        .unwrap();
        match cli.command {
            Command::Lesson(LessonCommand::New(args)) => {
                assert_eq!(args.level, EnglishLevel::C2);
                assert_eq!(args.section, Section::Exercises);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(
            Cli::try_parse_from([
                "english-tutor", "lesson", "new", "--topic", "t", "--vocabulary", "v", "--level", "Z9",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_history_action_is_optional() {
        let cli = Cli::try_parse_from(["english-tutor", "history"]).unwrap();
        assert!(matches!(cli.command, Command::History { action: None }));
        let cli = Cli::try_parse_from(["english-tutor", "history", "clear"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::History {
                action: Some(HistoryAction::Clear)
            }
        ));
    }

    #[test]
    fn test_voice_flags() {
        let cli = Cli::try_parse_from([
            "english-tutor", "voice", "--input-device", "USB Mic", "--half-duplex",
        ])
        .unwrap();
        match cli.command {
            Command::Voice(args) => {
                assert_eq!(args.input_device.as_deref(), Some("USB Mic"));
                assert!(args.output_device.is_none());
                assert!(args.half_duplex);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
