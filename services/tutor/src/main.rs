use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use secrecy::{ExposeSecret, SecretString};
use tracing::Level;
use tracing_subscriber::fmt::time::ChronoLocal;
use tutor_core::{
    ChatSession, LessonHistory, LessonParams, OfflineTutor, PromptBook, SavedLesson, Tutor,
    TutorClient,
};

use tutor_service::cli::{Cli, Command, HistoryAction, LessonCommand, NewLessonArgs, Section};
use tutor_service::config::{Config, TutorProvider};
use tutor_service::{chat, practice, render, voice};

fn init_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
}

fn load_prompts(config: &Config) -> Result<PromptBook> {
    match &config.prompts_dir {
        Some(dir) => PromptBook::with_overrides(dir).context("Failed to load prompt overrides"),
        None => Ok(PromptBook::default()),
    }
}

fn build_tutor(config: &Config, prompts: PromptBook) -> Result<Box<dyn Tutor>> {
    match config.provider {
        TutorProvider::Offline => {
            tracing::info!("Using the offline tutor");
            Ok(Box::new(OfflineTutor::new()))
        }
        TutorProvider::Gemini => {
            let key = config
                .api_key
                .as_ref()
                .context("GEMINI_API_KEY must be set for gemini provider")?;
            let client = TutorClient::new(SecretString::from(key.expose_secret().to_string()), prompts)
                .with_base_url(&config.base_url)
                .with_models(&config.lesson_model, &config.fast_model);
            Ok(Box::new(client))
        }
    }
}

fn find_saved<'a>(history: &'a LessonHistory, selector: &str) -> Result<&'a SavedLesson> {
    history.lookup(selector).with_context(|| {
        format!(
            "No saved lesson matches '{}'. Run `english-tutor history` to see your lessons.",
            selector
        )
    })
}

fn practice_on_stdin(lesson: &tutor_core::Lesson) -> Result<()> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();
    practice::run_practice(lesson, &mut input, &mut out)?;
    out.flush()?;
    Ok(())
}

async fn new_lesson(
    tutor: &dyn Tutor,
    history: &mut LessonHistory,
    args: NewLessonArgs,
) -> Result<()> {
    let params = LessonParams::new(args.level, &args.topic, &args.vocabulary, args.word_count);
    params.validate()?;

    println!("Generating your {} lesson on '{}'...", params.level, params.topic);
    let lesson = tutor.generate_lesson(&params).await.map_err(|e| {
        tracing::error!("Lesson generation failed: {}", e);
        anyhow::anyhow!("Failed to generate lesson. The AI might be busy. Please try again.")
    })?;
    history.record(&params, &lesson)?;

    println!("{}", render::render_lesson(&params, &lesson, args.section));
    if args.practice {
        println!();
        practice_on_stdin(&lesson)?;
    }
    Ok(())
}

async fn more_exercises(
    tutor: &dyn Tutor,
    history: &mut LessonHistory,
    selector: &str,
    section: Section,
) -> Result<()> {
    let saved = find_saved(history, selector)?.clone();
    let params = saved.params;

    println!("Generating more exercises for '{}'...", params.topic);
    let more = tutor
        .generate_more_exercises(params.level, &params.topic, &params.vocabulary)
        .await
        .map_err(|e| {
            tracing::error!("Exercise generation failed: {}", e);
            anyhow::anyhow!("Failed to generate more exercises. Please try again.")
        })?;

    let mut lesson = saved.lesson;
    lesson.append_exercises(more);
    history.update_lesson(&params.topic, &lesson)?;

    println!("{}", render::render_lesson(&params, &lesson, section));
    Ok(())
}

async fn define(tutor: &dyn Tutor, word: &str) -> Result<()> {
    if word.trim().is_empty() {
        anyhow::bail!("Please enter a word to look up.");
    }
    match tutor.define_word(word).await {
        Ok(definition) => println!("{}", render::render_markdown(&definition)),
        Err(e) => {
            tracing::error!("Definition failed: {}", e);
            anyhow::bail!("Sorry, I couldn't find a definition for that word.");
        }
    }
    Ok(())
}

async fn translate(tutor: &dyn Tutor, word: &str) -> Result<()> {
    if word.trim().is_empty() {
        anyhow::bail!("Please enter a Spanish word to translate.");
    }
    match tutor.translate_and_define(word).await {
        Ok(result) => {
            println!("{} → {}", word.trim(), result.translation);
            println!("{}", result.definition);
        }
        Err(e) => {
            tracing::error!("Translation failed: {}", e);
            anyhow::bail!("Sorry, I couldn't translate that word.");
        }
    }
    Ok(())
}

fn list_devices() -> Result<()> {
    println!("Input devices:\n{}", tutor_native_utils::device::get_available_inputs()?);
    println!("Output devices:\n{}", tutor_native_utils::device::get_available_outputs()?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Listing devices needs neither a key nor a data directory.
    if let Command::Devices = cli.command {
        init_logging(Level::WARN);
        return list_devices();
    }

    let config = Config::from_env().context("Failed to load application configuration")?;
    init_logging(config.log_level);
    tracing::debug!("Configuration loaded: {:?}", config);

    let prompts = load_prompts(&config)?;

    match cli.command {
        Command::Voice(args) => voice::run_voice(&config, &prompts, args).await,
        Command::History { action } => {
            let mut history = LessonHistory::load(&config.data_dir)?;
            match action.unwrap_or(HistoryAction::List) {
                HistoryAction::List => println!("{}", render::render_history(history.entries())),
                HistoryAction::Clear => {
                    history.clear()?;
                    println!("Lesson history cleared.");
                }
            }
            Ok(())
        }
        Command::Lesson(command) => {
            let mut history = LessonHistory::load(&config.data_dir)?;
            match command {
                LessonCommand::New(args) => {
                    let tutor = build_tutor(&config, prompts)?;
                    new_lesson(tutor.as_ref(), &mut history, args).await
                }
                LessonCommand::More { lesson, section } => {
                    let tutor = build_tutor(&config, prompts)?;
                    more_exercises(tutor.as_ref(), &mut history, &lesson, section).await
                }
                LessonCommand::Show { lesson, section } => {
                    let saved = find_saved(&history, &lesson)?;
                    println!("{}", render::render_lesson(&saved.params, &saved.lesson, section));
                    Ok(())
                }
                LessonCommand::Practice { lesson } => {
                    let saved = find_saved(&history, &lesson)?;
                    println!("{}\n", render::render_header(&saved.params));
                    practice_on_stdin(&saved.lesson)
                }
            }
        }
        Command::Define { word } => define(build_tutor(&config, prompts)?.as_ref(), &word).await,
        Command::Translate { word } => {
            translate(build_tutor(&config, prompts)?.as_ref(), &word).await
        }
        Command::Chat => {
            let mut session = ChatSession::new(prompts.chat_persona());
            let tutor = build_tutor(&config, prompts)?;
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            chat::run_chat(tutor.as_ref(), &mut session, input, &mut std::io::stdout()).await
        }
        Command::Devices => list_devices(),
    }
}
