//! Plain-text rendering of lessons, history and conversations for a terminal.

use tutor_core::{ChatMessage, Lesson, LessonParams, SavedLesson, Sender};

use crate::cli::Section;

pub fn title(text: &str, underline: char) -> String {
    let width = text.chars().count();
    format!("{}\n{}", text, underline.to_string().repeat(width))
}

/// Removes `**` and `__` emphasis markers. Longer underscore runs, such as
/// the `____` blank in an exercise, are left alone.
fn strip_emphasis(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '*' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            continue;
        }
        if c == '_' {
            let run = chars[i..].iter().take_while(|&&ch| ch == '_').count();
            if run != 2 {
                out.extend(std::iter::repeat_n('_', run));
            }
            i += run;
            continue;
        }
        out.push(c);
        i += 1;
    }
    out
}

fn heading_text(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        let text = trimmed.trim_start_matches('#').trim();
        return (!text.is_empty()).then_some(text);
    }
    let inner = trimmed.strip_prefix("**")?.strip_suffix("**")?;
    let inner = inner.trim_end_matches(':').trim();
    (!inner.is_empty() && !inner.contains("**")).then_some(inner)
}

/// Turns model markdown into readable terminal text.
pub fn render_markdown(markdown: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for raw in markdown.lines() {
        let line = raw.trim_end();
        if let Some(heading) = heading_text(line) {
            lines.push(title(&strip_emphasis(heading), '-'));
            continue;
        }
        let indent = line.len() - line.trim_start().len();
        let body = line.trim_start();
        let rendered = match body
            .strip_prefix("* ")
            .or_else(|| body.strip_prefix("- "))
        {
            Some(item) => format!("{}• {}", &line[..indent], strip_emphasis(item)),
            None => strip_emphasis(line),
        };
        lines.push(rendered);
    }

    let mut out: Vec<String> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            if out.last().is_some_and(|prev| prev.is_empty()) || out.is_empty() {
                continue;
            }
            out.push(String::new());
        } else {
            out.push(line);
        }
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn option_letter(index: usize) -> char {
    (b'a' + (index % 26) as u8) as char
}

pub fn render_header(params: &LessonParams) -> String {
    format!(
        "{}\nLevel: {} · Vocabulary: {}",
        title(&params.topic, '='),
        params.level,
        params.vocabulary
    )
}

fn section(heading: &str, body: &str) -> String {
    format!("{}\n{}", title(heading, '-'), body)
}

pub fn render_content(lesson: &Lesson) -> String {
    [
        section("Grammar & Usage", &render_markdown(&lesson.grammar_and_usage)),
        section("Dialogue Practice", &render_markdown(&lesson.dialogue)),
        section("Reading Paragraph", &render_markdown(&lesson.paragraph)),
    ]
    .join("\n\n")
}

pub fn render_exercises(lesson: &Lesson) -> String {
    let fill = lesson
        .fill_in_the_blank_exercises
        .iter()
        .enumerate()
        .map(|(i, ex)| format!("{}. {}", i + 1, ex.question))
        .collect::<Vec<_>>()
        .join("\n");
    let choice = lesson
        .multiple_choice_exercises
        .iter()
        .enumerate()
        .map(|(i, ex)| {
            let options = ex
                .options
                .iter()
                .enumerate()
                .map(|(j, option)| format!("   {}) {}", option_letter(j), option))
                .collect::<Vec<_>>()
                .join("\n");
            format!("{}. {}\n{}", i + 1, ex.question, options)
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    [
        section("Fill in the Blank", &fill),
        section("Multiple Choice", &choice),
    ]
    .join("\n\n")
}

pub fn render_vocabulary(lesson: &Lesson) -> String {
    let body = lesson
        .vocabulary_definitions
        .iter()
        .map(|def| format!("{}\n  {}", capitalize(&def.word), def.definition))
        .collect::<Vec<_>>()
        .join("\n");
    section("Lesson Vocabulary", &body)
}

pub fn render_lesson(params: &LessonParams, lesson: &Lesson, which: Section) -> String {
    let mut parts = vec![render_header(params)];
    if matches!(which, Section::All | Section::Content) {
        parts.push(render_content(lesson));
    }
    if matches!(which, Section::All | Section::Exercises) {
        parts.push(render_exercises(lesson));
    }
    if matches!(which, Section::All | Section::Vocabulary) {
        parts.push(render_vocabulary(lesson));
    }
    parts.join("\n\n")
}

pub fn render_history(entries: &[SavedLesson]) -> String {
    if entries.is_empty() {
        return "No saved lessons yet. Create one with `english-tutor lesson new`.".to_string();
    }
    let items = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("{}. {}\n   {}", i + 1, entry.params.topic, entry.summary()))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n{}", title("Your Recent Lessons", '-'), items)
}

pub fn chat_line(message: &ChatMessage) -> String {
    let who = match message.sender {
        Sender::User => "You",
        Sender::Ai => "Lexi",
    };
    format!("{}: {}", who, message.text)
}
