use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::lesson::{Lesson, LessonParams, SavedLesson};

pub const HISTORY_FILE: &str = "lesson_history.json";
pub const MAX_SAVED_LESSONS: usize = 5;

/// The most recent lessons, newest first, persisted as a JSON array.
#[derive(Debug)]
pub struct LessonHistory {
    path: PathBuf,
    entries: Vec<SavedLesson>,
}

impl LessonHistory {
    /// Reads `<data_dir>/lesson_history.json`.
    ///
    /// A missing file is an empty history. So is a file that does not parse;
    /// it is logged and removed so the next save starts clean.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(HISTORY_FILE);
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<SavedLesson>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::error!("Failed to parse lesson history {}: {}", path.display(), e);
                    remove_if_present(&path)?;
                    Vec::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read lesson history: {}", path.display()));
            }
        };
        tracing::debug!("Loaded {} saved lessons", entries.len());
        Ok(Self { path, entries })
    }

    pub fn entries(&self) -> &[SavedLesson] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saves a lesson. An entry with the same topic is replaced where it
    /// stands; otherwise the lesson goes to the front.
    pub fn record(&mut self, params: &LessonParams, lesson: &Lesson) -> Result<&SavedLesson> {
        let saved = SavedLesson {
            id: Utc::now().timestamp_millis().to_string(),
            params: params.clone(),
            lesson: lesson.clone(),
        };

        let index = match self
            .entries
            .iter()
            .position(|entry| entry.params.topic == params.topic)
        {
            Some(index) => {
                self.entries[index] = saved;
                index
            }
            None => {
                self.entries.insert(0, saved);
                0
            }
        };
        self.entries.truncate(MAX_SAVED_LESSONS);
        self.persist()?;
        self.entries
            .get(index)
            .context("saved lesson fell outside the history window")
    }

    /// Stores an updated lesson under its saved params, but only when the
    /// topic is already in the history. Returns whether anything was saved.
    pub fn update_lesson(&mut self, topic: &str, lesson: &Lesson) -> Result<bool> {
        let Some(params) = self.find(topic).map(|entry| entry.params.clone()) else {
            return Ok(false);
        };
        self.record(&params, lesson)?;
        Ok(true)
    }

    pub fn find(&self, topic: &str) -> Option<&SavedLesson> {
        self.entries.iter().find(|entry| entry.params.topic == topic)
    }

    /// 1-based, matching the numbers shown in listings.
    pub fn get(&self, position: usize) -> Option<&SavedLesson> {
        position.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// Resolves a listing number or a topic.
    pub fn lookup(&self, selector: &str) -> Option<&SavedLesson> {
        let selector = selector.trim();
        match selector.parse::<usize>() {
            Ok(position) => self.get(position).or_else(|| self.find(selector)),
            Err(_) => self.find(selector),
        }
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        remove_if_present(&self.path)
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string(&self.entries)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write lesson history: {}", self.path.display()))
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}
