pub mod chat;
pub mod exercise;
pub mod history;
pub mod lesson;
pub mod level;
pub mod offline_tutor;
pub mod prompts;
pub mod tutor;
pub mod voice;

pub use chat::ChatSession;
pub use history::LessonHistory;
pub use lesson::{
    ChatMessage, ExerciseSet, FillInTheBlankExercise, Lesson, LessonParams, LessonParamsError,
    MultipleChoiceExercise, SavedLesson, Sender, Translation, VocabularyDefinition,
};
pub use level::EnglishLevel;
pub use offline_tutor::OfflineTutor;
pub use prompts::PromptBook;
pub use tutor::{Tutor, TutorClient, TutorError};
pub use voice::{VoiceEvent, VoiceSession, VoiceStatus};
