use crate::types::{Blob, Content};

/// Every message the client may send. Serialized externally tagged,
/// e.g. `{"setup": {...}}` or `{"realtimeInput": {...}}`.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Setup(Setup),
    RealtimeInput(RealtimeInput),
    ClientContent(ClientContent),
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modality {
    Text,
    Audio,
}

/// Enables transcription of one direction of the audio stream.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct AudioTranscriptionConfig {}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub response_modalities: Vec<Modality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

/// The first message of every session.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_audio_transcription: Option<AudioTranscriptionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_audio_transcription: Option<AudioTranscriptionConfig>,
}

impl Setup {
    /// `model` may be given with or without the `models/` prefix.
    pub fn new(model: &str) -> Self {
        let model = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        Self {
            model,
            generation_config: None,
            system_instruction: None,
            input_audio_transcription: None,
            output_audio_transcription: None,
        }
    }

    pub fn with_response_modalities(mut self, modalities: Vec<Modality>) -> Self {
        self.generation_config
            .get_or_insert_with(GenerationConfig::default)
            .response_modalities = modalities;
        self
    }

    pub fn with_voice(mut self, voice_name: &str) -> Self {
        self.generation_config
            .get_or_insert_with(GenerationConfig::default)
            .speech_config = Some(SpeechConfig {
            voice_config: VoiceConfig {
                prebuilt_voice_config: PrebuiltVoiceConfig {
                    voice_name: voice_name.to_string(),
                },
            },
        });
        self
    }

    pub fn with_instructions(mut self, instructions: &str) -> Self {
        self.system_instruction = Some(Content::instruction(instructions));
        self
    }

    pub fn with_input_audio_transcription(mut self) -> Self {
        self.input_audio_transcription = Some(AudioTranscriptionConfig::default());
        self
    }

    pub fn with_output_audio_transcription(mut self) -> Self {
        self.output_audio_transcription = Some(AudioTranscriptionConfig::default());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Streamed user input that does not close a turn.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<Blob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_stream_end: Option<bool>,
}

impl RealtimeInput {
    pub fn audio(blob: Blob) -> Self {
        Self {
            audio: Some(blob),
            ..Default::default()
        }
    }

    pub fn audio_stream_end() -> Self {
        Self {
            audio_stream_end: Some(true),
            ..Default::default()
        }
    }
}

/// Complete conversation turns appended to the session history.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContent {
    pub turns: Vec<Content>,
    pub turn_complete: bool,
}

impl ClientContent {
    pub fn user_text(text: &str) -> Self {
        Self {
            turns: vec![Content::user_text(text)],
            turn_complete: true,
        }
    }
}
