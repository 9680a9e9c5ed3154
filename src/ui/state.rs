//! Toolkit-independent state machine behind the interactive form.
//!
//! Every handler is pure: it takes the current state and an event payload and
//! returns the next state together with the side effects the driver must run.
//! Completed effects are fed back through `on_metadata_loaded` and
//! `on_conversion_finished`.

use crate::session::ConversionJob;
use crate::tts::{ConnectionTarget, SpeakerDirectory, SynthesisSettings};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing fetched yet; selection and submit controls are disabled.
    #[default]
    Unloaded,
    Loaded,
    Submitting,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UiState {
    pub phase: Phase,
    pub models: Vec<String>,
    pub speakers: SpeakerDirectory,
    pub languages: Vec<String>,
    pub selected_language: Option<String>,
    pub speaker_choices: Vec<String>,
    pub selected_speaker: Option<String>,
    pub last_output: Option<PathBuf>,
    pub error: Option<String>,
}

impl UiState {
    pub fn controls_enabled(&self) -> bool {
        self.phase != Phase::Unloaded
    }

    fn with_error(&self, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..self.clone()
        }
    }
}

/// Work the driver performs on behalf of a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchMetadata(ConnectionTarget),
    Convert(ConversionJob),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: UiState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(state: UiState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

/// Server metadata fetched by `Effect::FetchMetadata`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub models: Vec<String>,
    pub speakers: SpeakerDirectory,
}

/// Field values read from the form on submit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmitForm {
    pub host: String,
    pub port: u16,
    pub text: String,
    pub language: String,
    pub speaker: String,
    #[serde(default)]
    pub model: Option<String>,
    pub file_path: String,
    #[serde(flatten)]
    pub settings: SynthesisSettings,
}

impl SubmitForm {
    fn into_job(self) -> Result<ConversionJob> {
        if self.text.trim().is_empty() {
            return Err(Error::validation_with_context(
                "text to convert is empty",
                ErrorContext::new().with_field_path("text").with_source("ui"),
            ));
        }
        if self.speaker.trim().is_empty() {
            return Err(Error::validation_with_context(
                "no speaker selected",
                ErrorContext::new().with_field_path("speaker").with_source("ui"),
            ));
        }
        self.settings.validate()?;
        Ok(ConversionJob {
            connection: ConnectionTarget::new(self.host, self.port),
            text: self.text,
            language: self.language,
            output_dir: PathBuf::from(self.file_path),
            speaker_wav: self.speaker,
            model: self.model.filter(|m| !m.is_empty()),
            settings: self.settings,
        })
    }
}

pub fn on_load(state: &UiState, connection: ConnectionTarget) -> Transition {
    if state.phase == Phase::Submitting {
        return Transition::stay(state.with_error("a conversion is in progress"));
    }
    Transition {
        state: UiState {
            error: None,
            ..state.clone()
        },
        effects: vec![Effect::FetchMetadata(connection)],
    }
}

/// Populate the dependent selections from freshly fetched metadata.
///
/// A failed fetch keeps the previous selections and phase.
pub fn on_metadata_loaded(
    state: &UiState,
    outcome: std::result::Result<Metadata, String>,
) -> Transition {
    let metadata = match outcome {
        Ok(metadata) => metadata,
        Err(message) => return Transition::stay(state.with_error(message)),
    };
    let languages = metadata.speakers.languages();
    let selected_language = languages.first().cloned();
    let speaker_choices = selected_language
        .as_deref()
        .map(|lang| metadata.speakers.speakers_for(lang).to_vec())
        .unwrap_or_default();
    Transition::stay(UiState {
        phase: Phase::Loaded,
        models: metadata.models,
        speakers: metadata.speakers,
        languages,
        selected_language,
        speaker_choices,
        selected_speaker: None,
        last_output: state.last_output.clone(),
        error: None,
    })
}

/// Re-derive speaker choices from the directory already held in `state`.
pub fn on_language_change(state: &UiState, language: &str) -> Transition {
    if state.phase == Phase::Unloaded {
        return Transition::stay(state.clone());
    }
    Transition::stay(UiState {
        selected_language: Some(language.to_string()),
        speaker_choices: state.speakers.speakers_for(language).to_vec(),
        selected_speaker: None,
        error: None,
        ..state.clone()
    })
}

pub fn on_submit(state: &UiState, form: SubmitForm) -> Transition {
    match state.phase {
        Phase::Unloaded => {
            return Transition::stay(state.with_error("load models and speakers first"))
        }
        Phase::Submitting => {
            return Transition::stay(state.with_error("a conversion is in progress"))
        }
        Phase::Loaded => {}
    }
    let selected_language = Some(form.language.clone());
    let selected_speaker = Some(form.speaker.clone());
    match form.into_job() {
        Ok(job) => Transition {
            state: UiState {
                phase: Phase::Submitting,
                selected_language,
                selected_speaker,
                error: None,
                ..state.clone()
            },
            effects: vec![Effect::Convert(job)],
        },
        Err(e) => Transition::stay(state.with_error(e.to_string())),
    }
}

pub fn on_conversion_finished(
    state: &UiState,
    outcome: std::result::Result<PathBuf, String>,
) -> Transition {
    let (last_output, error) = match outcome {
        Ok(path) => (Some(path), None),
        Err(message) => (state.last_output.clone(), Some(message)),
    };
    Transition::stay(UiState {
        phase: Phase::Loaded,
        last_output,
        error,
        ..state.clone()
    })
}
