//! XTTS request, settings, and metadata types.

use crate::{Error, ErrorContext, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8020;

/// Host and port of the XTTS API server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
}

impl ConnectionTarget {
    /// Surrounding whitespace in `host` is dropped so equal addresses compare equal.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            host: host.trim().to_string(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for ConnectionTarget {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Payload of one `/tts_to_audio/` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub language: String,
    pub speaker_wav: String,
}

/// Tuning parameters pushed to `/set_tts_settings` as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisSettings {
    pub temperature: f64,
    pub length_penalty: f64,
    pub repetition_penalty: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub speed: f64,
    pub enable_text_splitting: bool,
    pub stream_chunk_size: u32,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            temperature: 0.75,
            length_penalty: 1.0,
            repetition_penalty: 5.0,
            top_k: 50,
            top_p: 0.85,
            speed: 1.0,
            enable_text_splitting: true,
            stream_chunk_size: 100,
        }
    }
}

impl SynthesisSettings {
    /// Check every slider-backed value against the range the form exposes.
    pub fn validate(&self) -> Result<()> {
        check_range("temperature", self.temperature, 0.0, 1.0)?;
        check_range("length_penalty", self.length_penalty, 0.0, 2.0)?;
        check_range("repetition_penalty", self.repetition_penalty, 1.0, 10.0)?;
        check_range("top_k", f64::from(self.top_k), 0.0, 100.0)?;
        check_range("top_p", self.top_p, 0.0, 1.0)?;
        check_range("speed", self.speed, 0.5, 2.0)?;
        Ok(())
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        return Ok(());
    }
    Err(Error::validation_with_context(
        format!("{} is out of range", field),
        ErrorContext::new()
            .with_field_path(format!("settings.{}", field))
            .with_details(format!("expected {}..={}, got {}", min, max, value))
            .with_source("settings"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LanguageSpeakers {
    language: String,
    speakers: Vec<String>,
}

/// Language code to speaker list, in the order the server reported them.
///
/// Serializes as a JSON object `{"en": ["a", "b"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeakerDirectory {
    entries: Vec<LanguageSpeakers>,
}

impl SpeakerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the speakers for `language`.
    pub fn insert(&mut self, language: impl Into<String>, speakers: Vec<String>) {
        let language = language.into();
        match self.entries.iter_mut().find(|e| e.language == language) {
            Some(entry) => entry.speakers = speakers,
            None => self.entries.push(LanguageSpeakers { language, speakers }),
        }
    }

    pub fn languages(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.language.clone()).collect()
    }

    /// Speakers for `language`, empty when the language is unknown.
    pub fn speakers_for(&self, language: &str) -> &[String] {
        self.entries
            .iter()
            .find(|e| e.language == language)
            .map(|e| e.speakers.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reduce the server's per-language objects to their `speakers` arrays.
    ///
    /// Non-object input yields an empty directory. Languages without a
    /// `speakers` array map to an empty list.
    pub fn from_server_json(value: &serde_json::Value) -> Self {
        let mut directory = Self::new();
        let Some(languages) = value.as_object() else {
            return directory;
        };
        for (language, details) in languages {
            let speakers = details
                .get("speakers")
                .and_then(|s| s.as_array())
                .map(|list| {
                    list.iter()
                        .filter_map(|s| s.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            directory.insert(language.clone(), speakers);
        }
        directory
    }
}

impl Serialize for SpeakerDirectory {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.language, &entry.speakers)?;
        }
        map.end()
    }
}
