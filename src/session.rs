//! Conversion orchestration with per-session memory of what the server was last told.

use crate::output::{save_to_file, DEFAULT_OUTPUT_FILE};
use crate::transport::HttpTransport;
use crate::tts::{ConnectionTarget, SynthesisRequest, SynthesisSettings};
use crate::Result;
use bytes::Bytes;
use std::path::PathBuf;
use tracing::{debug, info};

/// Everything one conversion needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionJob {
    pub connection: ConnectionTarget,
    pub text: String,
    pub language: String,
    pub output_dir: PathBuf,
    pub speaker_wav: String,
    /// Model to switch to; `None` or empty leaves the server's model alone.
    pub model: Option<String>,
    pub settings: SynthesisSettings,
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub path: PathBuf,
    pub audio: Bytes,
}

/// Model and settings most recently accepted by the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastApplied {
    pub model: Option<String>,
    pub settings: Option<SynthesisSettings>,
}

/// A connection to one XTTS server plus the state needed to skip redundant calls.
pub struct Session {
    transport: HttpTransport,
    last_applied: LastApplied,
}

impl Session {
    pub fn new(target: ConnectionTarget) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(target)?,
            last_applied: LastApplied::default(),
        })
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    pub fn last_applied(&self) -> &LastApplied {
        &self.last_applied
    }

    /// Point the session at `target`, forgetting last-applied state if it changed.
    pub fn bind(&mut self, target: &ConnectionTarget) -> Result<()> {
        if self.transport.target() != target {
            info!(from = %self.transport.target(), to = %target, "rebinding session");
            self.transport = HttpTransport::new(target.clone())?;
            self.last_applied = LastApplied::default();
        }
        Ok(())
    }

    /// Switch model and push settings only when they changed, then synthesize and save.
    ///
    /// A failure aborts the remaining steps. Steps that already succeeded stay recorded.
    pub async fn convert(&mut self, job: &ConversionJob) -> Result<Conversion> {
        self.bind(&job.connection)?;

        if let Some(model) = job.model.as_deref().filter(|m| !m.is_empty()) {
            if self.last_applied.model.as_deref() != Some(model) {
                self.transport.switch_model(model).await?;
                self.last_applied.model = Some(model.to_string());
            } else {
                debug!(model, "model unchanged, skipping switch");
            }
        }

        if self.last_applied.settings.as_ref() != Some(&job.settings) {
            self.transport.apply_settings(&job.settings).await?;
            self.last_applied.settings = Some(job.settings.clone());
        } else {
            debug!("settings unchanged, skipping update");
        }

        let request = SynthesisRequest {
            text: job.text.clone(),
            language: job.language.clone(),
            speaker_wav: job.speaker_wav.clone(),
        };
        let audio = self.transport.synthesize(&request).await?;
        let path = save_to_file(&audio, &job.output_dir, DEFAULT_OUTPUT_FILE).await?;
        Ok(Conversion { path, audio })
    }
}
