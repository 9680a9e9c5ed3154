//! XTTS domain types: connection target, synthesis payloads, and server metadata.

mod types;

pub use types::{
    ConnectionTarget, SpeakerDirectory, SynthesisRequest, SynthesisSettings,
    DEFAULT_HOST, DEFAULT_PORT,
};
