//! HTTP access to the XTTS API server.

mod http;

pub use http::{
    HttpTransport, TransportError, MODELS_LIST_PATH, SET_TTS_SETTINGS_PATH, SPEAKERS_LIST_PATH,
    SWITCH_MODEL_PATH, TTS_TO_AUDIO_PATH,
};
