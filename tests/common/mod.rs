//! Mock XTTS server setup for integration tests

#![allow(dead_code)]

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use xtts_client::transport::{
    MODELS_LIST_PATH, SET_TTS_SETTINGS_PATH, SPEAKERS_LIST_PATH, SWITCH_MODEL_PATH,
    TTS_TO_AUDIO_PATH,
};
use xtts_client::{ConnectionTarget, SynthesisSettings};

pub const AUDIO: &[u8] = b"RIFF\x24\x00\x00\x00WAVEfmt fixed-test-audio";

/// Connection target pointing at a mockito server.
pub fn target(server: &ServerGuard) -> ConnectionTarget {
    let host_with_port = server.host_with_port();
    let (host, port) = host_with_port
        .rsplit_once(':')
        .expect("mock server address has a port");
    ConnectionTarget::new(host, port.parse().expect("numeric port"))
}

pub async fn mock_switch(server: &mut ServerGuard, model: &str, hits: usize) -> Mock {
    server
        .mock("POST", SWITCH_MODEL_PATH)
        .match_body(Matcher::Json(json!({ "model_name": model })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"message":"Model switched to {}"}}"#, model))
        .expect(hits)
        .create_async()
        .await
}

pub async fn mock_settings(
    server: &mut ServerGuard,
    settings: &SynthesisSettings,
    hits: usize,
) -> Mock {
    server
        .mock("POST", SET_TTS_SETTINGS_PATH)
        .match_body(Matcher::Json(serde_json::to_value(settings).unwrap()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Settings successfully applied"}"#)
        .expect(hits)
        .create_async()
        .await
}

pub async fn mock_tts(server: &mut ServerGuard, hits: usize) -> Mock {
    server
        .mock("POST", TTS_TO_AUDIO_PATH)
        .with_status(200)
        .with_header("content-type", "audio/wav")
        .with_body(AUDIO)
        .expect(hits)
        .create_async()
        .await
}

pub async fn mock_models(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", MODELS_LIST_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"["v2.0.2","v2.0.3"]"#)
        .create_async()
        .await
}

pub async fn mock_speakers(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", SPEAKERS_LIST_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "en": {"speakers": ["female", "male"], "path": "speakers/en"},
                "ru": {"speakers": ["anna"], "path": "speakers/ru"}
            })
            .to_string(),
        )
        .create_async()
        .await
}
