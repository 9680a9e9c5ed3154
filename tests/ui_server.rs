//! Drives the local web front end over HTTP, backed by a mock XTTS server.

mod common;

use common::{mock_models, mock_settings, mock_speakers, mock_tts, target, AUDIO};
use mockito::{Server, ServerGuard};
use serde_json::{json, Value};
use xtts_client::ui::{router, UiContext};
use xtts_client::SynthesisSettings;

/// Serve the UI on an ephemeral port and return its base URL.
async fn spawn_ui() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(UiContext::default()))
            .await
            .unwrap();
    });
    format!("http://{}", addr)
}

async fn open_session(client: &reqwest::Client, ui: &str) -> String {
    let page = client
        .get(format!("{}/", ui))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let marker = "const SESSION = \"";
    let start = page.find(marker).expect("page embeds a session id") + marker.len();
    let end = start + page[start..].find('"').unwrap();
    page[start..end].to_string()
}

async fn post(client: &reqwest::Client, url: String, body: Value) -> reqwest::Response {
    client.post(url).json(&body).send().await.unwrap()
}

fn connection(server: &ServerGuard) -> (String, u16) {
    let target = target(server);
    (target.host, target.port)
}

#[tokio::test]
async fn test_load_change_language_and_convert() {
    let mut xtts = Server::new_async().await;
    mock_models(&mut xtts).await;
    mock_speakers(&mut xtts).await;
    mock_settings(&mut xtts, &SynthesisSettings::default(), 1).await;
    let tts = mock_tts(&mut xtts, 1).await;
    let (host, port) = connection(&xtts);
    let tmp = tempfile::tempdir().unwrap();

    let ui = spawn_ui().await;
    let client = reqwest::Client::new();
    let id = open_session(&client, &ui).await;
    let api = format!("{}/api/sessions/{}", ui, id);

    let view: Value = post(&client, format!("{}/load", api), json!({"host": host, "port": port}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["phase"], "loaded");
    assert_eq!(view["models"], json!(["v2.0.2", "v2.0.3"]));
    assert_eq!(view["languages"], json!(["en", "ru"]));
    assert_eq!(view["selected_language"], "en");
    assert_eq!(view["speaker_choices"], json!(["female", "male"]));

    let view: Value = post(&client, format!("{}/language", api), json!({"language": "ru"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["speaker_choices"], json!(["anna"]));

    let view: Value = post(
        &client,
        format!("{}/convert", api),
        json!({
            "host": host,
            "port": port,
            "text": "Privet",
            "language": "ru",
            "speaker": "anna",
            "model": null,
            "file_path": tmp.path(),
            "temperature": 0.75,
            "length_penalty": 1.0,
            "repetition_penalty": 5.0,
            "top_k": 50,
            "top_p": 0.85,
            "speed": 1.0,
            "enable_text_splitting": true,
            "stream_chunk_size": 100
        }),
    )
    .await
    .json()
    .await
    .unwrap();
    assert_eq!(view["phase"], "loaded");
    assert_eq!(view["error"], Value::Null);
    let saved = tmp.path().join("output.wav");
    assert_eq!(view["last_output"], json!(saved));
    assert_eq!(std::fs::read(&saved).unwrap(), AUDIO);
    tts.assert_async().await;

    let audio = client
        .get(format!("{}/audio", api))
        .send()
        .await
        .unwrap();
    assert_eq!(audio.status(), reqwest::StatusCode::OK);
    assert_eq!(audio.headers()["content-type"], "audio/wav");
    assert_eq!(audio.bytes().await.unwrap().as_ref(), AUDIO);
}

#[tokio::test]
async fn test_convert_before_load_reports_error() {
    let ui = spawn_ui().await;
    let client = reqwest::Client::new();
    let id = open_session(&client, &ui).await;

    let view: Value = post(
        &client,
        format!("{}/api/sessions/{}/convert", ui, id),
        json!({
            "host": "127.0.0.1",
            "port": 8020,
            "text": "Hello",
            "language": "en",
            "speaker": "female",
            "file_path": "."
        }),
    )
    .await
    .json()
    .await
    .unwrap();

    assert_eq!(view["phase"], "unloaded");
    assert!(view["error"].as_str().unwrap().contains("load"));

    let audio = client
        .get(format!("{}/api/sessions/{}/audio", ui, id))
        .send()
        .await
        .unwrap();
    assert_eq!(audio.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let ui = spawn_ui().await;
    let client = reqwest::Client::new();

    for id in ["not-a-uuid", "6f1c2d4e-8a9b-4c3d-9e8f-0a1b2c3d4e5f"] {
        let resp = post(
            &client,
            format!("{}/api/sessions/{}/language", ui, id),
            json!({"language": "en"}),
        )
        .await;
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_sessions_do_not_share_state() {
    let mut xtts = Server::new_async().await;
    mock_models(&mut xtts).await;
    mock_speakers(&mut xtts).await;
    let (host, port) = connection(&xtts);

    let ui = spawn_ui().await;
    let client = reqwest::Client::new();
    let first = open_session(&client, &ui).await;
    let second = open_session(&client, &ui).await;
    assert_ne!(first, second);

    post(
        &client,
        format!("{}/api/sessions/{}/load", ui, first),
        json!({"host": host, "port": port}),
    )
    .await;
    let view: Value = post(
        &client,
        format!("{}/api/sessions/{}/language", ui, second),
        json!({"language": "en"}),
    )
    .await
    .json()
    .await
    .unwrap();

    assert_eq!(view["phase"], "unloaded");
    assert_eq!(view["speaker_choices"], json!([]));
}

/// A server that accepts connections and never answers.
async fn silent_server() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    port
}

fn convert_body(host: &str, port: u16, file_path: &std::path::Path) -> Value {
    json!({
        "host": host,
        "port": port,
        "text": "Hello",
        "language": "en",
        "speaker": "female",
        "file_path": file_path
    })
}

#[tokio::test]
async fn test_abandoned_convert_does_not_block_the_session() {
    let mut xtts = Server::new_async().await;
    mock_models(&mut xtts).await;
    mock_speakers(&mut xtts).await;
    mock_settings(&mut xtts, &SynthesisSettings::default(), 1).await;
    let tts = mock_tts(&mut xtts, 1).await;
    let (host, port) = connection(&xtts);
    let silent_port = silent_server().await;
    let tmp = tempfile::tempdir().unwrap();

    let ui = spawn_ui().await;
    let client = reqwest::Client::new();
    let id = open_session(&client, &ui).await;
    let api = format!("{}/api/sessions/{}", ui, id);
    post(&client, format!("{}/load", api), json!({"host": host, "port": port})).await;

    let impatient = reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(500))
        .build()
        .unwrap();
    let abandoned = impatient
        .post(format!("{}/convert", api))
        .json(&convert_body("127.0.0.1", silent_port, tmp.path()))
        .send()
        .await;
    assert!(abandoned.unwrap_err().is_timeout());

    let view: Value = post(
        &reqwest::Client::new(),
        format!("{}/convert", api),
        convert_body(&host, port, tmp.path()),
    )
    .await
    .json()
    .await
    .unwrap();

    assert_eq!(view["phase"], "loaded");
    assert_eq!(view["error"], Value::Null);
    assert_eq!(std::fs::read(tmp.path().join("output.wav")).unwrap(), AUDIO);
    tts.assert_async().await;
}

#[tokio::test]
async fn test_rejected_form_leaves_convert_usable() {
    let mut xtts = Server::new_async().await;
    mock_models(&mut xtts).await;
    mock_speakers(&mut xtts).await;
    let (host, port) = connection(&xtts);

    let ui = spawn_ui().await;
    let client = reqwest::Client::new();
    let page = client
        .get(format!("{}/", ui))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    // The page re-enables Convert when a request is refused.
    assert!(page.contains(r#"if (!view) {
    $("convert").disabled = false;"#));

    let id = open_session(&client, &ui).await;
    let api = format!("{}/api/sessions/{}", ui, id);
    post(&client, format!("{}/load", api), json!({"host": host, "port": port})).await;

    let mut body = convert_body(&host, port, std::path::Path::new("."));
    body["stream_chunk_size"] = json!(12.5);
    let rejected = post(&client, format!("{}/convert", api), body).await;
    assert!(rejected.status().is_client_error());

    let view: Value = post(&client, format!("{}/language", api), json!({"language": "en"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(view["phase"], "loaded");
}
