//! xtts-client: send text to an XTTS API server and save the audio.
//!
//! Usage:
//!   xtts-client --text "Hello" --speaker_wav female [--language en] [--file_path out]
//!   xtts-client                     Launch the browser UI
//!   xtts-client --ui [--ui-addr <addr>]

use anyhow::Context;
use clap::builder::BoolishValueParser;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use xtts_client::tts::{DEFAULT_HOST, DEFAULT_PORT};
use xtts_client::ui::DEFAULT_UI_ADDR;
use xtts_client::{ConnectionTarget, ConversionJob, Session, SynthesisSettings};

#[derive(Parser, Debug)]
#[command(name = "xtts-client", version)]
#[command(about = "Text-to-Speech conversion through an XTTS API server")]
struct Args {
    /// IP address of the server
    #[arg(long, default_value = DEFAULT_HOST)]
    ip: String,

    /// Port of the server
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Text to convert to speech
    #[arg(long, required_unless_present = "ui")]
    text: Option<String>,

    /// Language code of the text (e.g. "en" for English)
    #[arg(long, default_value = "en")]
    language: String,

    /// Directory where output.wav will be saved
    #[arg(long = "file_path", default_value = ".")]
    file_path: PathBuf,

    /// Model to switch to; no switch is attempted when omitted
    #[arg(long)]
    model: Option<String>,

    /// Identifier of the speaker WAV file on the server
    #[arg(long = "speaker_wav", required_unless_present = "ui")]
    speaker_wav: Option<String>,

    #[arg(long, default_value_t = 0.75)]
    temperature: f64,

    #[arg(long = "length_penalty", default_value_t = 1.0)]
    length_penalty: f64,

    #[arg(long = "repetition_penalty", default_value_t = 5.0)]
    repetition_penalty: f64,

    #[arg(long = "top_k", default_value_t = 50)]
    top_k: u32,

    #[arg(long = "top_p", default_value_t = 0.85)]
    top_p: f64,

    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Let the server split long text into sentences
    #[arg(
        long = "enable_text_splitting",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    enable_text_splitting: bool,

    #[arg(long = "stream_chunk_size", default_value_t = 100)]
    stream_chunk_size: u32,

    /// Launch the browser UI instead of converting once
    #[arg(long)]
    ui: bool,

    /// Local address the UI server binds to
    #[arg(long = "ui-addr", env = "XTTS_UI_ADDR", default_value = DEFAULT_UI_ADDR)]
    ui_addr: SocketAddr,
}

impl Args {
    fn settings(&self) -> SynthesisSettings {
        SynthesisSettings {
            temperature: self.temperature,
            length_penalty: self.length_penalty,
            repetition_penalty: self.repetition_penalty,
            top_k: self.top_k,
            top_p: self.top_p,
            speed: self.speed,
            enable_text_splitting: self.enable_text_splitting,
            stream_chunk_size: self.stream_chunk_size,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // No arguments at all means the interactive front end.
    let args = if std::env::args_os().len() <= 1 {
        Args::parse_from(["xtts-client", "--ui"])
    } else {
        Args::parse()
    };
    if args.ui {
        return launch_ui(args.ui_addr).await;
    }

    let settings = args.settings();
    let connection = ConnectionTarget::new(args.ip, args.port);
    let job = ConversionJob {
        connection: connection.clone(),
        text: args.text.context("--text is required")?,
        language: args.language,
        output_dir: args.file_path,
        speaker_wav: args.speaker_wav.context("--speaker_wav is required")?,
        model: args.model,
        settings,
    };

    let mut session = Session::new(connection)?;
    let conversion = session
        .convert(&job)
        .await
        .with_context(|| format!("conversion via {} failed", job.connection))?;
    println!("Audio file saved to: {}", conversion.path.display());
    Ok(())
}

async fn launch_ui(addr: SocketAddr) -> anyhow::Result<()> {
    let open_browser = std::env::var("XTTS_NO_BROWSER").map_or(true, |v| v != "1");
    xtts_client::ui::serve(addr, open_browser).await?;
    Ok(())
}
