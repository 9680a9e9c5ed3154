//! # xtts-client
//!
//! Client for an XTTS text-to-speech API server.
//!
//! The crate sends text plus voice-synthesis parameters to the server, receives
//! the synthesized audio, and writes it to `<dir>/output.wav`. It offers a
//! command-line entry point and a local browser form.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xtts_client::{ConnectionTarget, ConversionJob, Session, SynthesisSettings};
//!
//! #[tokio::main]
//! async fn main() -> xtts_client::Result<()> {
//!     let target = ConnectionTarget::default();
//!     let mut session = Session::new(target.clone())?;
//!
//!     let conversion = session
//!         .convert(&ConversionJob {
//!             connection: target,
//!             text: "Hello world".into(),
//!             language: "en".into(),
//!             output_dir: "out".into(),
//!             speaker_wav: "female".into(),
//!             model: None,
//!             settings: SynthesisSettings::default(),
//!         })
//!         .await?;
//!     println!("saved to {}", conversion.path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`transport`] | One function per server endpoint |
//! | [`session`] | Conversion orchestration and last-applied model/settings |
//! | [`output`] | Writing audio to disk |
//! | [`tts`] | Connection, request, settings, and speaker types |
//! | [`ui`] | Form state machine and local web server |

pub mod output;
pub mod session;
pub mod transport;
pub mod tts;
pub mod ui;

pub use output::{save_to_file, DEFAULT_OUTPUT_FILE};
pub use session::{Conversion, ConversionJob, LastApplied, Session};
pub use transport::HttpTransport;
pub use tts::{ConnectionTarget, SpeakerDirectory, SynthesisRequest, SynthesisSettings};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
