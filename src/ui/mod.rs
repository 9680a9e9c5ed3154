//! Interactive front end: a pure form state machine and the local web server that drives it.

mod server;
pub mod state;

pub use server::{router, serve, UiContext, SESSION_IDLE_TTL};
pub use state::{
    on_conversion_finished, on_language_change, on_load, on_metadata_loaded, on_submit, Effect,
    Metadata, Phase, SubmitForm, Transition, UiState,
};

/// Default local bind address of the UI server.
pub const DEFAULT_UI_ADDR: &str = "127.0.0.1:7860";
