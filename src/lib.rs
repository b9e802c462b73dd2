// src/lib.rs
// Public library surface for the `ainews` binary and integration tests.

pub mod ci;
pub mod cli;
pub mod config;
pub mod convert;
pub mod extract;
pub mod ingest;
pub mod notify;
pub mod publish;
pub mod render;
pub mod state;
pub mod translate;

pub use config::Settings;
pub use state::{FileMarker, MarkerStore, MemoryMarker};
