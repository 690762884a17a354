//! FluentBlocks · English sentence-builder backend
//!
//! Engine pieces (usable without the server):
//!   - `builder`: step sequencer + sentence assembler (preview and Spanish gloss)
//!   - `validator`: exact-match answer checking for word-ordering exercises
//!   - `tracker`: interaction / level counters and the feedback-prompt policy
//!   - `stats`: per-session interaction log
//!
//! Service pieces: `state`, `logic`, `protocol`, `routes`.

pub mod audio;
pub mod builder;
pub mod config;
pub mod domain;
pub mod error;
pub mod logic;
pub mod protocol;
pub mod routes;
pub mod seeds;
pub mod state;
pub mod stats;
pub mod store;
pub mod telemetry;
pub mod tracker;
pub mod validator;

pub use routes::build_router;
pub use state::AppState;
