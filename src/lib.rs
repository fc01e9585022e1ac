//! HTTP service around so-vits-svc-fork: trains voice models from uploaded
//! recordings, converts audio with them and narrates text through TTS.

pub mod config;
pub mod errors;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;
