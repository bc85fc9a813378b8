//! Analytics API: request/response mapping over JSON payloads.
//!
//! Transport-agnostic; a server (or the bundled CLI) mounts [`app::call`].

pub mod app;
