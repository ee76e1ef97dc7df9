//! HTTP front-end for flowchart generation.
//!
//! Exposes `POST /api/generate-flow`, which turns a free-text process
//! description into a flowchart document, and `GET /api/health`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod router;
pub mod state;
