//! Clerk: turn one communication intent into platform-tailored message
//! drafts with structured send payloads, using a generative model bound to a
//! strict response schema.

pub mod app;
pub mod config;
pub mod error;
pub mod form;
pub mod gemini;
pub mod llm;
pub mod logging;
pub mod mock;
pub mod model;
pub mod render;
pub mod schema;

pub use error::{ClerkError, Result};
