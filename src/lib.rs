#![forbid(unsafe_code)]

pub mod app;
pub mod captions;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod huggingface;
pub mod logging;
pub mod pipeline;
pub mod retry;
pub mod summarize;
pub mod text;
pub mod youtube;

pub use error::{Error, Result};
