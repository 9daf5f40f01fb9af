//! Error types for Storyweave operations.
//!
//! This module provides the main error type [`StoryweaveError`] which wraps
//! the error conditions of every layer: reading persisted content, structural
//! tree edits, editor interactions and exporting previews.

use std::io;

use thiserror::Error;

use storyweave_core::content::ContentError;

use crate::{editor::EditorError, export, tree::TreeError};

/// The main error type for Storyweave operations.
#[derive(Debug, Error)]
pub enum StoryweaveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(#[from] export::Error),
}
