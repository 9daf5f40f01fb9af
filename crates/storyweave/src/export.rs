//! Export of scenario layouts.

pub mod svg;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
