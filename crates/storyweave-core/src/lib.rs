//! Storyweave Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Storyweave tree
//! model, layout engine and exporters. It includes:
//!
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Content**: The branching scenario node model and its persisted JSON
//!   form ([`content`] module)

pub mod color;
pub mod content;
pub mod geometry;
