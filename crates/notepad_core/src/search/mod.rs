//! Note search entry points.
//!
//! # Responsibility
//! - Expose substring search over note title and content.
//! - Keep result shaping inside core.

pub mod notes;
