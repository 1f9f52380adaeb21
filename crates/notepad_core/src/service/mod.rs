//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the HTTP layer decoupled from storage details.

pub mod board_service;
pub mod meeting_service;
pub mod mind_map_service;
pub mod note_service;
pub mod prompt_service;
pub mod tag_service;
