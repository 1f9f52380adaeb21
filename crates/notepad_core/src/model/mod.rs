//! Domain model for notes and the productivity widgets around them.
//!
//! # Responsibility
//! - Define the row shapes persisted by repositories.
//! - Hold pure, storage-free logic: draft validation, outline arena,
//!   kanban move planning, tag list editing.
//!
//! # Invariants
//! - Every persisted entity is identified by a stable UUID (tags use an
//!   integer key because they are a plain dictionary).
//! - Timestamps are epoch milliseconds.

pub mod ai_prompt;
pub mod board;
pub mod meeting;
pub mod mind_map;
pub mod note;
pub mod outline;
pub mod tag;
