//! Mind-map nodes placed on a free canvas.
//!
//! # Invariants
//! - `parent_id` edges form a forest; a node is never its own ancestor.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MindMapNodeId = Uuid;

/// Upper bound (exclusive) for generated canvas coordinates.
pub const CANVAS_EXTENT: f64 = 500.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub id: MindMapNodeId,
    pub content: String,
    pub x: f64,
    pub y: f64,
    pub parent_id: Option<MindMapNodeId>,
}
