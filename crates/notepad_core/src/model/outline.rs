//! Hierarchical outline attached to a note.
//!
//! # Responsibility
//! - Define the persisted outline item shape (`id`, `content`, `children`).
//! - Provide an arena-backed editor that validates the tree on load and
//!   keeps it valid across edits.
//!
//! # Invariants
//! - Item ids are unique across the whole tree.
//! - Depth never exceeds [`MAX_OUTLINE_DEPTH`] (roots are depth 1).
//! - Sibling order is preserved exactly as stored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const MAX_OUTLINE_DEPTH: usize = 16;

/// Serialized outline node, stored as JSON on the note row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineItem {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub children: Vec<OutlineItem>,
}

impl OutlineItem {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            children: Vec::new(),
        }
    }
}

/// Outcome of a single-item outline edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEdit {
    /// Id generated for an added item; `None` for other edits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub outline: Vec<OutlineItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineError {
    DuplicateId(String),
    BlankId,
    TooDeep { id: String, depth: usize },
    ItemNotFound(String),
    IndexOutOfRange { index: usize, len: usize },
}

impl Display for OutlineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "duplicate outline item id `{id}`"),
            Self::BlankId => write!(f, "outline item id must not be blank"),
            Self::TooDeep { id, depth } => write!(
                f,
                "outline item `{id}` at depth {depth} exceeds max depth {MAX_OUTLINE_DEPTH}"
            ),
            Self::ItemNotFound(id) => write!(f, "outline item not found: {id}"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "outline index {index} out of range for {len} siblings")
            }
        }
    }
}

impl Error for OutlineError {}

#[derive(Debug, Clone)]
struct Slot {
    id: String,
    content: String,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Arena editor over an outline. Removed slots stay allocated but are
/// unreachable from `roots` and absent from `index`.
#[derive(Debug, Clone, Default)]
pub struct OutlineTree {
    slots: Vec<Slot>,
    roots: Vec<usize>,
    index: HashMap<String, usize>,
}

impl OutlineTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates a stored outline.
    pub fn from_items(items: &[OutlineItem]) -> Result<Self, OutlineError> {
        let mut tree = Self::new();
        let mut stack: Vec<(&OutlineItem, Option<usize>, usize)> =
            items.iter().rev().map(|item| (item, None, 1)).collect();

        while let Some((item, parent, depth)) = stack.pop() {
            if depth > MAX_OUTLINE_DEPTH {
                return Err(OutlineError::TooDeep {
                    id: item.id.clone(),
                    depth,
                });
            }
            let slot = tree.insert_slot(item.id.clone(), item.content.clone(), parent)?;
            for child in item.children.iter().rev() {
                stack.push((child, Some(slot), depth + 1));
            }
        }

        Ok(tree)
    }

    pub fn to_items(&self) -> Vec<OutlineItem> {
        self.roots.iter().map(|slot| self.build_item(*slot)).collect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn content(&self, id: &str) -> Option<&str> {
        self.index.get(id).map(|slot| self.slots[*slot].content.as_str())
    }

    pub fn parent_of(&self, id: &str) -> Option<&str> {
        let slot = self.index.get(id)?;
        self.slots[*slot]
            .parent
            .map(|parent| self.slots[parent].id.as_str())
    }

    /// Depth of an item, with roots at 1.
    pub fn depth_of(&self, id: &str) -> Option<usize> {
        let mut cursor = *self.index.get(id)?;
        let mut depth = 1;
        while let Some(parent) = self.slots[cursor].parent {
            depth += 1;
            cursor = parent;
        }
        Some(depth)
    }

    /// Appends a new item at the end of `parent`'s children, or at the
    /// root level when `parent` is `None`. Returns the generated id.
    pub fn add_item(
        &mut self,
        parent: Option<&str>,
        content: impl Into<String>,
    ) -> Result<String, OutlineError> {
        let parent_slot = match parent {
            Some(parent_id) => Some(self.slot_of(parent_id)?),
            None => None,
        };
        let id = Uuid::new_v4().to_string();
        if let Some(parent_id) = parent {
            let depth = self.depth_of(parent_id).unwrap_or(0) + 1;
            if depth > MAX_OUTLINE_DEPTH {
                return Err(OutlineError::TooDeep { id, depth });
            }
        }
        self.insert_slot(id.clone(), content.into(), parent_slot)?;
        Ok(id)
    }

    pub fn set_content(
        &mut self,
        id: &str,
        content: impl Into<String>,
    ) -> Result<(), OutlineError> {
        let slot = self.slot_of(id)?;
        self.slots[slot].content = content.into();
        Ok(())
    }

    /// Moves the sibling at `from` to `to` within one level.
    pub fn move_sibling(
        &mut self,
        parent: Option<&str>,
        from: usize,
        to: usize,
    ) -> Result<(), OutlineError> {
        let siblings = match parent {
            Some(parent_id) => {
                let slot = self.slot_of(parent_id)?;
                &mut self.slots[slot].children
            }
            None => &mut self.roots,
        };
        let len = siblings.len();
        if from >= len {
            return Err(OutlineError::IndexOutOfRange { index: from, len });
        }
        if to >= len {
            return Err(OutlineError::IndexOutOfRange { index: to, len });
        }
        let moved = siblings.remove(from);
        siblings.insert(to, moved);
        Ok(())
    }

    /// Removes an item and its whole subtree.
    pub fn remove_item(&mut self, id: &str) -> Result<(), OutlineError> {
        let slot = self.slot_of(id)?;
        match self.slots[slot].parent {
            Some(parent) => self.slots[parent].children.retain(|child| *child != slot),
            None => self.roots.retain(|root| *root != slot),
        }

        let mut pending = vec![slot];
        while let Some(current) = pending.pop() {
            self.index.remove(&self.slots[current].id);
            pending.extend(self.slots[current].children.iter().copied());
        }
        Ok(())
    }

    fn slot_of(&self, id: &str) -> Result<usize, OutlineError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| OutlineError::ItemNotFound(id.to_string()))
    }

    fn insert_slot(
        &mut self,
        id: String,
        content: String,
        parent: Option<usize>,
    ) -> Result<usize, OutlineError> {
        if id.trim().is_empty() {
            return Err(OutlineError::BlankId);
        }
        if self.index.contains_key(&id) {
            return Err(OutlineError::DuplicateId(id));
        }
        let slot = self.slots.len();
        self.index.insert(id.clone(), slot);
        self.slots.push(Slot {
            id,
            content,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.slots[parent].children.push(slot),
            None => self.roots.push(slot),
        }
        Ok(slot)
    }

    fn build_item(&self, slot: usize) -> OutlineItem {
        let node = &self.slots[slot];
        OutlineItem {
            id: node.id.clone(),
            content: node.content.clone(),
            children: node
                .children
                .iter()
                .map(|child| self.build_item(*child))
                .collect(),
        }
    }
}
