//! Mind-map use-case service.
//!
//! # Responsibility
//! - Add, move, reparent and delete canvas nodes.
//!
//! # Invariants
//! - Reparenting never makes a node its own ancestor.
//! - Generated positions fall inside `0..CANVAS_EXTENT` on both axes.
//! - Coordinates are always finite.

use crate::model::mind_map::{MindMapNode, MindMapNodeId, CANVAS_EXTENT};
use crate::repo::mind_map_repo::MindMapRepository;
use crate::repo::RepoError;
use log::info;
use rand::Rng;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[derive(Debug)]
pub enum MindMapServiceError {
    InvalidContent,
    InvalidPosition { x: f64, y: f64 },
    NodeNotFound(MindMapNodeId),
    ParentNotFound(MindMapNodeId),
    CycleDetected {
        node_id: MindMapNodeId,
        parent_id: MindMapNodeId,
    },
    Repo(RepoError),
}

impl Display for MindMapServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidContent => write!(f, "node content must not be blank"),
            Self::InvalidPosition { x, y } => write!(f, "invalid node position ({x}, {y})"),
            Self::NodeNotFound(id) => write!(f, "mind map node not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent node not found: {id}"),
            Self::CycleDetected { node_id, parent_id } => write!(
                f,
                "cannot attach node {node_id} under {parent_id}: would create a cycle"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MindMapServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for MindMapServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "mind map node",
                id,
            } => match id.parse() {
                Ok(node_id) => Self::NodeNotFound(node_id),
                Err(_) => Self::Repo(RepoError::NotFound {
                    entity: "mind map node",
                    id,
                }),
            },
            other => Self::Repo(other),
        }
    }
}

pub struct MindMapService<R: MindMapRepository> {
    repo: R,
}

impl<R: MindMapRepository> MindMapService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_nodes(&self) -> Result<Vec<MindMapNode>, MindMapServiceError> {
        Ok(self.repo.list_nodes()?)
    }

    /// Adds a node; without `position` it lands at a random canvas spot.
    pub fn add_node(
        &self,
        content: &str,
        position: Option<(f64, f64)>,
        parent_id: Option<MindMapNodeId>,
    ) -> Result<MindMapNode, MindMapServiceError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(MindMapServiceError::InvalidContent);
        }
        if let Some(parent_id) = parent_id {
            self.repo
                .get_node(parent_id)?
                .ok_or(MindMapServiceError::ParentNotFound(parent_id))?;
        }
        let (x, y) = match position {
            Some((x, y)) => validate_position(x, y)?,
            None => random_position(),
        };

        let node = MindMapNode {
            id: Uuid::new_v4(),
            content: content.to_string(),
            x,
            y,
            parent_id,
        };
        self.repo.insert_node(&node)?;
        info!(
            "event=mind_map_add module=service status=ok node_id={} has_parent={}",
            node.id,
            node.parent_id.is_some()
        );
        Ok(node)
    }

    pub fn move_node(
        &self,
        node_id: MindMapNodeId,
        x: f64,
        y: f64,
    ) -> Result<MindMapNode, MindMapServiceError> {
        let (x, y) = validate_position(x, y)?;
        self.repo.set_position(node_id, x, y)?;
        self.get_node(node_id)
    }

    /// Moves a node under `parent_id`, or to the top level with `None`.
    pub fn reparent(
        &self,
        node_id: MindMapNodeId,
        parent_id: Option<MindMapNodeId>,
    ) -> Result<MindMapNode, MindMapServiceError> {
        self.get_node(node_id)?;
        if let Some(parent_id) = parent_id {
            if self.would_create_cycle(node_id, parent_id)? {
                return Err(MindMapServiceError::CycleDetected { node_id, parent_id });
            }
        }
        self.repo.set_parent(node_id, parent_id)?;
        info!(
            "event=mind_map_reparent module=service status=ok node_id={node_id} has_parent={}",
            parent_id.is_some()
        );
        self.get_node(node_id)
    }

    /// Deletes one node; its children become top-level nodes.
    pub fn delete_node(&self, node_id: MindMapNodeId) -> Result<(), MindMapServiceError> {
        self.repo.delete_node(node_id)?;
        info!("event=mind_map_delete module=service status=ok node_id={node_id}");
        Ok(())
    }

    fn get_node(&self, node_id: MindMapNodeId) -> Result<MindMapNode, MindMapServiceError> {
        self.repo
            .get_node(node_id)?
            .ok_or(MindMapServiceError::NodeNotFound(node_id))
    }

    fn would_create_cycle(
        &self,
        node_id: MindMapNodeId,
        candidate_parent: MindMapNodeId,
    ) -> Result<bool, MindMapServiceError> {
        let mut visited = HashSet::new();
        let mut cursor = Some(candidate_parent);
        while let Some(current) = cursor {
            if current == node_id || !visited.insert(current) {
                return Ok(true);
            }
            let node = self
                .repo
                .get_node(current)?
                .ok_or(MindMapServiceError::ParentNotFound(current))?;
            cursor = node.parent_id;
        }
        Ok(false)
    }
}

fn validate_position(x: f64, y: f64) -> Result<(f64, f64), MindMapServiceError> {
    if !x.is_finite() || !y.is_finite() {
        return Err(MindMapServiceError::InvalidPosition { x, y });
    }
    Ok((x, y))
}

fn random_position() -> (f64, f64) {
    let mut rng = rand::rng();
    (
        rng.random_range(0.0..CANVAS_EXTENT),
        rng.random_range(0.0..CANVAS_EXTENT),
    )
}
