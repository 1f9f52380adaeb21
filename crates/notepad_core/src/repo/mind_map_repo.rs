//! Mind-map node persistence.
//!
//! # Invariants
//! - Deleting a node detaches its children (`ON DELETE SET NULL`).

use crate::db::ensure_tables;
use crate::model::mind_map::{MindMapNode, MindMapNodeId};
use crate::repo::{parse_optional_uuid, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

pub trait MindMapRepository {
    fn insert_node(&self, node: &MindMapNode) -> RepoResult<()>;
    fn get_node(&self, id: MindMapNodeId) -> RepoResult<Option<MindMapNode>>;
    /// Insertion order.
    fn list_nodes(&self) -> RepoResult<Vec<MindMapNode>>;
    fn set_position(&self, id: MindMapNodeId, x: f64, y: f64) -> RepoResult<()>;
    fn set_parent(&self, id: MindMapNodeId, parent_id: Option<MindMapNodeId>) -> RepoResult<()>;
    fn delete_node(&self, id: MindMapNodeId) -> RepoResult<()>;
}

pub struct SqliteMindMapRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMindMapRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["mind_map_nodes"])?;
        Ok(Self { conn })
    }
}

impl MindMapRepository for SqliteMindMapRepository<'_> {
    fn insert_node(&self, node: &MindMapNode) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO mind_map_nodes (id, content, x, y, parent_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                node.id.to_string(),
                node.content,
                node.x,
                node.y,
                node.parent_id.map(|id| id.to_string()),
            ],
        )?;
        Ok(())
    }

    fn get_node(&self, id: MindMapNodeId) -> RepoResult<Option<MindMapNode>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, content, x, y, parent_id FROM mind_map_nodes WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(node_from_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_nodes(&self) -> RepoResult<Vec<MindMapNode>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, content, x, y, parent_id FROM mind_map_nodes ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut nodes = Vec::new();
        while let Some(row) = rows.next()? {
            nodes.push(node_from_row(row)?);
        }
        Ok(nodes)
    }

    fn set_position(&self, id: MindMapNodeId, x: f64, y: f64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE mind_map_nodes SET x = ?2, y = ?3 WHERE id = ?1;",
            params![id.to_string(), x, y],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("mind map node", id));
        }
        Ok(())
    }

    fn set_parent(&self, id: MindMapNodeId, parent_id: Option<MindMapNodeId>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE mind_map_nodes SET parent_id = ?2 WHERE id = ?1;",
            params![id.to_string(), parent_id.map(|parent| parent.to_string())],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("mind map node", id));
        }
        Ok(())
    }

    fn delete_node(&self, id: MindMapNodeId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM mind_map_nodes WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found("mind map node", id));
        }
        Ok(())
    }
}

fn node_from_row(row: &Row<'_>) -> RepoResult<MindMapNode> {
    let id: String = row.get("id")?;
    Ok(MindMapNode {
        id: parse_uuid(&id, "mind_map_nodes.id")?,
        content: row.get("content")?,
        x: row.get("x")?,
        y: row.get("y")?,
        parent_id: parse_optional_uuid(row.get("parent_id")?, "mind_map_nodes.parent_id")?,
    })
}
