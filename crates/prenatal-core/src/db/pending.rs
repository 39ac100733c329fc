//! Pending item database operations.

use rusqlite::{params, Row};

use super::{Database, DbResult};
use crate::models::PendingItem;

impl Database {
    /// Insert a pending item.
    pub fn insert_pending_item(&self, item: &PendingItem) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO pending_items (item_id, patient_id, text, urgent, done, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                item.item_id,
                item.patient_id,
                item.text,
                item.urgent,
                item.done,
                item.created_at,
            ],
        )?;
        Ok(())
    }

    /// Flip an item between open and done. Returns the new state, or `None`
    /// when the item does not exist.
    pub fn toggle_pending_item(&self, item_id: &str) -> DbResult<Option<bool>> {
        let rows_affected = self.conn.execute(
            "UPDATE pending_items SET done = NOT done WHERE item_id = ?",
            [item_id],
        )?;
        if rows_affected == 0 {
            return Ok(None);
        }

        let done: bool = self.conn.query_row(
            "SELECT done FROM pending_items WHERE item_id = ?",
            [item_id],
            |row| row.get(0),
        )?;
        Ok(Some(done))
    }

    /// Items for a patient: urgent first, then oldest first.
    pub fn list_pending_items(&self, patient_id: &str) -> DbResult<Vec<PendingItem>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT item_id, patient_id, text, urgent, done, created_at
            FROM pending_items
            WHERE patient_id = ?
            ORDER BY urgent DESC, created_at ASC
            "#,
        )?;

        let rows = stmt.query_map([patient_id], item_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a pending item.
    pub fn delete_pending_item(&self, item_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM pending_items WHERE item_id = ?", [item_id])?;
        Ok(rows_affected > 0)
    }
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<PendingItem> {
    Ok(PendingItem {
        item_id: row.get(0)?,
        patient_id: row.get(1)?,
        text: row.get(2)?,
        urgent: row.get(3)?,
        done: row.get(4)?,
        created_at: row.get(5)?,
    })
}
