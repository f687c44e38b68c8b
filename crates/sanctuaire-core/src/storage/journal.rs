//! Free-form journal kept alongside the sessions.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use super::database::Database;
use crate::error::{CoreError, StorageError, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Creation time in epoch milliseconds, bumped if needed to stay unique.
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub text: String,
}

impl Database {
    /// Append an entry. Blank text is rejected.
    pub fn add_journal_entry(&self, text: &str) -> Result<JournalEntry, CoreError> {
        if text.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "text".into(),
                message: "journal entry is empty".into(),
            }
            .into());
        }

        let created_at = Utc::now();
        let last_id: i64 = self
            .conn()
            .query_row("SELECT COALESCE(MAX(id), 0) FROM journal", [], |row| {
                row.get(0)
            })
            .map_err(StorageError::from)?;
        let id = created_at.timestamp_millis().max(last_id + 1);

        self.conn()
            .execute(
                "INSERT INTO journal (id, created_at, text) VALUES (?1, ?2, ?3)",
                params![id, created_at.to_rfc3339(), text],
            )
            .map_err(StorageError::from)?;

        Ok(JournalEntry {
            id,
            created_at,
            text: text.to_string(),
        })
    }

    /// All entries, newest first.
    pub fn journal_entries(&self) -> Result<Vec<JournalEntry>, StorageError> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, created_at, text FROM journal ORDER BY id DESC")?;
        let rows = stmt.query_map([], |row| {
            let raw: String = row.get(1)?;
            let created_at = DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
            Ok(JournalEntry {
                id: row.get(0)?,
                created_at,
                text: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }

    /// Returns whether an entry was deleted.
    pub fn delete_journal_entry(&self, id: i64) -> Result<bool, StorageError> {
        let n = self
            .conn()
            .execute("DELETE FROM journal WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_list_delete() {
        let db = Database::open_memory().unwrap();
        let first = db.add_journal_entry("Merci pour cette journée").unwrap();
        let second = db.add_journal_entry("Résolution : écouter").unwrap();
        assert!(second.id > first.id);

        let entries = db.journal_entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "Résolution : écouter");
        assert_eq!(entries[1], first);

        assert!(db.delete_journal_entry(first.id).unwrap());
        assert!(!db.delete_journal_entry(first.id).unwrap());
        assert_eq!(db.journal_entries().unwrap().len(), 1);
    }

    #[test]
    fn blank_entries_are_rejected() {
        let db = Database::open_memory().unwrap();
        let err = db.add_journal_entry("   \n").unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(db.journal_entries().unwrap().is_empty());
    }
}
