//! Import record operations

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use tracing::info;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{ImportReceipt, ImportRecord, ImportSummary, NewImport};

const IMPORT_COLUMNS: &str =
    "id, template_id, datasets_json, mappings_json, calculation_json, fingerprint, created_at";

/// SHA-256 of the serialized datasets, hex encoded
pub fn dataset_fingerprint(datasets_json: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(datasets_json.as_bytes());
    hex::encode(hasher.finalize())
}

/// Raw row before the JSON columns are decoded
struct StoredImport {
    id: i64,
    template_id: String,
    datasets_json: String,
    mappings_json: String,
    calculation_json: String,
    fingerprint: String,
    created_at: String,
}

impl StoredImport {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            template_id: row.get(1)?,
            datasets_json: row.get(2)?,
            mappings_json: row.get(3)?,
            calculation_json: row.get(4)?,
            fingerprint: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<ImportRecord> {
        Ok(ImportRecord {
            id: self.id,
            template_id: self.template_id,
            datasets: serde_json::from_str(&self.datasets_json)?,
            mappings: serde_json::from_str(&self.mappings_json)?,
            calculation: serde_json::from_str(&self.calculation_json)?,
            fingerprint: self.fingerprint,
            created_at: parse_datetime(&self.created_at),
        })
    }
}

impl Database {
    /// Append one import inside a single transaction
    pub fn append_import(&self, import: &NewImport) -> Result<ImportReceipt> {
        let datasets_json = serde_json::to_string(import.datasets)?;
        let mappings_json = serde_json::to_string(import.mappings)?;
        let calculation_json = serde_json::to_string(import.calculation)?;
        let fingerprint = dataset_fingerprint(&datasets_json);
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO imports (template_id, datasets_json, mappings_json, calculation_json, fingerprint, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                import.template_id,
                datasets_json,
                mappings_json,
                calculation_json,
                fingerprint,
                created_at,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(
            import_id = id,
            template = import.template_id,
            fingerprint = %fingerprint,
            "Import stored"
        );

        Ok(ImportReceipt {
            id,
            created_at: parse_datetime(&created_at),
        })
    }

    /// Most recent import (highest id)
    pub fn latest_import(&self) -> Result<Option<ImportRecord>> {
        let conn = self.conn()?;
        let stored = conn
            .query_row(
                &format!("SELECT {} FROM imports ORDER BY id DESC LIMIT 1", IMPORT_COLUMNS),
                [],
                StoredImport::from_row,
            )
            .optional()?;

        stored.map(StoredImport::into_record).transpose()
    }

    /// Get an import by id
    pub fn get_import(&self, id: i64) -> Result<Option<ImportRecord>> {
        let conn = self.conn()?;
        let stored = conn
            .query_row(
                &format!("SELECT {} FROM imports WHERE id = ?", IMPORT_COLUMNS),
                params![id],
                StoredImport::from_row,
            )
            .optional()?;

        stored.map(StoredImport::into_record).transpose()
    }

    /// Import history, newest first, without the payload blobs
    pub fn list_imports(&self, limit: i64, offset: i64) -> Result<Vec<ImportSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, template_id, fingerprint, created_at
            FROM imports
            ORDER BY id DESC
            LIMIT ? OFFSET ?
            "#,
        )?;

        let imports = stmt
            .query_map(params![limit, offset], |row| {
                let created_at: String = row.get(3)?;
                Ok(ImportSummary {
                    id: row.get(0)?,
                    template_id: row.get(1)?,
                    fingerprint: row.get(2)?,
                    created_at: parse_datetime(&created_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(imports)
    }

    pub fn count_imports(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM imports", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete every import; returns the number of rows removed
    pub fn reset_imports(&self) -> Result<usize> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM imports", [])?;
        info!(deleted, "Import history cleared");
        Ok(deleted)
    }
}
