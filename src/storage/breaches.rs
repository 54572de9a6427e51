//! Breach documents.
//!
//! Each breach is stored as a JSON document; list filters are evaluated in
//! SQLite with `json_extract` so paging happens in the database.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::{now_rfc3339, parse_timestamp, Page, PageRequest, Pool};
use crate::records::{BreachFilter, BreachRecord, RecordSource};

/// A breach record together with its storage metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBreach {
    pub id: Uuid,
    #[serde(flatten)]
    pub record: BreachRecord,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

struct BreachRow {
    id: String,
    document_json: String,
    created_by: Option<String>,
    created_at: String,
    updated_at: String,
}

impl BreachRow {
    const COLUMNS: &'static str = "id, document_json, created_by, created_at, updated_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            document_json: row.get(1)?,
            created_by: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    fn into_stored(self) -> Result<StoredBreach> {
        Ok(StoredBreach {
            id: Uuid::parse_str(&self.id)
                .with_context(|| format!("invalid breach id {:?}", self.id))?,
            record: parse_document(&self.document_json)?,
            created_by: self.created_by,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn parse_document(json: &str) -> Result<BreachRecord> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("stored breach document is not valid JSON")?;
    Ok(BreachRecord::from_document(value)?)
}

/// Build a `WHERE` clause (with leading space) and its positional parameters.
fn where_clause(filter: &BreachFilter) -> (String, Vec<String>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<String> = Vec::new();

    if let Some(year) = &filter.year {
        values.push(year.clone());
        clauses.push(format!(
            "CAST(json_extract(document_json, '$.year') AS TEXT) = ?{}",
            values.len()
        ));
    }
    if let Some(organization) = &filter.organization {
        values.push(organization.clone());
        clauses.push(format!(
            "instr(lower(json_extract(document_json, '$.organization')), lower(?{})) > 0",
            values.len()
        ));
    }
    if let Some(breach_type) = &filter.breach_type {
        values.push(breach_type.clone());
        clauses.push(format!(
            "json_extract(document_json, '$.breachType') = ?{}",
            values.len()
        ));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

#[derive(Clone)]
pub struct BreachStore {
    pool: Pool,
}

impl BreachStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn insert(&self, record: &BreachRecord, created_by: Option<&str>) -> Result<StoredBreach> {
        let conn = self.pool.get()?;
        let id = Uuid::new_v4();
        let now = now_rfc3339();
        let document = serde_json::to_string(record)?;

        conn.execute(
            "INSERT INTO breaches (id, document_json, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![id.to_string(), document, created_by, now],
        )
        .context("Failed to insert breach")?;

        info!(%id, organization = ?record.organization, "breach recorded");

        let timestamp = parse_timestamp(&now)?;
        Ok(StoredBreach {
            id,
            record: record.clone(),
            created_by: created_by.map(str::to_string),
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    pub fn get(&self, id: Uuid) -> Result<Option<StoredBreach>> {
        let conn = self.pool.get()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM breaches WHERE id = ?1", BreachRow::COLUMNS),
                params![id.to_string()],
                BreachRow::from_row,
            )
            .optional()?;

        row.map(BreachRow::into_stored).transpose()
    }

    /// Replace the document of an existing breach. `None` if it does not exist.
    pub fn update(&self, id: Uuid, record: &BreachRecord) -> Result<Option<StoredBreach>> {
        let changed = {
            let conn = self.pool.get()?;
            conn.execute(
                "UPDATE breaches SET document_json = ?1, updated_at = ?2 WHERE id = ?3",
                params![serde_json::to_string(record)?, now_rfc3339(), id.to_string()],
            )
            .context("Failed to update breach")?
        };

        if changed == 0 {
            return Ok(None);
        }
        info!(%id, "breach updated");
        self.get(id)
    }

    /// Delete a breach. Returns whether anything was removed.
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let changed = conn.execute("DELETE FROM breaches WHERE id = ?1", params![id.to_string()])?;
        if changed > 0 {
            info!(%id, "breach deleted");
        }
        Ok(changed > 0)
    }

    /// One page of breaches matching `filter`, most recent breach date first.
    pub fn list(&self, filter: &BreachFilter, page: PageRequest) -> Result<Page<StoredBreach>> {
        let conn = self.pool.get()?;
        let (clause, values) = where_clause(filter);

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM breaches{clause}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {} FROM breaches{clause}
             ORDER BY json_extract(document_json, '$.date') DESC, created_at DESC
             LIMIT {} OFFSET {}",
            BreachRow::COLUMNS,
            page.limit,
            page.offset()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), BreachRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let items = rows
            .into_iter()
            .map(BreachRow::into_stored)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(items, total.max(0) as u64, page))
    }
}

impl RecordSource for BreachStore {
    fn fetch_records(&self, filter: &BreachFilter) -> Result<Vec<BreachRecord>> {
        let conn = self.pool.get()?;
        let (clause, values) = where_clause(filter);

        let mut stmt = conn.prepare(&format!("SELECT document_json FROM breaches{clause}"))?;
        let documents = stmt
            .query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let records = documents
            .iter()
            .map(|doc| parse_document(doc))
            .collect::<Result<Vec<_>>>()?;

        debug!(count = records.len(), filtered = !filter.is_empty(), "fetched breach records");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, BreachStore) {
        let dir = tempfile::TempDir::new().unwrap();
        let pool = crate::storage::open_pool(&dir.path().join("test.db")).unwrap();
        (dir, BreachStore::new(pool))
    }

    fn record(doc: serde_json::Value) -> BreachRecord {
        BreachRecord::from_document(doc).unwrap()
    }

    #[test]
    fn test_insert_get_update_delete() -> Result<()> {
        let (_dir, store) = store();

        let created = store.insert(
            &record(json!({ "organization": "Acme", "recordsCompromised": 10, "country": "US" })),
            Some("analyst"),
        )?;
        let fetched = store.get(created.id)?.expect("breach should exist");
        assert_eq!(fetched.record, created.record);
        assert_eq!(fetched.created_by.as_deref(), Some("analyst"));

        let updated = store
            .update(created.id, &record(json!({ "organization": "Acme Corp" })))?
            .expect("breach should exist");
        assert_eq!(updated.record.organization.as_deref(), Some("Acme Corp"));
        assert!(updated.record.records_compromised.is_none());

        assert!(store.delete(created.id)?);
        assert!(!store.delete(created.id)?);
        assert!(store.get(created.id)?.is_none());
        assert!(store.update(created.id, &BreachRecord::default())?.is_none());
        Ok(())
    }

    #[test]
    fn test_malformed_counts_survive_storage() -> Result<()> {
        let (_dir, store) = store();
        store.insert(&record(json!({ "recordsCompromised": "n/a" })), None)?;

        let records = store.fetch_records(&BreachFilter::default())?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].records_compromised, Some(json!("n/a")));
        Ok(())
    }

    #[test]
    fn test_list_filters_and_pages() -> Result<()> {
        let (_dir, store) = store();
        for (i, org) in ["Globex", "globex labs", "Initech", "Umbrella"].iter().enumerate() {
            store.insert(
                &record(json!({
                    "organization": org,
                    "breachType": if i % 2 == 0 { "Hacking" } else { "Phishing" },
                    "year": 2020 + i as i64,
                    "date": format!("202{i}-01-01"),
                })),
                None,
            )?;
        }

        let all = store.list(&BreachFilter::default(), PageRequest::new(Some(1), Some(3)))?;
        assert_eq!(all.total, 4);
        assert_eq!(all.total_pages, 2);
        assert_eq!(all.items.len(), 3);
        assert_eq!(all.items[0].record.organization.as_deref(), Some("Umbrella"));

        let second = store.list(&BreachFilter::default(), PageRequest::new(Some(2), Some(3)))?;
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].record.organization.as_deref(), Some("Globex"));

        let by_org = BreachFilter {
            organization: Some("GLOBEX".into()),
            ..Default::default()
        };
        assert_eq!(store.list(&by_org, PageRequest::default())?.total, 2);

        let by_year = BreachFilter {
            year: Some("2022".into()),
            ..Default::default()
        };
        let page = store.list(&by_year, PageRequest::default())?;
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].record.organization.as_deref(), Some("Initech"));

        let by_type = BreachFilter {
            breach_type: Some("Phishing".into()),
            ..Default::default()
        };
        assert_eq!(store.fetch_records(&by_type)?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_sql_filter_agrees_with_in_memory_filter() -> Result<()> {
        let (_dir, store) = store();
        let docs = vec![
            record(json!({ "organization": "Acme", "year": "2021" })),
            record(json!({ "organization": "acme west", "year": 2021 })),
            record(json!({ "organization": "Other", "year": 2021.5 })),
            record(json!({ "year": 2021 })),
        ];
        for doc in &docs {
            store.insert(doc, None)?;
        }

        let filters = [
            BreachFilter { year: Some("2021".into()), ..Default::default() },
            BreachFilter { organization: Some("ACME".into()), ..Default::default() },
            BreachFilter { year: Some("2021.5".into()), ..Default::default() },
        ];
        for filter in &filters {
            assert_eq!(
                store.fetch_records(filter)?.len(),
                docs.fetch_records(filter)?.len(),
                "filter {filter:?}"
            );
        }
        Ok(())
    }
}
