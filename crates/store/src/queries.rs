use rusqlite::{params, OptionalExtension};

use til_types::{NoteRecord, Result, SearchHit, Store, StoreStats, TilError};

use crate::{migrate, schema, SqliteStore};

const NOTE_COLUMNS: &str =
    "path, slug, topic, title, url, body, html, created, created_utc, updated, updated_utc";

// ── Helpers ───────────────────────────────────────────────────────────────

fn row_to_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<NoteRecord> {
    Ok(NoteRecord {
        path: row.get("path")?,
        slug: row.get::<_, Option<String>>("slug")?.unwrap_or_default(),
        topic: row.get::<_, Option<String>>("topic")?.unwrap_or_default(),
        title: row.get::<_, Option<String>>("title")?.unwrap_or_default(),
        url: row.get::<_, Option<String>>("url")?.unwrap_or_default(),
        body: row.get::<_, Option<String>>("body")?.unwrap_or_default(),
        html: row.get("html")?,
        created: row.get("created")?,
        created_utc: row.get("created_utc")?,
        updated: row.get("updated")?,
        updated_utc: row.get("updated_utc")?,
    })
}

fn fts_exists(conn: &rusqlite::Connection) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'til_fts'",
        [],
        |r| r.get(0),
    )?;
    Ok(count > 0)
}

// ── impl Store ────────────────────────────────────────────────────────────

impl Store for SqliteStore {
    // ── Index writes ──────────────────────────────────────────────────────

    fn get_note(&self, path: &str) -> Result<Option<NoteRecord>> {
        let conn = self.lock()?;
        let note = conn
            .query_row(
                &format!("SELECT {} FROM til WHERE path = ?1", NOTE_COLUMNS),
                params![path],
                row_to_note,
            )
            .optional()?;
        Ok(note)
    }

    fn upsert_note(&self, note: &NoteRecord) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        migrate::ensure_columns(&tx, "til", NoteRecord::COLUMNS)?;

        // Optional columns fall back to the stored value, so a record that
        // was not re-rendered (or has no history) keeps what it had.
        tx.execute(
            "INSERT INTO til
                (path, slug, topic, title, url, body, html, created, created_utc, updated, updated_utc)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(path) DO UPDATE SET
                slug        = excluded.slug,
                topic       = excluded.topic,
                title       = excluded.title,
                url         = excluded.url,
                body        = excluded.body,
                html        = COALESCE(excluded.html, til.html),
                created     = COALESCE(excluded.created, til.created),
                created_utc = COALESCE(excluded.created_utc, til.created_utc),
                updated     = COALESCE(excluded.updated, til.updated),
                updated_utc = COALESCE(excluded.updated_utc, til.updated_utc)",
            params![
                note.path,
                note.slug,
                note.topic,
                note.title,
                note.url,
                note.body,
                note.html,
                note.created,
                note.created_utc,
                note.updated,
                note.updated_utc,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn enable_fts(&self) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute_batch(schema::DROP_FTS_SQL)?;
        tx.execute_batch(schema::CREATE_FTS_SQL)?;
        tx.commit()?;
        tracing::debug!("full-text index rebuilt");
        Ok(())
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    fn notes_by_created(&self) -> Result<Vec<NoteRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM til ORDER BY created_utc, rowid",
            NOTE_COLUMNS
        ))?;
        let notes: rusqlite::Result<Vec<NoteRecord>> = stmt.query_map([], row_to_note)?.collect();
        Ok(notes?)
    }

    fn count_notes(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM til", [], |r| r.get(0))?;
        Ok(count as usize)
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let conn = self.lock()?;
        if !fts_exists(&conn)? {
            return Err(TilError::NotFound(
                "full-text index (run `til build` first)".into(),
            ));
        }

        let mut stmt = conn.prepare(
            "SELECT t.path, t.title, t.url, snippet(til_fts, 1, '**', '**', '...', 16)
             FROM til_fts
             JOIN til t ON t.rowid = til_fts.rowid
             WHERE til_fts MATCH ?1
             ORDER BY rank
             LIMIT ?2",
        )?;
        let hits: rusqlite::Result<Vec<SearchHit>> = stmt
            .query_map(params![query, limit as i64], |row| {
                Ok(SearchHit {
                    path: row.get(0)?,
                    title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    url: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    snippet: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                })
            })?
            .collect();
        Ok(hits?)
    }

    fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;
        let (note_count, topic_count, last_updated_utc): (i64, i64, Option<String>) = conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT topic), MAX(updated_utc) FROM til",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;
        Ok(StoreStats {
            note_count: note_count as usize,
            topic_count: topic_count as usize,
            last_updated_utc,
            fts_enabled: fts_exists(&conn)?,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
