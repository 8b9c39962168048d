/// DDL for the `til` table. Idempotent (IF NOT EXISTS); columns added by
/// later versions are brought in by [`crate::migrate`].
pub const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode=WAL;

CREATE TABLE IF NOT EXISTS til (
    path        TEXT PRIMARY KEY,
    slug        TEXT,
    topic       TEXT,
    title       TEXT,
    url         TEXT,
    body        TEXT,
    html        TEXT,
    created     TEXT,
    created_utc TEXT,
    updated     TEXT,
    updated_utc TEXT
);
"#;

/// Removes any previous full-text index definition.
pub const DROP_FTS_SQL: &str = r#"
DROP TRIGGER IF EXISTS til_ai;
DROP TRIGGER IF EXISTS til_ad;
DROP TRIGGER IF EXISTS til_au;
DROP TABLE IF EXISTS til_fts;
"#;

/// External-content FTS5 index over title and body with porter stemming,
/// populated from the current rows and kept in sync by triggers.
pub const CREATE_FTS_SQL: &str = r#"
CREATE VIRTUAL TABLE til_fts
    USING fts5(title, body, tokenize='porter', content='til');

INSERT INTO til_fts (rowid, title, body)
    SELECT rowid, title, body FROM til;

CREATE TRIGGER til_ai AFTER INSERT ON til BEGIN
    INSERT INTO til_fts (rowid, title, body) VALUES (new.rowid, new.title, new.body);
END;

CREATE TRIGGER til_ad AFTER DELETE ON til BEGIN
    INSERT INTO til_fts (til_fts, rowid, title, body)
        VALUES ('delete', old.rowid, old.title, old.body);
END;

CREATE TRIGGER til_au AFTER UPDATE ON til BEGIN
    INSERT INTO til_fts (til_fts, rowid, title, body)
        VALUES ('delete', old.rowid, old.title, old.body);
    INSERT INTO til_fts (rowid, title, body) VALUES (new.rowid, new.title, new.body);
END;
"#;
