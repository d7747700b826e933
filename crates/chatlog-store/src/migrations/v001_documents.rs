//! v001 -- Document table and the store-wide revision counter.

use rusqlite::Connection;

const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Documents
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS documents (
    collection  TEXT NOT NULL,
    key         TEXT NOT NULL,
    body        TEXT NOT NULL,                -- JSON object
    created_at  TEXT NOT NULL,                -- RFC-3339
    updated_at  TEXT NOT NULL,                -- RFC-3339
    created_rev INTEGER NOT NULL,
    updated_rev INTEGER NOT NULL,

    PRIMARY KEY (collection, key)
);

CREATE INDEX IF NOT EXISTS idx_documents_updated
    ON documents(collection, updated_rev DESC);

CREATE INDEX IF NOT EXISTS idx_documents_created
    ON documents(collection, created_rev DESC);

-- ----------------------------------------------------------------
-- Revision counter (single row, never decreases)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS revision_counter (
    id    INTEGER PRIMARY KEY CHECK (id = 1),
    value INTEGER NOT NULL
);

INSERT OR IGNORE INTO revision_counter (id, value) VALUES (1, 0);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
