//! Database schema SQL for the local store.

/// Simulation records. `parent_id` links a revision to the record it was derived from;
/// the link is not enforced, so a parent may disappear.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS simulations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL,
    json TEXT NOT NULL,
    from_ai INTEGER NOT NULL DEFAULT 0,
    parent_id INTEGER,
    title TEXT,
    description TEXT,
    changes_made TEXT
);

CREATE INDEX IF NOT EXISTS idx_simulations_parent ON simulations(parent_id);
"#;
