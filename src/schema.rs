pub const SCHEMA_VERSION: &str = "1";

pub const CREATE_SCHEMA_SQL: &str = r#"
BEGIN TRANSACTION;

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', '1');

-- Delivery addresses browsed by the admin table
CREATE TABLE IF NOT EXISTS delivery_addresses (
    id VARCHAR(30) PRIMARY KEY,
    country VARCHAR(100) NOT NULL,
    full_address VARCHAR(255) NOT NULL,
    city VARCHAR(100) NOT NULL,
    street VARCHAR(255) NOT NULL,
    zip_code VARCHAR(20) NOT NULL,
    created_at INTEGER NOT NULL,       -- UTC unix seconds
    updated_at INTEGER DEFAULT NULL    -- UTC unix seconds, NULL if never updated
);

CREATE INDEX IF NOT EXISTS idx_delivery_addresses_created ON delivery_addresses (created_at);

-- Tasks shown by the parallel table
CREATE TABLE IF NOT EXISTS tasks (
    id VARCHAR(30) PRIMARY KEY,
    code VARCHAR(128) NOT NULL UNIQUE,
    title VARCHAR(128),
    status VARCHAR(30) NOT NULL DEFAULT 'todo',        -- 'todo', 'in-progress', 'done', 'canceled'
    label VARCHAR(30) NOT NULL DEFAULT 'bug',          -- 'bug', 'feature', 'enhancement', 'documentation'
    priority VARCHAR(30) NOT NULL DEFAULT 'low',       -- 'low', 'medium', 'high'
    created_at INTEGER NOT NULL,
    updated_at INTEGER DEFAULT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_created ON tasks (created_at);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks (status);
CREATE INDEX IF NOT EXISTS idx_tasks_priority ON tasks (priority);

COMMIT;
"#;
