//! SQL schema for the Herald SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS partners (
    partner_id       TEXT PRIMARY KEY,
    name             TEXT NOT NULL,
    email            TEXT,
    email_preference TEXT NOT NULL DEFAULT 'always',  -- 'always' | 'none'
    signature        TEXT
);

-- One row per (document, partner). Modifying followers changes access
-- rights to individual documents; every write notifies the invalidator.
CREATE TABLE IF NOT EXISTS followers (
    subscription_id TEXT PRIMARY KEY,
    model           TEXT NOT NULL,
    res_id          INTEGER NOT NULL,   -- 0 means every instance of model
    partner_id      TEXT NOT NULL REFERENCES partners(partner_id) ON DELETE CASCADE,
    subtypes        TEXT NOT NULL DEFAULT '[]',  -- JSON array of subtype names
    created_at      TEXT NOT NULL,
    UNIQUE (model, res_id, partner_id)
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    partner_id      TEXT NOT NULL REFERENCES partners(partner_id) ON DELETE CASCADE,
    message_id      TEXT NOT NULL,
    is_read         INTEGER NOT NULL DEFAULT 0,
    starred         INTEGER NOT NULL DEFAULT 0
);

-- Inbox queries filter on partner + flags.
CREATE INDEX IF NOT EXISTS notifications_inbox_idx
    ON notifications(partner_id, is_read, starred, message_id);
CREATE INDEX IF NOT EXISTS notifications_message_idx
    ON notifications(message_id);

CREATE TABLE IF NOT EXISTS outbox (
    envelope_id   TEXT PRIMARY KEY,
    message_id    TEXT NOT NULL,
    body_html     TEXT NOT NULL,
    recipient_ids TEXT NOT NULL,                  -- JSON array of partner UUIDs
    refs          TEXT,                           -- References header value
    auto_delete   INTEGER NOT NULL DEFAULT 1,
    server_id     TEXT,
    extra_headers TEXT NOT NULL DEFAULT '{}',     -- JSON object
    status        TEXT NOT NULL DEFAULT 'queued', -- 'queued' | 'sent'
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS outbox_status_idx ON outbox(status);

PRAGMA user_version = 1;
";
