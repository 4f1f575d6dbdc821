use anyhow::Result;
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

/// The system account (`admin = 1`), seeded by the first migration.
pub const SYSTEM_ACCOUNT_ID: Uuid = Uuid::from_u128(1);

/// Account that self-registered users are created under.
pub const PUBLIC_ACCOUNT_ID: Uuid = Uuid::from_u128(2);

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE accounts (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                active      INTEGER NOT NULL DEFAULT 1,
                admin       INTEGER NOT NULL DEFAULT 0,
                expiry      TEXT,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- at most one system account
            CREATE UNIQUE INDEX idx_accounts_admin ON accounts(admin) WHERE admin = 1;

            CREATE TABLE countries (
                id                   TEXT PRIMARY KEY,
                name                 TEXT NOT NULL UNIQUE,
                national_id_pattern  TEXT
            );

            CREATE TABLE persons (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                surname     TEXT NOT NULL,
                dob         TEXT,
                gender      TEXT,
                email       TEXT,
                phone       TEXT,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_persons_identity ON persons(name, surname, dob, gender);

            CREATE TABLE person_nationalities (
                person_id    TEXT NOT NULL REFERENCES persons(id) ON DELETE CASCADE,
                country_id   TEXT NOT NULL REFERENCES countries(id),
                national_id  TEXT NOT NULL,
                PRIMARY KEY (person_id, country_id)
            );

            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                account_id  TEXT NOT NULL REFERENCES accounts(id),
                username    TEXT NOT NULL UNIQUE,
                passhash    TEXT NOT NULL,
                admin       INTEGER NOT NULL DEFAULT 0,
                active      INTEGER NOT NULL DEFAULT 1,
                expiry      TEXT,
                person_id   TEXT REFERENCES persons(id),
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_users_account ON users(account_id);

            -- user_id is unique: one live session per user
            CREATE TABLE sessions (
                token         TEXT PRIMARY KEY,
                account_id    TEXT NOT NULL REFERENCES accounts(id),
                user_id       TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                time_created  TEXT NOT NULL,
                time_updated  TEXT NOT NULL
            );

            -- parent_group_id has no ON DELETE action: a parent cannot be
            -- deleted while sub-groups reference it
            CREATE TABLE `groups` (
                id               TEXT PRIMARY KEY,
                account_id       TEXT NOT NULL REFERENCES accounts(id),
                parent_group_id  TEXT REFERENCES `groups`(id),
                name             TEXT NOT NULL,
                description      TEXT,
                invitation       INTEGER NOT NULL DEFAULT 0,
                owner_type       TEXT NOT NULL,
                owner_id         TEXT NOT NULL,
                created_at       TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_groups_account ON `groups`(account_id);
            CREATE INDEX idx_groups_parent ON `groups`(parent_group_id);

            CREATE TABLE group_members (
                id           TEXT PRIMARY KEY,
                group_id     TEXT NOT NULL REFERENCES `groups`(id) ON DELETE CASCADE,
                member_type  TEXT NOT NULL,
                member_id    TEXT NOT NULL,
                UNIQUE (group_id, member_type, member_id)
            );

            CREATE INDEX idx_group_members_member ON group_members(member_type, member_id);

            -- metas and fields have no foreign key on purpose: table_name
            -- names any entity class, so owners purge them explicitly
            CREATE TABLE metas (
                table_name  TEXT NOT NULL,
                table_id    TEXT NOT NULL,
                name        TEXT NOT NULL,
                value       TEXT NOT NULL,
                PRIMARY KEY (table_name, table_id, name)
            );

            CREATE TABLE fields (
                table_name   TEXT NOT NULL,
                table_id     TEXT NOT NULL,
                order_nr     INTEGER NOT NULL DEFAULT 0,
                name         TEXT NOT NULL,
                type         TEXT NOT NULL DEFAULT '',
                description  TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (table_name, table_id, name)
            );

            CREATE TABLE messages (
                id            TEXT PRIMARY KEY,
                from_user_id  TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                to_user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                message       TEXT NOT NULL,
                time_sent     TEXT NOT NULL,
                time_read     TEXT
            );

            CREATE INDEX idx_messages_inbox ON messages(to_user_id, time_sent);

            INSERT INTO accounts (id, name, active, admin)
                VALUES ('00000000-0000-0000-0000-000000000001', 'system', 1, 1);
            INSERT INTO accounts (id, name, active, admin)
                VALUES ('00000000-0000-0000-0000-000000000002', 'public', 1, 0);

            INSERT INTO countries (id, name, national_id_pattern) VALUES
                ('ZA', 'South Africa', '^[0-9]{13}$'),
                ('NA', 'Namibia', '^[0-9]{11}$'),
                ('BW', 'Botswana', NULL),
                ('ZW', 'Zimbabwe', NULL),
                ('MZ', 'Mozambique', NULL),
                ('GB', 'United Kingdom', NULL),
                ('NL', 'Netherlands', NULL),
                ('DE', 'Germany', NULL),
                ('US', 'United States', NULL),
                ('AU', 'Australia', NULL);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
