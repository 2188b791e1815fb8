use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            user_id       INTEGER PRIMARY KEY AUTOINCREMENT,
            username      TEXT NOT NULL UNIQUE,
            password      TEXT NOT NULL,
            email         TEXT NOT NULL UNIQUE,
            display_name  TEXT NOT NULL,
            created_at    TEXT NOT NULL,
            active        INTEGER NOT NULL DEFAULT 1
        );

        -- Directed friendship edges; a relationship is two rows kept in
        -- sync by the pair-insert transaction. The UNIQUE constraint closes
        -- the concurrent double-add race.
        CREATE TABLE IF NOT EXISTS user_friends (
            user_friend_id  INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(user_id),
            friend_id       INTEGER NOT NULL REFERENCES users(user_id),
            blocked         INTEGER NOT NULL DEFAULT 0,
            display_name    TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            UNIQUE(user_id, friend_id)
        );

        CREATE TABLE IF NOT EXISTS chats (
            chat_id     INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        -- Chat lifetime is derived from these rows: the chat (and its
        -- messages) is deleted when the last membership row goes.
        CREATE TABLE IF NOT EXISTS user_chats (
            user_chat_id  INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id       INTEGER NOT NULL REFERENCES users(user_id),
            chat_id       INTEGER NOT NULL,
            created_at    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_user_chats_chat
            ON user_chats(chat_id);

        -- username and reply_* are display snapshots, not foreign keys.
        CREATE TABLE IF NOT EXISTS messages (
            message_id      INTEGER PRIMARY KEY AUTOINCREMENT,
            content         TEXT NOT NULL,
            reply_username  TEXT,
            reply_content   TEXT,
            username        TEXT NOT NULL,
            chat_id         INTEGER NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_chat
            ON messages(chat_id);

        CREATE TABLE IF NOT EXISTS comments (
            comment_id  INTEGER PRIMARY KEY AUTOINCREMENT,
            email       TEXT NOT NULL,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
