use crate::models::{ChatRow, FriendRow, MessageRow, UserRow};
use crate::{Database, DbError};
use rusqlite::Connection;

/// Timestamps are stored as RFC 3339 strings.
fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
    ) -> Result<i64, DbError> {
        self.with_conn(|conn| {
            // display_name starts out equal to the username
            conn.execute(
                "INSERT INTO users (username, password, email, display_name, created_at)
                 VALUES (?1, ?2, ?3, ?1, ?4)",
                rusqlite::params![username, password_hash, email, now()],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_id(&self, user_id: i64) -> Result<Option<UserRow>, DbError> {
        self.with_conn(|conn| query_user(conn, "user_id = ?1", rusqlite::params![user_id]))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>, DbError> {
        self.with_conn(|conn| query_user(conn, "username = ?1", rusqlite::params![username]))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>, DbError> {
        self.with_conn(|conn| query_user(conn, "email = ?1", rusqlite::params![email]))
    }

    pub fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?1 WHERE user_id = ?2",
                rusqlite::params![password_hash, user_id],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound("user"));
            }
            Ok(())
        })
    }

    /// Renames the account. Friendship display_name snapshots and message
    /// author names are left alone on purpose.
    pub fn update_username(&self, user_id: i64, username: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET username = ?1 WHERE user_id = ?2",
                rusqlite::params![username, user_id],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound("user"));
            }
            Ok(())
        })
    }

    // -- Friendships --

    /// Create both directed edges of a friendship in one transaction, each
    /// carrying the other party's username as a display snapshot and the
    /// same creation timestamp.
    pub fn add_friend_pair(&self, requester: &str, target: &str) -> Result<(), DbError> {
        if requester == target {
            return Err(DbError::SelfReference);
        }
        self.with_tx(|tx| {
            let target_row =
                query_user(tx, "username = ?1", rusqlite::params![target])?
                    .ok_or(DbError::NotFound("user"))?;
            let requester_row =
                query_user(tx, "username = ?1", rusqlite::params![requester])?
                    .ok_or(DbError::NotFound("user"))?;

            let existing: i64 = tx.query_row(
                "SELECT COUNT(*) FROM user_friends WHERE user_id = ?1 AND friend_id = ?2",
                rusqlite::params![requester_row.user_id, target_row.user_id],
                |row| row.get(0),
            )?;
            if existing > 0 {
                return Err(DbError::AlreadyFriends);
            }

            let timestamp = now();
            tx.execute(
                "INSERT INTO user_friends (user_id, friend_id, display_name, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![requester_row.user_id, target_row.user_id, target, timestamp],
            )?;
            tx.execute(
                "INSERT INTO user_friends (user_id, friend_id, display_name, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![target_row.user_id, requester_row.user_id, requester, timestamp],
            )?;
            Ok(())
        })
    }

    /// Blocking is asymmetric: only the owner's outbound edge is touched.
    pub fn set_friend_blocked(
        &self,
        owner_id: i64,
        target_username: &str,
        blocked: bool,
    ) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let target = query_user(conn, "username = ?1", rusqlite::params![target_username])?
                .ok_or(DbError::NotFound("user"))?;
            let changed = conn.execute(
                "UPDATE user_friends SET blocked = ?1 WHERE user_id = ?2 AND friend_id = ?3",
                rusqlite::params![blocked, owner_id, target.user_id],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound("friendship"));
            }
            Ok(())
        })
    }

    pub fn get_friend_edge(
        &self,
        owner_id: i64,
        target_username: &str,
    ) -> Result<FriendRow, DbError> {
        self.with_conn(|conn| {
            let target = query_user(conn, "username = ?1", rusqlite::params![target_username])?
                .ok_or(DbError::NotFound("user"))?;
            conn.query_row(
                "SELECT user_friend_id, user_id, friend_id, blocked, display_name, created_at
                 FROM user_friends WHERE user_id = ?1 AND friend_id = ?2",
                rusqlite::params![owner_id, target.user_id],
                map_friend_row,
            )
            .optional()?
            .ok_or(DbError::NotFound("friendship"))
        })
    }

    /// The users on the other end of a user's outbound edges.
    pub fn list_friends(&self, user_id: i64) -> Result<Vec<UserRow>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.user_id, u.username, u.password, u.email, u.display_name,
                        u.created_at, u.active
                 FROM user_friends uf
                 INNER JOIN users u ON uf.friend_id = u.user_id
                 WHERE uf.user_id = ?1
                 ORDER BY uf.created_at",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![user_id], map_user_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Chats --

    /// One chat row plus exactly two membership rows (creator, invitee),
    /// all in one transaction. Duplicate chats for the same pair are allowed.
    pub fn create_chat_with_members(
        &self,
        creator: &str,
        invitee: &str,
        title: &str,
    ) -> Result<i64, DbError> {
        self.with_tx(|tx| {
            let creator_row =
                query_user(tx, "username = ?1", rusqlite::params![creator])?
                    .ok_or(DbError::NotFound("user"))?;
            let invitee_row =
                query_user(tx, "username = ?1", rusqlite::params![invitee])?
                    .ok_or(DbError::NotFound("user"))?;

            let timestamp = now();
            tx.execute(
                "INSERT INTO chats (title, created_at) VALUES (?1, ?2)",
                rusqlite::params![title, timestamp],
            )?;
            let chat_id = tx.last_insert_rowid();

            for member in [creator_row.user_id, invitee_row.user_id] {
                tx.execute(
                    "INSERT INTO user_chats (user_id, chat_id, created_at) VALUES (?1, ?2, ?3)",
                    rusqlite::params![member, chat_id, timestamp],
                )?;
            }
            Ok(chat_id)
        })
    }

    pub fn list_chats_for_user(&self, user_id: i64) -> Result<Vec<ChatRow>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.chat_id, c.title, c.created_at
                 FROM user_chats uc
                 INNER JOIN chats c ON uc.chat_id = c.chat_id
                 WHERE uc.user_id = ?1
                 ORDER BY c.created_at",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![user_id], map_chat_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_chat(&self, chat_id: i64) -> Result<ChatRow, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT chat_id, title, created_at FROM chats WHERE chat_id = ?1",
                rusqlite::params![chat_id],
                map_chat_row,
            )
            .optional()?
            .ok_or(DbError::NotFound("chat"))
        })
    }

    pub fn update_chat_title(&self, chat_id: i64, title: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE chats SET title = ?1 WHERE chat_id = ?2",
                rusqlite::params![title, chat_id],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound("chat"));
            }
            Ok(())
        })
    }

    pub fn list_chat_members(&self, chat_id: i64) -> Result<Vec<UserRow>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.user_id, u.username, u.password, u.email, u.display_name,
                        u.created_at, u.active
                 FROM user_chats uc
                 INNER JOIN users u ON uc.user_id = u.user_id
                 WHERE uc.chat_id = ?1
                 ORDER BY uc.created_at",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![chat_id], map_user_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn add_chat_member(
        &self,
        chat_id: i64,
        acting: &str,
        invitee: &str,
    ) -> Result<(), DbError> {
        if acting == invitee {
            return Err(DbError::SelfReference);
        }
        self.with_tx(|tx| {
            let invitee_row =
                query_user(tx, "username = ?1", rusqlite::params![invitee])?
                    .ok_or(DbError::NotFound("user"))?;

            let existing: i64 = tx.query_row(
                "SELECT COUNT(*) FROM user_chats WHERE user_id = ?1 AND chat_id = ?2",
                rusqlite::params![invitee_row.user_id, chat_id],
                |row| row.get(0),
            )?;
            if existing > 0 {
                return Err(DbError::AlreadyMember);
            }

            tx.execute(
                "INSERT INTO user_chats (user_id, chat_id, created_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![invitee_row.user_id, chat_id, now()],
            )?;
            Ok(())
        })
    }

    /// Remove the caller's membership row, then tear the chat down (chat row
    /// plus all its messages) iff no members remain. The delete → count →
    /// conditional cascade ordering runs inside one transaction.
    ///
    /// Returns true when the chat was torn down.
    pub fn leave_chat(&self, user_id: i64, chat_id: i64) -> Result<bool, DbError> {
        self.with_tx(|tx| {
            tx.execute(
                "DELETE FROM user_chats WHERE user_id = ?1 AND chat_id = ?2",
                rusqlite::params![user_id, chat_id],
            )?;

            let remaining: i64 = tx.query_row(
                "SELECT COUNT(*) FROM user_chats WHERE chat_id = ?1",
                rusqlite::params![chat_id],
                |row| row.get(0),
            )?;
            if remaining > 0 {
                return Ok(false);
            }

            tx.execute("DELETE FROM chats WHERE chat_id = ?1", rusqlite::params![chat_id])?;
            tx.execute(
                "DELETE FROM messages WHERE chat_id = ?1",
                rusqlite::params![chat_id],
            )?;
            Ok(true)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        content: &str,
        reply_username: Option<&str>,
        reply_content: Option<&str>,
        username: &str,
        chat_id: i64,
    ) -> Result<i64, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (content, reply_username, reply_content, username, chat_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![content, reply_username, reply_content, username, chat_id, now()],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_messages(&self, chat_id: i64) -> Result<Vec<MessageRow>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT message_id, content, reply_username, reply_content, username, chat_id, created_at
                 FROM messages WHERE chat_id = ?1 ORDER BY message_id",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![chat_id], map_message_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_message_content(&self, message_id: i64, content: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET content = ?1 WHERE message_id = ?2",
                rusqlite::params![content, message_id],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound("message"));
            }
            Ok(())
        })
    }

    // -- Comments --

    pub fn insert_comment(&self, email: &str, content: &str) -> Result<i64, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (email, content, created_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![email, content, now()],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }
}

fn query_user(
    conn: &Connection,
    filter: &str,
    params: impl rusqlite::Params,
) -> Result<Option<UserRow>, DbError> {
    let sql = format!(
        "SELECT user_id, username, password, email, display_name, created_at, active
         FROM users WHERE {filter}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row(params, map_user_row).optional()?;
    Ok(row)
}

fn map_user_row(row: &rusqlite::Row<'_>) -> Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        user_id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        email: row.get(3)?,
        display_name: row.get(4)?,
        created_at: row.get(5)?,
        active: row.get(6)?,
    })
}

fn map_friend_row(row: &rusqlite::Row<'_>) -> Result<FriendRow, rusqlite::Error> {
    Ok(FriendRow {
        user_friend_id: row.get(0)?,
        user_id: row.get(1)?,
        friend_id: row.get(2)?,
        blocked: row.get(3)?,
        display_name: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn map_chat_row(row: &rusqlite::Row<'_>) -> Result<ChatRow, rusqlite::Error> {
    Ok(ChatRow {
        chat_id: row.get(0)?,
        title: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn map_message_row(row: &rusqlite::Row<'_>) -> Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        message_id: row.get(0)?,
        content: row.get(1)?,
        reply_username: row.get(2)?,
        reply_content: row.get(3)?,
        username: row.get(4)?,
        chat_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user("alice", "hash-a", "alice@example.com").unwrap();
        db.create_user("bob", "hash-b", "bob@example.com").unwrap();
        db.create_user("carol", "hash-c", "carol@example.com").unwrap();
        db
    }

    fn user_id(db: &Database, username: &str) -> i64 {
        db.get_user_by_username(username).unwrap().unwrap().user_id
    }

    fn edge_count(db: &Database) -> i64 {
        db.with_conn(|conn| {
            Ok(conn
                .query_row("SELECT COUNT(*) FROM user_friends", [], |r| r.get(0))
                .unwrap())
        })
        .unwrap()
    }

    #[test]
    fn add_friend_creates_both_edges() {
        let db = test_db();
        db.add_friend_pair("alice", "bob").unwrap();

        let alice = user_id(&db, "alice");
        let bob = user_id(&db, "bob");

        let out = db.get_friend_edge(alice, "bob").unwrap();
        let back = db.get_friend_edge(bob, "alice").unwrap();

        assert_eq!(out.friend_id, bob);
        assert_eq!(back.friend_id, alice);
        // each edge snapshots the OTHER party's name
        assert_eq!(out.display_name, "bob");
        assert_eq!(back.display_name, "alice");
        // the pair shares one timestamp
        assert_eq!(out.created_at, back.created_at);
        assert!(!out.blocked);
        assert_eq!(edge_count(&db), 2);
    }

    #[test]
    fn add_friend_to_self_fails_with_zero_rows() {
        let db = test_db();
        let err = db.add_friend_pair("alice", "alice").unwrap_err();
        assert!(matches!(err, DbError::SelfReference));
        assert_eq!(edge_count(&db), 0);
    }

    #[test]
    fn add_friend_unknown_target_fails() {
        let db = test_db();
        let err = db.add_friend_pair("alice", "nobody").unwrap_err();
        assert!(matches!(err, DbError::NotFound("user")));
        assert_eq!(edge_count(&db), 0);
    }

    #[test]
    fn add_friend_twice_fails_and_leaves_rows_unchanged() {
        let db = test_db();
        db.add_friend_pair("alice", "bob").unwrap();
        let err = db.add_friend_pair("alice", "bob").unwrap_err();
        assert!(matches!(err, DbError::AlreadyFriends));
        assert_eq!(edge_count(&db), 2);
    }

    #[test]
    fn blocking_is_asymmetric() {
        let db = test_db();
        db.add_friend_pair("alice", "bob").unwrap();

        let alice = user_id(&db, "alice");
        let bob = user_id(&db, "bob");

        db.set_friend_blocked(alice, "bob", true).unwrap();
        assert!(db.get_friend_edge(alice, "bob").unwrap().blocked);
        // bob's view of the relationship is unchanged
        assert!(!db.get_friend_edge(bob, "alice").unwrap().blocked);

        db.set_friend_blocked(alice, "bob", false).unwrap();
        assert!(!db.get_friend_edge(alice, "bob").unwrap().blocked);
    }

    #[test]
    fn block_without_edge_is_not_found() {
        let db = test_db();
        let alice = user_id(&db, "alice");
        let err = db.set_friend_blocked(alice, "bob", true).unwrap_err();
        assert!(matches!(err, DbError::NotFound("friendship")));
    }

    #[test]
    fn list_friends_returns_joined_users() {
        let db = test_db();
        db.add_friend_pair("alice", "bob").unwrap();
        db.add_friend_pair("alice", "carol").unwrap();

        let alice = user_id(&db, "alice");
        let friends = db.list_friends(alice).unwrap();
        let names: Vec<&str> = friends.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["bob", "carol"]);

        // bob only sees alice
        let bob = user_id(&db, "bob");
        assert_eq!(db.list_friends(bob).unwrap().len(), 1);
    }

    #[test]
    fn create_chat_adds_two_memberships() {
        let db = test_db();
        let chat_id = db
            .create_chat_with_members("alice", "bob", "weekend plans")
            .unwrap();

        let members = db.list_chat_members(chat_id).unwrap();
        assert_eq!(members.len(), 2);

        // no duplicate-chat detection: same pair again makes a second chat
        let other = db
            .create_chat_with_members("alice", "bob", "weekend plans")
            .unwrap();
        assert_ne!(chat_id, other);
    }

    #[test]
    fn add_member_rules() {
        let db = test_db();
        let chat_id = db.create_chat_with_members("alice", "bob", "trio").unwrap();

        assert!(matches!(
            db.add_chat_member(chat_id, "alice", "alice").unwrap_err(),
            DbError::SelfReference
        ));
        assert!(matches!(
            db.add_chat_member(chat_id, "alice", "nobody").unwrap_err(),
            DbError::NotFound("user")
        ));
        assert!(matches!(
            db.add_chat_member(chat_id, "alice", "bob").unwrap_err(),
            DbError::AlreadyMember
        ));

        db.add_chat_member(chat_id, "alice", "carol").unwrap();
        assert_eq!(db.list_chat_members(chat_id).unwrap().len(), 3);
    }

    #[test]
    fn leave_chat_cascades_only_when_last_member_leaves() {
        let db = test_db();
        let chat_id = db.create_chat_with_members("alice", "bob", "doomed").unwrap();
        let alice = user_id(&db, "alice");
        let bob = user_id(&db, "bob");

        db.insert_message("hello", None, None, "alice", chat_id).unwrap();
        db.insert_message("hi", None, None, "bob", chat_id).unwrap();

        // first leave: chat survives, messages survive
        assert!(!db.leave_chat(alice, chat_id).unwrap());
        assert!(db.get_chat(chat_id).is_ok());
        assert_eq!(db.list_messages(chat_id).unwrap().len(), 2);
        assert_eq!(db.list_chat_members(chat_id).unwrap().len(), 1);

        // last leave: chat, memberships, and messages all gone
        assert!(db.leave_chat(bob, chat_id).unwrap());
        assert!(matches!(db.get_chat(chat_id).unwrap_err(), DbError::NotFound("chat")));
        assert_eq!(db.list_chat_members(chat_id).unwrap().len(), 0);
        assert_eq!(db.list_messages(chat_id).unwrap().len(), 0);
    }

    #[test]
    fn message_insert_list_update() {
        let db = test_db();
        let chat_id = db.create_chat_with_members("alice", "bob", "talk").unwrap();

        let id = db
            .insert_message("first", Some("bob"), Some("earlier text"), "alice", chat_id)
            .unwrap();
        db.insert_message("second", None, None, "bob", chat_id).unwrap();

        let messages = db.list_messages(chat_id).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[0].reply_username.as_deref(), Some("bob"));
        assert_eq!(messages[1].reply_username, None);

        db.update_message_content(id, "edited").unwrap();
        let messages = db.list_messages(chat_id).unwrap();
        assert_eq!(messages[0].content, "edited");

        assert!(matches!(
            db.update_message_content(9999, "x").unwrap_err(),
            DbError::NotFound("message")
        ));
    }

    #[test]
    fn repeated_reads_are_stable() {
        let db = test_db();
        let chat_id = db.create_chat_with_members("alice", "bob", "stable").unwrap();
        db.insert_message("only", None, None, "alice", chat_id).unwrap();

        let first: Vec<String> = db
            .list_messages(chat_id)
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        let second: Vec<String> = db
            .list_messages(chat_id)
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn username_and_email_are_unique() {
        let db = test_db();
        assert!(db.create_user("alice", "h", "other@example.com").is_err());
        assert!(db.create_user("dave", "h", "alice@example.com").is_err());
    }

    #[test]
    fn password_and_username_updates() {
        let db = test_db();
        let alice = user_id(&db, "alice");

        db.update_password(alice, "new-hash").unwrap();
        assert_eq!(db.get_user_by_id(alice).unwrap().unwrap().password, "new-hash");

        db.update_username(alice, "alicia").unwrap();
        assert_eq!(db.get_user_by_id(alice).unwrap().unwrap().username, "alicia");
        // display_name snapshot unchanged by rename
        assert_eq!(db.get_user_by_id(alice).unwrap().unwrap().display_name, "alice");

        assert!(matches!(
            db.update_password(9999, "x").unwrap_err(),
            DbError::NotFound("user")
        ));
    }

    #[test]
    fn comment_insert() {
        let db = test_db();
        let id = db.insert_comment("fan@example.com", "love the app").unwrap();
        assert!(id > 0);
    }
}
