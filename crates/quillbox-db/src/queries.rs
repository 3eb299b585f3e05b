use crate::models::{NoteRow, UserRow};
use crate::{Database, StoreError};
use rusqlite::Connection;

impl Database {
    // -- Users --

    /// Insert a new user. The SELECT pre-checks give a precise duplicate
    /// error; the UNIQUE constraints still catch a concurrent duplicate
    /// insert, which is translated to the same typed errors.
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRow, StoreError> {
        self.with_conn_mut(|conn| {
            if query_user_by_email(conn, email)?.is_some() {
                return Err(StoreError::DuplicateEmail);
            }
            if query_user_by_username(conn, username)?.is_some() {
                return Err(StoreError::DuplicateUsername);
            }

            conn.execute(
                "INSERT INTO users (username, email, password) VALUES (?1, ?2, ?3)",
                (username, email, password_hash),
            )
            .map_err(translate_unique_violation)?;

            let id = conn.last_insert_rowid();
            query_user_by_id(conn, id)?.ok_or(StoreError::NotFound)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    /// Delete a user and all of their notes in one transaction.
    /// Returns the attachment references of the deleted notes so the caller
    /// can remove the files best-effort after the commit.
    pub fn delete_user(&self, user_id: i64) -> Result<Vec<String>, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let refs = {
                let mut stmt = tx.prepare(
                    "SELECT file_path FROM notes WHERE user_id = ?1 AND file_path IS NOT NULL",
                )?;
                stmt.query_map([user_id], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?
            };

            tx.execute("DELETE FROM notes WHERE user_id = ?1", [user_id])?;
            let deleted = tx.execute("DELETE FROM users WHERE id = ?1", [user_id])?;
            if deleted == 0 {
                return Err(StoreError::NotFound);
            }

            tx.commit()?;
            Ok(refs)
        })
    }

    // -- Notes --

    pub fn insert_note(
        &self,
        owner_id: i64,
        title: &str,
        content: &str,
        attachment: Option<&str>,
    ) -> Result<NoteRow, StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notes (user_id, title, content, file_path) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![owner_id, title, content, attachment],
            )?;

            let id = conn.last_insert_rowid();
            query_note(conn, id, owner_id)?.ok_or(StoreError::NotFound)
        })
    }

    pub fn list_notes_by_owner(&self, owner_id: i64) -> Result<Vec<NoteRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map([owner_id], note_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Case-insensitive substring search over title and content, always
    /// scoped to the owner. A blank query lists all of the owner's notes.
    pub fn search_notes(&self, owner_id: i64, query: &str) -> Result<Vec<NoteRow>, StoreError> {
        let query = query.trim();
        if query.is_empty() {
            return self.list_notes_by_owner(owner_id);
        }

        let pattern = format!("%{}%", escape_like(query));
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTE_COLUMNS} FROM notes
                 WHERE user_id = ?1
                   AND (title LIKE ?2 ESCAPE '\\' OR content LIKE ?2 ESCAPE '\\')
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![owner_id, pattern], note_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Delete a note, filtered by id AND owner — the double filter is the
    /// authorization check, so a note owned by someone else is NotFound.
    /// Returns the attachment reference for the caller to remove.
    pub fn delete_note(&self, note_id: i64, owner_id: i64) -> Result<Option<String>, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let attachment: Option<String> = tx
                .query_row(
                    "SELECT file_path FROM notes WHERE id = ?1 AND user_id = ?2",
                    [note_id, owner_id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or(StoreError::NotFound)?;

            tx.execute(
                "DELETE FROM notes WHERE id = ?1 AND user_id = ?2",
                [note_id, owner_id],
            )?;

            tx.commit()?;
            Ok(attachment)
        })
    }
}

const NOTE_COLUMNS: &str = "id, user_id, title, content, file_path, created_at, updated_at";

fn note_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NoteRow> {
    Ok(NoteRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        file_path: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn query_note(conn: &Connection, id: i64, owner_id: i64) -> Result<Option<NoteRow>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1 AND user_id = ?2"
    ))?;
    stmt.query_row([id, owner_id], note_from_row).optional()
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password, created_at FROM users WHERE email = ?1",
    )?;
    stmt.query_row([email], user_from_row).optional()
}

fn query_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<UserRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password, created_at FROM users WHERE username = ?1",
    )?;
    stmt.query_row([username], user_from_row).optional()
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>, StoreError> {
    let mut stmt = conn
        .prepare("SELECT id, username, email, password, created_at FROM users WHERE id = ?1")?;
    stmt.query_row([id], user_from_row).optional()
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Map a UNIQUE constraint violation from a concurrent duplicate insert to
/// the same typed errors the pre-check produces.
fn translate_unique_violation(err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(e, Some(msg)) = &err {
        if e.code == rusqlite::ErrorCode::ConstraintViolation {
            if msg.contains("users.email") {
                return StoreError::DuplicateEmail;
            }
            if msg.contains("users.username") {
                return StoreError::DuplicateUsername;
            }
        }
    }
    StoreError::Sqlite(err)
}

/// Escape LIKE metacharacters so the query matches as a literal substring.
fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, StoreError>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, StoreError> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
