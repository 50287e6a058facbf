//! Generic single-column accessor over every entity kind.
//!
//! # Responsibility
//! - Read one column of one row and coerce it through the coercion kernel.
//! - Write one column of one row with no-op short-circuiting.
//! - Refresh `DateModified` for kinds that track it.
//!
//! # Invariants
//! - Table, key and column identifiers come only from `KindDescriptor`.
//! - A write whose stored value already equals the new value touches nothing,
//!   including the modification timestamp.
//! - Coercion failures are returned, never replaced with a zero value.
//! - Nothing is retried; callers decide.

use crate::db::DbError;
use crate::model::coerce::{coerce, CoercionError, RawValue, Scalar};
use crate::model::columns;
use crate::model::ids::{EntityId, EntityKind, KindDescriptor};
use log::debug;
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AccessResult<T> = Result<T, AccessError>;

/// Error taxonomy of the entity layer.
#[derive(Debug)]
pub enum AccessError {
    /// Identifier has no backing row (or is the reserved zero id).
    NotFound { kind: EntityKind, id: i64 },
    /// Column exists but holds NULL and a non-optional value was requested.
    NullValue {
        kind: EntityKind,
        id: i64,
        column: String,
    },
    /// Stored representation has no conversion to the requested type.
    InvalidType {
        kind: EntityKind,
        id: i64,
        column: String,
        error: CoercionError,
    },
    /// Stored value was clamped to fit the requested type.
    Lossy {
        kind: EntityKind,
        id: i64,
        column: String,
        error: CoercionError,
    },
    /// Caller asked for something the metadata or catalogs do not allow.
    InvalidConfiguration(String),
    /// Persisted row cannot be mapped into a snapshot.
    InvalidData(String),
    /// Connection schema is not at the migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    Db(DbError),
}

impl AccessError {
    pub(crate) fn coercion(kind: EntityKind, id: i64, column: &str, error: CoercionError) -> Self {
        match error {
            CoercionError::InvalidType { .. } => Self::InvalidType {
                kind,
                id,
                column: column.to_string(),
                error,
            },
            CoercionError::Lossy { .. } => Self::Lossy {
                kind,
                id,
                column: column.to_string(),
                error,
            },
        }
    }

    /// Whether a display path may substitute a default and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NullValue { .. })
    }
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::NullValue { kind, id, column } => {
                write!(f, "{kind} {id} column `{column}` is null")
            }
            Self::InvalidType {
                kind,
                id,
                column,
                error,
            } => write!(f, "{kind} {id} column `{column}`: {error}"),
            Self::Lossy {
                kind,
                id,
                column,
                error,
            } => write!(f, "{kind} {id} column `{column}`: {error}"),
            Self::InvalidConfiguration(message) => write!(f, "invalid configuration: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "inventory requires schema version {expected_version}, got {actual_version}"
            ),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidType { error, .. } | Self::Lossy { error, .. } => Some(error),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for AccessError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for AccessError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result of one `set` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOutcome {
    /// `false` when the stored value already matched.
    pub changed: bool,
    /// Re-read `DateModified` after a change, for kinds that track it.
    pub modified: Option<String>,
}

impl SetOutcome {
    fn unchanged() -> Self {
        Self {
            changed: false,
            modified: None,
        }
    }
}

/// Generic column accessor bound to one connection.
#[derive(Debug, Clone, Copy)]
pub struct ColumnAccessor<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ColumnAccessor<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Reads a non-optional scalar.
    ///
    /// # Errors
    /// - `NotFound` when the row does not exist.
    /// - `NullValue` when the column holds NULL.
    /// - `InvalidType` / `Lossy` from the coercion kernel.
    pub fn get<T: Scalar, I: EntityId>(&self, id: I, column: &str) -> AccessResult<T> {
        self.get_value(I::KIND, id.raw(), column)
    }

    /// Reads a nullable scalar; NULL becomes `None`.
    pub fn get_opt<T: Scalar, I: EntityId>(&self, id: I, column: &str) -> AccessResult<Option<T>> {
        self.get_opt_value(I::KIND, id.raw(), column)
    }

    /// Writes one scalar. See `set_value`.
    pub fn set<I: EntityId>(
        &self,
        id: I,
        column: &str,
        value: impl Into<RawValue>,
    ) -> AccessResult<SetOutcome> {
        self.set_value(I::KIND, id.raw(), column, &value.into())
    }

    pub fn get_value<T: Scalar>(&self, kind: EntityKind, id: i64, column: &str) -> AccessResult<T> {
        let raw = self.get_raw(kind, id, column)?;
        let coerced = coerce::<T>(&raw).map_err(|err| AccessError::coercion(kind, id, column, err))?;
        if coerced.is_null {
            return Err(AccessError::NullValue {
                kind,
                id,
                column: column.to_string(),
            });
        }
        Ok(coerced.value)
    }

    pub fn get_opt_value<T: Scalar>(
        &self,
        kind: EntityKind,
        id: i64,
        column: &str,
    ) -> AccessResult<Option<T>> {
        let raw = self.get_raw(kind, id, column)?;
        let coerced = coerce::<T>(&raw).map_err(|err| AccessError::coercion(kind, id, column, err))?;
        Ok(coerced.into_option())
    }

    /// Reads the uncoerced stored value.
    pub fn get_raw(&self, kind: EntityKind, id: i64, column: &str) -> AccessResult<RawValue> {
        let descriptor = kind.descriptor();
        let column = checked_column(descriptor, column)?;
        if id == 0 {
            return Err(AccessError::NotFound { kind, id });
        }

        let sql = format!(
            "SELECT \"{column}\" FROM \"{}\" WHERE \"{}\" = ?1;",
            descriptor.table, descriptor.key_column
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(RawValue::from(row.get_ref(0)?)),
            None => Err(AccessError::NotFound { kind, id }),
        }
    }

    /// Conditionally writes one column.
    ///
    /// The update only applies when the stored value differs (`IS NOT`, so
    /// NULL compares as a value). On an applied change for kinds tracking
    /// modification, `DateModified` is bumped in the same statement and
    /// re-read into the outcome.
    ///
    /// # Errors
    /// - `InvalidConfiguration` for unknown, protected or read-only columns.
    /// - `NotFound` when the row does not exist.
    pub fn set_value(
        &self,
        kind: EntityKind,
        id: i64,
        column: &str,
        value: &RawValue,
    ) -> AccessResult<SetOutcome> {
        let descriptor = kind.descriptor();
        if descriptor.read_only {
            return Err(AccessError::InvalidConfiguration(format!(
                "`{}` is a read-only catalog",
                descriptor.table
            )));
        }
        let column = checked_column(descriptor, column)?;
        if !descriptor.is_writable(column) {
            return Err(AccessError::InvalidConfiguration(format!(
                "column `{column}` of `{}` cannot be written",
                descriptor.table
            )));
        }
        if id == 0 {
            return Err(AccessError::NotFound { kind, id });
        }

        let touch_modified = if descriptor.tracks_modified {
            format!(
                ", \"{}\" = strftime('%Y-%m-%d %H:%M:%f', 'now')",
                columns::item::DATE_MODIFIED
            )
        } else {
            String::new()
        };
        let sql = format!(
            "UPDATE \"{table}\" SET \"{column}\" = ?1{touch_modified}
             WHERE \"{key}\" = ?2 AND \"{column}\" IS NOT ?1;",
            table = descriptor.table,
            key = descriptor.key_column,
        );
        let changed = self.conn.execute(&sql, params![value, id])?;

        if changed == 0 {
            if !self.exists(kind, id)? {
                return Err(AccessError::NotFound { kind, id });
            }
            debug!(
                "event=column_set module=accessor status=noop kind={} id={} column={}",
                kind, id, column
            );
            return Ok(SetOutcome::unchanged());
        }

        let modified = if descriptor.tracks_modified {
            Some(self.get_value::<String>(kind, id, columns::item::DATE_MODIFIED)?)
        } else {
            None
        };
        debug!(
            "event=column_set module=accessor status=ok kind={} id={} column={}",
            kind, id, column
        );
        Ok(SetOutcome {
            changed: true,
            modified,
        })
    }

    /// Whether a row exists for `id`.
    pub fn exists(&self, kind: EntityKind, id: i64) -> AccessResult<bool> {
        if id == 0 {
            return Ok(false);
        }
        let descriptor = kind.descriptor();
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM \"{}\" WHERE \"{}\" = ?1);",
            descriptor.table, descriptor.key_column
        );
        let exists: i64 = self.conn.query_row(&sql, [id], |row| row.get(0))?;
        Ok(exists == 1)
    }
}

fn checked_column(descriptor: &KindDescriptor, column: &str) -> AccessResult<&'static str> {
    descriptor
        .columns
        .iter()
        .find(|known| **known == column)
        .copied()
        .ok_or_else(|| {
            AccessError::InvalidConfiguration(format!(
                "unknown column `{column}` for table `{}`",
                descriptor.table
            ))
        })
}
