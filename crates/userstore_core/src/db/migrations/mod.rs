//! Ordered schema migrations for the entity store.
//!
//! # Invariants
//! - `version` values are strictly increasing.
//! - Applied version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_entities.sql"),
}];

/// Returns the latest schema version known by this build.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Reads the schema version recorded on a connection.
pub fn current_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Applies all pending migrations inside one transaction.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    apply_migration_list(conn, MIGRATIONS)
}

fn apply_migration_list(conn: &mut Connection, migrations: &[Migration]) -> DbResult<()> {
    let current = current_version(conn)?;
    let latest = migrations.last().map_or(0, |migration| migration.version);

    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in migrations.iter().filter(|m| m.version > current) {
        let step = |sql: &str| {
            tx.execute_batch(sql).map_err(|source| DbError::Migration {
                version: migration.version,
                source,
            })
        };
        step(migration.sql)?;
        step(format!("PRAGMA user_version = {};", migration.version).as_str())?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from={current} to={latest}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_migration_list, current_version, Migration};
    use crate::db::DbError;
    use rusqlite::Connection;

    const BROKEN: &[Migration] = &[
        Migration {
            version: 1,
            sql: "CREATE TABLE first (id INTEGER);",
        },
        Migration {
            version: 2,
            sql: "CREATE TABLE broken (;",
        },
    ];

    #[test]
    fn failed_migration_reports_version_and_rolls_back() {
        let mut conn = Connection::open_in_memory().unwrap();

        let err = apply_migration_list(&mut conn, BROKEN).unwrap_err();
        assert!(matches!(err, DbError::Migration { version: 2, .. }));
        assert!(err.to_string().starts_with("entity store migration 2 failed:"));

        assert_eq!(current_version(&conn).unwrap(), 0);
        let first_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE name = 'first');",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(!first_exists);
    }

    #[test]
    fn migrations_resume_from_recorded_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA user_version = 1;").unwrap();

        // Version 1 is skipped, so only the broken step runs.
        let err = apply_migration_list(&mut conn, BROKEN).unwrap_err();
        assert!(matches!(err, DbError::Migration { version: 2, .. }));

        apply_migration_list(&mut conn, &BROKEN[..1]).unwrap();
        assert_eq!(current_version(&conn).unwrap(), 1);
    }
}
