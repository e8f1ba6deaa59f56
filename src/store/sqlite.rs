use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use indexmap::IndexMap;
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::distro::types::{Package, PackageMetadata, Source};
use crate::store::error::StoreError;
use crate::store::state::{PackageRecord, SourceRecord, StateStore, StoredState};

/// Schema migrations
/// Each version contains a list of SQL statements to execute
const MIGRATIONS: &[&[&str]] = &[
    // v1: descriptive package metadata
    &[
        "ALTER TABLE packages ADD COLUMN homepage_url TEXT",
        "ALTER TABLE packages ADD COLUMN license TEXT",
        "ALTER TABLE packages ADD COLUMN category TEXT",
        "ALTER TABLE packages ADD COLUMN summary TEXT",
        "ALTER TABLE packages ADD COLUMN description TEXT",
    ],
    // v2: lookup of packages by owning source
    &["CREATE INDEX IF NOT EXISTS idx_packages_source_name ON packages(source_name)"],
    // v3: upstream tracked per source, seeded from its packages
    &[
        "ALTER TABLE sources ADD COLUMN upstream_version TEXT",
        "ALTER TABLE sources ADD COLUMN upstream_repository TEXT",
        r#"
        UPDATE sources SET
            upstream_version = (
                SELECT p.upstream_version FROM packages p
                WHERE p.source_name = sources.name AND p.upstream_version IS NOT NULL
                ORDER BY p.name LIMIT 1
            ),
            upstream_repository = (
                SELECT p.upstream_repository FROM packages p
                WHERE p.source_name = sources.name AND p.upstream_version IS NOT NULL
                ORDER BY p.name LIMIT 1
            )
        WHERE upstream_version IS NULL
        "#,
    ],
];

const SOURCE_COLUMNS: &str = "name, local_version, upstream_version, upstream_repository";

const PACKAGE_COLUMNS: &str = "name, source_name, local_version, maintainer, upstream_version, \
     upstream_repository, homepage_url, license, category, summary, description";

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        info!("Opening state database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        debug!("Database connection established");

        let store = Self {
            conn: Mutex::new(conn),
        };

        store.create_schema()?;
        info!("State database ready");

        Ok(store)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn create_schema(&self) -> Result<(), StoreError> {
        debug!("Creating database schema");

        let conn = self.lock_conn()?;

        // Create base tables (without migration columns)
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sources (
                name TEXT PRIMARY KEY NOT NULL,
                local_version TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS packages (
                name TEXT PRIMARY KEY NOT NULL,
                source_name TEXT NOT NULL,
                local_version TEXT NOT NULL,
                maintainer TEXT,
                upstream_version TEXT,
                upstream_repository TEXT,
                FOREIGN KEY (source_name) REFERENCES sources(name) ON DELETE CASCADE
            )
            "#,
            [],
        )?;

        Self::apply_migrations(&conn)?;

        debug!("Database schema created successfully");
        Ok(())
    }

    /// Apply pending migrations based on user_version pragma
    fn apply_migrations(conn: &Connection) -> Result<(), StoreError> {
        let current_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        for (i, statements) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                for sql in *statements {
                    // Databases written by hand or by older tools may already
                    // carry the column
                    match conn.execute(sql, []) {
                        Ok(_) => {}
                        Err(rusqlite::Error::SqliteFailure(_, Some(ref msg)))
                            if msg.contains("duplicate column name") =>
                        {
                            debug!("Column already exists, skipping: {}", sql);
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                debug!("Applied migration v{}", version);
            }
        }

        let target_version = MIGRATIONS.len() as i32;
        if target_version > current_version {
            conn.pragma_update(None, "user_version", target_version)?;
            debug!("Updated schema version to v{}", target_version);
        }

        Ok(())
    }

    fn package_from_row(row: &Row<'_>) -> rusqlite::Result<PackageRecord> {
        Ok(PackageRecord {
            name: row.get(0)?,
            source_name: row.get(1)?,
            local_version: row.get(2)?,
            maintainer: row.get(3)?,
            upstream_version: row.get(4)?,
            upstream_repository: row.get(5)?,
            metadata: PackageMetadata {
                homepage_url: row.get(6)?,
                license: row.get(7)?,
                category: row.get(8)?,
                summary: row.get(9)?,
                description: row.get(10)?,
            },
        })
    }

    fn source_from_row(row: &Row<'_>) -> rusqlite::Result<SourceRecord> {
        Ok(SourceRecord {
            name: row.get(0)?,
            local_version: row.get(1)?,
            upstream_version: row.get(2)?,
            upstream_repository: row.get(3)?,
        })
    }

    fn query_packages<P: rusqlite::Params>(
        &self,
        filter: &str,
        params: P,
    ) -> Result<Vec<PackageRecord>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages {filter} ORDER BY name"
        ))?;

        let packages = stmt
            .query_map(params, Self::package_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(packages)
    }
}

impl StateStore for Store {
    fn load_state(&self) -> Result<StoredState, StoreError> {
        let sources: IndexMap<String, SourceRecord> = {
            let conn = self.lock_conn()?;
            let mut stmt =
                conn.prepare(&format!("SELECT {SOURCE_COLUMNS} FROM sources ORDER BY name"))?;
            let rows = stmt
                .query_map([], Self::source_from_row)?
                .map(|r| r.map(|s| (s.name.clone(), s)))
                .collect::<Result<IndexMap<_, _>, _>>()?;
            rows
        };

        let packages = self
            .query_packages("", [])?
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();

        Ok(StoredState { sources, packages })
    }

    fn upsert_source(&self, source: &Source) -> Result<(), StoreError> {
        debug!("Recording source {} at {}", source.name, source.version);

        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO sources (name, local_version) VALUES (?1, ?2)
            ON CONFLICT(name) DO UPDATE SET local_version = excluded.local_version
            "#,
            (&source.name, &source.version),
        )?;

        Ok(())
    }

    fn remove_source(&self, name: &str) -> Result<usize, StoreError> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let packages = tx.execute("DELETE FROM packages WHERE source_name = ?1", [name])?;
        tx.execute("DELETE FROM sources WHERE name = ?1", [name])?;

        tx.commit()?;

        debug!("Deleted source {} with {} packages", name, packages);
        Ok(packages)
    }

    fn upsert_package(&self, package: &Package) -> Result<(), StoreError> {
        debug!(
            "Recording package {} ({}) at {}",
            package.name, package.source, package.version
        );

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let source_exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM sources WHERE name = ?1)",
            [&package.source],
            |row| row.get(0),
        )?;
        if !source_exists {
            return Err(StoreError::MissingSource(package.source.clone()));
        }

        let metadata = &package.metadata;
        tx.execute(
            r#"
            INSERT INTO packages (
                name, source_name, local_version, maintainer,
                homepage_url, license, category, summary, description
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(name) DO UPDATE SET
                source_name = excluded.source_name,
                local_version = excluded.local_version,
                maintainer = excluded.maintainer,
                homepage_url = excluded.homepage_url,
                license = excluded.license,
                category = excluded.category,
                summary = excluded.summary,
                description = excluded.description
            "#,
            (
                &package.name,
                &package.source,
                &package.version,
                &package.maintainer,
                &metadata.homepage_url,
                &metadata.license,
                &metadata.category,
                &metadata.summary,
                &metadata.description,
            ),
        )?;

        tx.commit()?;
        Ok(())
    }

    fn remove_package(&self, name: &str) -> Result<bool, StoreError> {
        let conn = self.lock_conn()?;
        let rows = conn.execute("DELETE FROM packages WHERE name = ?1", [name])?;
        debug!("Deleted package {} ({} rows)", name, rows);
        Ok(rows > 0)
    }

    fn record_upstream(
        &self,
        source_name: &str,
        version: &str,
        repository: &str,
    ) -> Result<usize, StoreError> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            UPDATE sources SET upstream_version = ?1, upstream_repository = ?2
            WHERE name = ?3
            "#,
            (version, repository, source_name),
        )?;
        let rows = tx.execute(
            r#"
            UPDATE packages SET upstream_version = ?1, upstream_repository = ?2
            WHERE source_name = ?3
            "#,
            (version, repository, source_name),
        )?;

        tx.commit()?;

        debug!(
            "Recorded upstream {} ({}) for {} and {} of its packages",
            version, repository, source_name, rows
        );
        Ok(rows)
    }

    fn source(&self, name: &str) -> Result<Option<SourceRecord>, StoreError> {
        let conn = self.lock_conn()?;
        let source = conn
            .query_row(
                &format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE name = ?1"),
                [name],
                Self::source_from_row,
            )
            .optional()?;

        Ok(source)
    }

    fn package(&self, name: &str) -> Result<Option<PackageRecord>, StoreError> {
        let conn = self.lock_conn()?;
        let package = conn
            .query_row(
                &format!("SELECT {PACKAGE_COLUMNS} FROM packages WHERE name = ?1"),
                [name],
                Self::package_from_row,
            )
            .optional()?;

        Ok(package)
    }

    fn packages_by_source(&self, source_name: &str) -> Result<Vec<PackageRecord>, StoreError> {
        self.query_packages("WHERE source_name = ?1", [source_name])
    }

    fn search_sources(&self, term: &str) -> Result<Vec<SourceRecord>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SOURCE_COLUMNS} FROM sources WHERE instr(name, ?1) > 0 ORDER BY name"
        ))?;

        let sources = stmt
            .query_map([term], Self::source_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sources)
    }

    fn packages_missing_maintainer(&self) -> Result<Vec<PackageRecord>, StoreError> {
        self.query_packages("WHERE maintainer IS NULL OR maintainer = ''", [])
    }
}
