//! Scratch Postgres databases for integration tests.
//!
//! [`ScratchDb::from_env`] creates a `whut_test_<uuid>` database on the server named by
//! `WHUT_PG_DSN` and hands back a [`Db`] with the schema already applied. Call
//! [`ScratchDb::finish`] at the end of a test; a scratch database that is dropped unfinished is
//! removed from a helper thread.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

use whut_config::Postgres;
use whut_storage::db::Db;

pub const DSN_ENV: &str = "WHUT_PG_DSN";

/// Databases tried, in order, for `CREATE DATABASE` and `DROP DATABASE`.
const MAINTENANCE_DATABASES: [&str; 2] = ["postgres", "template1"];
const POOL_MAX_CONNS: u32 = 2;

pub struct ScratchDb {
	db: Db,
	name: String,
	maintenance: PgConnectOptions,
	dropped: bool,
}
impl ScratchDb {
	/// `Ok(None)` when `WHUT_PG_DSN` is unset, so callers can skip.
	pub async fn from_env() -> Result<Option<Self>> {
		match env::var(DSN_ENV) {
			Ok(dsn) => Self::create(&dsn).await.map(Some),
			Err(_) => Ok(None),
		}
	}

	pub async fn create(server_dsn: &str) -> Result<Self> {
		let server = PgConnectOptions::from_str(server_dsn)
			.map_err(|err| Error::Dsn { message: err.to_string() })?;
		let (maintenance, mut conn) = maintenance_connection(&server).await?;
		let name = format!("whut_test_{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str()).await?;

		let cfg = Postgres {
			dsn: server.database(&name).to_url_lossy().to_string(),
			pool_max_conns: POOL_MAX_CONNS,
		};

		match bootstrap(&cfg).await {
			Ok(db) => Ok(Self { db, name, maintenance, dropped: false }),
			Err(err) => {
				if let Err(cleanup) = drop_database(&maintenance, &name).await {
					eprintln!("Failed to drop {name} after bootstrap failure: {cleanup}.");
				}

				Err(err)
			},
		}
	}

	/// Connected handle with `preferences` and `sent_items` in place.
	pub fn db(&self) -> &Db {
		&self.db
	}

	pub async fn finish(mut self) -> Result<()> {
		self.db.pool.close().await;
		drop_database(&self.maintenance, &self.name).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for ScratchDb {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let name = self.name.clone();
		let maintenance = self.maintenance.clone();
		// The test's runtime may be shutting down here, so cleanup runs on a fresh one.
		let worker = thread::spawn(move || {
			let outcome = Builder::new_current_thread()
				.enable_all()
				.build()
				.map_err(|err| err.to_string())
				.and_then(|runtime| {
					runtime.block_on(drop_database(&maintenance, &name)).map_err(|err| err.to_string())
				});

			if let Err(err) = outcome {
				eprintln!("Failed to drop scratch database {name}: {err}.");
			}
		});

		let _ = worker.join();
	}
}

async fn bootstrap(cfg: &Postgres) -> Result<Db> {
	let db = Db::connect(cfg).await?;

	db.ensure_schema().await?;

	Ok(db)
}

async fn maintenance_connection(
	server: &PgConnectOptions,
) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in MAINTENANCE_DATABASES {
		let options = server.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last_err = Some(err),
		}
	}

	Err(Error::Maintenance {
		message: last_err.map_or_else(|| "no database tried".to_string(), |err| err.to_string()),
	})
}

async fn drop_database(maintenance: &PgConnectOptions, name: &str) -> Result<()> {
	let mut conn = PgConnection::connect_with(maintenance).await?;

	// Pools left open by a failed test would otherwise block the drop.
	if let Err(err) =
		sqlx::query("SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = $1")
			.bind(name)
			.execute(&mut conn)
			.await
	{
		eprintln!("Failed to terminate sessions on {name}: {err}.");
	}

	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str()).await?;

	Ok(())
}
