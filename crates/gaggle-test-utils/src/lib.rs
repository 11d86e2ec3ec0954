//! PostgreSQL fixtures for gaggle integration tests.
//!
//! Every test gets a freshly migrated database of its own inside one shared
//! server. The server is either the one named by `GAGGLE_TEST_PG_URL` (a
//! root URL without a database name, e.g. started by a nextest setup
//! script) or a testcontainers Postgres started on first use and kept for
//! the life of the test binary.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use gaggle_db::pool;

const POSTGRES_TAG: &str = "17";

struct Server {
    root_url: String,
    _container: Option<ContainerAsync<Postgres>>,
}

static SERVER: OnceCell<Server> = OnceCell::const_new();

async fn start_server() -> Server {
    if let Ok(root_url) = std::env::var("GAGGLE_TEST_PG_URL") {
        return Server {
            root_url,
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag(POSTGRES_TAG)
        .start()
        .await
        .expect("postgres container should start");
    let host = container.get_host().await.expect("container host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("container port 5432 mapped");

    Server {
        root_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

async fn root_url() -> &'static str {
    &SERVER.get_or_init(start_server).await.root_url
}

async fn connect(url: &str, max_connections: u32) -> PgPool {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(url)
        .await
        .unwrap_or_else(|e| panic!("connect to {url}: {e}"))
}

/// Run one statement against the server's `postgres` database.
async fn admin(sql: &str) {
    let admin = connect(&format!("{}/postgres", root_url().await), 1).await;
    admin
        .execute(sql)
        .await
        .unwrap_or_else(|e| panic!("{sql}: {e}"));
    admin.close().await;
}

/// A migrated scratch database.
///
/// ```ignore
/// let db = TestDb::new().await;
/// // ... use db.pool ...
/// db.finish().await;
/// ```
///
/// `finish` drops the database. A test that panics first leaves it behind;
/// it disappears with the container.
pub struct TestDb {
    pub pool: PgPool,
    name: String,
}

impl TestDb {
    pub async fn new() -> Self {
        let name = format!("gaggle_test_{}", Uuid::new_v4().simple());
        admin(&format!("CREATE DATABASE {name}")).await;

        let pool = connect(&format!("{}/{name}", root_url().await), 5).await;
        pool::run_migrations(&pool)
            .await
            .expect("migrations should apply to a fresh database");

        Self { pool, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Close the pool and drop the database.
    pub async fn finish(self) {
        self.pool.close().await;
        admin(&format!(
            "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
             WHERE datname = '{}' AND pid <> pg_backend_pid()",
            self.name
        ))
        .await;
        admin(&format!("DROP DATABASE IF EXISTS {}", self.name)).await;
    }
}
