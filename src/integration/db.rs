use std::env;

use diesel::PgConnection;
use diesel::connection::SimpleConnection;
use diesel::r2d2::ConnectionManager;
use log::info;

pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

const SCHEMA: &str = include_str!("../../migrations/00000000000000_init/up.sql");

#[derive(Clone)]
pub struct Config {
    host: String,
    port: u16,
    user: String,
    password: String,
    db: String,
    pool_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 5432,
            user: String::from("postgres"),
            password: String::from("postgres"),
            db: String::from("postgres"),
            pool_size: 10,
        }
    }
}

impl Config {
    pub fn env() -> super::Result<Self> {
        let host = env::var("PG_HOST")?;
        let port = env::var("PG_PORT")?.parse()?;
        let user = env::var("PG_USER")?;
        let password = env::var("PG_PASSWORD")?;
        let db = env::var("PG_DB")?;
        let pool_size = env::var("PG_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            host,
            port,
            user,
            password,
            db,
            pool_size,
        })
    }

    /// Default credentials against an arbitrary host, as exposed by a disposable container.
    pub fn at(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            pool_size: 4,
            ..Self::default()
        }
    }

    fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.db
        )
    }

    pub fn connect(&self) -> super::Result<Pool> {
        let manager = ConnectionManager::<PgConnection>::new(self.url());
        let pool = r2d2::Pool::builder()
            .max_size(self.pool_size)
            .build(manager)?;

        Ok(pool)
    }

    /// Connects and brings the schema up to date.
    pub fn init(&self) -> super::Result<Pool> {
        let pool = self.connect()?;
        migrate(&pool)?;
        info!("connected to postgres at {}:{}/{}", self.host, self.port, self.db);
        Ok(pool)
    }

    #[cfg(test)]
    pub async fn test(
        node: &testcontainers_modules::testcontainers::ContainerAsync<
            testcontainers_modules::postgres::Postgres,
        >,
    ) -> Self {
        let host = node.get_host().await.unwrap().to_string();
        let port = node.get_host_port_ipv4(5432).await.unwrap();
        Self::at(host, port)
    }
}

pub fn migrate(pool: &Pool) -> super::Result<()> {
    let mut conn = pool.get()?;
    conn.batch_execute(SCHEMA)?;
    Ok(())
}
