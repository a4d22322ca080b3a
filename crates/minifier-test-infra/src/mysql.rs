use crate::{Result, TestInfraError};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

/// How the MySQL fixture is provisioned.
#[derive(Debug, Clone, TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = "minifier".to_string(), setter(into))]
    database: String,
    #[builder(default = "minifier".to_string(), setter(into))]
    credentials: String,
    /// DDL executed once the server accepts connections.
    #[builder(default, setter(strip_option))]
    schema: Option<&'static str>,
    #[builder(default = 5)]
    max_connections: u32,
    /// The server logs "ready" before the user database is usable, so the
    /// first connections are retried.
    #[builder(default = 20)]
    connect_attempts: u32,
}

/// A disposable MySQL server with a connected pool and, optionally, a schema
/// already in place. Dropping the fixture stops the container.
pub struct MySqlServer {
    _container: ContainerAsync<GenericImage>,
    database_url: String,
    pool: MySqlPool,
}

impl MySqlServer {
    pub async fn start(config: MysqlConfig) -> Result<Self> {
        let container = GenericImage::new("mysql", "8.4")
            .with_exposed_port(3306_u16.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_DATABASE", config.database.as_str())
            .with_env_var("MYSQL_USER", config.credentials.as_str())
            .with_env_var("MYSQL_PASSWORD", config.credentials.as_str())
            .with_env_var("MYSQL_ROOT_PASSWORD", "root")
            .start()
            .await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(3306).await?;
        let database_url = format!(
            "mysql://{user}:{user}@{host}:{port}/{db}",
            user = config.credentials,
            db = config.database
        );

        let pool = connect(&database_url, &config).await?;
        if let Some(schema) = config.schema {
            sqlx::query(schema)
                .execute(&pool)
                .await
                .map_err(TestInfraError::Schema)?;
        }

        Ok(Self {
            _container: container,
            database_url,
            pool,
        })
    }

    /// A pool over the fixture's database, ready for queries.
    pub fn pool(&self) -> MySqlPool {
        self.pool.clone()
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

async fn connect(url: &str, config: &MysqlConfig) -> Result<MySqlPool> {
    let mut last_error = String::new();

    for _ in 0..config.connect_attempts {
        match MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(err) => {
                last_error = err.to_string();
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    Err(TestInfraError::Unreachable {
        service: "mysql",
        attempts: config.connect_attempts,
        message: last_error,
    })
}
