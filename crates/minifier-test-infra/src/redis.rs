use crate::Result;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage};

/// A disposable standalone Redis server.
pub struct RedisServer {
    _container: ContainerAsync<GenericImage>,
    url: String,
}

impl RedisServer {
    pub async fn start() -> Result<Self> {
        let container = GenericImage::new("redis", "8.6.0")
            .with_exposed_port(6379_u16.tcp())
            .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
            .start()
            .await?;

        // redis-rs may resolve "localhost" to ::1, which the port mapping
        // does not cover
        let host = match container.get_host().await?.to_string().as_str() {
            "localhost" => "127.0.0.1".to_string(),
            other => other.to_string(),
        };
        let port = container.get_host_port_ipv4(6379).await?;

        Ok(Self {
            _container: container,
            url: format!("redis://{host}:{port}"),
        })
    }

    /// `redis://host:port` for the running container.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Opens a plain client for seeding and inspecting keys directly.
    pub fn client(&self) -> Result<redis::Client> {
        Ok(redis::Client::open(self.url.as_str())?)
    }
}
