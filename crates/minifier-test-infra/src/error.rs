use thiserror::Error;

/// Why a test container could not be brought up.
#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("container failed: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("{service} not reachable after {attempts} attempts: {message}")]
    Unreachable {
        service: &'static str,
        attempts: u32,
        message: String,
    },

    #[error("failed to apply schema: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("redis client failed: {0}")]
    Redis(#[from] redis::RedisError),
}

pub type Result<T> = std::result::Result<T, TestInfraError>;
