use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const STORAGE_BACKEND_ENV: &str = "MINIFIER_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "MINIFIER_MYSQL_DSN";
pub const CACHE_BACKEND_ENV: &str = "MINIFIER_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "MINIFIER_REDIS_URL";
pub const NODE_ID_ENV: &str = "MINIFIER_NODE_ID";
pub const DEFAULT_LIFETIME_ENV: &str = "MINIFIER_DEFAULT_LIFETIME";
pub const LOG_FORMAT_ENV: &str = "MINIFIER_LOG_FORMAT";

pub const DEFAULT_LIFETIME: &str = "24h";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "none")]
    None,
    #[value(name = "memory")]
    Memory,
    #[value(name = "redis")]
    Redis,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::None => write!(f, "none"),
            CacheBackendArg::Memory => write!(f, "memory"),
            CacheBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl Display for LogFormatArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormatArg::Text => write!(f, "text"),
            LogFormatArg::Json => write!(f, "json"),
        }
    }
}

/// Accepts friendly (`90m`, `1h 30m`) and ISO 8601 (`PT1H`) durations.
fn parse_lifetime(value: &str) -> Result<Duration, String> {
    let signed: jiff::SignedDuration = value.parse().map_err(|e| format!("{e}"))?;
    Duration::try_from(signed).map_err(|_| format!("lifetime must not be negative: {value}"))
}

#[derive(Debug, Parser)]
#[command(name = "minifier", version, about = "Create and resolve short URLs")]
pub struct CLI {
    #[command(flatten)]
    pub backend: BackendArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct BackendArgs {
    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::Memory
    )]
    pub cache: CacheBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("cache", "redis"))]
    pub redis_url: Option<String>,

    /// Snowflake node id, unique per running instance (0-1023).
    #[arg(long, env = NODE_ID_ENV, default_value_t = 0)]
    pub node_id: u16,

    /// Lifetime of links created without `--expires-in`.
    #[arg(
        long,
        env = DEFAULT_LIFETIME_ENV,
        default_value = DEFAULT_LIFETIME,
        value_parser = parse_lifetime
    )]
    pub default_lifetime: Duration,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(flatten)]
    Op(Operation),
    /// Read commands from stdin, one per line, against a single catalog.
    Shell,
}

#[derive(Debug, Subcommand)]
pub enum Operation {
    /// Shorten a URL.
    Create {
        long_url: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        alias: Option<String>,
        #[arg(long, value_parser = parse_lifetime)]
        expires_in: Option<Duration>,
    },
    /// Resolve a short code.
    Get { code: String },
    /// Delete a record by id.
    Delete {
        id: String,
        #[arg(long)]
        owner: String,
    },
    /// List an owner's live records.
    List { owner: String },
}

/// One line of `minifier shell` input.
#[derive(Debug, Parser)]
#[command(name = "minifier", no_binary_name = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub op: Operation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_formats() {
        assert_eq!(parse_lifetime("24h").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_lifetime("PT90M").unwrap(), Duration::from_secs(5_400));
        assert!(parse_lifetime("-1h").is_err());
        assert!(parse_lifetime("soon").is_err());
    }

    #[test]
    fn shell_lines_parse_operations() {
        let line = ShellLine::try_parse_from(
            "create https://example.com --owner u1 --alias promo".split_whitespace(),
        )
        .unwrap();

        match line.op {
            Operation::Create {
                long_url,
                owner,
                alias,
                expires_in,
            } => {
                assert_eq!(long_url, "https://example.com");
                assert_eq!(owner, "u1");
                assert_eq!(alias.as_deref(), Some("promo"));
                assert_eq!(expires_in, None);
            }
            other => panic!("unexpected operation: {other:?}"),
        }
    }

    #[test]
    fn mysql_requires_dsn() {
        let err = CLI::try_parse_from(["minifier", "--storage", "mysql", "list", "u1"]);
        assert!(err.is_err());
    }
}
