mod cli;

use crate::cli::{
    BackendArgs, CacheBackendArg, Command, LogFormatArg, Operation, ShellLine, StorageBackendArg,
    CLI,
};
use anyhow::Context;
use clap::Parser;
use minifier_cache::{MokaLookupCache, NullCache, RedisLookupCache};
use minifier_catalog::{CatalogConfig, CreateUrlRequest, UrlCatalog};
use minifier_core::{LookupCache, RecordId, RecordStore};
use minifier_snowflake::{Snowflake, SnowflakeSettings};
use minifier_storage::{InMemoryRecordStore, MySqlRecordStore};
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type Catalog = UrlCatalog<dyn RecordStore, dyn LookupCache>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.backend.log_format);

    info!(
        storage_backend = %config.backend.storage,
        cache_backend = %config.backend.cache,
        node_id = config.backend.node_id,
        "starting minifier"
    );

    let catalog = build_catalog(&config.backend).await?;

    let outcome = match config.command {
        Command::Op(op) => run(&catalog, op).await,
        Command::Shell => shell(&catalog).await,
    };

    catalog.close().await?;
    outcome
}

fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormatArg::Text => subscriber.init(),
        LogFormatArg::Json => subscriber.json().init(),
    }
}

async fn build_catalog(backend: &BackendArgs) -> anyhow::Result<Catalog> {
    let store: Arc<dyn RecordStore> = match backend.storage {
        StorageBackendArg::InMemory => Arc::new(InMemoryRecordStore::new()),
        StorageBackendArg::Mysql => {
            let dsn = backend
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let store = MySqlRecordStore::connect(dsn).await?;
            store.ensure_schema().await?;
            Arc::new(store)
        }
    };

    let cache: Arc<dyn LookupCache> = match backend.cache {
        CacheBackendArg::None => Arc::new(NullCache::new()),
        CacheBackendArg::Memory => Arc::new(MokaLookupCache::new()),
        CacheBackendArg::Redis => {
            let url = backend
                .redis_url
                .as_deref()
                .context("redis url is required when cache backend is redis")?;
            Arc::new(RedisLookupCache::connect(url).await?)
        }
    };

    let ids = Snowflake::new(SnowflakeSettings::builder().node_id(backend.node_id).build())
        .context("invalid snowflake settings")?;

    let catalog = UrlCatalog::from_shared(store, cache)?
        .with_id_source(Arc::new(ids))
        .with_config(
            CatalogConfig::builder()
                .default_lifetime(backend.default_lifetime)
                .build(),
        );

    Ok(catalog)
}

async fn run(catalog: &Catalog, op: Operation) -> anyhow::Result<()> {
    match op {
        Operation::Create {
            long_url,
            owner,
            alias,
            expires_in,
        } => {
            let request = CreateUrlRequest {
                long_url,
                owner_id: owner,
                custom_alias: alias,
                expires_in,
            };
            let record = catalog.create_url(request).await?;
            print_json(&record)
        }
        Operation::Get { code } => {
            let record = catalog.get_url(&code).await?;
            print_json(&record)
        }
        Operation::Delete { id, owner } => {
            catalog.delete_url(&RecordId::new(&id), &owner).await?;
            print_json(&json!({ "deleted": id }))
        }
        Operation::List { owner } => {
            let records = catalog.list_user_urls(&owner).await?;
            print_json(&records)
        }
    }
}

/// Runs one operation per stdin line until EOF or `exit`.
///
/// Failed lines are reported on stderr and do not end the session.
async fn shell(catalog: &Catalog) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "exit" | "quit" => break,
            _ => {}
        }

        let parsed = match ShellLine::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        if let Err(e) = run(catalog, parsed.op).await {
            eprintln!("error: {e}");
        }
    }

    debug!("shell input closed");
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
