use evm_storage_map::cli::Cli;
use evm_storage_map::output;
use evm_storage_map::{CachedWordReader, PathSegment, RpcWordReader, StorageLayout, StorageResolver, WordReader};

use clap::Parser;
use eyre::{eyre, WrapErr};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Main entry point for the storage decoder
#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Logs go to stderr so `--json` output stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let json = std::fs::read_to_string(&cli.layout)
        .wrap_err_with(|| format!("failed to read layout {}", cli.layout.display()))?;
    let layout = StorageLayout::from_json(&json, cli.contract.as_deref())
        .wrap_err_with(|| format!("invalid storage layout {}", cli.layout.display()))?;
    debug!(target: "storage_map", variables = layout.len(), "layout loaded");

    if cli.list {
        output::print_variables(&layout);
        return Ok(());
    }

    let address = cli.address.ok_or_else(|| eyre!("--address is required"))?;
    let variable = cli.variable.as_deref().ok_or_else(|| eyre!("a variable name is required"))?;
    let rpc = RpcWordReader::new(cli.rpc_config())?;

    match cli.cache_config() {
        Some(cache) => {
            let resolver = StorageResolver::new(layout, CachedWordReader::new(rpc, cache), address)
                .with_config(cli.resolver_config());
            decode(&resolver, variable, &cli.path, cli.json).await?;
            let stats = resolver.reader().stats();
            debug!(target: "storage_map", hits = stats.hits, misses = stats.misses, "cache");
            if !cli.json && tracing::enabled!(tracing::Level::DEBUG) {
                output::print_cache_stats(&stats);
            }
        }
        None => {
            let resolver = StorageResolver::new(layout, rpc, address).with_config(cli.resolver_config());
            decode(&resolver, variable, &cli.path, cli.json).await?;
        }
    }

    Ok(())
}

async fn decode<R: WordReader>(
    resolver: &StorageResolver<R>,
    variable: &str,
    path: &[PathSegment],
    json: bool,
) -> eyre::Result<()> {
    let value = resolver
        .get_storage(variable, path)
        .await
        .wrap_err_with(|| format!("failed to decode {}", output::format_path(variable, path)))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        output::print_value(&resolver.address(), variable, path, &value);
    }
    Ok(())
}
