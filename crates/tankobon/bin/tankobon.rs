#[macro_use]
extern crate log;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tankobon::{
    application::catalog::{CatalogError, CatalogService},
    infrastructure::config::Config,
};
use tankobon_sources::prelude::{HttpClient, SourceManager};

#[derive(Parser)]
#[clap(version, about)]
struct Opts {
    /// Path to config file
    #[clap(long, global = true)]
    config: Option<String>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a title on every enabled source
    Search {
        query: String,
        /// Other names the series is known by
        #[clap(long = "alias")]
        aliases: Vec<String>,
        #[clap(long)]
        pretty: bool,
    },
    /// Build the merged chapter catalog of a title
    Catalog {
        query: String,
        /// Other names the series is known by
        #[clap(long = "alias")]
        aliases: Vec<String>,
        #[clap(long)]
        pretty: bool,
    },
    /// Print the page images of one chapter
    Pages {
        /// Source id, e.g. mangadex
        source: String,
        /// Chapter url as listed in a catalog
        url: String,
    },
    /// List enabled sources
    Sources,
}

fn init_logger() {
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        if let Ok(level) = std::env::var("TANKOBON_LOG") {
            builder.parse_filters(&format!(
                "tankobon={level},tankobon_sources={level},tankobon_lib={level}"
            ));
        }
    }
    builder.init();
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), anyhow::Error> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");

    Ok(())
}

fn report_ambiguity(err: &CatalogError) {
    if let CatalogError::AmbiguousTitle { candidates, .. } = err {
        for candidate in candidates {
            eprintln!(
                "  {}\t{}\t{}\t{:.3}",
                candidate.source_id, candidate.title, candidate.url, candidate.similarity
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_logger();

    let opts = Opts::parse();
    let config = Config::open(opts.config)?;
    debug!("config: {:?}", config);

    let client = Arc::new(HttpClient::new(config.retry_policy(), config.request_timeout())?);
    let manager = SourceManager::with_builtin(
        client,
        &config.language,
        &config.pagination_config(),
        &config.sources,
    )?;

    match opts.command {
        Command::Search {
            query,
            aliases,
            pretty,
        } => {
            let service = CatalogService::new(&manager, config.catalog_options())?;
            match service.resolve_title(&query, &aliases).await {
                Ok(resolution) => print_json(&resolution, pretty)?,
                Err(e) => {
                    report_ambiguity(&e);
                    return Err(e.into());
                }
            }
        }
        Command::Catalog {
            query,
            aliases,
            pretty,
        } => {
            let service = CatalogService::new(&manager, config.catalog_options())?;
            match service.collect(&query, &aliases).await {
                Ok(report) => {
                    if report.partial {
                        warn!(
                            "partial catalog: {} provider failures, {} incomplete listings",
                            report.failures.len(),
                            report.incomplete.len()
                        );
                    }
                    print_json(&report, pretty)?;
                }
                Err(e) => {
                    report_ambiguity(&e);
                    return Err(e.into());
                }
            }
        }
        Command::Pages { source, url } => {
            let pages = manager.get(&source)?.fetch_pages(&url).await?;
            for page in pages {
                println!("{page}");
            }
        }
        Command::Sources => {
            let trust = config.trust_ranks();
            for info in manager.list() {
                println!(
                    "{}\t{}\t{}\ttrust {}",
                    info.id,
                    info.name,
                    info.url,
                    trust.rank(&info.id)
                );
            }
        }
    }

    Ok(())
}
