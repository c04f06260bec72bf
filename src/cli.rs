use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::assemble::{ProfileAssembler, ScrapeOptions};
use crate::dynamic::StaticListingFetcher;
use crate::gateway::RequestGateway;
use crate::tables::ClassificationTables;

/// CLI for git-pull: scrape user profiles, repositories and per-line blame.
#[derive(Parser)]
#[clap(
    name = "git-pull",
    version,
    about = "Scrape a user's repositories, files and per-line blame into a JSON tree"
)]
pub struct Cli {
    /// Directory holding the classification tables
    /// (languages.yml, vendor.yml, documentation.yml, useragents.yml)
    #[clap(long, default_value = "resources")]
    pub resources: PathBuf,

    /// Write the JSON tree here instead of stdout
    #[clap(long)]
    pub out: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape a user profile
    Profile {
        #[clap(long)]
        username: String,
        /// Also scrape every repository's files and blame
        #[clap(long)]
        full: bool,
        /// Worker bound for per-file scrapes (0 = sequential)
        #[clap(long)]
        concurrency: Option<usize>,
    },
    /// Scrape a single repository
    Repo {
        #[clap(long)]
        owner: String,
        #[clap(long)]
        name: String,
        /// Also scrape the repository's files and blame
        #[clap(long)]
        full: bool,
        #[clap(long)]
        concurrency: Option<usize>,
    },
}

/// Async CLI entrypoint shared by main() and integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    let tables = Arc::new(ClassificationTables::load(&cli.resources)?);
    let gateway = Arc::new(RequestGateway::new(Arc::clone(&tables)));
    let listing = Arc::new(StaticListingFetcher::new(RequestGateway::new(Arc::clone(
        &tables,
    ))));

    let json = match cli.command {
        Commands::Profile {
            username,
            full,
            concurrency,
        } => {
            let assembler = ProfileAssembler::new(
                gateway,
                listing,
                tables,
                ScrapeOptions {
                    full,
                    concurrency,
                    ..ScrapeOptions::default()
                },
            );
            let profile = assembler.scrape_profile(&username).await?;
            serde_json::to_string_pretty(&profile)?
        }
        Commands::Repo {
            owner,
            name,
            full,
            concurrency,
        } => {
            let assembler = ProfileAssembler::new(
                gateway,
                listing,
                tables,
                ScrapeOptions {
                    full,
                    concurrency,
                    ..ScrapeOptions::default()
                },
            );
            let repo = assembler.scrape_repository(&owner, &name).await?;
            serde_json::to_string_pretty(&repo)?
        }
    };

    match cli.out {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}
