//! CLI entry point for spacetraveling

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spacetraveling::commands::list::PageLimit;

#[derive(Parser)]
#[command(name = "spacetraveling")]
#[command(version)]
#[command(about = "A blog generated from a headless content repository", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate static files
    #[command(alias = "g")]
    Generate {
        /// Only rebuild the page of this post
        #[arg(long)]
        post: Option<String>,
    },

    /// Start the blog server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// Clean the public folder
    Clean,

    /// List posts from the repository
    List {
        /// Number of listing pages to load
        #[arg(long, default_value = "1", conflicts_with = "all")]
        pages: usize,

        /// Follow the listing until the last page
        #[arg(long)]
        all: bool,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "spacetraveling=debug,info"
    } else {
        "spacetraveling=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Generate { post } => {
            let site = spacetraveling::Site::new(&base_dir)?;
            match post {
                Some(uid) => {
                    tracing::info!("Generating post {}...", uid);
                    spacetraveling::commands::generate::run_single(&site, &uid).await?;
                }
                None => {
                    tracing::info!("Generating static files...");
                    let report = site.generate().await?;
                    println!(
                        "Generated {} posts ({} on the first page)",
                        report.articles, report.listing_items
                    );
                    if report.failed > 0 {
                        anyhow::bail!("{} posts failed to generate", report.failed);
                    }
                }
            }
            println!("Generated successfully!");
        }

        Commands::Server { port, ip } => {
            let site = spacetraveling::Site::new(&base_dir)?;

            // Generate first
            tracing::info!("Generating static files...");
            site.generate().await?;

            tracing::info!("Starting server at http://{}:{}", ip, port);
            spacetraveling::server::start(&site, &ip, port).await?;
        }

        Commands::Clean => {
            let site = spacetraveling::Site::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { pages, all } => {
            let site = spacetraveling::Site::new(&base_dir)?;
            let limit = if all {
                PageLimit::All
            } else {
                PageLimit::Pages(pages.max(1))
            };
            spacetraveling::commands::list::run(&site, limit).await?;
        }

        Commands::Version => {
            println!("spacetraveling version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
