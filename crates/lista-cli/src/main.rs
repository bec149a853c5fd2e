use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod catalog;
mod render;

#[derive(Debug, Parser)]
#[command(name = "lista")]
#[command(about = "Browse and search the published price list")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one sync cycle and report what was loaded
    Sync,
    /// Sync, then print the whole catalog
    List {
        /// Render HTML table rows instead of a text table
        #[arg(long)]
        html: bool,
    },
    /// Sync, then print products matching every term
    Search {
        /// Search terms; each must appear in the name, detail or brand
        #[arg(required = true, num_args = 1..)]
        terms: Vec<String>,
        /// Render HTML table rows instead of a text table
        #[arg(long)]
        html: bool,
    },
    /// Sync, then search interactively with queries read from stdin
    Browse,
    /// Show the currency reference sale price
    Rate,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("lista: no command given; run `lista --help` for usage");
        return Ok(());
    };

    let config = lista_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(env = %config.env, feed = %config.feed_base_url, "configuration loaded");

    match command {
        Commands::Sync => catalog::run_sync(&config).await,
        Commands::List { html } => catalog::run_list(&config, html).await,
        Commands::Search { terms, html } => {
            catalog::run_search(&config, &terms.join(" "), html).await
        }
        Commands::Browse => catalog::run_browse(&config).await,
        Commands::Rate => catalog::run_rate(&config).await,
    }
}
