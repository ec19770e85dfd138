use atlas_site::content::{Collection, load_content};
use atlas_site::listing::{ListingConfig, snapshot};
use atlas_site::{config, generate, output};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "atlas-site")]
#[command(about = "Static site builder for an indie game studio")]
#[command(long_about = "\
Static site builder for an indie game studio

Hand-written HTML pages plus JSON and Markdown content become a static site
with searchable, filterable listing pages.

Project structure:

  ./
  ├── site.toml                    # Site config (optional)
  ├── index.html                   # Root pages: {{site_name}}, {{year}}, ...
  ├── games.html                   # Listing page: {{filters}} {{results_count}} {{listing}}
  ├── robots.txt                   # Root files copied verbatim
  ├── assets/                      # Copied to dist/assets/
  └── content/
      ├── games/*.json             # One record per game → game/<slug>.html
      ├── blog/*.md                # Front matter + Markdown → blog/<slug>.html
      ├── team/*.json              # → team/<slug>.html
      └── awards/*.json

Listing URLs take the same query string the site uses, e.g.
  atlas-site query games 'status=released&tags=co-op&sortBy=title&sortOrder=asc'

Set RUST_LOG=debug for detailed logs.
Run 'atlas-site gen-config' to print a documented site.toml.")]
#[command(version)]
struct Cli {
    /// Project directory
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site into the output directory
    Build,
    /// Validate content and config without building
    Check,
    /// Show one listing page for a URL query string
    Query {
        /// Collection: games, blog, team, or awards
        collection: String,
        /// URL query string, e.g. "status=released&tags=co-op"
        #[arg(default_value = "")]
        query: String,
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Build => {
            let site_config = config::load_config(&cli.source)?;
            println!("==> Building {} → {}", cli.source.display(), cli.output.display());
            let report = generate::build(&cli.source, &cli.output, &site_config)?;
            output::print_build_output(&report);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            let site_config = config::load_config(&cli.source)?;
            println!("==> Checking {}", cli.source.display());
            let report = generate::check(&cli.source, &site_config)?;
            output::print_check_output(&report);
            if !report.is_clean() {
                std::process::exit(1);
            }
        }
        Command::Query {
            collection,
            query,
            page,
        } => {
            let collection = Collection::from_name(&collection)
                .ok_or_else(|| format!("unknown collection {collection:?}"))?;
            let site_config = config::load_config(&cli.source)?;
            let content = load_content(&cli.source)?;

            let listing = site_config
                .listings
                .iter()
                .find(|l| l.collection() == Some(collection));
            let listing_config = ListingConfig {
                search_fields: listing
                    .map(|l| l.search_fields.clone())
                    .unwrap_or_else(|| vec!["title".to_string()]),
                items_per_page: listing
                    .and_then(|l| l.items_per_page)
                    .unwrap_or(site_config.listing.items_per_page),
                ..Default::default()
            };
            let snap = snapshot(content.collection(collection), listing_config, &query, page);
            output::print_query_output(collection, &snap);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
