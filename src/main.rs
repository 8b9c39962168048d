use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use til_ingest::build_index;
use til_readme::regenerate;
use til_render::HttpRenderer;
use til_store::SqliteStore;
use til_types::{Config, Store};

#[derive(Parser)]
#[command(name = "til", about = "Searchable index of today-I-learned notes")]
struct Cli {
    /// Notes root (also the git working tree)
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan history, render changed notes and upsert them into the database
    Build,
    /// Regenerate the summary block and per-topic subsection files
    Readme {
        /// Write the block into the summary document instead of printing it
        #[arg(long)]
        rewrite: bool,
    },
    /// Full-text search over titles and bodies
    Search {
        query: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Show note and topic counts and whether the search index exists
    Status {
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("TIL_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn resolve_db_path(flag: Option<PathBuf>, config: &Config) -> PathBuf {
    if let Some(p) = flag {
        return p;
    }
    if let Ok(v) = std::env::var("TIL_DB") {
        return PathBuf::from(v);
    }
    config.db_path()
}

/// Open a database that an earlier `til build` must have created.
fn open_existing(db_path: &std::path::Path) -> Result<SqliteStore> {
    if !db_path.is_file() {
        anyhow::bail!(
            "No database at {} (run `til build` first)",
            db_path.display()
        );
    }
    SqliteStore::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = Config::load(&cli.root)
        .with_context(|| format!("Failed to load config from {}", cli.root.display()))?;
    let db_path = resolve_db_path(cli.db, &config);

    match cli.command {
        Commands::Build => {
            if let Some(parent) = db_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
            let store = SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
            let renderer = HttpRenderer::new(&config.render).context("Failed to set up renderer")?;

            let summary = build_index(&config, &store, &renderer)
                .with_context(|| format!("Failed to index notes under {}", config.root.display()))?;
            println!(
                "Indexed {} notes ({} rendered, {} unchanged, {} untracked) into {}",
                summary.notes_seen,
                summary.notes_rendered,
                summary.notes_unchanged,
                summary.notes_untracked,
                db_path.display()
            );
        }

        Commands::Readme { rewrite } => {
            let store = open_existing(&db_path)?;
            let result = regenerate(&config, &store, rewrite).context("Failed to regenerate summary")?;

            match result.rewrite {
                None => println!("{}", result.index),
                Some(outcome) if !outcome.index_replaced => eprintln!(
                    "Warning: no index markers in {}, block not written",
                    config.readme_path().display()
                ),
                Some(_) => println!("Rewrote {}", config.readme_path().display()),
            }
            for path in &result.subsections {
                tracing::info!(path = %path.display(), "wrote subsection");
            }
        }

        Commands::Search { query, limit, json } => {
            let store = open_existing(&db_path)?;
            let hits = store
                .search(&query, limit)
                .with_context(|| format!("Search for '{}' failed", query))?;

            if json {
                let out = serde_json::to_string_pretty(&hits).context("Failed to serialize hits to JSON")?;
                println!("{}", out);
            } else if hits.is_empty() {
                println!("No matches");
            } else {
                for hit in &hits {
                    println!("{}\n  {}\n  {}", hit.title, hit.url, hit.snippet);
                }
            }
        }

        Commands::Status { json } => {
            let store = open_existing(&db_path)?;
            let stats = store.stats().context("Failed to read database stats")?;

            if json {
                let out = serde_json::to_string_pretty(&stats).context("Failed to serialize stats to JSON")?;
                println!("{}", out);
            } else {
                println!("{:<16} {}", "DATABASE", db_path.display());
                println!("{:<16} {}", "NOTES", stats.note_count);
                println!("{:<16} {}", "TOPICS", stats.topic_count);
                println!(
                    "{:<16} {}",
                    "LAST UPDATED",
                    stats.last_updated_utc.as_deref().unwrap_or("never")
                );
                println!(
                    "{:<16} {}",
                    "SEARCH INDEX",
                    if stats.fts_enabled { "enabled" } else { "missing" }
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_db_path_prefers_flag() {
        let config = Config {
            root: PathBuf::from("/notes"),
            ..Config::default()
        };
        let flag = PathBuf::from("/elsewhere/other.db");
        assert_eq!(resolve_db_path(Some(flag.clone()), &config), flag);
    }

    #[test]
    fn test_cli_parses_readme_rewrite() {
        let cli = Cli::try_parse_from(["til", "--root", "/notes", "readme", "--rewrite"]).expect("parse");
        assert_eq!(cli.root, PathBuf::from("/notes"));
        assert!(matches!(cli.command, Commands::Readme { rewrite: true }));

        let cli = Cli::try_parse_from(["til", "readme"]).expect("parse");
        assert!(matches!(cli.command, Commands::Readme { rewrite: false }));
    }

    #[test]
    fn test_every_subcommand_has_help_text() {
        use clap::CommandFactory;
        let cli = Cli::command();
        for sub in cli.get_subcommands() {
            assert!(sub.get_about().is_some(), "`{}` has no description", sub.get_name());
        }
    }

    #[test]
    fn test_open_existing_rejects_missing_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(open_existing(&dir.path().join("missing.db")).is_err());
    }
}
