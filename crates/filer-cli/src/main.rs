//! Filer CLI — administrative access to sharded file storage.
//!
//! Configured through FILER_ROOT, FILER_BASE_URL, FILER_SHARD_TEMPLATE and
//! FILER_ALLOW_OVERWRITE (a `.env` file is honoured).

use anyhow::Context;
use clap::{Parser, Subcommand};
use filer_cli::{generate_key, init_tracing};
use filer_core::Config;
use filer_storage::create_storage;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "filer", about = "Sharded file storage CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the filesystem path a key resolves to
    Path {
        /// File key (`<id>/<filename>`)
        key: String,
    },
    /// Print the public URL a key resolves to
    Url {
        /// File key (`<id>/<filename>`)
        key: String,
    },
    /// Store a local file
    Put {
        /// Path to the file to store
        file: PathBuf,
        /// Key to store under; generated when omitted
        #[arg(long)]
        key: Option<String>,
    },
    /// Fetch a stored file
    Get {
        /// File key
        key: String,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete a stored file
    Rm {
        /// File key
        key: String,
    },
    /// List a directory relative to the storage root
    Ls {
        /// Directory, relative to the root
        #[arg(default_value = "")]
        dir: String,
    },
    /// Recursively delete a directory relative to the storage root
    Purge {
        /// Directory, relative to the root
        dir: String,
    },
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `.env` may set RUST_LOG, so it is loaded before the subscriber.
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_current_env()
        .context("Failed to load configuration. Set FILER_ROOT")?;
    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage")?;

    match cli.command {
        Commands::Path { key } => {
            let path = storage.path(&key)?;
            print_json(&serde_json::json!({ "key": key, "path": path.display().to_string() }))?;
        }
        Commands::Url { key } => {
            let url = storage.url(&key)?;
            print_json(&serde_json::json!({ "key": key, "url": url }))?;
        }
        Commands::Put { file, key } => {
            let key = key.unwrap_or_else(|| generate_key(&file));
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let size = data.len();
            let url = storage.save(&key, data).await?;
            print_json(&serde_json::json!({ "key": key, "url": url, "size_bytes": size }))?;
        }
        Commands::Get { key, out } => {
            let data = storage.open(&key).await?;
            match out {
                Some(out) => {
                    tokio::fs::write(&out, &data)
                        .await
                        .with_context(|| format!("Failed to write {}", out.display()))?;
                    print_json(&serde_json::json!({
                        "key": key,
                        "out": out.display().to_string(),
                        "size_bytes": data.len()
                    }))?;
                }
                None => {
                    use std::io::Write;
                    std::io::stdout()
                        .write_all(&data)
                        .context("Failed to write to stdout")?;
                }
            }
        }
        Commands::Rm { key } => {
            storage.delete(&key).await?;
            print_json(&serde_json::json!({ "success": true, "key": key }))?;
        }
        Commands::Ls { dir } => {
            let listing = storage.listdir(&dir).await?;
            print_json(&serde_json::to_value(&listing)?)?;
        }
        Commands::Purge { dir } => {
            storage.delete_directory(&dir).await?;
            print_json(&serde_json::json!({ "success": true, "dir": dir }))?;
        }
    }

    Ok(())
}
