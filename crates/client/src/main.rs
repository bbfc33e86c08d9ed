use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ayn::key::{PeekReader, detect_format, extract};
use ayn::verify_post;

#[derive(Parser)]
#[clap(about = "Offline tools for signed posts and key files")]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify a signed post document, read from FILE or stdin
    Verify { file: Option<PathBuf> },
    /// List the private keys found in a key file
    Inspect {
        keyfile: PathBuf,
        /// Key file format (PEM, DER, ...), detected when omitted
        #[clap(long)]
        format: Option<String>,
        /// Password for encrypted entries
        #[clap(long, env = "AYN_KEY_PASSWORD", default_value = "")]
        password: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Args::parse().command {
        Command::Verify { file } => verify(file),
        Command::Inspect {
            keyfile,
            format,
            password,
        } => inspect(keyfile, format, password),
    }
}

fn verify(file: Option<PathBuf>) -> Result<()> {
    let mut data = Vec::new();
    match &file {
        Some(path) => {
            File::open(path)
                .with_context(|| format!("opening {}", path.display()))?
                .read_to_end(&mut data)?;
        }
        None => {
            std::io::stdin().read_to_end(&mut data).context("reading stdin")?;
        }
    }
    debug!(bytes = data.len(), "verifying post");

    let post = verify_post(&data).context("verification failed")?;
    let key = ayn::PublicKey::from_der(&post.key.crt)?;
    println!("valid: {} {}-bit key", key.scheme(), key.bits());
    println!("{}", serde_json::to_string_pretty(&post.content)?);
    Ok(())
}

fn inspect(path: PathBuf, hint: Option<String>, password: String) -> Result<()> {
    let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = PeekReader::new(file);
    let format = detect_format(&mut reader, &path, hint.as_deref())?;
    println!("format: {format}");

    let mut count = 0;
    for key in extract(format, reader, |_: &str| password.clone())? {
        let key = key?;
        count += 1;
        println!("key {count}: {} {} bits", key.scheme(), key.bits());
    }
    if count == 0 {
        bail!("no private key in {}", path.display());
    }
    Ok(())
}
