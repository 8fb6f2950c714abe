use clap::Parser;
use gcscli::credentials::KeySource;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Uploads files to, and inspects objects in, Google Cloud Storage
#[derive(Parser)]
#[clap(name = "gcscli", author, version, about)]
struct Cli {
    /// Use this service account key instead of the one bundled with the binary
    #[arg(long, global = true, env = "GCSCLI_KEY_FILE")]
    key_file: Option<PathBuf>,
    #[clap(subcommand)]
    cmd: gcscli::gcs::Args,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let key = match &cli.key_file {
        Some(path) => KeySource::File(path),
        None => KeySource::Embedded,
    };

    gcscli::gcs::run(cli.cmd, key).await
}
