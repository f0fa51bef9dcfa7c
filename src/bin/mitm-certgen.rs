use anyhow::{Context, Result};
use clap::Parser;
use mitm_certgen::{CaCredential, LeafMinter, MinterConfig};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Mints a short-lived leaf certificate signed by an existing CA.
///
/// The first hostname becomes the subject common name; all hostnames
/// are listed as subject alternative names.
#[derive(Parser, Debug)]
#[command(name = "mitm-certgen")]
#[command(version, about)]
struct Args {
    /// CA certificate (PEM).
    #[arg(long)]
    ca_cert: PathBuf,

    /// CA private key (PEM).
    #[arg(long)]
    ca_key: PathBuf,

    /// Minter configuration file (YAML).
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Write the leaf certificate here instead of stdout.
    #[arg(long)]
    out_cert: Option<PathBuf>,

    /// Write the leaf private key here instead of stdout.
    #[arg(long)]
    out_key: Option<PathBuf>,

    /// Hostnames to certify.
    #[arg(required = true, trailing_var_arg = true)]
    hostnames: Vec<String>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => MinterConfig::load(path)
            .with_context(|| format!("failed to load config from {:?}", path))?,
        None => MinterConfig::default(),
    };

    let cert_pem = fs::read_to_string(&args.ca_cert)
        .with_context(|| format!("failed to read CA certificate {:?}", args.ca_cert))?;
    let key_pem = fs::read_to_string(&args.ca_key)
        .with_context(|| format!("failed to read CA key {:?}", args.ca_key))?;
    let ca = CaCredential::from_pem(&cert_pem, &key_pem).context("failed to load CA credential")?;

    let leaf = LeafMinter::new(&config)
        .mint(&ca, &args.hostnames)
        .context("failed to mint leaf certificate")?;

    info!(
        "minted certificate for {} valid until {}",
        args.hostnames.join(", "),
        leaf.info().not_after
    );

    emit(args.out_cert.as_deref(), &leaf.cert_pem(), 0o644)?;
    emit(args.out_key.as_deref(), &leaf.key_pem(), 0o600)?;

    Ok(())
}

fn emit(path: Option<&Path>, pem: &str, mode: u32) -> Result<()> {
    let Some(path) = path else {
        print!("{}", pem);
        return Ok(());
    };

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options
        .open(path)
        .with_context(|| format!("failed to create {:?}", path))?;
    file.write_all(pem.as_bytes())
        .with_context(|| format!("failed to write {:?}", path))
}
