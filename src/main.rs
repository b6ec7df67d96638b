use anyhow::{Context as _, Result};
use clap::Parser;
use std::{fs, path::PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitestack::cli::{Args, Command};

fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the emitted document, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match args.command {
        Command::Build {
            asset_dir,
            format,
            out,
        } => build(args.config, asset_dir, format, out),
        Command::Init {
            domain,
            force,
            path,
        } => {
            let path = path.unwrap_or_else(|| PathBuf::from(sitestack::context::LOCAL_CONFIG_NAME));
            let written = sitestack::init::write_config_stub(&path, domain.as_deref(), force)?;
            eprintln!("wrote {}", written.display());
            Ok(())
        }
    }
}

fn build(
    config: Option<PathBuf>,
    asset_dir: Option<PathBuf>,
    format: sitestack::Format,
    out: Option<PathBuf>,
) -> Result<()> {
    let mut ctx = sitestack::ContextEnv::new()?;
    let config_path = ctx.locate_config(config.as_deref())?;

    let cfg = sitestack::Config::load_from_path(&config_path)?;
    cfg.validate()?;

    let root = match asset_dir {
        Some(dir) => ctx.absolutize(&dir),
        None => sitestack::Resolver::new(&ctx)
            .with_domain(&cfg.site.domain)
            .resolve_path(&cfg.site.asset_dir)?,
    };
    tracing::info!(config = %config_path.display(), root = %root.display(), "building stack");

    // all-or-nothing: nothing is written unless every step succeeded
    let stack = sitestack::build_from_dir(&cfg, &root)?;
    let text = sitestack::Emitter::new(format, &cfg.provider.region).emit(&stack)?;

    match out {
        Some(path) => fs::write(&path, text)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{text}"),
    }

    Ok(())
}
