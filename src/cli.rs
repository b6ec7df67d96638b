use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::emit::Format;

#[derive(Parser, Debug)]
#[command(name = "sitestack", version, about)]
pub struct Args {
    /// Path to the site config (overrides ./sitestack.toml and the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enumerate the site assets and emit the stack's declarations
    Build {
        /// Asset root (overrides site.asset_dir)
        #[arg(long)]
        asset_dir: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Manifest)]
        format: Format,

        /// Write the declarations to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Write a starter config file
    Init {
        /// Domain the site is served from
        #[arg(long)]
        domain: Option<String>,

        /// Overwrite an existing file
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Where to write it (default ./sitestack.toml)
        path: Option<PathBuf>,
    },
}

impl Args {
    /// Filter used when RUST_LOG is unset.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "sitestack=warn",
            1 => "sitestack=info",
            2 => "sitestack=debug",
            _ => "sitestack=trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_defaults_to_manifest() {
        let args = Args::parse_from(["sitestack", "build"]);
        match &args.command {
            Command::Build { format, out, asset_dir } => {
                assert_eq!(*format, Format::Manifest);
                assert!(out.is_none());
                assert!(asset_dir.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(args.log_filter(), "sitestack=warn");
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let args = Args::parse_from([
            "sitestack", "build", "--format", "terraform", "--config", "site.toml", "-vv",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("site.toml")));
        assert_eq!(args.log_filter(), "sitestack=debug");
        assert!(matches!(
            args.command,
            Command::Build { format: Format::Terraform, .. }
        ));
    }
}
