use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Clone, Debug, Parser)]
#[command(name = "uplift", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// Installation root to check and update.
    #[arg(long, short, global = true, default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Report whether a newer release is available.
    #[command(alias = "c", name = "check")]
    Check,
    /// Check, then install a newer release if there is one.
    #[command(alias = "u", name = "update")]
    Update(UpdateArg),
    /// Install an archive placed in the manual update directory.
    #[command(alias = "m", name = "manual")]
    Manual(UpdateArg),
}

#[derive(Clone, Debug, Args)]
pub struct UpdateArg {
    /// Expected SHA-256 of the update archive, hex encoded.
    #[arg(long, value_name = "HEX")]
    pub sha256: Option<String>,

    /// Do not draw a progress bar.
    #[arg(long)]
    pub quiet: bool,
}
