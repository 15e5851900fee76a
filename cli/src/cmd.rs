pub mod cases;
pub mod init;
pub mod run;

use std::path::PathBuf;

use autograde_core::GradeConfig;

use crate::util;

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub subcmd: Subcommand,

    /// Explicit config file path (default: search ancestor dirs).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Scale every timeout budget, e.g. 2.0 on slow hardware.
    #[arg(long)]
    pub timeout_multiplier: Option<f64>,

    /// Scale every default iteration count (rounded up).
    #[arg(long)]
    pub iters_multiplier: Option<f64>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    #[command(alias("r"))]
    Run(run::Args),

    Init(init::Args),
    Cases(cases::Args),
}

pub type SubcmdResult = anyhow::Result<()>;

impl GlobalArgs {
    pub async fn exec_subcmd(&self) -> SubcmdResult {
        use Subcommand::*;
        match &self.subcmd {
            Run(args) => run::exec(args, self).await,
            Init(args) => init::exec(args, self),
            Cases(args) => cases::exec(args, self),
        }
    }

    pub fn load_config(&self) -> anyhow::Result<GradeConfig> {
        let mut cfg = match &self.config {
            Some(path) => GradeConfig::from_toml_file(path.clone())?,
            None => GradeConfig::load_or_default(util::current_dir())?,
        };
        if let Some(x) = self.timeout_multiplier {
            cfg.timeout_multiplier = x;
        }
        if let Some(x) = self.iters_multiplier {
            cfg.iters_multiplier = x;
        }
        cfg.validate()?;
        match &cfg.source_config_file {
            Some(path) => log::info!("Loaded config from {}", path.display()),
            None => log::debug!("Using built-in config defaults"),
        }
        Ok(cfg)
    }
}
