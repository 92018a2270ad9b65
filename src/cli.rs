use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::core::recovery::Normalization;
use crate::paper::figure::OutputFormat;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML
    #[arg(long, global = true, default_value = "shareplot.toml")]
    pub config: String,

    /// Output directory (overrides config)
    #[arg(long, global = true)]
    pub out_dir: Option<String>,

    /// Figure format (overrides config)
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Recovery probability per group threshold
    Recovery {
        /// Number of share groups (r)
        #[arg(long)]
        groups: Option<u32>,

        /// Shares per group (s)
        #[arg(long)]
        shares: Option<u32>,

        #[arg(long, value_enum)]
        normalization: Option<Normalization>,
    },
    /// Cumulative recovery probability from simulation results
    Cdf,
    /// Expected contacts until recovery
    Expected,
    /// User against adversary recovery
    Comparison,
    /// Computation time
    Timing,
    /// Packet size
    Packet,
    /// Every figure
    All,
}

impl Args {
    /// Fold command-line overrides into the loaded config.
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(dir) = &self.out_dir {
            cfg.output.dir = dir.clone();
        }
        if let Some(format) = self.format {
            cfg.output.format = format;
        }
        if let Command::Recovery {
            groups,
            shares,
            normalization,
        } = &self.command
        {
            if let Some(groups) = groups {
                cfg.recovery.groups = *groups;
            }
            if let Some(shares) = shares {
                cfg.recovery.shares_per_group = *shares;
            }
            if let Some(normalization) = normalization {
                cfg.recovery.normalization = *normalization;
            }
        }
    }
}
