// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands:
//   init-config  write model hyperparameters to <model-dir>
//   describe     rebuild the model and print its shape
//   check        push crystal graphs through the model once

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::ml::model::CrystalGraphConvNetConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a model config for the given input feature widths
    InitConfig(InitConfigArgs),

    /// Summarise the model described by a saved config
    Describe(DescribeArgs),

    /// Validate crystal graphs and run one inference pass
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Directory that holds model_config.json
    #[arg(long, default_value = "model")]
    pub model_dir: PathBuf,

    /// Width of the raw atom feature vectors
    #[arg(long)]
    pub orig_atom_fea_len: usize,

    /// Width of the bond feature vectors
    #[arg(long)]
    pub nbr_fea_len: usize,

    /// Hidden atom features in the convolutional layers
    #[arg(long, default_value_t = 64)]
    pub atom_fea_len: usize,

    /// Number of convolutional layers
    #[arg(long, default_value_t = 3)]
    pub n_conv: usize,

    /// Hidden features after pooling
    #[arg(long, default_value_t = 128)]
    pub h_fea_len: usize,

    /// Hidden layers after pooling
    #[arg(long, default_value_t = 1)]
    pub n_h: usize,

    /// Predict two-class log-probabilities instead of a scalar
    #[arg(long)]
    pub classification: bool,

    /// Plain CGCNN convolutions without neighbour self-attention
    #[arg(long)]
    pub no_attention: bool,
}

impl From<&InitConfigArgs> for CrystalGraphConvNetConfig {
    fn from(a: &InitConfigArgs) -> Self {
        CrystalGraphConvNetConfig::new(a.orig_atom_fea_len, a.nbr_fea_len)
            .with_atom_fea_len(a.atom_fea_len)
            .with_n_conv(a.n_conv)
            .with_h_fea_len(a.h_fea_len)
            .with_n_h(a.n_h)
            .with_classification(a.classification)
            .with_attention(!a.no_attention)
    }
}

#[derive(Args, Debug)]
pub struct DescribeArgs {
    #[arg(long, default_value = "model")]
    pub model_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[arg(long, default_value = "model")]
    pub model_dir: PathBuf,

    /// JSON array of crystal graphs, or a directory of one-graph JSON files
    #[arg(long)]
    pub graphs: PathBuf,

    /// Crystals per forward pass
    #[arg(long, default_value_t = 256)]
    pub batch_size: usize,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_init_config_args_map_to_model_config() {
        let cli = Cli::try_parse_from([
            "cgcnn-sa", "init-config",
            "--orig-atom-fea-len", "92", "--nbr-fea-len", "41",
            "--n-h", "2", "--classification", "--no-attention",
        ])
        .unwrap();

        let Commands::InitConfig(args) = cli.command else {
            panic!("expected init-config");
        };
        let cfg = CrystalGraphConvNetConfig::from(&args);
        assert_eq!(cfg.orig_atom_fea_len, 92);
        assert_eq!(cfg.nbr_fea_len, 41);
        assert_eq!(cfg.atom_fea_len, 64);
        assert_eq!(cfg.n_h, 2);
        assert!(cfg.classification);
        assert!(!cfg.attention);
    }

    #[test]
    fn test_check_requires_graphs() {
        assert!(Cli::try_parse_from(["cgcnn-sa", "check"]).is_err());
    }
}
