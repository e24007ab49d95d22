// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands each subcommand to its
// use case in Layer 2. Printing results happens here and
// nowhere else.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{CheckArgs, Commands, DescribeArgs, InitConfigArgs};

#[derive(Parser, Debug)]
#[command(
    name = "cgcnn-sa",
    version,
    about = "Crystal graph convolutional network with neighbour self-attention."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::InitConfig(args) => run_init_config(args),
            Commands::Describe(args)   => run_describe(args),
            Commands::Check(args)      => run_check(args),
        }
    }
}

fn run_init_config(args: InitConfigArgs) -> Result<()> {
    use crate::application::init_config_use_case::InitConfigUseCase;

    let path = InitConfigUseCase::new(&args.model_dir, (&args).into()).execute()?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn run_describe(args: DescribeArgs) -> Result<()> {
    use crate::application::describe_use_case::DescribeUseCase;

    let s = DescribeUseCase::new(&args.model_dir).execute()?;
    println!(
        "conv layers: {} (attention: {})\natom features: {}\nhidden features: {} ({} extra layers)\noutputs: {}\nparameters: {}",
        s.conv_layers, s.attention, s.atom_fea_len, s.h_fea_len, s.hidden_fcs, s.output_len, s.num_params,
    );
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<()> {
    use crate::application::check_use_case::CheckUseCase;

    let preds = CheckUseCase::new(&args.model_dir, &args.graphs, args.batch_size).execute()?;
    for p in preds {
        let row: Vec<String> = p.output.iter().map(|v| format!("{v:.6}")).collect();
        println!("{}\t{}", p.id, row.join("\t"));
    }
    Ok(())
}
