use anyhow::Result;
use cgcnn_sa::cli::Cli;
use clap::Parser;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cgcnn_sa=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}
