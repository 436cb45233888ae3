use clap::Parser;
use research_console::cli::{print_completions, Args};
use research_console::{logging, research};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        print_completions(shell, &mut std::io::stdout());
        return Ok(());
    }

    logging::init(args.verbose);
    research::run_research(&args).await?;

    Ok(())
}
