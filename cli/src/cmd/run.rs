use std::io;

use autograde_core::{action, style};

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Emit the final report as JSON instead of the score line.
    #[arg(short, long)]
    pub json: bool,
}

pub async fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = global_args.load_config()?;
    let report = action::grade(&cfg).await?;

    if args.json {
        serde_json::to_writer_pretty(io::stdout(), &report)?;
        println!();
        return Ok(());
    }

    style::print_score_line(&report);
    Ok(())
}
