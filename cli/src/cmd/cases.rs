use autograde_core::suite;

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Also print each case's timeout and full command line.
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = global_args.load_config()?;
    let suite = suite::channel(&cfg);
    for case in suite.registry.iter() {
        if args.verbose {
            println!(
                "{}\t{}s\t{}",
                case.name,
                case.timeout.as_secs(),
                case.argv.join(" ")
            );
        } else {
            println!("{}", case.name);
        }
    }
    Ok(())
}
