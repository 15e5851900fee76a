use std::path::PathBuf;

use autograde_core::{print_success, GradeConfig};

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg(default_value = "./")]
    dir: PathBuf,
}

pub fn exec(args: &Args, _: &GlobalArgs) -> SubcmdResult {
    let path = args.dir.join(GradeConfig::FILENAME);
    anyhow::ensure!(!path.exists(), "Config file already exists: {}", path.display());
    fsutil::write_with_mkdir(&path, GradeConfig::example_toml())?;
    print_success!("Successfully wrote example config. (path: {})", path.display());
    Ok(())
}
