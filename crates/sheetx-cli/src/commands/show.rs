//! Print workbook contents

use crate::commands::print_json;
use anyhow::Context;
use clap::Args;
use sheetx_store::FsWorkbookSession;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Workbook JSON file
    #[arg(long, short = 'w')]
    pub workbook: PathBuf,

    /// Print only this sheet
    #[arg(long)]
    pub sheet: Option<String>,
}

pub fn execute(args: ShowArgs) -> anyhow::Result<ExitCode> {
    let session = FsWorkbookSession::open(&args.workbook)?;
    let workbook = session.load()?;
    match args.sheet {
        Some(name) => {
            let sheet = workbook
                .sheets
                .get(&name)
                .with_context(|| format!("no sheet named '{}'", name))?;
            print_json(sheet)?;
        }
        None => print_json(&workbook)?,
    }
    Ok(ExitCode::SUCCESS)
}
