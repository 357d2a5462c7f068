//! Create a workbook file

use clap::Args;
use sheetx_core::{Sheet, Workbook};
use sheetx_store::FsWorkbookSession;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Workbook JSON file to create
    pub path: PathBuf,

    /// Workbook id (default: the file path)
    #[arg(long)]
    pub id: Option<String>,

    /// Active sheet name
    #[arg(long, default_value = "Sheet1")]
    pub sheet: String,

    #[arg(long, default_value_t = 0)]
    pub rows: u32,

    #[arg(long, default_value_t = 0)]
    pub cols: u32,
}

pub fn execute(args: InitArgs) -> anyhow::Result<ExitCode> {
    let id = args
        .id
        .unwrap_or_else(|| args.path.display().to_string());
    let mut workbook = Workbook::new(id, args.sheet.clone());
    workbook
        .sheets
        .insert(args.sheet.clone(), Sheet::with_dims(args.sheet, args.rows, args.cols));

    let session = FsWorkbookSession::create(&args.path, &workbook)?;
    println!("Workbook created:");
    println!("  path: {}", session.path().display());
    println!("  workbook_id: {}", workbook.id);
    Ok(ExitCode::SUCCESS)
}
