//! Translate command - convert workflows between tool formats.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use geoflow_translate::{Catalog, Format, Translator};

use super::Context;

/// Arguments for the translate command.
#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Input format: native, qgis or ilwis
    #[arg(long)]
    pub from: Format,

    /// Output format: native or qgis
    #[arg(long)]
    pub to: Format,

    /// Operation catalog TOML (default: [catalog].path, then built-in)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Document to translate
    pub file: PathBuf,
}

/// Run the translate command.
pub async fn run(args: TranslateArgs, ctx: &Context) -> Result<()> {
    let catalog_path = args.catalog.or(ctx.config.catalog().path);
    let catalog = Catalog::load_or_builtin(catalog_path.as_deref())?;
    let translator = Translator::new(Arc::new(catalog));

    let input = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let output = translator.translate(&input, args.from, args.to)?;

    match args.output {
        Some(path) => std::fs::write(&path, output)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{output}"),
    }
    Ok(())
}
