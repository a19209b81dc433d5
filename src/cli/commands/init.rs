//! `lca init` command - create a project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::core::project::{Project, PRODUCTS_DIR, PROJECT_DIR};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (defaults to the current directory)
    pub path: Option<PathBuf>,
}

pub fn run(args: InitArgs) -> Result<()> {
    let root = match args.path {
        Some(path) => {
            std::fs::create_dir_all(&path).into_diagnostic()?;
            path
        }
        None => std::env::current_dir().into_diagnostic()?,
    };

    let project = Project::init(&root).map_err(|e| miette::miette!("{}", e))?;

    println!(
        "{} Initialized LCA project at {}",
        style("✓").green(),
        style(project.root().display()).cyan()
    );
    println!("   {}/config.yaml", style(PROJECT_DIR).dim());
    println!("   {}/", style(PRODUCTS_DIR).dim());
    println!();
    println!("Next: {}", style("lca product new -i").yellow());
    Ok(())
}
