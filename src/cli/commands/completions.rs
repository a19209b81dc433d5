//! `lca completions` command - shell completion scripts

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn run(args: CompletionsArgs) -> miette::Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "lca", &mut std::io::stdout());
    Ok(())
}
