//! Command-line argument definitions

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::cli::commands::catalog::CatalogArgs;
use crate::cli::commands::completions::CompletionsArgs;
use crate::cli::commands::init::InitArgs;
use crate::cli::commands::product::ProductCommands;
use crate::cli::commands::widget::WidgetCommands;

#[derive(Parser, Debug)]
#[command(name = "lca")]
#[command(author, version, about = "LCA product entry toolkit", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// YAML for single records, TSV for lists
    #[default]
    Auto,
    Yaml,
    Json,
    Tsv,
    Csv,
    /// Boxed terminal table
    Table,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new LCA project in the current directory
    Init(InitArgs),

    /// Enter, list and inspect products
    #[command(subcommand)]
    Product(ProductCommands),

    /// Show the material, process and country tables
    Catalog(CatalogArgs),

    /// Inspect host widget and link registrations
    #[command(subcommand)]
    Widget(WidgetCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["lca", "catalog", "-f", "json", "-vv"]).unwrap();
        assert_eq!(cli.global.format, OutputFormat::Json);
        assert_eq!(cli.global.verbose, 2);
    }
}
