use clap::Parser;
use lca::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    lca::logging::init(cli.global.verbose);

    match cli.command {
        Commands::Init(args) => lca::cli::commands::init::run(args),
        Commands::Product(cmd) => lca::cli::commands::product::run(cmd, &cli.global),
        Commands::Catalog(args) => lca::cli::commands::catalog::run(args, &cli.global),
        Commands::Widget(cmd) => lca::cli::commands::widget::run(cmd, &cli.global),
        Commands::Completions(args) => lca::cli::commands::completions::run(args),
    }
}
