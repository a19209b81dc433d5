//! `lca widget` command - host registrations

use clap::Subcommand;
use miette::Result;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::output::{effective_format, print_delimited, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::host::{HostContext, Registration};
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum WidgetCommands {
    /// List registered widgets and sidebar links
    List,
}

#[derive(Tabled)]
struct WidgetRow {
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "QUALIFIED ID")]
    qualified_id: String,
    #[tabled(rename = "VIEW")]
    view: String,
}

impl From<&Registration> for WidgetRow {
    fn from(r: &Registration) -> Self {
        Self {
            kind: r.kind.to_string(),
            id: r.id.clone(),
            qualified_id: r.qualified_id.clone(),
            view: r.view.to_string(),
        }
    }
}

pub fn run(cmd: WidgetCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        WidgetCommands::List => run_list(global),
    }
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let host = HostContext::from_config(&Config::load());
    let registrations: Vec<&Registration> = host.registry().iter().collect();

    match effective_format(global.format, true) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => {
            print_structured(&registrations, format)?;
        }
        OutputFormat::Table => {
            let rows: Vec<WidgetRow> = registrations.iter().map(|r| WidgetRow::from(*r)).collect();
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{}", table);
        }
        format => {
            let rows: Vec<Vec<String>> = registrations
                .iter()
                .map(|r| {
                    let row = WidgetRow::from(*r);
                    vec![row.kind, row.id, row.qualified_id, row.view]
                })
                .collect();
            print_delimited(&["kind", "id", "qualified_id", "view"], &rows, format)?;
        }
    }
    Ok(())
}
