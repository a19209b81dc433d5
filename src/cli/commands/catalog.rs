//! `lca catalog` command - the fixed lookup tables

use clap::ValueEnum;
use miette::Result;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::output::{effective_format, print_delimited, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::material::MaterialClass;
use crate::entities::process::ManufacturingProcess;
use crate::entities::product::Country;

#[derive(clap::Args, Debug)]
pub struct CatalogArgs {
    /// Which table to show
    #[arg(value_enum, default_value = "all")]
    pub table: CatalogTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CatalogTable {
    Materials,
    Processes,
    Countries,
    All,
}

#[derive(Debug, Serialize, Tabled)]
struct CatalogEntry {
    #[tabled(rename = "TABLE")]
    table: &'static str,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "OPTIONS")]
    options: String,
}

fn entries(table: CatalogTable) -> Vec<CatalogEntry> {
    let mut out = Vec::new();
    if matches!(table, CatalogTable::Materials | CatalogTable::All) {
        out.extend(MaterialClass::ALL.iter().map(|c| CatalogEntry {
            table: "material",
            name: c.to_string(),
            options: c.specific_materials().join(", "),
        }));
    }
    if matches!(table, CatalogTable::Processes | CatalogTable::All) {
        out.extend(ManufacturingProcess::ALL.iter().map(|p| CatalogEntry {
            table: "process",
            name: p.to_string(),
            options: p.sub_processes().join(", "),
        }));
    }
    if matches!(table, CatalogTable::Countries | CatalogTable::All) {
        out.extend(Country::ALL.iter().map(|c| CatalogEntry {
            table: "country",
            name: c.code().to_string(),
            options: c.label().to_string(),
        }));
    }
    out
}

pub fn run(args: CatalogArgs, global: &GlobalOpts) -> Result<()> {
    let entries = entries(args.table);

    match effective_format(global.format, true) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => {
            print_structured(&entries, format)?;
        }
        OutputFormat::Table => {
            let mut table = Table::new(&entries);
            table.with(Style::rounded());
            println!("{}", table);
        }
        format => {
            let rows: Vec<Vec<String>> = entries
                .iter()
                .map(|e| vec![e.table.to_string(), e.name.clone(), e.options.clone()])
                .collect();
            print_delimited(&["table", "name", "options"], &rows, format)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_per_table() {
        assert_eq!(entries(CatalogTable::Materials).len(), 3);
        assert_eq!(entries(CatalogTable::Processes).len(), 3);
        assert_eq!(entries(CatalogTable::Countries).len(), 3);
        assert_eq!(entries(CatalogTable::All).len(), 9);
    }

    #[test]
    fn test_material_options() {
        let wood = &entries(CatalogTable::Materials)[0];
        assert_eq!(wood.name, "Wood");
        assert_eq!(wood.options, "Oak, Maple");
    }
}
