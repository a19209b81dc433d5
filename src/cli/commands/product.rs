//! `lca product` command - product entry and the local product store

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::helpers::{format_short_id, is_interactive, or_dash, truncate_str};
use crate::cli::output::{effective_format, print_delimited, print_structured};
use crate::cli::session::ServiceSession;
use crate::cli::wizard::{print_summary, ProductWizard, WizardResult};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::bom::{BomEditor, EntryMode, GenerateOutcome};
use crate::core::cancel::CancelToken;
use crate::core::categorize::{CategorizationForm, CategoryTaxonomy};
use crate::core::entity::{Entity, Status};
use crate::core::host::HostContext;
use crate::core::process::ProcessPlanEditor;
use crate::core::project::Project;
use crate::core::summary::{ProductSummary, RECORD_HEADERS};
use crate::core::wizard::{StepData, StepOutcome, WizardController};
use crate::core::Config;
use crate::entities::material::MaterialLine;
use crate::entities::process::parse_process_spec;
use crate::entities::product::{Country, Product, ProductCategoryInfo, ProductDraft, ProductInfo};
use crate::service::{
    BomClassificationRequest, ProcessClassificationRequest, ProductClassificationRequest,
    ProductPayload, RemoteProduct,
};

#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// Enter a new product (interactive wizard with -i, otherwise from flags)
    New(Box<NewArgs>),

    /// List stored products
    List(ListArgs),

    /// Show a stored product
    Show(ShowArgs),

    /// Material and process summary of a stored product
    Summary(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Step through the wizard interactively
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Product code
    #[arg(long)]
    pub code: Option<String>,

    /// Product name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Product description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Product category
    #[arg(long)]
    pub category: Option<String>,

    /// Product sub-category (requires --category)
    #[arg(long)]
    pub sub_category: Option<String>,

    /// Number of units
    #[arg(long)]
    pub units: Option<String>,

    /// Total product weight in kg
    #[arg(long)]
    pub weight: Option<String>,

    /// Brand name
    #[arg(long)]
    pub brand: Option<String>,

    /// Supplier name
    #[arg(long)]
    pub supplier: Option<String>,

    /// Country of manufacture (CN, VD, GL)
    #[arg(long)]
    pub country: Option<Country>,

    /// Material line as CLASS[:MATERIAL[:WEIGHT]], e.g. Wood:Oak:2.5 (repeatable)
    #[arg(long = "material", short = 'm')]
    pub materials: Vec<String>,

    /// Process as INDEX:PROCESS:SUB[+SUB], e.g. 0:Machining:CNC Milling (repeatable)
    #[arg(long = "process", short = 'p')]
    pub processes: Vec<String>,

    /// Ask the classification service for anything not given on the command line
    #[arg(long)]
    pub assist: bool,

    /// Submit the product to the LCA service after saving
    #[arg(long)]
    pub submit: bool,

    /// Override the configured API base URL
    #[arg(long, env = "LCA_API_URL")]
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    Draft,
    Submitted,
    All,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's', default_value = "all")]
    pub status: StatusFilter,

    /// Search in code, name and category (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,

    /// Filter by category (case-insensitive substring)
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// List the products stored by the LCA service instead of the local store
    #[arg(long)]
    pub remote: bool,

    /// Override the configured API base URL (with --remote)
    #[arg(long, env = "LCA_API_URL")]
    pub api_url: Option<String>,

    /// Print only the number of matching products
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Product ID, ID prefix or product code
    pub id: String,
}

pub fn run(cmd: ProductCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ProductCommands::New(args) => run_new(*args, global),
        ProductCommands::List(args) => run_list(args, global),
        ProductCommands::Show(args) => run_show(args, global),
        ProductCommands::Summary(args) => run_summary(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let mut config = Config::load();
    if let Some(url) = &args.api_url {
        config.api_base_url = Some(url.clone());
    }
    let host = HostContext::from_config(&config);
    let session = ServiceSession::new(&host)?;

    let WizardResult { draft, submit } = if args.interactive {
        if !is_interactive() {
            return Err(miette::miette!(
                "--interactive needs a terminal; pass the product on the command line instead"
            ));
        }
        match ProductWizard::new(&session).run()? {
            Some(result) => result,
            None => {
                println!("{} Cancelled; nothing saved", style("✗").red());
                return Ok(());
            }
        }
    } else {
        WizardResult {
            draft: draft_from_flags(&args, &session)?,
            submit: args.submit,
        }
    };

    let mut product = Product::from_draft(draft, config.author());

    if submit {
        let payload = ProductPayload::from_draft(&product.to_draft());
        let cancel = CancelToken::new();
        let result = session.block_on(&cancel, async {
            tokio::select! {
                _ = cancel.cancelled() => None,
                r = session.service().submit_product(&payload) => Some(r),
            }
        });
        match result {
            Some(Ok(_)) => {
                product.status = Status::Submitted;
                eprintln!(
                    "{} Submitted to {}",
                    style("✓").green(),
                    style(session.base_url()).cyan()
                );
            }
            Some(Err(e)) => eprintln!(
                "{} Submission failed, saved locally as draft: {}",
                style("!").yellow(),
                e
            ),
            None => eprintln!("{} Submission cancelled", style("!").yellow()),
        }
    }

    let path = project
        .save_product(&product)
        .map_err(|e| miette::miette!("{}", e))?;

    match global.format {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&product, format)?,
        _ => {
            println!(
                "{} Created product {}",
                style("✓").green(),
                style(product.id()).cyan()
            );
            println!("   {}", style(path.display()).dim());
            println!(
                "   {} {}",
                style(&product.info.code).yellow(),
                product.title()
            );
        }
    }
    Ok(())
}

/// Drive the wizard non-interactively from command-line flags
fn draft_from_flags(args: &NewArgs, session: &ServiceSession) -> Result<ProductDraft> {
    let mut wizard = WizardController::new();

    // Product information
    let info = ProductInfo::new(
        args.code.clone().unwrap_or_default().trim(),
        args.name.clone().unwrap_or_default().trim(),
        args.description.clone().unwrap_or_default().trim(),
    );
    if !info.is_complete() {
        return Err(miette::miette!(
            "Product code and name are required (--code, --name), or use --interactive"
        ));
    }
    wizard.complete_step(StepData::Information(info));

    // Categorization
    let taxonomy = if args.assist {
        session.taxonomy()
    } else {
        CategoryTaxonomy::default()
    };
    let mut form = CategorizationForm::new(taxonomy, ProductCategoryInfo::default());
    if args.assist && args.category.is_none() {
        let request = ProductClassificationRequest::from_draft(wizard.draft());
        let cancel = CancelToken::new();
        session.block_on(&cancel, form.suggest(session.service(), &request, &cancel));
    }
    apply_category_flags(&mut form, args)?;
    wizard.complete_step(StepData::Categorization(form.finish()));

    // Bill of materials
    let materials = if !args.materials.is_empty() {
        manual_materials(&args.materials)?
    } else if args.assist {
        let mut editor = BomEditor::new(EntryMode::Assisted);
        let request = BomClassificationRequest::from_draft(wizard.draft());
        let cancel = CancelToken::new();
        match session.block_on(
            &cancel,
            editor.generate(session.service(), &request, &cancel),
        ) {
            Ok(GenerateOutcome::Replaced(n)) => {
                eprintln!("{} Generated {} material line(s)", style("✓").green(), n)
            }
            Ok(_) => {}
            Err(e) => eprintln!(
                "{} Could not generate materials: {}",
                style("!").yellow(),
                e
            ),
        }
        editor.finish()
    } else {
        Vec::new()
    };
    wizard.complete_step(StepData::Materials(materials));

    // Manufacturing
    let mut plan = ProcessPlanEditor::new(wizard.draft().materials.clone(), Default::default());
    if !args.processes.is_empty() {
        for spec in &args.processes {
            let (index, assignment) = parse_process_spec(spec).into_diagnostic()?;
            let mut entry = plan.entry(index).ok_or_else(|| {
                miette::miette!(
                    "Process '{}' refers to material {} but only {} material line(s) exist",
                    spec,
                    index,
                    plan.materials().len()
                )
            })?;
            entry.select_process(assignment.manufacturing_process);
            entry
                .select_sub_processes(&assignment.sub_processes)
                .into_diagnostic()?;
            plan.save_entry(index, &mut entry);
        }
    } else if args.assist && !plan.materials().is_empty() {
        let request = ProcessClassificationRequest::from_draft(wizard.draft());
        let cancel = CancelToken::new();
        match session.block_on(&cancel, plan.generate(session.service(), &request, &cancel)) {
            Ok(Some(n)) => eprintln!(
                "{} Processes suggested for {} line(s)",
                style("✓").green(),
                n
            ),
            Ok(None) => {}
            Err(e) => eprintln!(
                "{} Could not suggest processes: {}",
                style("!").yellow(),
                e
            ),
        }
    }
    wizard.complete_step(StepData::Processes(plan.finish()));

    // Summary
    match wizard.complete_step(StepData::Confirm) {
        StepOutcome::Finished => Ok(wizard.into_draft()),
        StepOutcome::Advanced(step) => Err(miette::miette!(
            "Wizard stopped early at step '{}'",
            step.title()
        )),
    }
}

fn apply_category_flags(form: &mut CategorizationForm, args: &NewArgs) -> Result<()> {
    if let Some(category) = &args.category {
        form.select_category(category.trim()).into_diagnostic()?;
    }
    if let Some(sub) = &args.sub_category {
        form.select_sub_category(sub.trim()).into_diagnostic()?;
    }
    if let Some(units) = &args.units {
        form.set_number_of_units(units).into_diagnostic()?;
    }
    if let Some(weight) = &args.weight {
        form.set_total_weight(weight).into_diagnostic()?;
    }
    if let Some(brand) = &args.brand {
        form.set_brand_name(brand);
    }
    if let Some(supplier) = &args.supplier {
        form.set_supplier_name(supplier);
    }
    if args.country.is_some() {
        form.set_country(args.country);
    }
    Ok(())
}

/// Feed `CLASS[:MATERIAL[:WEIGHT]]` specs through the manual entry form
fn manual_materials(specs: &[String]) -> Result<Vec<MaterialLine>> {
    let lines = specs
        .iter()
        .map(|s| s.parse::<MaterialLine>().into_diagnostic())
        .collect::<Result<Vec<_>>>()?;

    let mut editor = BomEditor::new(EntryMode::Manual);
    let form = editor
        .open_form()
        .ok_or_else(|| miette::miette!("Manual material entry is unavailable"))?;
    for (i, line) in lines.iter().enumerate() {
        let row = if i == 0 { 0 } else { form.add_another() };
        form.set_class(row, line.material_class);
        if let Some(specific) = &line.specific_material {
            form.set_specific(row, specific).into_diagnostic()?;
        }
        form.set_weight(row, &line.weight).into_diagnostic()?;
    }
    if !editor.save_form() {
        return Err(miette::miette!(
            "Every material line needs a class and a numeric weight"
        ));
    }
    Ok(editor.finish())
}

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "CODE")]
    code: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "CATEGORY")]
    category: String,
    #[tabled(rename = "MATERIALS")]
    materials: usize,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "CREATED")]
    created: String,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        Self {
            id: format_short_id(p.id()),
            code: p.info.code.clone(),
            name: truncate_str(p.title(), 30),
            category: or_dash(&p.categorization.category),
            materials: p.materials.len(),
            status: p.status().to_string(),
            created: p.created().format("%Y-%m-%d").to_string(),
        }
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    if args.remote {
        return run_list_remote(args, global);
    }
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let search = args.search.as_deref().map(str::to_lowercase);
    let category = args.category.as_deref().map(str::to_lowercase);
    let mut products: Vec<Product> = project
        .load_products()
        .into_iter()
        .filter(|p| match args.status {
            StatusFilter::Draft => p.status == Status::Draft,
            StatusFilter::Submitted => p.status == Status::Submitted,
            StatusFilter::All => true,
        })
        .filter(|p| {
            search.as_deref().is_none_or(|q| {
                p.info.code.to_lowercase().contains(q)
                    || p.info.name.to_lowercase().contains(q)
                    || p.categorization.category.to_lowercase().contains(q)
            })
        })
        .filter(|p| {
            category
                .as_deref()
                .is_none_or(|c| p.categorization.category.to_lowercase().contains(c))
        })
        .collect();
    products.sort_by(|a, b| a.created.cmp(&b.created));

    if args.count {
        println!("{}", products.len());
        return Ok(());
    }

    if products.is_empty() {
        println!("No products found.");
        return Ok(());
    }

    match effective_format(global.format, true) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&products, format)?,
        OutputFormat::Table => {
            let rows: Vec<ProductRow> = products.iter().map(ProductRow::from).collect();
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{}", table);
        }
        format => {
            let rows: Vec<Vec<String>> = products
                .iter()
                .map(|p| {
                    let row = ProductRow::from(p);
                    vec![
                        p.id().to_string(),
                        row.code,
                        row.name,
                        row.category,
                        row.materials.to_string(),
                        row.status,
                        row.created,
                    ]
                })
                .collect();
            print_delimited(
                &["id", "code", "name", "category", "materials", "status", "created"],
                &rows,
                format,
            )?;
        }
    }
    Ok(())
}

#[derive(Tabled)]
struct RemoteProductRow {
    #[tabled(rename = "CODE")]
    code: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "CATEGORY")]
    category: String,
    #[tabled(rename = "SUB-CATEGORY")]
    sub_category: String,
    #[tabled(rename = "WEIGHT")]
    weight: String,
    #[tabled(rename = "CO2")]
    co2: String,
}

impl From<&RemoteProduct> for RemoteProductRow {
    fn from(p: &RemoteProduct) -> Self {
        Self {
            code: p.code().to_string(),
            name: truncate_str(&p.name, 40),
            category: or_dash(p.category.trim()),
            sub_category: or_dash(p.sub_category.trim()),
            weight: or_dash(&p.weight),
            co2: or_dash(&p.co2_emission),
        }
    }
}

fn run_list_remote(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let mut config = Config::load();
    if let Some(url) = &args.api_url {
        config.api_base_url = Some(url.clone());
    }
    let session = ServiceSession::new(&HostContext::from_config(&config))?;

    let cancel = CancelToken::new();
    let fetched = session
        .block_on(&cancel, async {
            tokio::select! {
                _ = cancel.cancelled() => None,
                r = session.service().list_products() => Some(r),
            }
        })
        .ok_or_else(|| miette::miette!("Cancelled"))?
        .map_err(|e| miette::miette!("{}", e))?;

    let products: Vec<RemoteProduct> = fetched
        .into_iter()
        .filter(|p| p.matches(args.search.as_deref(), args.category.as_deref()))
        .collect();

    if args.count {
        println!("{}", products.len());
        return Ok(());
    }

    if products.is_empty() {
        println!("No products found.");
        return Ok(());
    }

    match effective_format(global.format, true) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&products, format)?,
        OutputFormat::Table => {
            let rows: Vec<RemoteProductRow> = products.iter().map(RemoteProductRow::from).collect();
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{}", table);
        }
        format => {
            let rows: Vec<Vec<String>> = products
                .iter()
                .map(|p| {
                    vec![
                        p.code().to_string(),
                        p.name.clone(),
                        p.category.trim().to_string(),
                        p.sub_category.clone(),
                        p.weight.clone(),
                        p.co2_emission.clone(),
                    ]
                })
                .collect();
            print_delimited(
                &["code", "name", "category", "sub_category", "weight", "co2_emission"],
                &rows,
                format,
            )?;
        }
    }
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let product = project
        .find_product(&args.id)
        .map_err(|e| miette::miette!("{}", e))?;

    match effective_format(global.format, false) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&product, format)?,
        _ => {
            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {}", style("ID").bold(), style(product.id()).cyan());
            println!("{}: {}", style("Status").bold(), product.status());
            println!("{}: {}", style("Author").bold(), product.author());
            println!(
                "{}: {}",
                style("Created").bold(),
                product.created().format("%Y-%m-%d %H:%M")
            );
            if !product.info.description.is_empty() {
                println!("{}: {}", style("Description").bold(), product.info.description);
            }
            let c = &product.categorization;
            println!("{}: {}", style("Units").bold(), or_dash(&c.number_of_units));
            println!("{}: {}", style("Total weight").bold(), or_dash(&c.total_weight));
            println!("{}: {}", style("Brand").bold(), or_dash(&c.brand_name));
            println!("{}: {}", style("Supplier").bold(), or_dash(&c.supplier_name));
            println!(
                "{}: {}",
                style("Country").bold(),
                c.country
                    .map(|c| format!("{} ({})", c.code(), c.label()))
                    .unwrap_or_else(|| "-".to_string())
            );
            println!("{}", style("─".repeat(60)).dim());
            print_summary(&product.to_draft());
        }
    }
    Ok(())
}

fn run_summary(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let product = project
        .find_product(&args.id)
        .map_err(|e| miette::miette!("{}", e))?;
    let summary = ProductSummary::from_draft(&product.to_draft());

    match global.format {
        OutputFormat::Auto | OutputFormat::Table => println!("{}", summary.render_table()),
        OutputFormat::Csv => print!("{}", summary.to_csv().into_diagnostic()?),
        OutputFormat::Tsv => print_delimited(&RECORD_HEADERS, &summary.records(), OutputFormat::Tsv)?,
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&summary, format)?,
    }
    Ok(())
}
