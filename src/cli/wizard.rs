//! Interactive product wizard
//!
//! Each step edits a copy of its slice of the draft and hands the result to
//! the [`WizardController`] only when the user moves forward.

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect, Select};
use miette::{IntoDiagnostic, Result};

use crate::cli::session::ServiceSession;
use crate::core::bom::{BomEditor, EntryMode, GenerateOutcome, MaterialForm};
use crate::core::cancel::CancelToken;
use crate::core::categorize::CategorizationForm;
use crate::core::process::ProcessPlanEditor;
use crate::core::summary::ProductSummary;
use crate::core::wizard::{StepData, StepOutcome, WizardController, WizardStep};
use crate::entities::material::{validate_weight, MaterialClass};
use crate::entities::process::ManufacturingProcess;
use crate::entities::product::{Country, ProductDraft, ProductInfo};
use crate::service::{
    BomClassificationRequest, ProcessClassificationRequest, ProductClassificationRequest,
};

/// What the user chose to do with a finished draft
pub struct WizardResult {
    pub draft: ProductDraft,
    pub submit: bool,
}

enum Nav {
    Next,
    Back,
    Cancel,
}

pub struct ProductWizard<'a> {
    theme: ColorfulTheme,
    session: &'a ServiceSession,
}

impl<'a> ProductWizard<'a> {
    pub fn new(session: &'a ServiceSession) -> Self {
        Self {
            theme: ColorfulTheme::default(),
            session,
        }
    }

    /// Run until the user finishes (Some) or cancels (None)
    pub fn run(&self) -> Result<Option<WizardResult>> {
        let mut wizard = WizardController::new();

        loop {
            self.print_indicator(&wizard);

            let data = match wizard.current() {
                WizardStep::ProductInformation => self.information(wizard.draft())?,
                WizardStep::Categorization => self.categorization(wizard.draft())?,
                WizardStep::BillOfMaterials => self.materials(wizard.draft())?,
                WizardStep::Manufacturing => self.processes(wizard.draft())?,
                WizardStep::Summary => {
                    print_summary(wizard.draft());
                    StepData::Confirm
                }
            };

            match self.navigate(wizard.current())? {
                Nav::Next => {
                    if wizard.complete_step(data) == StepOutcome::Finished {
                        let submit = Confirm::with_theme(&self.theme)
                            .with_prompt(format!(
                                "Submit to the LCA service at {}?",
                                self.session.base_url()
                            ))
                            .default(false)
                            .interact()
                            .into_diagnostic()?;
                        return Ok(Some(WizardResult {
                            draft: wizard.into_draft(),
                            submit,
                        }));
                    }
                }
                Nav::Back => wizard.back(),
                Nav::Cancel => {
                    wizard.reset();
                    return Ok(None);
                }
            }
        }
    }

    fn print_indicator(&self, wizard: &WizardController) {
        println!();
        let parts: Vec<String> = wizard
            .steps()
            .iter()
            .map(|s| {
                if s.active {
                    style(format!("▸ {}", s.step.title())).cyan().bold().to_string()
                } else if s.complete {
                    style(format!("✓ {}", s.step.title())).green().to_string()
                } else {
                    style(s.step.title()).dim().to_string()
                }
            })
            .collect();
        let separator = style("  ›  ").dim().to_string();
        println!("{}", parts.join(separator.as_str()));
        println!("{}", style("─".repeat(60)).dim());
        println!("{}", style(wizard.current()).bold());
    }

    fn navigate(&self, step: WizardStep) -> Result<Nav> {
        let next = if step.is_terminal() { "Finish" } else { "Next" };
        let mut items = vec![next];
        if step.previous().is_some() {
            items.push("Back");
        }
        items.push("Cancel");

        let choice = Select::with_theme(&self.theme)
            .items(&items)
            .default(0)
            .interact()
            .into_diagnostic()?;
        Ok(match items[choice] {
            "Back" => Nav::Back,
            "Cancel" => Nav::Cancel,
            _ => Nav::Next,
        })
    }

    // ----- Step 1 -----

    fn information(&self, draft: &ProductDraft) -> Result<StepData> {
        let required = |input: &String| -> std::result::Result<(), &'static str> {
            if input.trim().is_empty() {
                Err("Required")
            } else {
                Ok(())
            }
        };

        let code: String = Input::with_theme(&self.theme)
            .with_prompt("Product code")
            .with_initial_text(&draft.info.code)
            .validate_with(required)
            .interact_text()
            .into_diagnostic()?;
        let name: String = Input::with_theme(&self.theme)
            .with_prompt("Product name")
            .with_initial_text(&draft.info.name)
            .validate_with(required)
            .interact_text()
            .into_diagnostic()?;
        let description: String = Input::with_theme(&self.theme)
            .with_prompt("Description")
            .with_initial_text(&draft.info.description)
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()?;

        Ok(StepData::Information(ProductInfo::new(
            code.trim(),
            name.trim(),
            description.trim(),
        )))
    }

    // ----- Step 2 -----

    fn categorization(&self, draft: &ProductDraft) -> Result<StepData> {
        let mut form =
            CategorizationForm::new(self.session.taxonomy(), draft.categorization.clone());

        let suggest = Confirm::with_theme(&self.theme)
            .with_prompt("Suggest a category from the product description?")
            .default(form.data().category.is_empty())
            .interact()
            .into_diagnostic()?;
        if suggest {
            let request = ProductClassificationRequest::from_draft(draft);
            let cancel = CancelToken::new();
            let applied = self.session.block_on(
                &cancel,
                form.suggest(self.session.service(), &request, &cancel),
            );
            if !applied {
                println!("{} No usable suggestion", style("!").yellow());
            }
        }

        if form.taxonomy().is_empty() {
            let category: String = Input::with_theme(&self.theme)
                .with_prompt("Category")
                .with_initial_text(&form.data().category)
                .allow_empty(true)
                .interact_text()
                .into_diagnostic()?;
            if !category.trim().is_empty() {
                let previous = form.data().sub_category.clone();
                form.select_category(category.trim()).into_diagnostic()?;
                let sub: String = Input::with_theme(&self.theme)
                    .with_prompt("Sub-category")
                    .with_initial_text(&previous)
                    .allow_empty(true)
                    .interact_text()
                    .into_diagnostic()?;
                if !sub.trim().is_empty() {
                    form.select_sub_category(sub.trim()).into_diagnostic()?;
                }
            }
        } else {
            let categories: Vec<String> = form.taxonomy().categories().map(String::from).collect();
            let current = categories
                .iter()
                .position(|c| *c == form.data().category)
                .unwrap_or(0);
            let idx = Select::with_theme(&self.theme)
                .with_prompt("Category")
                .items(&categories)
                .default(current)
                .interact()
                .into_diagnostic()?;
            if categories[idx] != form.data().category {
                form.select_category(&categories[idx]).into_diagnostic()?;
            }

            let subs = form.sub_category_options().to_vec();
            if !subs.is_empty() {
                let current = subs
                    .iter()
                    .position(|s| *s == form.data().sub_category)
                    .unwrap_or(0);
                let idx = Select::with_theme(&self.theme)
                    .with_prompt("Sub-category")
                    .items(&subs)
                    .default(current)
                    .interact()
                    .into_diagnostic()?;
                form.select_sub_category(&subs[idx]).into_diagnostic()?;
            }
        }

        let units = self.numeric("Number of units", &form.data().number_of_units)?;
        form.set_number_of_units(&units).into_diagnostic()?;
        let weight = self.numeric("Total weight (kg)", &form.data().total_weight)?;
        form.set_total_weight(&weight).into_diagnostic()?;

        let brand: String = Input::with_theme(&self.theme)
            .with_prompt("Brand name")
            .with_initial_text(&form.data().brand_name)
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()?;
        form.set_brand_name(&brand);
        let supplier: String = Input::with_theme(&self.theme)
            .with_prompt("Supplier name")
            .with_initial_text(&form.data().supplier_name)
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()?;
        form.set_supplier_name(&supplier);

        let mut countries = vec!["(not set)".to_string()];
        countries.extend(Country::ALL.iter().map(|c| format!("{} - {}", c.code(), c.label())));
        let current = form
            .data()
            .country
            .and_then(|c| Country::ALL.iter().position(|x| *x == c))
            .map(|i| i + 1)
            .unwrap_or(0);
        let idx = Select::with_theme(&self.theme)
            .with_prompt("Country of manufacture")
            .items(&countries)
            .default(current)
            .interact()
            .into_diagnostic()?;
        form.set_country(idx.checked_sub(1).map(|i| Country::ALL[i]));

        Ok(StepData::Categorization(form.finish()))
    }

    fn numeric(&self, prompt: &str, initial: &str) -> Result<String> {
        Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .with_initial_text(initial)
            .allow_empty(true)
            .validate_with(|input: &String| -> std::result::Result<(), String> {
                validate_weight(input).map(|_| ()).map_err(|e| e.to_string())
            })
            .interact_text()
            .into_diagnostic()
    }

    // ----- Step 3 -----

    fn materials(&self, draft: &ProductDraft) -> Result<StepData> {
        let modes = ["Assisted (generate from the product description)", "Manual"];
        let start = if draft.materials.is_empty() { 0 } else { 1 };
        let idx = Select::with_theme(&self.theme)
            .with_prompt("How do you want to enter the bill of materials?")
            .items(&modes)
            .default(start)
            .interact()
            .into_diagnostic()?;
        let mode = if idx == 0 {
            EntryMode::Assisted
        } else {
            EntryMode::Manual
        };

        let mut editor = BomEditor::with_materials(EntryMode::Manual, draft.materials.clone());
        editor.set_mode(mode);

        loop {
            print_materials(&editor);
            let actions: &[&str] = match editor.mode() {
                EntryMode::Assisted => &["Generate materials", "Switch to manual entry", "Done"],
                EntryMode::Manual => &[
                    "Add lines",
                    "Edit a line",
                    "Delete a line",
                    "Switch to assisted entry",
                    "Done",
                ],
            };
            let choice = Select::with_theme(&self.theme)
                .items(actions)
                .default(0)
                .interact()
                .into_diagnostic()?;

            match actions[choice] {
                "Generate materials" => {
                    let request = BomClassificationRequest::from_draft(draft);
                    let cancel = CancelToken::new();
                    match self.session.block_on(
                        &cancel,
                        editor.generate(self.session.service(), &request, &cancel),
                    ) {
                        Ok(GenerateOutcome::Replaced(n)) => {
                            println!("{} Generated {} material line(s)", style("✓").green(), n)
                        }
                        Ok(GenerateOutcome::Cancelled) => {
                            println!("{} Generation cancelled", style("!").yellow())
                        }
                        Ok(GenerateOutcome::Disabled) => {}
                        Err(e) => println!("{} {}", style("!").yellow(), e),
                    }
                }
                "Switch to manual entry" => editor.set_mode(EntryMode::Manual),
                "Switch to assisted entry" => editor.set_mode(EntryMode::Assisted),
                "Add lines" => {
                    if let Some(form) = editor.open_form() {
                        self.fill_rows(form, 0)?;
                    }
                    self.save_or_report(&mut editor);
                }
                "Edit a line" => {
                    if let Some(i) = self.pick_line(&editor)? {
                        if let Some(form) = editor.edit(i) {
                            self.fill_rows(form, 0)?;
                        }
                        self.save_or_report(&mut editor);
                    }
                }
                "Delete a line" => {
                    if let Some(i) = self.pick_line(&editor)? {
                        editor.delete(i);
                    }
                }
                _ => return Ok(StepData::Materials(editor.finish())),
            }
        }
    }

    fn save_or_report(&self, editor: &mut BomEditor) {
        if !editor.save_form() {
            println!(
                "{} Every line needs a material class and a numeric weight; nothing saved",
                style("!").yellow()
            );
            editor.cancel_form();
        }
    }

    fn pick_line(&self, editor: &BomEditor) -> Result<Option<usize>> {
        if editor.materials().is_empty() {
            println!("No material lines yet.");
            return Ok(None);
        }
        let items: Vec<String> = editor
            .materials()
            .iter()
            .map(|m| format!("{} / {} / {} {}", m.material_class, m.specific_display(), m.weight, m.unit))
            .collect();
        let idx = Select::with_theme(&self.theme)
            .with_prompt("Line")
            .items(&items)
            .default(0)
            .interact()
            .into_diagnostic()?;
        Ok(Some(idx))
    }

    /// Prompt for `row` and any further rows the user adds
    fn fill_rows(&self, form: &mut MaterialForm, mut row: usize) -> Result<()> {
        loop {
            let existing = form.rows()[row].clone();

            let classes: Vec<String> = MaterialClass::ALL.iter().map(|c| c.to_string()).collect();
            let current = existing
                .material_class
                .and_then(|c| MaterialClass::ALL.iter().position(|x| *x == c))
                .unwrap_or(0);
            let idx = Select::with_theme(&self.theme)
                .with_prompt("Material class")
                .items(&classes)
                .default(current)
                .interact()
                .into_diagnostic()?;
            form.set_class(row, MaterialClass::ALL[idx]);

            let options = form.rows()[row].specific_options();
            let mut items = vec!["(not specified)"];
            items.extend(options.iter().copied());
            let current = form.rows()[row]
                .specific_material
                .as_deref()
                .and_then(|s| options.iter().position(|o| *o == s))
                .map(|i| i + 1)
                .unwrap_or(0);
            let idx = Select::with_theme(&self.theme)
                .with_prompt("Specific material")
                .items(&items)
                .default(current)
                .interact()
                .into_diagnostic()?;
            if idx > 0 {
                form.set_specific(row, items[idx]).into_diagnostic()?;
            }

            let weight = self.numeric("Weight (kg)", &existing.weight)?;
            form.set_weight(row, &weight).into_diagnostic()?;

            let more = Confirm::with_theme(&self.theme)
                .with_prompt("Add another line?")
                .default(false)
                .interact()
                .into_diagnostic()?;
            if !more {
                return Ok(());
            }
            row = form.add_another();
        }
    }

    // ----- Step 4 -----

    fn processes(&self, draft: &ProductDraft) -> Result<StepData> {
        let mut editor = ProcessPlanEditor::new(
            draft.materials.clone(),
            draft.processes_by_material_index.clone(),
        );
        if editor.materials().is_empty() {
            println!("No material lines; add materials to assign processes.");
            return Ok(StepData::Processes(editor.finish()));
        }

        loop {
            print_plan(&editor);
            let actions = [
                "Suggest processes",
                "Assign a process",
                "Remove an assignment",
                "Done",
            ];
            let choice = Select::with_theme(&self.theme)
                .items(&actions)
                .default(0)
                .interact()
                .into_diagnostic()?;

            match choice {
                0 => {
                    let request = ProcessClassificationRequest::from_draft(draft);
                    let cancel = CancelToken::new();
                    match self.session.block_on(
                        &cancel,
                        editor.generate(self.session.service(), &request, &cancel),
                    ) {
                        Ok(Some(n)) => println!(
                            "{} Processes suggested for {} line(s)",
                            style("✓").green(),
                            n
                        ),
                        Ok(None) => println!("{} Suggestion cancelled", style("!").yellow()),
                        Err(e) => println!("{} {}", style("!").yellow(), e),
                    }
                }
                1 => self.assign(&mut editor)?,
                2 => self.unassign(&mut editor)?,
                _ => return Ok(StepData::Processes(editor.finish())),
            }
        }
    }

    fn pick_material(&self, editor: &ProcessPlanEditor) -> Result<usize> {
        let items: Vec<String> = editor
            .materials()
            .iter()
            .enumerate()
            .map(|(i, m)| format!("{}. {} ({})", i + 1, m.material_class, m.specific_display()))
            .collect();
        Select::with_theme(&self.theme)
            .with_prompt("Material")
            .items(&items)
            .default(0)
            .interact()
            .into_diagnostic()
    }

    fn assign(&self, editor: &mut ProcessPlanEditor) -> Result<()> {
        let index = self.pick_material(editor)?;
        let Some(mut entry) = editor.entry(index) else {
            return Ok(());
        };

        let processes: Vec<String> = ManufacturingProcess::ALL
            .iter()
            .map(|p| p.to_string())
            .collect();
        let idx = Select::with_theme(&self.theme)
            .with_prompt("Manufacturing process")
            .items(&processes)
            .default(0)
            .interact()
            .into_diagnostic()?;
        entry.select_process(ManufacturingProcess::ALL[idx]);

        let options = entry.sub_process_options();
        let picked = MultiSelect::with_theme(&self.theme)
            .with_prompt("Sub-processes (space to select)")
            .items(options)
            .interact()
            .into_diagnostic()?;
        entry
            .select_sub_processes(picked.iter().map(|&i| options[i]))
            .into_diagnostic()?;

        if !editor.save_entry(index, &mut entry) {
            println!(
                "{} Select at least one sub-process; nothing added",
                style("!").yellow()
            );
        }
        Ok(())
    }

    fn unassign(&self, editor: &mut ProcessPlanEditor) -> Result<()> {
        let index = self.pick_material(editor)?;
        let assigned: Vec<String> = editor
            .assignments(index)
            .iter()
            .map(|a| format!("{}: {}", a.manufacturing_process, a.sub_processes.join(", ")))
            .collect();
        if assigned.is_empty() {
            println!("No processes assigned to that material.");
            return Ok(());
        }
        let position = Select::with_theme(&self.theme)
            .with_prompt("Assignment")
            .items(&assigned)
            .default(0)
            .interact()
            .into_diagnostic()?;
        editor.remove(index, position);
        Ok(())
    }
}

fn print_materials(editor: &BomEditor) {
    println!();
    println!(
        "{} ({} mode)",
        style("Bill of materials").bold(),
        editor.mode()
    );
    if editor.materials().is_empty() {
        println!("  {}", style("(empty)").dim());
    }
    for (i, m) in editor.materials().iter().enumerate() {
        println!(
            "  {}. {} / {} / {} {}",
            i + 1,
            style(m.material_class).cyan(),
            m.specific_display(),
            m.weight,
            m.unit
        );
    }
}

fn print_plan(editor: &ProcessPlanEditor) {
    println!();
    for (i, m) in editor.materials().iter().enumerate() {
        println!(
            "  {}. {} ({})",
            i + 1,
            style(m.material_class).cyan(),
            m.specific_display()
        );
        for a in editor.assignments(i) {
            println!(
                "     {} {}: {}",
                style("→").dim(),
                a.manufacturing_process,
                a.sub_processes.join(", ")
            );
        }
    }
}

pub fn print_summary(draft: &ProductDraft) {
    let summary = ProductSummary::from_draft(draft);
    println!(
        "{}: {}   {}: {}",
        style("Code").bold(),
        style(&summary.code).cyan(),
        style("Name").bold(),
        style(&summary.name).yellow()
    );
    let c = &draft.categorization;
    if !c.category.is_empty() {
        println!(
            "{}: {} / {}",
            style("Category").bold(),
            c.category,
            if c.sub_category.is_empty() {
                "-"
            } else {
                c.sub_category.as_str()
            }
        );
    }
    if summary.rows.is_empty() {
        println!("{}", style("No materials entered.").dim());
    } else {
        println!("{}", summary.render_table());
    }
}
