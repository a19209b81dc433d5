//! Manufacturing step: process entry per material line

use tracing::{debug, warn};

use crate::core::cancel::CancelToken;
use crate::entities::material::MaterialLine;
use crate::entities::process::{ManufacturingProcess, ProcessAssignment, ProcessError};
use crate::entities::product::ProcessPlan;
use crate::service::{LcaService, MaterialProcesses, ProcessClassificationRequest, ServiceError};

/// Process selector for one material line
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessEntry {
    material: MaterialLine,
    process: Option<ManufacturingProcess>,
    sub_processes: Vec<&'static str>,
    expanded: bool,
}

impl ProcessEntry {
    pub fn new(material: MaterialLine) -> Self {
        Self {
            material,
            process: None,
            sub_processes: Vec::new(),
            expanded: true,
        }
    }

    pub fn material(&self) -> &MaterialLine {
        &self.material
    }

    pub fn process(&self) -> Option<ManufacturingProcess> {
        self.process
    }

    pub fn selected_sub_processes(&self) -> &[&'static str] {
        &self.sub_processes
    }

    /// Sub-processes offered for the current process (empty until one is chosen)
    pub fn sub_process_options(&self) -> &'static [&'static str] {
        self.process.map(|p| p.sub_processes()).unwrap_or(&[])
    }

    /// Choose a process; switching to a different one clears the sub-process selection
    pub fn select_process(&mut self, process: ManufacturingProcess) {
        if self.process != Some(process) {
            self.sub_processes.clear();
        }
        self.process = Some(process);
    }

    /// Replace the sub-process selection. Names outside the current process are rejected.
    pub fn select_sub_processes<I, S>(&mut self, names: I) -> Result<(), ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let process = self.process.ok_or(ProcessError::NoProcess)?;
        let mut selected = Vec::new();
        for name in names {
            let name = name.as_ref();
            let canonical =
                process
                    .find_sub_process(name)
                    .ok_or_else(|| ProcessError::SubProcessMismatch {
                        process,
                        sub_process: name.to_string(),
                        options: process.sub_processes().join(", "),
                    })?;
            if !selected.contains(&canonical) {
                selected.push(canonical);
            }
        }
        self.sub_processes = selected;
        Ok(())
    }

    /// Save is enabled only with a process and at least one sub-process
    pub fn can_save(&self) -> bool {
        self.process.is_some() && !self.sub_processes.is_empty()
    }

    /// Hand the assignment to `on_add` if saving is enabled, then reset the selector.
    /// Returns whether the callback ran.
    pub fn handle_add_process<F>(&mut self, on_add: F) -> bool
    where
        F: FnOnce(ProcessAssignment),
    {
        let Some(process) = self.process.filter(|_| self.can_save()) else {
            return false;
        };
        let Ok(assignment) = ProcessAssignment::new(process, &self.sub_processes) else {
            return false;
        };
        on_add(assignment);
        self.process = None;
        self.sub_processes.clear();
        true
    }

    pub fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }
}

/// Process assignments for every material line of the draft
#[derive(Debug, Clone, Default)]
pub struct ProcessPlanEditor {
    materials: Vec<MaterialLine>,
    plan: ProcessPlan,
}

impl ProcessPlanEditor {
    /// Start from the draft's materials and any plan already committed
    pub fn new(materials: Vec<MaterialLine>, plan: ProcessPlan) -> Self {
        Self { materials, plan }
    }

    pub fn materials(&self) -> &[MaterialLine] {
        &self.materials
    }

    pub fn plan(&self) -> &ProcessPlan {
        &self.plan
    }

    /// A fresh selector for material `index`
    pub fn entry(&self, index: usize) -> Option<ProcessEntry> {
        self.materials.get(index).cloned().map(ProcessEntry::new)
    }

    pub fn assignments(&self, index: usize) -> &[ProcessAssignment] {
        self.plan.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Run the selector's save action against material `index`
    pub fn save_entry(&mut self, index: usize, entry: &mut ProcessEntry) -> bool {
        if index >= self.materials.len() {
            return false;
        }
        let plan = &mut self.plan;
        entry.handle_add_process(|assignment| plan.entry(index).or_default().push(assignment))
    }

    /// Append an already-validated assignment
    pub fn add(&mut self, index: usize, assignment: ProcessAssignment) -> bool {
        if index >= self.materials.len() {
            return false;
        }
        self.plan.entry(index).or_default().push(assignment);
        true
    }

    pub fn remove(&mut self, index: usize, position: usize) -> Option<ProcessAssignment> {
        let list = self.plan.get_mut(&index)?;
        if position >= list.len() {
            return None;
        }
        let removed = list.remove(position);
        if list.is_empty() {
            self.plan.remove(&index);
        }
        Some(removed)
    }

    /// Attach suggestions to every material line of the matching class.
    /// Replaces the whole plan; returns the number of lines that received processes.
    pub fn apply_suggestions(&mut self, suggestions: &[MaterialProcesses]) -> usize {
        let mut plan = ProcessPlan::new();
        for (i, line) in self.materials.iter().enumerate() {
            let assignments: Vec<ProcessAssignment> = suggestions
                .iter()
                .filter(|s| s.material_class == line.material_class)
                .flat_map(|s| s.assignments.iter().cloned())
                .collect();
            if !assignments.is_empty() {
                plan.insert(i, assignments);
            }
        }
        let n = plan.len();
        self.plan = plan;
        n
    }

    /// Request suggestions and apply them; failures are logged and leave the plan untouched
    pub async fn generate(
        &mut self,
        service: &dyn LcaService,
        request: &ProcessClassificationRequest,
        cancel: &CancelToken,
    ) -> Result<Option<usize>, ServiceError> {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("process generation cancelled");
                return Ok(None);
            }
            r = service.classify_processes(request) => r,
        };
        match result {
            Ok(suggestions) => Ok(Some(self.apply_suggestions(&suggestions))),
            Err(e) => {
                warn!(error = %e, "failed to fetch manufacturing processes");
                Err(e)
            }
        }
    }

    pub fn finish(&self) -> ProcessPlan {
        self.plan.clone()
    }
}

/// Re-key `plan` after the material list changed from `old` to `new`.
///
/// Lines are matched in order by class and specific material, so a deleted or
/// spliced row carries no assignments onto its neighbours. Assignments whose
/// line no longer exists are dropped.
pub fn realign_plan(
    old: &[MaterialLine],
    new: &[MaterialLine],
    plan: &ProcessPlan,
) -> ProcessPlan {
    let same = |a: &MaterialLine, b: &MaterialLine| {
        a.material_class == b.material_class && a.specific_material == b.specific_material
    };

    let mut out = ProcessPlan::new();
    let mut cursor = 0;
    for (i, line) in old.iter().enumerate() {
        let Some(offset) = new[cursor..].iter().position(|n| same(line, n)) else {
            if plan.contains_key(&i) {
                debug!(index = i, "material line removed; dropping its processes");
            }
            continue;
        };
        let j = cursor + offset;
        cursor = j + 1;
        if let Some(assignments) = plan.get(&i) {
            out.insert(j, assignments.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::material::MaterialClass;
    use std::cell::Cell;

    fn oak() -> MaterialLine {
        MaterialLine::new(MaterialClass::Wood, Some("Oak"), "2.5").unwrap()
    }

    #[test]
    fn test_handle_add_process_requires_process_and_sub_process() {
        let mut entry = ProcessEntry::new(oak());
        let calls = Cell::new(0);

        assert!(!entry.handle_add_process(|_| calls.set(calls.get() + 1)));

        entry.select_process(ManufacturingProcess::Machining);
        assert!(!entry.can_save());
        assert!(!entry.handle_add_process(|_| calls.set(calls.get() + 1)));
        assert_eq!(calls.get(), 0);

        entry.select_sub_processes(["CNC Milling"]).unwrap();
        assert!(entry.can_save());
        assert!(entry.handle_add_process(|a| {
            assert_eq!(a.sub_processes, vec!["CNC Milling"]);
            calls.set(calls.get() + 1)
        }));
        assert_eq!(calls.get(), 1);

        // selector resets after a successful save
        assert_eq!(entry.process(), None);
        assert!(entry.selected_sub_processes().is_empty());
    }

    #[test]
    fn test_sub_processes_filtered_by_process() {
        let mut entry = ProcessEntry::new(oak());
        assert!(entry.sub_process_options().is_empty());
        assert!(entry.select_sub_processes(["Turning"]).is_err());

        entry.select_process(ManufacturingProcess::Casting);
        assert_eq!(entry.sub_process_options(), &["Die Casting", "Sand Casting"]);
        assert!(entry.select_sub_processes(["Turning"]).is_err());
        entry.select_sub_processes(["Sand Casting"]).unwrap();

        entry.select_process(ManufacturingProcess::Casting);
        assert_eq!(entry.selected_sub_processes(), &["Sand Casting"]);
        entry.select_process(ManufacturingProcess::Molding);
        assert!(entry.selected_sub_processes().is_empty());
    }

    #[test]
    fn test_toggle_expanded_does_not_touch_selection() {
        let mut entry = ProcessEntry::new(oak());
        entry.select_process(ManufacturingProcess::Molding);
        entry.select_sub_processes(["Blow Molding"]).unwrap();
        entry.toggle_expanded();
        assert!(!entry.is_expanded());
        assert!(entry.can_save());
        entry.toggle_expanded();
        assert!(entry.is_expanded());
    }

    #[test]
    fn test_plan_editor_save_entry() {
        let mut editor = ProcessPlanEditor::new(vec![oak()], ProcessPlan::new());
        let mut entry = editor.entry(0).unwrap();
        entry.select_process(ManufacturingProcess::Machining);
        entry.select_sub_processes(["CNC Milling"]).unwrap();
        assert!(editor.save_entry(0, &mut entry));
        assert_eq!(editor.assignments(0).len(), 1);

        assert!(editor.entry(3).is_none());
        assert!(!editor.save_entry(3, &mut entry));
    }

    #[test]
    fn test_plan_editor_remove_drops_empty_key() {
        let mut editor = ProcessPlanEditor::new(vec![oak()], ProcessPlan::new());
        let a = ProcessAssignment::new(ManufacturingProcess::Machining, ["Turning"]).unwrap();
        assert!(editor.add(0, a.clone()));
        assert_eq!(editor.remove(0, 0), Some(a));
        assert!(editor.plan().is_empty());
        assert_eq!(editor.remove(0, 0), None);
    }

    #[test]
    fn test_apply_suggestions_by_material_class() {
        let metal = MaterialLine::new(MaterialClass::Metal, Some("Aluminium"), "1").unwrap();
        let mut editor = ProcessPlanEditor::new(vec![oak(), metal.clone(), metal], ProcessPlan::new());
        let casting = ProcessAssignment::new(ManufacturingProcess::Casting, ["Die Casting"]).unwrap();
        let n = editor.apply_suggestions(&[MaterialProcesses {
            material_class: MaterialClass::Metal,
            assignments: vec![casting.clone()],
        }]);
        assert_eq!(n, 2);
        assert!(editor.assignments(0).is_empty());
        assert_eq!(editor.assignments(1), &[casting.clone()]);
        assert_eq!(editor.assignments(2), &[casting]);
    }

    #[test]
    fn test_realign_plan_follows_deleted_row() {
        let metal = MaterialLine::new(MaterialClass::Metal, Some("Aluminium"), "1").unwrap();
        let plastic = MaterialLine::new(MaterialClass::Plastic, Some("Polypropylene"), "3").unwrap();
        let old = vec![oak(), metal.clone(), plastic.clone()];
        let casting = ProcessAssignment::new(ManufacturingProcess::Casting, ["Die Casting"]).unwrap();
        let mut plan = ProcessPlan::new();
        plan.insert(1, vec![casting.clone()]);

        let new = vec![metal, plastic];
        let realigned = realign_plan(&old, &new, &plan);

        assert_eq!(realigned.get(&0), Some(&vec![casting]));
        assert!(!realigned.contains_key(&1));
    }

    #[test]
    fn test_realign_plan_drops_replaced_row_and_keeps_weight_edits() {
        crate::logging::init_test();
        let steel = MaterialLine::new(MaterialClass::Metal, Some("Stainless Steel"), "1").unwrap();
        let heavier_oak = MaterialLine::new(MaterialClass::Wood, Some("Oak"), "4").unwrap();
        let milling = ProcessAssignment::new(ManufacturingProcess::Machining, ["CNC Milling"]).unwrap();
        let casting = ProcessAssignment::new(ManufacturingProcess::Casting, ["Sand Casting"]).unwrap();
        let mut plan = ProcessPlan::new();
        plan.insert(0, vec![milling.clone()]);
        plan.insert(1, vec![casting]);

        // row 0 re-weighed, row 1 spliced into two plastic rows
        let pp = MaterialLine::new(MaterialClass::Plastic, Some("Polypropylene"), "1").unwrap();
        let new = vec![heavier_oak, pp.clone(), pp];
        let realigned = realign_plan(&[oak(), steel], &new, &plan);

        assert_eq!(realigned.len(), 1);
        assert_eq!(realigned.get(&0), Some(&vec![milling]));
    }
}
