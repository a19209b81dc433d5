//! Bill-of-materials editor
//!
//! Two mutually exclusive entry modes feed one material list:
//! - **Assisted**: the whole list is replaced by a classification call.
//! - **Manual**: rows are entered through a [`MaterialForm`], either appended
//!   or spliced in place of the row being edited.
//!
//! Switching modes clears the list.

use tracing::{debug, info, warn};

use crate::core::cancel::CancelToken;
use crate::entities::material::{validate_weight, MassUnit, MaterialClass, MaterialError, MaterialLine};
use crate::service::{BomClassificationRequest, LcaService, ServiceError};

/// How the material list is populated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryMode {
    #[default]
    Assisted,
    Manual,
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryMode::Assisted => write!(f, "assisted"),
            EntryMode::Manual => write!(f, "manual"),
        }
    }
}

/// One editable row of the manual form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialRow {
    pub material_class: Option<MaterialClass>,
    pub specific_material: Option<String>,
    pub weight: String,
    pub unit: MassUnit,
}

impl MaterialRow {
    fn from_line(line: &MaterialLine) -> Self {
        Self {
            material_class: Some(line.material_class),
            specific_material: line.specific_material.clone(),
            weight: line.weight.clone(),
            unit: line.unit,
        }
    }

    /// Specific materials offered for the selected class
    pub fn specific_options(&self) -> &'static [&'static str] {
        self.material_class
            .map(|c| c.specific_materials())
            .unwrap_or(&[])
    }

    fn to_line(&self) -> Option<MaterialLine> {
        let class = self.material_class?;
        MaterialLine::new(class, self.specific_material.as_deref(), &self.weight).ok()
    }
}

/// Manual entry form: one or more rows saved together
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialForm {
    rows: Vec<MaterialRow>,
}

impl Default for MaterialForm {
    fn default() -> Self {
        Self {
            rows: vec![MaterialRow::default()],
        }
    }
}

impl MaterialForm {
    fn prefilled(line: &MaterialLine) -> Self {
        Self {
            rows: vec![MaterialRow::from_line(line)],
        }
    }

    pub fn rows(&self) -> &[MaterialRow] {
        &self.rows
    }

    /// Append a blank row; existing rows are untouched
    pub fn add_another(&mut self) -> usize {
        self.rows.push(MaterialRow::default());
        self.rows.len() - 1
    }

    /// Choose the class of a row; an incompatible specific material is cleared
    pub fn set_class(&mut self, row: usize, class: MaterialClass) -> bool {
        let Some(r) = self.rows.get_mut(row) else {
            return false;
        };
        r.material_class = Some(class);
        if let Some(specific) = &r.specific_material {
            if class.find_specific(specific).is_none() {
                r.specific_material = None;
            }
        }
        true
    }

    pub fn set_specific(&mut self, row: usize, name: &str) -> Result<(), MaterialError> {
        let Some(r) = self.rows.get_mut(row) else {
            return Ok(());
        };
        let class = r
            .material_class
            .ok_or_else(|| MaterialError::BadSpec(format!("row {} has no material class", row)))?;
        let canonical = class
            .find_specific(name)
            .ok_or_else(|| MaterialError::SpecificMismatch {
                class,
                material: name.to_string(),
                options: class.specific_materials().join(", "),
            })?;
        r.specific_material = Some(canonical.to_string());
        Ok(())
    }

    pub fn set_weight(&mut self, row: usize, weight: &str) -> Result<(), MaterialError> {
        let weight = validate_weight(weight)?;
        if let Some(r) = self.rows.get_mut(row) {
            r.weight = weight;
        }
        Ok(())
    }

    /// Every row has a class and a valid weight
    pub fn is_complete(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|r| r.to_line().is_some())
    }

    /// The rows as material lines, or `None` while the form is incomplete
    pub fn lines(&self) -> Option<Vec<MaterialLine>> {
        self.rows.iter().map(MaterialRow::to_line).collect()
    }
}

/// Replace `list[index]` with `replacement`, preserving everything around it
pub fn splice_rows(
    list: &[MaterialLine],
    index: usize,
    replacement: Vec<MaterialLine>,
) -> Vec<MaterialLine> {
    let mut out = list.to_vec();
    if index < out.len() {
        out.splice(index..=index, replacement);
    }
    out
}

/// Outcome of an assisted generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// List replaced with this many lines
    Replaced(usize),
    /// Token cancelled before the response arrived; result discarded
    Cancelled,
    /// Not in assisted mode; nothing was requested
    Disabled,
}

/// Material list plus the manual form state
#[derive(Debug, Clone, Default)]
pub struct BomEditor {
    mode: EntryMode,
    materials: Vec<MaterialLine>,
    form: Option<MaterialForm>,
    edit_index: Option<usize>,
}

impl BomEditor {
    pub fn new(mode: EntryMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Resume from materials already committed to the draft
    pub fn with_materials(mode: EntryMode, materials: Vec<MaterialLine>) -> Self {
        Self {
            mode,
            materials,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> EntryMode {
        self.mode
    }

    pub fn materials(&self) -> &[MaterialLine] {
        &self.materials
    }

    pub fn form(&self) -> Option<&MaterialForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut MaterialForm> {
        self.form.as_mut()
    }

    pub fn edit_index(&self) -> Option<usize> {
        self.edit_index
    }

    /// Switch entry mode. A real switch discards the list and any open form.
    pub fn set_mode(&mut self, mode: EntryMode) {
        if mode == self.mode {
            return;
        }
        if !self.materials.is_empty() {
            info!(from = %self.mode, to = %mode, discarded = self.materials.len(), "entry mode switched; material list cleared");
        }
        self.mode = mode;
        self.materials.clear();
        self.form = None;
        self.edit_index = None;
    }

    /// Open a blank form for new rows (manual mode only)
    pub fn open_form(&mut self) -> Option<&mut MaterialForm> {
        if self.mode != EntryMode::Manual {
            return None;
        }
        self.edit_index = None;
        self.form = Some(MaterialForm::default());
        self.form.as_mut()
    }

    /// Open the form pre-populated with row `index` (manual mode only)
    pub fn edit(&mut self, index: usize) -> Option<&mut MaterialForm> {
        if self.mode != EntryMode::Manual {
            return None;
        }
        let line = self.materials.get(index)?;
        self.form = Some(MaterialForm::prefilled(line));
        self.edit_index = Some(index);
        self.form.as_mut()
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
        self.edit_index = None;
    }

    /// Save the open form. No-op (returns false) when no form is open or it is incomplete.
    pub fn save_form(&mut self) -> bool {
        let Some(lines) = self.form.as_ref().and_then(MaterialForm::lines) else {
            return false;
        };
        match self.edit_index {
            Some(index) => {
                debug!(index, rows = lines.len(), "replacing edited material row");
                self.materials = splice_rows(&self.materials, index, lines);
            }
            None => self.materials.extend(lines),
        }
        self.form = None;
        self.edit_index = None;
        true
    }

    /// Remove one row by position
    pub fn delete(&mut self, index: usize) -> Option<MaterialLine> {
        if index >= self.materials.len() {
            return None;
        }
        if self.edit_index == Some(index) {
            self.cancel_form();
        }
        Some(self.materials.remove(index))
    }

    /// Apply a classification result: success replaces the list, failure leaves it untouched
    pub fn apply_generated(
        &mut self,
        result: Result<Vec<MaterialLine>, ServiceError>,
    ) -> Result<usize, ServiceError> {
        match result {
            Ok(lines) => {
                let n = lines.len();
                self.materials = lines;
                Ok(n)
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch materials from classification service");
                Err(e)
            }
        }
    }

    /// Request a bill of materials from the classifier (assisted mode only)
    pub async fn generate(
        &mut self,
        service: &dyn LcaService,
        request: &BomClassificationRequest,
        cancel: &CancelToken,
    ) -> Result<GenerateOutcome, ServiceError> {
        if self.mode != EntryMode::Assisted {
            return Ok(GenerateOutcome::Disabled);
        }
        if cancel.is_cancelled() {
            return Ok(GenerateOutcome::Cancelled);
        }
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("material generation cancelled");
                return Ok(GenerateOutcome::Cancelled);
            }
            r = service.classify_bom(request) => r,
        };
        self.apply_generated(result).map(GenerateOutcome::Replaced)
    }

    pub fn finish(&self) -> Vec<MaterialLine> {
        self.materials.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(class: MaterialClass, specific: &str, weight: &str) -> MaterialLine {
        MaterialLine::new(class, Some(specific), weight).unwrap()
    }

    fn three() -> Vec<MaterialLine> {
        vec![
            line(MaterialClass::Wood, "Oak", "1"),
            line(MaterialClass::Metal, "Aluminium", "2"),
            line(MaterialClass::Plastic, "Polypropylene", "3"),
        ]
    }

    #[test]
    fn test_splice_rows_replaces_one_with_many() {
        let original = three();
        let replacement = vec![
            line(MaterialClass::Metal, "Stainless Steel", "0.5"),
            line(MaterialClass::Wood, "Maple", "0.7"),
        ];
        let out = splice_rows(&original, 1, replacement.clone());

        assert_eq!(out.len(), original.len() - 1 + replacement.len());
        assert_eq!(out[0], original[0]);
        assert_eq!(&out[1..3], replacement.as_slice());
        assert_eq!(out[3], original[2]);
    }

    #[test]
    fn test_splice_rows_out_of_range_is_unchanged() {
        let original = three();
        assert_eq!(splice_rows(&original, 7, vec![]), original);
    }

    #[test]
    fn test_manual_add_and_another_row() {
        let mut bom = BomEditor::new(EntryMode::Manual);
        let form = bom.open_form().unwrap();
        form.set_class(0, MaterialClass::Wood);
        form.set_specific(0, "Oak").unwrap();
        form.set_weight(0, "2.5").unwrap();
        let second = form.add_another();
        assert_eq!(second, 1);
        assert_eq!(form.rows()[0].specific_material.as_deref(), Some("Oak"));

        // second row blank: save is disabled
        assert!(!bom.save_form());
        assert!(bom.materials().is_empty());

        bom.form_mut().unwrap().set_class(1, MaterialClass::Plastic);
        assert!(bom.save_form());
        assert_eq!(bom.materials().len(), 2);
        assert!(bom.form().is_none());
    }

    #[test]
    fn test_set_class_clears_incompatible_specific() {
        let mut form = MaterialForm::default();
        form.set_class(0, MaterialClass::Wood);
        form.set_specific(0, "Maple").unwrap();
        form.set_class(0, MaterialClass::Metal);
        assert_eq!(form.rows()[0].specific_material, None);
        assert_eq!(
            form.rows()[0].specific_options(),
            &["Stainless Steel", "Aluminium"]
        );
        assert!(form.set_specific(0, "Oak").is_err());
    }

    #[test]
    fn test_set_specific_requires_class() {
        let mut form = MaterialForm::default();
        assert!(form.set_specific(0, "Oak").is_err());
        assert!(form.rows()[0].specific_options().is_empty());
    }

    #[test]
    fn test_edit_splices_in_place() {
        let mut bom = BomEditor::with_materials(EntryMode::Manual, three());
        let form = bom.edit(1).unwrap();
        assert_eq!(form.rows()[0].material_class, Some(MaterialClass::Metal));
        form.set_specific(0, "Stainless Steel").unwrap();
        form.add_another();
        form.set_class(1, MaterialClass::Wood);
        assert!(bom.save_form());

        let m = bom.materials();
        assert_eq!(m.len(), 4);
        assert_eq!(m[0].specific_display(), "Oak");
        assert_eq!(m[1].specific_display(), "Stainless Steel");
        assert_eq!(m[2].material_class, MaterialClass::Wood);
        assert_eq!(m[3].specific_display(), "Polypropylene");
    }

    #[test]
    fn test_delete_removes_one_row() {
        let mut bom = BomEditor::with_materials(EntryMode::Manual, three());
        let removed = bom.delete(0).unwrap();
        assert_eq!(removed.specific_display(), "Oak");
        assert_eq!(bom.materials().len(), 2);
        assert!(bom.delete(5).is_none());
    }

    #[test]
    fn test_mode_switch_clears_list() {
        crate::logging::init_test();
        let mut bom = BomEditor::with_materials(EntryMode::Manual, three());
        bom.set_mode(EntryMode::Assisted);
        assert!(bom.materials().is_empty());

        let mut bom = BomEditor::with_materials(EntryMode::Assisted, three());
        bom.set_mode(EntryMode::Manual);
        assert!(bom.materials().is_empty());
    }

    #[test]
    fn test_same_mode_keeps_list() {
        let mut bom = BomEditor::with_materials(EntryMode::Manual, three());
        bom.set_mode(EntryMode::Manual);
        assert_eq!(bom.materials().len(), 3);
    }

    #[test]
    fn test_form_only_in_manual_mode() {
        let mut bom = BomEditor::with_materials(EntryMode::Assisted, three());
        assert!(bom.open_form().is_none());
        assert!(bom.edit(0).is_none());
    }

    #[test]
    fn test_apply_generated_failure_keeps_list() {
        crate::logging::init_test();
        let mut bom = BomEditor::with_materials(EntryMode::Assisted, three());
        let err = ServiceError::Status {
            url: "http://x/api/classify-bom".to_string(),
            status: 500,
            body: String::new(),
        };
        assert!(bom.apply_generated(Err(err)).is_err());
        assert_eq!(bom.materials(), three().as_slice());

        let n = bom
            .apply_generated(Ok(vec![line(MaterialClass::Wood, "Maple", "9")]))
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(bom.materials().len(), 1);
    }
}
