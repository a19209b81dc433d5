//! Read-only product summary: each material line with its process groups

use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::entities::product::ProductDraft;

/// A process with its sub-processes, as shown under a material
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessGroup {
    pub process: String,
    pub sub_processes: Vec<String>,
}

/// One material line of the summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub material_class: String,
    pub specific_material: String,
    pub weight: String,
    pub unit: String,
    pub process_groups: Vec<ProcessGroup>,
}

/// Tabular projection of a draft
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub code: String,
    pub name: String,
    pub rows: Vec<SummaryRow>,
}

/// Column names of [`ProductSummary::records`]
pub const RECORD_HEADERS: [&str; 7] = [
    "material_index",
    "material_class",
    "specific_material",
    "weight",
    "unit",
    "process",
    "sub_process",
];

#[derive(Tabled)]
struct TableRow {
    #[tabled(rename = "MATERIAL CLASS")]
    class: String,
    #[tabled(rename = "SPECIFIC MATERIAL")]
    specific: String,
    #[tabled(rename = "WEIGHT")]
    weight: String,
    #[tabled(rename = "PROCESSES")]
    processes: String,
}

impl ProductSummary {
    /// Pure projection; never touches the draft
    pub fn from_draft(draft: &ProductDraft) -> Self {
        let rows = draft
            .materials
            .iter()
            .enumerate()
            .map(|(i, line)| SummaryRow {
                material_class: line.material_class.to_string(),
                specific_material: line.specific_display().to_string(),
                weight: line.weight.clone(),
                unit: line.unit.to_string(),
                process_groups: draft
                    .processes_for(i)
                    .iter()
                    .map(|a| ProcessGroup {
                        process: a.manufacturing_process.to_string(),
                        sub_processes: a.sub_processes.clone(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            code: draft.info.code.clone(),
            name: draft.info.name.clone(),
            rows,
        }
    }

    /// Terminal table, one line per material; process groups as `Process: a, b`
    pub fn render_table(&self) -> String {
        let rows: Vec<TableRow> = self
            .rows
            .iter()
            .map(|r| TableRow {
                class: r.material_class.clone(),
                specific: r.specific_material.clone(),
                weight: format!("{} {}", r.weight, r.unit).trim().to_string(),
                processes: r
                    .process_groups
                    .iter()
                    .map(|g| format!("{}: {}", g.process, g.sub_processes.join(", ")))
                    .collect::<Vec<_>>()
                    .join("\n"),
            })
            .collect();

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        table.to_string()
    }

    /// Flat records: one per (material, process, sub-process).
    /// A material without processes still yields one record with empty process columns.
    pub fn records(&self) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            let base = vec![
                i.to_string(),
                row.material_class.clone(),
                row.specific_material.clone(),
                row.weight.clone(),
                row.unit.clone(),
            ];
            if row.process_groups.is_empty() {
                let mut record = base.clone();
                record.extend([String::new(), String::new()]);
                out.push(record);
                continue;
            }
            for group in &row.process_groups {
                for sub in &group.sub_processes {
                    let mut record = base.clone();
                    record.extend([group.process.clone(), sub.clone()]);
                    out.push(record);
                }
            }
        }
        out
    }

    pub fn to_csv(&self) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(RECORD_HEADERS)?;
        for record in self.records() {
            writer.write_record(&record)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::material::{MaterialClass, MaterialLine};
    use crate::entities::process::{ManufacturingProcess, ProcessAssignment};
    use crate::entities::product::ProductInfo;

    fn draft() -> ProductDraft {
        let mut draft = ProductDraft {
            info: ProductInfo::new("P1", "Chair", "Wood chair"),
            ..Default::default()
        };
        draft
            .materials
            .push(MaterialLine::new(MaterialClass::Wood, Some("Oak"), "2.5").unwrap());
        draft
            .materials
            .push(MaterialLine::new(MaterialClass::Metal, None, "0.3").unwrap());
        draft.processes_by_material_index.insert(
            0,
            vec![ProcessAssignment::new(ManufacturingProcess::Machining, ["CNC Milling", "Turning"]).unwrap()],
        );
        draft
    }

    #[test]
    fn test_summary_groups_processes_per_material() {
        let summary = ProductSummary::from_draft(&draft());
        assert_eq!(summary.code, "P1");
        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].process_groups.len(), 1);
        assert_eq!(summary.rows[0].process_groups[0].sub_processes.len(), 2);
        assert!(summary.rows[1].process_groups.is_empty());
    }

    #[test]
    fn test_summary_ignores_stale_indices() {
        let mut d = draft();
        d.processes_by_material_index.insert(
            9,
            vec![ProcessAssignment::new(ManufacturingProcess::Casting, ["Die Casting"]).unwrap()],
        );
        let summary = ProductSummary::from_draft(&d);
        assert_eq!(summary.rows.len(), 2);
    }

    #[test]
    fn test_render_table_contains_values() {
        let table = ProductSummary::from_draft(&draft()).render_table();
        assert!(table.contains("MATERIAL CLASS"));
        assert!(table.contains("Oak"));
        assert!(table.contains("2.5 kg"));
        assert!(table.contains("Machining: CNC Milling, Turning"));
    }

    #[test]
    fn test_csv_one_record_per_sub_process() {
        let csv = ProductSummary::from_draft(&draft()).to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        // header + 2 sub-processes for Oak + 1 bare row for Metal
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "0,Wood,Oak,2.5,kg,Machining,CNC Milling");
        assert_eq!(lines[3], "1,Metal,,0.3,kg,,");
    }
}
