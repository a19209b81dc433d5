//! Manufacturing process assignments for material lines

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level manufacturing process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ManufacturingProcess {
    Casting,
    Molding,
    Machining,
}

impl ManufacturingProcess {
    pub const ALL: [ManufacturingProcess; 3] = [
        ManufacturingProcess::Casting,
        ManufacturingProcess::Molding,
        ManufacturingProcess::Machining,
    ];

    /// Sub-processes offered once this process is selected
    pub fn sub_processes(&self) -> &'static [&'static str] {
        match self {
            ManufacturingProcess::Casting => &["Die Casting", "Sand Casting"],
            ManufacturingProcess::Molding => &["Injection Molding", "Blow Molding"],
            ManufacturingProcess::Machining => &["CNC Milling", "Turning"],
        }
    }

    /// Canonical spelling of a sub-process, if it belongs to this process
    pub fn find_sub_process(&self, name: &str) -> Option<&'static str> {
        self.sub_processes()
            .iter()
            .copied()
            .find(|p| p.eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for ManufacturingProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManufacturingProcess::Casting => write!(f, "Casting"),
            ManufacturingProcess::Molding => write!(f, "Molding"),
            ManufacturingProcess::Machining => write!(f, "Machining"),
        }
    }
}

impl std::str::FromStr for ManufacturingProcess {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "casting" => Ok(ManufacturingProcess::Casting),
            "molding" | "moulding" => Ok(ManufacturingProcess::Molding),
            "machining" => Ok(ManufacturingProcess::Machining),
            _ => Err(ProcessError::UnknownProcess(s.to_string())),
        }
    }
}

/// Errors raised while assembling process assignments
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Unknown manufacturing process '{0}'. Use Casting, Molding, or Machining")]
    UnknownProcess(String),

    #[error("'{sub_process}' is not a {process} sub-process (expected one of: {options})")]
    SubProcessMismatch {
        process: ManufacturingProcess,
        sub_process: String,
        options: String,
    },

    #[error("A manufacturing process needs at least one sub-process")]
    NoSubProcesses,

    #[error("Select a manufacturing process first")]
    NoProcess,

    #[error("Process spec '{0}' must look like MATERIAL_INDEX:PROCESS:SUB[+SUB...]")]
    BadSpec(String),
}

/// A manufacturing process with its selected sub-processes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessAssignment {
    pub manufacturing_process: ManufacturingProcess,

    /// Selected sub-processes, unique and in selection order
    pub sub_processes: Vec<String>,
}

impl ProcessAssignment {
    /// Build a validated assignment; duplicates are collapsed
    pub fn new<I, S>(process: ManufacturingProcess, sub_processes: I) -> Result<Self, ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected: Vec<String> = Vec::new();
        for name in sub_processes {
            let name = name.as_ref();
            let canonical = process.find_sub_process(name).ok_or_else(|| {
                ProcessError::SubProcessMismatch {
                    process,
                    sub_process: name.to_string(),
                    options: process.sub_processes().join(", "),
                }
            })?;
            if !selected.iter().any(|s| s == canonical) {
                selected.push(canonical.to_string());
            }
        }

        if selected.is_empty() {
            return Err(ProcessError::NoSubProcesses);
        }

        Ok(Self {
            manufacturing_process: process,
            sub_processes: selected,
        })
    }
}

/// Parse `INDEX:PROCESS:SUB[+SUB...]` into a material index and assignment
pub fn parse_process_spec(spec: &str) -> Result<(usize, ProcessAssignment), ProcessError> {
    let mut parts = spec.splitn(3, ':');
    let (Some(index), Some(process), Some(subs)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ProcessError::BadSpec(spec.to_string()));
    };
    let index: usize = index
        .trim()
        .parse()
        .map_err(|_| ProcessError::BadSpec(spec.to_string()))?;
    let process: ManufacturingProcess = process.parse()?;
    let assignment = ProcessAssignment::new(process, subs.split('+').filter(|s| !s.trim().is_empty()))?;
    Ok((index, assignment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_process_table() {
        assert_eq!(
            ManufacturingProcess::Casting.sub_processes(),
            &["Die Casting", "Sand Casting"]
        );
        assert_eq!(
            ManufacturingProcess::Molding.sub_processes(),
            &["Injection Molding", "Blow Molding"]
        );
        assert_eq!(
            ManufacturingProcess::Machining.sub_processes(),
            &["CNC Milling", "Turning"]
        );
    }

    #[test]
    fn test_assignment_requires_sub_process() {
        let empty: [&str; 0] = [];
        assert_eq!(
            ProcessAssignment::new(ManufacturingProcess::Casting, empty),
            Err(ProcessError::NoSubProcesses)
        );
    }

    #[test]
    fn test_assignment_rejects_foreign_sub_process() {
        let err = ProcessAssignment::new(ManufacturingProcess::Casting, ["Turning"]).unwrap_err();
        assert!(matches!(err, ProcessError::SubProcessMismatch { .. }));
    }

    #[test]
    fn test_assignment_dedupes_and_canonicalizes() {
        let a = ProcessAssignment::new(
            ManufacturingProcess::Machining,
            ["cnc milling", "Turning", "CNC Milling"],
        )
        .unwrap();
        assert_eq!(a.sub_processes, vec!["CNC Milling", "Turning"]);
    }

    #[test]
    fn test_parse_process_spec() {
        let (idx, a) = parse_process_spec("0:Machining:CNC Milling+Turning").unwrap();
        assert_eq!(idx, 0);
        assert_eq!(a.manufacturing_process, ManufacturingProcess::Machining);
        assert_eq!(a.sub_processes.len(), 2);

        assert!(parse_process_spec("Machining:CNC Milling").is_err());
        assert!(parse_process_spec("x:Machining:CNC Milling").is_err());
        assert_eq!(
            parse_process_spec("1:Casting:"),
            Err(ProcessError::NoSubProcesses)
        );
    }
}
