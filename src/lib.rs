//! LCA: life-cycle assessment product entry toolkit
//!
//! A step-by-step wizard that collects product information, categorization,
//! a bill of materials and manufacturing processes, backed by a remote
//! classification service and stored as plain-text YAML.

pub mod cli;
pub mod core;
pub mod entities;
pub mod logging;
pub mod service;
pub mod yaml;
