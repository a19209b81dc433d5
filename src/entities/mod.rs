//! Entity type definitions

pub mod material;
pub mod process;
pub mod product;

pub use material::{MassUnit, MaterialClass, MaterialError, MaterialLine};
pub use process::{ManufacturingProcess, ProcessAssignment, ProcessError};
pub use product::{Country, Product, ProductCategoryInfo, ProductDraft, ProductInfo, ProcessPlan};
