//! CLI command implementations

pub mod catalog;
pub mod completions;
pub mod init;
pub mod product;
pub mod widget;
