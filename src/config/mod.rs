//! Configuration module for bizlog
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence (diff rendering preferences)
//! - The operation catalog loaded from YAML

pub mod catalog;
pub mod paths;
pub mod settings;

pub use catalog::SpecCatalog;
pub use paths::BizlogPaths;
pub use settings::{DiffSettings, Settings};
