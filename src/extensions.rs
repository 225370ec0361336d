//! Optional extension modules.
//!
//! The graphics extension is resolved here when a build links one in; the
//! core ships none, so sessions come up silently without it and importing
//! it reports an ordinary import fault.

use crate::value::Value;

/// Namespace and import name of the optional graphics extension.
pub const GRAPHICS_MODULE: &str = "grafico";

/// The graphics extension module, when available in this build.
pub fn graphics_module() -> Option<Value> {
    None
}

/// Resolve an extension module by import name.
pub fn load(name: &str) -> Option<Value> {
    match name {
        GRAPHICS_MODULE => graphics_module(),
        _ => None,
    }
}
