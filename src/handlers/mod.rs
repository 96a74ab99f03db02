// handlers/mod.rs - Built-in API modules
//
// Each versioned directory contributes ApiModules to the startup registry.
// Adding a version means adding a directory and a `register` call below.

pub mod v1;

use crate::dispatch::{ApiRegistry, RegistryError};

/// Registry holding every module shipped with the server
pub fn builtin_registry() -> Result<ApiRegistry, RegistryError> {
    let mut registry = ApiRegistry::new();
    v1::register(&mut registry)?;
    Ok(registry)
}
