pub mod keepers;
pub mod system;
pub mod tenures;

use crate::dispatch::{ApiRegistry, RegistryError};

pub const VERSION: &str = "v1";

pub fn register(registry: &mut ApiRegistry) -> Result<(), RegistryError> {
    registry.register(VERSION, system::module())?;
    registry.register(VERSION, keepers::module())?;
    registry.register(VERSION, tenures::module())?;
    Ok(())
}
