pub mod key;
pub mod manager;

pub use key::ResourceKey;
pub use manager::{Resource, ResourceDataState, ResourceManager, ResourcePolicy};

/// Cache shared by drawables for shader programs, light setups and materials.
pub type ShaderManager = ResourceManager;

/// Registry of per-light-setup shadow maps, written by the shadow pass.
pub type ShadowMapRegistry = ResourceManager;
