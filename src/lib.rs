pub mod asset;
pub mod gfx;
pub mod renderer;
pub mod resource;
pub mod scene;
pub mod settings;

pub use gfx::{
    Drawable, GenericDrawable, GenericDrawableConfig, LightInfo, LightSetup, PhongMaterialData,
    ShadowCasterDrawable,
};
pub use renderer::{DrawList, DrawTarget, WgpuBackend};
pub use resource::{ResourceKey, ResourceManager, ShaderManager, ShadowMapRegistry};
pub use scene::{Camera, SceneGraph};
pub use settings::RenderSettings;

/// Route `log` output through env_logger, `Info` unless `RUST_LOG` says
/// otherwise. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
