pub mod drawable;
pub mod generic_drawable;
pub mod light_setup;
pub mod material;
pub mod shaders;
pub mod shadow_caster_drawable;
pub mod shadows;

pub use drawable::{DrawContext, Drawable, NodeInfo, ID_UNDEFINED};
pub use generic_drawable::{GenericDrawable, GenericDrawableConfig};
pub use light_setup::{
    get_light_position_relative_to_camera, LightInfo, LightPositionModel, LightSetup,
};
pub use material::PhongMaterialData;
pub use shadow_caster_drawable::ShadowCasterDrawable;
pub use shadows::{LightSetupShadowMaps, ShadowLight};
