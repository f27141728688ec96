pub mod keys;
pub mod phong;
pub mod shadow_caster;
pub mod shadow_receiver;

pub use keys::{phong_shader_key, shadow_caster_shader_key, shadow_receiver_shader_key};
pub use phong::{PhongFlags, PhongShader};
pub use shadow_caster::ShadowCasterShader;
pub use shadow_receiver::{ShadowReceiverShader, DEFAULT_SHADOW_BIAS};
