use super::PhongFlags;
use crate::resource::ResourceKey;

pub const SHADOW_CASTER_SHADER_KEY: &str = "ShadowCasterShader";

/// Cache key for a Phong variant. Distinct for every (light count, flags).
pub fn phong_shader_key(light_count: u32, flags: PhongFlags) -> ResourceKey {
    ResourceKey::new(format!("Phong-lights={}-flags={}", light_count, flags.bits()))
}

/// Cache key for a shadow receiver specialised for `layer_count` layers.
pub fn shadow_receiver_shader_key(layer_count: u32) -> ResourceKey {
    ResourceKey::new(format!("shadow-receiver-{}", layer_count))
}

pub fn shadow_caster_shader_key() -> ResourceKey {
    ResourceKey::from(SHADOW_CASTER_SHADER_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn phong_keys_are_distinct_across_counts_and_flags() {
        let flag_sets = [
            PhongFlags::OBJECT_ID,
            PhongFlags::OBJECT_ID | PhongFlags::AMBIENT_TEXTURE,
            PhongFlags::OBJECT_ID | PhongFlags::DIFFUSE_TEXTURE,
            PhongFlags::OBJECT_ID | PhongFlags::SPECULAR_TEXTURE,
            PhongFlags::all(),
        ];
        let mut seen = HashSet::new();
        for lights in 0..12 {
            for flags in flag_sets {
                assert!(seen.insert(phong_shader_key(lights, flags)));
            }
        }
    }

    #[test]
    fn phong_key_is_stable() {
        assert_eq!(
            phong_shader_key(3, PhongFlags::OBJECT_ID | PhongFlags::DIFFUSE_TEXTURE).as_str(),
            "Phong-lights=3-flags=66"
        );
    }

    #[test]
    fn shadow_receiver_key_encodes_layers() {
        assert_eq!(shadow_receiver_shader_key(4).as_str(), "shadow-receiver-4");
        assert_ne!(shadow_receiver_shader_key(1), shadow_receiver_shader_key(2));
    }
}
