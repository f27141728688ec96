pub mod shadow_light;

pub use shadow_light::{ShadowLayer, ShadowLight};

/// Shadow-casting lights registered for one light setup, stored in the
/// [`ShadowMapRegistry`](crate::resource::ShadowMapRegistry) under the light
/// setup's key. Receivers only consume the first light.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightSetupShadowMaps {
    lights: Vec<ShadowLight>,
}

impl LightSetupShadowMaps {
    pub fn new(lights: Vec<ShadowLight>) -> Self {
        Self { lights }
    }

    pub fn push(&mut self, light: ShadowLight) {
        self.lights.push(light);
    }

    pub fn first(&self) -> Option<&ShadowLight> {
        self.lights.first()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ShadowLight> {
        self.lights.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
}
