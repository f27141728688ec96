pub mod backend;
pub mod depth;
pub mod draw_list;
pub mod pipeline_builder;
pub mod texture;
pub mod uniforms;
pub mod vertex;

pub use backend::{FrameTargets, WgpuBackend};
pub use depth::{Depth, ObjectIdTarget};
pub use draw_list::{DrawCommand, DrawList, DrawTarget, ProgramSnapshot, ShaderProgram};
pub use pipeline_builder::PipelineBuilder;
pub use texture::Texture;
pub use vertex::Vertex;
