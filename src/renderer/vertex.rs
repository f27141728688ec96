use bytemuck::{Pod, Zeroable};
use std::mem;

/// Vertex layout shared by every drawable shader: position, normal, uv at
/// locations 0, 1 and 2.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2
    ];

    pub const fn new(pos: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self { pos, normal, uv }
    }

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Unit quad in the XY plane facing +Z.
pub fn quad() -> ([Vertex; 4], [u32; 6]) {
    let n = [0.0, 0.0, 1.0];
    (
        [
            Vertex::new([-0.5, -0.5, 0.0], n, [0.0, 1.0]),
            Vertex::new([0.5, -0.5, 0.0], n, [1.0, 1.0]),
            Vertex::new([0.5, 0.5, 0.0], n, [1.0, 0.0]),
            Vertex::new([-0.5, 0.5, 0.0], n, [0.0, 0.0]),
        ],
        [0, 1, 2, 0, 2, 3],
    )
}
