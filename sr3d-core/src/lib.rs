/// SR3D Core Library - software 3D rasterization
///
/// Vector/matrix math, a depth-tested framebuffer, flat-colored triangle
/// meshes and a CPU rasterizer that draws them in perspective. No GPU or 3D
/// API is involved; everything runs on one thread.

pub mod color;
pub mod framebuffer;
pub mod geometry;
pub mod math;
pub mod projection;
pub mod renderer;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use color::Color;
pub use framebuffer::Framebuffer;
pub use geometry::{Face, Mesh, MeshError, PhoneSpec};
pub use math::{Mat4, Vec3, Vec4};
pub use projection::Perspective;
pub use renderer::{RasterMode, RenderStats, Renderer, TriangleOutcome};
pub use stl::StlError;
pub use transform::{frame_progress, RotationState, Spin};
