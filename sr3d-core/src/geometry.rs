/// Indexed triangle meshes with flat per-face colors
use std::f32::consts::TAU;

use crate::color::Color;
use crate::math::Vec3;

/// Three indices into a mesh's vertex list, counter-clockwise when seen from outside
pub type Face = [usize; 3];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: usize,
        vertex_count: usize,
    },

    #[error("mesh has {faces} faces but {colors} face colors")]
    ColorCountMismatch { faces: usize, colors: usize },
}

/// A renderable solid: vertices, triangular faces and one flat color per face.
///
/// Built once and immutable afterwards. Every face index addresses a vertex and
/// there is exactly one color per face.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    faces: Vec<Face>,
    face_colors: Vec<Color>,
}

impl Mesh {
    pub fn new(
        vertices: Vec<Vec3>,
        faces: Vec<Face>,
        face_colors: Vec<Color>,
    ) -> Result<Self, MeshError> {
        if faces.len() != face_colors.len() {
            return Err(MeshError::ColorCountMismatch {
                faces: faces.len(),
                colors: face_colors.len(),
            });
        }
        for (face, indices) in faces.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i >= vertices.len()) {
                return Err(MeshError::IndexOutOfRange {
                    face,
                    index,
                    vertex_count: vertices.len(),
                });
            }
        }
        Ok(Self {
            vertices,
            faces,
            face_colors,
        })
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn face_colors(&self) -> &[Color] {
        &self.face_colors
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    /// Iterate faces in stored order as `(v0, v1, v2, color)`
    pub fn triangles(&self) -> impl Iterator<Item = (Vec3, Vec3, Vec3, Color)> + '_ {
        self.faces
            .iter()
            .zip(&self.face_colors)
            .map(|(&[a, b, c], &color)| (self.vertices[a], self.vertices[b], self.vertices[c], color))
    }

    /// Same geometry with every face painted `color`
    pub fn with_color(mut self, color: Color) -> Self {
        self.face_colors.fill(color);
        self
    }

    /// Signed volume enclosed by the faces; positive when faces wind outward
    pub fn signed_volume(&self) -> f32 {
        self.triangles()
            .map(|(a, b, c, _)| a.dot(&b.cross(&c)) / 6.0)
            .sum()
    }

    /// Axis-aligned cube centred on the origin, two triangles and one color per side
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let vertices = vec![
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
        ];

        let sides: [([Face; 2], Color); 6] = [
            ([[4, 5, 6], [4, 6, 7]], Color::rgb(231, 76, 60)),   // +z
            ([[5, 1, 2], [5, 2, 6]], Color::rgb(52, 152, 219)),  // +x
            ([[1, 0, 3], [1, 3, 2]], Color::rgb(46, 204, 113)),  // -z
            ([[0, 4, 7], [0, 7, 3]], Color::rgb(241, 196, 15)),  // -x
            ([[7, 6, 2], [7, 2, 3]], Color::rgb(155, 89, 182)),  // +y
            ([[0, 1, 5], [0, 5, 4]], Color::rgb(230, 126, 34)),  // -y
        ];

        let mut faces = Vec::with_capacity(12);
        let mut face_colors = Vec::with_capacity(12);
        for (pair, color) in sides {
            faces.extend(pair);
            face_colors.extend([color, color]);
        }

        Self {
            vertices,
            faces,
            face_colors,
        }
    }

    /// Beveled phone-like slab with a cylindrical camera bump on its back
    pub fn phone(spec: &PhoneSpec) -> Self {
        MeshBuilder::default().phone(spec)
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            face_colors: Vec::new(),
        }
    }
}

/// Dimensions and materials of [`Mesh::phone`]
#[derive(Debug, Clone, PartialEq)]
pub struct PhoneSpec {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    /// Chamfer cut from each corner of the outline
    pub corner: f32,
    /// Inset of the front and back rings relative to the sides
    pub bevel: f32,
    pub cam_segments: usize,
    pub cam_radius: f32,
    pub cam_height: f32,
    /// Camera centre on the back face, in the x/y plane
    pub cam_center: (f32, f32),
    pub screen: Color,
    pub body: Color,
    pub edge: Color,
    pub cam_ring: Color,
    pub lens: Color,
}

impl Default for PhoneSpec {
    fn default() -> Self {
        Self {
            width: 1.5,
            height: 3.0,
            depth: 0.3,
            corner: 0.2,
            bevel: 0.05,
            cam_segments: 16,
            cam_radius: 0.18,
            cam_height: 0.06,
            cam_center: (-0.4, 1.1),
            screen: Color::rgb(15, 15, 25),
            body: Color::rgb(60, 60, 70),
            edge: Color::rgb(170, 170, 180),
            cam_ring: Color::rgb(40, 40, 45),
            lens: Color::rgb(30, 60, 120),
        }
    }
}

#[derive(Default)]
struct MeshBuilder {
    vertices: Vec<Vec3>,
    faces: Vec<Face>,
    face_colors: Vec<Color>,
}

impl MeshBuilder {
    fn phone(mut self, spec: &PhoneSpec) -> Mesh {
        let (hx, hy, hz) = (spec.width / 2.0, spec.height / 2.0, spec.depth / 2.0);
        let b = spec.bevel;

        let front = self.ring(&outline(hx - b, hy - b, spec.corner), hz);
        let front_edge = self.ring(&outline(hx, hy, spec.corner), hz - b);
        let back_edge = self.ring(&outline(hx, hy, spec.corner), -hz + b);
        let back = self.ring(&outline(hx - b, hy - b, spec.corner), -hz);

        self.cap(&front, spec.screen, false);
        self.band(&front, &front_edge, spec.edge);
        self.band(&front_edge, &back_edge, spec.body);
        self.band(&back_edge, &back, spec.edge);
        self.cap(&back, spec.body, true);

        let (cx, cy) = spec.cam_center;
        let n = spec.cam_segments.max(3);
        let circle: Vec<(f32, f32)> = (0..n)
            .map(|k| {
                let (s, c) = (TAU * k as f32 / n as f32).sin_cos();
                (cx + spec.cam_radius * c, cy + spec.cam_radius * s)
            })
            .collect();
        let bump_base = self.ring(&circle, -hz);
        let bump_top = self.ring(&circle, -hz - spec.cam_height);
        self.band(&bump_base, &bump_top, spec.cam_ring);

        let lens_center = self.vertex(Vec3::new(cx, cy, -hz - spec.cam_height));
        for k in 0..n {
            let next = bump_top[(k + 1) % n];
            self.face([lens_center, next, bump_top[k]], spec.lens);
        }

        self.build()
    }

    fn vertex(&mut self, v: Vec3) -> usize {
        self.vertices.push(v);
        self.vertices.len() - 1
    }

    fn face(&mut self, face: Face, color: Color) {
        self.faces.push(face);
        self.face_colors.push(color);
    }

    fn ring(&mut self, points: &[(f32, f32)], z: f32) -> Vec<usize> {
        points
            .iter()
            .map(|&(x, y)| self.vertex(Vec3::new(x, y, z)))
            .collect()
    }

    /// Fan across a convex ring; `facing_back` flips it to face -z
    fn cap(&mut self, ring: &[usize], color: Color, facing_back: bool) {
        for i in 1..ring.len() - 1 {
            let (b, c) = (ring[i], ring[i + 1]);
            if facing_back {
                self.face([ring[0], c, b], color);
            } else {
                self.face([ring[0], b, c], color);
            }
        }
    }

    /// Quads joining two rings of equal length; `upper` lies on the +z side
    fn band(&mut self, upper: &[usize], lower: &[usize], color: Color) {
        let n = upper.len();
        for i in 0..n {
            let j = (i + 1) % n;
            self.face([lower[i], lower[j], upper[j]], color);
            self.face([lower[i], upper[j], upper[i]], color);
        }
    }

    fn build(self) -> Mesh {
        Mesh {
            vertices: self.vertices,
            faces: self.faces,
            face_colors: self.face_colors,
        }
    }
}

/// Rectangle with chamfered corners, counter-clockwise seen from +z
fn outline(hx: f32, hy: f32, corner: f32) -> [(f32, f32); 8] {
    let c = corner.min(hx).min(hy);
    [
        (-hx + c, -hy),
        (hx - c, -hy),
        (hx, -hy + c),
        (hx, hy - c),
        (hx - c, hy),
        (-hx + c, hy),
        (-hx, hy - c),
        (-hx, -hy + c),
    ]
}
