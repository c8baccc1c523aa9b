/// STL reader (binary and ASCII) producing indexed, single-color meshes
use std::collections::HashMap;

use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, not_line_ending},
    combinator::map,
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use crate::color::Color;
use crate::geometry::{Mesh, MeshError};
use crate::math::Vec3;

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Color given to imported meshes unless the caller picks another
pub const DEFAULT_STL_COLOR: Color = Color::rgb(180, 180, 190);

#[derive(Debug, thiserror::Error)]
pub enum StlError {
    #[error("file too small to be a valid STL ({len} bytes)")]
    TooSmall { len: usize },

    #[error("binary STL declares {triangles} triangles but holds only {len} bytes")]
    Truncated { triangles: usize, len: usize },

    #[error("failed to parse ASCII STL: {0}")]
    Ascii(String),

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

type Triangle = [Vec3; 3];

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8], color: Color) -> Result<Mesh, StlError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(StlError::TooSmall { len: data.len() });
    }
    let (rest, triangles) = preceded(take(HEADER_LEN), le_u32)(data)
        .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| StlError::TooSmall { len: data.len() })?;
    let triangles = triangles as usize;
    if rest.len() < triangles.saturating_mul(FACET_LEN) {
        return Err(StlError::Truncated {
            triangles,
            len: data.len(),
        });
    }

    let (_, facets) = count(binary_facet, triangles)(rest).map_err(|_| StlError::Truncated {
        triangles,
        len: data.len(),
    })?;
    build_mesh(facets, color)
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    // The stored normal and attribute word are not needed for flat colors.
    let (input, _normal) = take(12usize)(input)?;
    let (input, v0) = binary_vec3(input)?;
    let (input, v1) = binary_vec3(input)?;
    let (input, v2) = binary_vec3(input)?;
    let (input, _attributes) = le_u16(input)?;
    Ok((input, [v0, v1, v2]))
}

fn binary_vec3(input: &[u8]) -> IResult<&[u8], Vec3> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, Vec3::new(x, y, z)))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str, color: Color) -> Result<Mesh, StlError> {
    let facets = match solid(input) {
        Ok((_, facets)) => facets,
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            return Err(StlError::Ascii(format!("unexpected input near {:?}", near(e.input))));
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(StlError::Ascii("unexpected end of input".into()));
        }
    };
    build_mesh(facets, color)
}

/// First line of the unparsed text, for error messages
fn near(rest: &str) -> String {
    rest.trim_start().lines().next().unwrap_or_default().chars().take(40).collect()
}

/// `inner` after optional whitespace
fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    preceded(multispace0, inner)
}

/// `solid <name>` facets... `endsolid`
fn solid(input: &str) -> IResult<&str, Vec<Triangle>> {
    delimited(
        pair(ws(tag("solid")), not_line_ending),
        many0(facet),
        ws(tag("endsolid")),
    )(input)
}

/// `facet normal n n n outer loop vertex.. x3 endloop endfacet`; the stored normal is dropped
fn facet(input: &str) -> IResult<&str, Triangle> {
    let header = tuple((ws(tag("facet")), ws(tag("normal")), point));
    let corners = delimited(
        pair(ws(tag("outer")), ws(tag("loop"))),
        tuple((corner, corner, corner)),
        ws(tag("endloop")),
    );
    map(delimited(header, corners, ws(tag("endfacet"))), |(a, b, c)| {
        [a, b, c]
    })(input)
}

fn corner(input: &str) -> IResult<&str, Vec3> {
    preceded(ws(tag("vertex")), point)(input)
}

fn point(input: &str) -> IResult<&str, Vec3> {
    map(tuple((ws(float), ws(float), ws(float))), |(x, y, z)| {
        Vec3::new(x, y, z)
    })(input)
}

/// Detect and parse STL data (binary or ASCII)
pub fn parse_stl(data: &[u8], color: Color) -> Result<Mesh, StlError> {
    // Some binary exporters also start their header with "solid".
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            match parse_ascii_stl(text, color) {
                Ok(mesh) => return Ok(mesh),
                Err(e) => tracing::debug!(error = %e, "not ASCII STL, trying binary"),
            }
        }
    }
    parse_binary_stl(data, color)
}

/// Merge bit-identical corners so the mesh is indexed
fn build_mesh(facets: Vec<Triangle>, color: Color) -> Result<Mesh, StlError> {
    let mut vertices = Vec::new();
    let mut lookup: HashMap<[u32; 3], usize> = HashMap::new();
    let mut faces = Vec::with_capacity(facets.len());

    for triangle in &facets {
        let face = triangle.map(|v| {
            // -0.0 and 0.0 are the same corner
            let key = [v.x + 0.0, v.y + 0.0, v.z + 0.0].map(f32::to_bits);
            *lookup.entry(key).or_insert_with(|| {
                vertices.push(v);
                vertices.len() - 1
            })
        });
        faces.push(face);
    }

    let colors = vec![color; faces.len()];
    Ok(Mesh::new(vertices, faces, colors)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_with(triangles: &[Triangle]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data.extend((triangles.len() as u32).to_le_bytes());
        for tri in triangles {
            data.extend([0.0f32; 3].iter().flat_map(|f| f.to_le_bytes()));
            for v in tri {
                for c in [v.x, v.y, v.z] {
                    data.extend(c.to_le_bytes());
                }
            }
            data.extend(0u16.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        // Set triangle count to 0
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let mesh = parse_binary_stl(&data, DEFAULT_STL_COLOR).unwrap();
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_too_small() {
        assert!(matches!(
            parse_stl(&[0u8; 10], DEFAULT_STL_COLOR),
            Err(StlError::TooSmall { len: 10 })
        ));
    }

    #[test]
    fn test_truncated_binary() {
        let mut data = binary_with(&[[Vec3::default(); 3]]);
        data[80..84].copy_from_slice(&2u32.to_le_bytes());
        assert!(matches!(
            parse_binary_stl(&data, DEFAULT_STL_COLOR),
            Err(StlError::Truncated { triangles: 2, .. })
        ));
    }

    #[test]
    fn test_binary_shares_corners() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        let c = Vec3::new(1.0, 1.0, 0.0);
        let d = Vec3::new(-0.0, 1.0, 0.0);
        let data = binary_with(&[[a, b, c], [a, c, d]]);

        let red = Color::rgb(255, 0, 0);
        let mesh = parse_stl(&data, red).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.faces(), &[[0, 1, 2], [0, 2, 3]]);
        assert!(mesh.face_colors().iter().all(|&col| col == red));
    }

    #[test]
    fn test_parse_ascii() {
        let text = "solid square\n\
            facet normal 0 0 1\n outer loop\n  vertex 0 0 0\n  vertex 1 0 0\n  vertex 1 1 0\n endloop\nendfacet\n\
            facet normal 0 0 1\n outer loop\n  vertex 0 0 0\n  vertex 1 1 0\n  vertex 0 1.5e0 0\n endloop\nendfacet\n\
            endsolid square\n";
        let mesh = parse_stl(text.as_bytes(), DEFAULT_STL_COLOR).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.vertices()[3], Vec3::new(0.0, 1.5, 0.0));
    }

    #[test]
    fn test_malformed_ascii() {
        let err = parse_ascii_stl("solid x\nfacet normal 0 0\n", DEFAULT_STL_COLOR).unwrap_err();
        assert!(matches!(err, StlError::Ascii(_)));
        assert!(err.to_string().contains("facet normal 0 0"), "{err}");
    }

    #[test]
    fn test_ascii_unnamed_solid_with_loose_spacing() {
        let text = "solid\r\n  facet normal 0 0 -1\r\n\touter loop\r\n\
            vertex -1 0 2\r\nvertex 0 -1 2\r\nvertex 0 0 2\r\n\
            endloop\r\n  endfacet\r\nendsolid";
        let mesh = parse_ascii_stl(text, DEFAULT_STL_COLOR).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertices()[0], Vec3::new(-1.0, 0.0, 2.0));
    }
}
