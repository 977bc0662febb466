/// Wavefront OBJ reader producing an interleaved position + texcoord stream
///
/// Only `v`, `vt` and `f` records are consumed. Faces are fan-triangulated
/// around their first vertex, which is only correct for convex, planar faces.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{info, warn};
use nom::{
    bytes::complete::take_till1,
    character::complete::{char, i64 as index, space0, space1},
    combinator::opt,
    multi::many_m_n,
    number::complete::float,
    sequence::preceded,
    IResult,
};

use crate::error::ParseError;
use crate::geometry::MeshData;
use crate::vector::{Vec2, Vec3};

/// One line of an OBJ file, after the keyword has been recognised
#[derive(Debug, PartialEq)]
enum Record<'a> {
    Position(Vec3),
    TexCoord(Vec2),
    Face(Vec<&'a str>),
    Ignored,
}

/// Indices from a face token, 1-based; 0 means absent or unreadable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FaceIndex {
    position: i64,
    tex_coord: i64,
}

/// Open and parse an OBJ file
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<MeshData, ParseError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ParseError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_obj(BufReader::new(file), &path.display().to_string())
}

/// Parse an OBJ stream. `name` is only used in diagnostics.
pub fn parse_obj<R: BufRead>(reader: R, name: &str) -> Result<MeshData, ParseError> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut tex_coords: Vec<Vec2> = Vec::new();
    let mut mesh = MeshData::new();
    let mut skipped = 0usize;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_record(line) {
            Record::Position(p) => positions.push(p),
            Record::TexCoord(t) => tex_coords.push(t),
            Record::Face(tokens) => {
                if tokens.len() < 3 {
                    continue;
                }
                let corners: Vec<FaceIndex> = tokens.iter().map(|t| parse_face_token(t)).collect();
                for i in 1..corners.len() - 1 {
                    for corner in [corners[0], corners[i], corners[i + 1]] {
                        match resolve(corner, &positions, &tex_coords) {
                            Some((position, tex_coord)) => mesh.push_vertex(position, tex_coord),
                            None => skipped += 1,
                        }
                    }
                }
            }
            Record::Ignored => {}
        }
    }

    if skipped > 0 {
        warn!("{}: skipped {} face vertices with invalid position indices", name, skipped);
    }

    if mesh.is_empty() {
        return Err(ParseError::NoVertices(name.to_string()));
    }

    info!("OBJ loaded: {}, vertices: {}", name, mesh.vertex_count());
    Ok(mesh)
}

/// Look up a face corner. Positions must be in range or the corner is
/// dropped; a missing texture coordinate falls back to (0, 0).
fn resolve(corner: FaceIndex, positions: &[Vec3], tex_coords: &[Vec2]) -> Option<(Vec3, Vec2)> {
    let position = lookup(positions, corner.position)?;
    let tex_coord = lookup(tex_coords, corner.tex_coord).unwrap_or(Vec2::ZERO);
    Some((position, tex_coord))
}

fn lookup<T: Copy>(items: &[T], one_based: i64) -> Option<T> {
    if one_based <= 0 {
        return None;
    }
    items.get(usize::try_from(one_based - 1).ok()?).copied()
}

fn parse_record(line: &str) -> Record<'_> {
    let Ok((rest, word)) = keyword(line) else {
        return Record::Ignored;
    };

    match word {
        "v" => {
            let c = components(rest, 3);
            Record::Position(Vec3::new(c[0], c[1], c[2]))
        }
        "vt" => {
            let c = components(rest, 2);
            Record::TexCoord(Vec2::new(c[0], c[1]))
        }
        "f" => Record::Face(rest.split_whitespace().collect()),
        _ => Record::Ignored,
    }
}

fn keyword(input: &str) -> IResult<&str, &str> {
    preceded(space0, take_till1(|c: char| c.is_whitespace()))(input)
}

/// Read up to `count` floats. Anything missing or unreadable is zero, so
/// the record still occupies its index.
fn components(input: &str, count: usize) -> Vec<f32> {
    let parsed: IResult<&str, Vec<f32>> = many_m_n(0, count, preceded(space1, float))(input);
    let mut values = parsed.map(|(_, values)| values).unwrap_or_default();
    values.resize(count, 0.0);
    values
}

fn parse_face_token(token: &str) -> FaceIndex {
    match face_index(token) {
        Ok((_, (position, tex_coord))) => FaceIndex {
            position,
            tex_coord: tex_coord.unwrap_or(0),
        },
        Err(_) => FaceIndex {
            position: 0,
            tex_coord: 0,
        },
    }
}

/// `p`, `p/t`, `p/t/n` or `p//n`; anything after the texcoord is ignored
fn face_index(input: &str) -> IResult<&str, (i64, Option<i64>)> {
    let (input, position) = index(input)?;
    let (input, tex_coord) = opt(preceded(char('/'), opt(index)))(input)?;
    Ok((input, (position, tex_coord.flatten())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(source: &str) -> Result<MeshData, ParseError> {
        parse_obj(Cursor::new(source), "test.obj")
    }

    fn positions(mesh: &MeshData) -> Vec<Vec3> {
        (0..mesh.vertex_count()).map(|i| mesh.position(i)).collect()
    }

    const QUAD: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";

    #[test]
    fn test_quad_fan_triangulation() {
        let mesh = parse(QUAD).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.as_slice().len(), 30);

        let p = |i: usize| match i {
            1 => Vec3::new(0.0, 0.0, 0.0),
            2 => Vec3::new(1.0, 0.0, 0.0),
            3 => Vec3::new(1.0, 1.0, 0.0),
            _ => Vec3::new(0.0, 1.0, 0.0),
        };
        assert_eq!(positions(&mesh), vec![p(1), p(2), p(3), p(1), p(3), p(4)]);
        for i in 0..6 {
            assert_eq!(mesh.tex_coord(i), Vec2::ZERO);
        }
    }

    #[test]
    fn test_pentagon_produces_three_triangles() {
        let source = "v 0 0 0\nv 1 0 0\nv 2 1 0\nv 1 2 0\nv 0 1 0\nf 1 2 3 4 5\n";
        let mesh = parse(source).unwrap();
        assert_eq!(mesh.vertex_count(), 9);
        assert_eq!(mesh.position(6), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(mesh.position(8), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_texcoords_and_normals() {
        let source = "\
# a textured triangle
v 0 0 0
v 1 0 0
v 0 1 0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0 0 1

f 1/1/1 2/2/1 3/3/1
";
        let mesh = parse(source).unwrap();
        assert_eq!(
            mesh.as_slice(),
            &[0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_position_normal_without_texcoord() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0.5 0.5\nf 1//1 2//1 3//1\n";
        let mesh = parse(source).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.tex_coord(1), Vec2::ZERO);
    }

    #[test]
    fn test_out_of_range_position_is_skipped() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 99\n";
        let mesh = parse(source).unwrap();
        assert_eq!(positions(&mesh), vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)]);
    }

    #[test]
    fn test_zero_negative_and_garbage_indices_are_skipped() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 -1 abc\nf 1 2 3\n";
        let mesh = parse(source).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_bad_texcoord_index_defaults_to_origin() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0.5 0.25\nf 1/1 2/0 3/7\n";
        let mesh = parse(source).unwrap();
        assert_eq!(mesh.tex_coord(0), Vec2::new(0.5, 0.25));
        assert_eq!(mesh.tex_coord(1), Vec2::ZERO);
        assert_eq!(mesh.tex_coord(2), Vec2::ZERO);
    }

    #[test]
    fn test_face_refers_only_to_earlier_positions() {
        let source = "v 0 0 0\nv 1 0 0\nf 1 2 3\nv 0 1 0\nf 1 2 3\n";
        let mesh = parse(source).unwrap();
        assert_eq!(mesh.vertex_count(), 5);
    }

    #[test]
    fn test_short_faces_are_ignored() {
        let source = "v 0 0 0\nv 1 0 0\nf 1 2\n";
        assert!(matches!(parse(source), Err(ParseError::NoVertices(_))));
    }

    #[test]
    fn test_missing_components_read_as_zero() {
        let source = "v 1 2\nv 4 5 6\nv 7 8 9\nf 1 2 3\n";
        let mesh = parse(source).unwrap();
        assert_eq!(mesh.position(0), Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(mesh.position(1), Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_empty_mesh_is_an_error() {
        let err = parse("# nothing here\n\n").unwrap_err();
        assert!(matches!(err, ParseError::NoVertices(name) if name == "test.obj"));
    }

    #[test]
    fn test_missing_file_is_distinct_from_empty_mesh() {
        let err = load_obj("definitely/not/here.obj").unwrap_err();
        assert!(matches!(err, ParseError::Open { .. }));
    }

    #[test]
    fn test_face_index_forms() {
        assert_eq!(face_index("7"), Ok(("", (7, None))));
        assert_eq!(face_index("7/3"), Ok(("", (7, Some(3)))));
        assert_eq!(face_index("7/3/2"), Ok(("/2", (7, Some(3)))));
        assert_eq!(face_index("7//2"), Ok(("/2", (7, None))));
        assert!(face_index("/3").is_err());
    }

    #[test]
    fn test_vt_is_not_mistaken_for_v() {
        assert_eq!(parse_record("vt 0.5 1"), Record::TexCoord(Vec2::new(0.5, 1.0)));
        assert_eq!(parse_record("vn 0 1 0"), Record::Ignored);
        assert_eq!(parse_record("v 1 2 3"), Record::Position(Vec3::new(1.0, 2.0, 3.0)));
    }
}
