//! Wavefront OBJ loading

use crate::backend::types::Vertex;
use crate::error::{AssetError, AssetResult};
use crate::resources::Mesh;
use glam::{Vec2, Vec3, Vec4};
use std::io::BufRead;
use std::path::Path;

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ignore_lines: true,
        ignore_points: true,
        ..Default::default()
    }
}

/// Load every model in an OBJ file into a single mesh.
///
/// Materials referenced by the file are ignored; the scene assigns its own.
pub fn load_obj(path: impl AsRef<Path>) -> AssetResult<Mesh> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("obj")
        .to_string();

    let (models, _materials) = tobj::load_obj(path, &load_options()).map_err(|source| {
        AssetError::Obj {
            name: path.display().to_string(),
            source,
        }
    })?;

    build_mesh(&name, models)
}

/// Same as [`load_obj`] but reads OBJ text from any buffered reader
pub fn load_obj_from_reader<R: BufRead>(reader: &mut R, name: &str) -> AssetResult<Mesh> {
    let (models, _materials) = tobj::load_obj_buf(reader, &load_options(), |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(|source| AssetError::Obj {
        name: name.to_string(),
        source,
    })?;

    build_mesh(name, models)
}

fn build_mesh(name: &str, models: Vec<tobj::Model>) -> AssetResult<Mesh> {
    let mut mesh = Mesh::new(name);
    let mut needs_normals = false;

    for model in models {
        let m = model.mesh;
        let base = mesh.vertices.len() as u32;
        let count = m.positions.len() / 3;
        let has_normals = m.normals.len() == m.positions.len();
        let has_uvs = m.texcoords.len() / 2 == count;
        needs_normals |= !has_normals;

        for i in 0..count {
            let position = Vec3::new(m.positions[3 * i], m.positions[3 * i + 1], m.positions[3 * i + 2]);
            let normal = if has_normals {
                Vec3::new(m.normals[3 * i], m.normals[3 * i + 1], m.normals[3 * i + 2])
            } else {
                Vec3::ZERO
            };
            // OBJ texture space has v pointing up
            let uv = if has_uvs {
                Vec2::new(m.texcoords[2 * i], 1.0 - m.texcoords[2 * i + 1])
            } else {
                Vec2::ZERO
            };
            mesh.vertices.push(Vertex {
                position,
                normal,
                uv,
                tangent: Vec4::new(1.0, 0.0, 0.0, 1.0),
            });
        }
        mesh.indices.extend(m.indices.iter().map(|i| i + base));
    }

    if mesh.indices.is_empty() {
        return Err(AssetError::EmptyMesh(name.to_string()));
    }
    if needs_normals {
        log::debug!("{}: computing missing normals", name);
        mesh.compute_normals();
    }

    log::info!(
        "Loaded mesh {} ({} vertices, {} triangles)",
        name,
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const QUAD: &str = "\
# quad in the XY plane
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
";

    #[test]
    fn quad_is_triangulated() {
        let mesh = load_obj_from_reader(&mut Cursor::new(QUAD), "quad").unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn missing_normals_are_computed() {
        let mesh = load_obj_from_reader(&mut Cursor::new(QUAD), "quad").unwrap();
        for v in &mesh.vertices {
            assert!((v.normal - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn texcoords_are_flipped_to_top_left_origin() {
        let mesh = load_obj_from_reader(&mut Cursor::new(QUAD), "quad").unwrap();
        let origin = mesh
            .vertices
            .iter()
            .find(|v| v.position.length() < 1e-6)
            .unwrap();
        assert!((origin.uv - Vec2::new(0.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn missing_texcoords_default_to_zero() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
        let mesh = load_obj_from_reader(&mut Cursor::new(src), "tri").unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.vertices.iter().all(|v| v.uv == Vec2::ZERO));
        assert!(mesh.vertices.iter().all(|v| (v.normal - Vec3::Z).length() < 1e-6));
    }

    #[test]
    fn file_without_faces_is_rejected() {
        assert!(load_obj_from_reader(&mut Cursor::new("v 0 0 0\n"), "points").is_err());
    }

    #[test]
    fn missing_file_is_an_obj_error() {
        let err = load_obj("does/not/exist.obj").unwrap_err();
        assert!(matches!(err, AssetError::Obj { .. }));
    }
}
