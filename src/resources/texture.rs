//! Texture loading and GPU upload

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::error::{AssetError, AssetResult};
use image::{DynamicImage, GenericImageView};
use std::path::{Path, PathBuf};

/// Loaded texture data
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: Vec<u8>,
    pub name: String,
}

impl TextureData {
    /// Load texture from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AssetResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let img = image::open(path).map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_image(img, &name))
    }

    fn from_image(img: DynamicImage, name: &str) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            format: TextureFormat::Rgba8UnormSrgb,
            data: img.to_rgba8().into_raw(),
            name: name.to_string(),
        }
    }

    /// Create a solid color texture
    pub fn solid_color(color: [u8; 4], name: &str) -> Self {
        Self {
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8UnormSrgb,
            data: color.to_vec(),
            name: name.to_string(),
        }
    }

    /// Create a default white texture
    pub fn white() -> Self {
        Self::solid_color([255, 255, 255, 255], "white")
    }
}

/// Six square faces of a cube map, in +X, -X, +Y, -Y, +Z, -Z order
pub struct CubeMapData {
    pub size: u32,
    /// Tightly packed RGBA8 faces, one after another
    pub data: Vec<u8>,
    pub name: String,
}

/// Face suffixes in upload order
pub const CUBE_FACE_SUFFIXES: [&str; 6] = ["posx", "negx", "posy", "negy", "posz", "negz"];

impl CubeMapData {
    /// Paths of the six faces for a base path: `space.jpg` becomes
    /// `space_posx.jpg`, `space_negx.jpg` and so on
    pub fn face_paths(base: &Path) -> [PathBuf; 6] {
        let stem = base
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let ext = base.extension().and_then(|e| e.to_str());
        CUBE_FACE_SUFFIXES.map(|suffix| {
            let file = match ext {
                Some(ext) => format!("{}_{}.{}", stem, suffix, ext),
                None => format!("{}_{}", stem, suffix),
            };
            base.with_file_name(file)
        })
    }

    /// Load six face images next to `base`
    pub fn from_files(base: impl AsRef<Path>) -> AssetResult<Self> {
        let base = base.as_ref();
        let mut faces = Vec::with_capacity(6);
        for path in Self::face_paths(base) {
            faces.push(TextureData::from_file(&path)?);
        }

        let name = base
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("cubemap")
            .to_string();
        Self::from_faces(&name, &faces)
    }

    /// Assemble a cube map from already decoded faces
    pub fn from_faces(name: &str, faces: &[TextureData]) -> AssetResult<Self> {
        if faces.len() != 6 {
            return Err(AssetError::CubeMap(format!(
                "{}: expected 6 faces, got {}",
                name,
                faces.len()
            )));
        }

        let size = faces[0].width;
        let mut data = Vec::with_capacity((size * size * 4 * 6) as usize);
        for (face, suffix) in faces.iter().zip(CUBE_FACE_SUFFIXES) {
            if face.width != face.height {
                return Err(AssetError::CubeMap(format!(
                    "{}: face {} is {}x{}, faces must be square",
                    name, suffix, face.width, face.height
                )));
            }
            if face.width != size {
                return Err(AssetError::CubeMap(format!(
                    "{}: face {} is {} pixels wide, expected {}",
                    name, suffix, face.width, size
                )));
            }
            data.extend_from_slice(&face.data);
        }

        Ok(Self {
            size,
            data,
            name: name.to_string(),
        })
    }

    /// A 1x1 cube map of a single colour
    pub fn solid_color(color: [u8; 4], name: &str) -> Self {
        Self {
            size: 1,
            data: color.repeat(6),
            name: name.to_string(),
        }
    }
}

/// GPU texture with its view
pub struct GpuTexture {
    pub handle: TextureHandle,
    pub view: TextureViewHandle,
    pub width: u32,
    pub height: u32,
    pub dimension: TextureDimension,
    pub name: String,
}

impl GpuTexture {
    /// Create and upload a 2D texture
    pub fn create<B: GraphicsBackend>(
        backend: &mut B,
        data: &TextureData,
    ) -> BackendResult<Self> {
        Self::upload(
            backend,
            &data.name,
            data.width,
            data.height,
            1,
            TextureDimension::D2,
            data.format,
            &data.data,
        )
    }

    /// Create and upload a cube map
    pub fn create_cube<B: GraphicsBackend>(
        backend: &mut B,
        data: &CubeMapData,
    ) -> BackendResult<Self> {
        Self::upload(
            backend,
            &data.name,
            data.size,
            data.size,
            6,
            TextureDimension::Cube,
            TextureFormat::Rgba8UnormSrgb,
            &data.data,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn upload<B: GraphicsBackend>(
        backend: &mut B,
        name: &str,
        width: u32,
        height: u32,
        depth: u32,
        dimension: TextureDimension,
        format: TextureFormat,
        data: &[u8],
    ) -> BackendResult<Self> {
        let handle = backend.create_texture(&TextureDescriptor {
            label: Some(name.to_string()),
            width,
            height,
            depth,
            dimension,
            format,
            usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        })?;

        let view = backend.create_texture_view(handle)?;
        backend.write_texture(handle, data, width, height, depth);

        Ok(Self {
            handle,
            view,
            width,
            height,
            dimension,
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(size: u32) -> TextureData {
        TextureData {
            width: size,
            height: size,
            format: TextureFormat::Rgba8UnormSrgb,
            data: vec![0; (size * size * 4) as usize],
            name: "face".into(),
        }
    }

    #[test]
    fn face_paths_follow_naming_scheme() {
        let paths = CubeMapData::face_paths(Path::new("images/cubemaps/skybox/space.jpg"));
        assert_eq!(paths[0], Path::new("images/cubemaps/skybox/space_posx.jpg"));
        assert_eq!(paths[5], Path::new("images/cubemaps/skybox/space_negz.jpg"));
    }

    #[test]
    fn cube_map_concatenates_faces() {
        let faces: Vec<TextureData> = (0..6).map(|_| face(4)).collect();
        let cube = CubeMapData::from_faces("test", &faces).unwrap();
        assert_eq!(cube.size, 4);
        assert_eq!(cube.data.len(), 4 * 4 * 4 * 6);
    }

    #[test]
    fn mismatched_faces_are_rejected() {
        let mut faces: Vec<TextureData> = (0..6).map(|_| face(4)).collect();
        faces[3] = face(8);
        assert!(matches!(
            CubeMapData::from_faces("test", &faces),
            Err(AssetError::CubeMap(_))
        ));
    }

    #[test]
    fn non_square_face_is_rejected() {
        let mut faces: Vec<TextureData> = (0..6).map(|_| face(4)).collect();
        faces[0].height = 2;
        assert!(CubeMapData::from_faces("test", &faces).is_err());
    }

    #[test]
    fn solid_cube_map_has_six_texels() {
        let cube = CubeMapData::solid_color([10, 20, 30, 255], "flat");
        assert_eq!(cube.data.len(), 24);
        assert_eq!(&cube.data[20..24], &[10, 20, 30, 255]);
    }

    #[test]
    fn missing_image_reports_path() {
        let err = TextureData::from_file("nope/missing.png").err().unwrap();
        assert!(err.to_string().contains("missing.png"));
    }
}
