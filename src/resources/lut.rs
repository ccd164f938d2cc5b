//! 3D colour look-up tables in the Adobe `.cube` format

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::error::{AssetError, AssetResult};
use crate::resources::GpuTexture;
use glam::Vec3;
use std::path::Path;

/// A cubic colour grid with red varying fastest, then green, then blue
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3d {
    pub title: Option<String>,
    pub size: u32,
    pub domain_min: Vec3,
    pub domain_max: Vec3,
    pub entries: Vec<Vec3>,
}

fn lut_error(line: usize, message: impl Into<String>) -> AssetError {
    AssetError::Lut {
        line,
        message: message.into(),
    }
}

fn parse_vec3(line: usize, fields: &[&str]) -> AssetResult<Vec3> {
    if fields.len() != 3 {
        return Err(lut_error(
            line,
            format!("expected 3 values, found {}", fields.len()),
        ));
    }
    let mut v = [0.0f32; 3];
    for (slot, field) in v.iter_mut().zip(fields) {
        *slot = field
            .parse()
            .map_err(|_| lut_error(line, format!("'{}' is not a number", field)))?;
    }
    Ok(Vec3::from_array(v))
}

impl Lut3d {
    /// Largest grid edge accepted by the parser
    pub const MAX_SIZE: u32 = 256;

    pub fn from_file(path: impl AsRef<Path>) -> AssetResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let lut = Self::parse(&text)?;
        log::info!(
            "Loaded LUT {} ({}^3 entries)",
            lut.title.as_deref().unwrap_or_else(|| path.to_str().unwrap_or("?")),
            lut.size
        );
        Ok(lut)
    }

    /// Parse `.cube` text. Line numbers in errors are 1-based.
    pub fn parse(text: &str) -> AssetResult<Self> {
        let mut title = None;
        let mut size: Option<u32> = None;
        let mut domain_min = Vec3::ZERO;
        let mut domain_max = Vec3::ONE;
        let mut entries = Vec::new();
        let mut last_line = 0;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            last_line = line_no;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields[0] {
                "TITLE" => {
                    let rest = line["TITLE".len()..].trim();
                    title = Some(rest.trim_matches('"').to_string());
                }
                "LUT_3D_SIZE" => {
                    if !entries.is_empty() {
                        return Err(lut_error(line_no, "LUT_3D_SIZE after table data"));
                    }
                    let value = fields
                        .get(1)
                        .and_then(|v| v.parse::<u32>().ok())
                        .ok_or_else(|| lut_error(line_no, "LUT_3D_SIZE needs an integer"))?;
                    if !(2..=Self::MAX_SIZE).contains(&value) {
                        return Err(lut_error(
                            line_no,
                            format!("LUT_3D_SIZE {} outside 2..={}", value, Self::MAX_SIZE),
                        ));
                    }
                    size = Some(value);
                }
                "LUT_1D_SIZE" => {
                    return Err(lut_error(line_no, "1D LUTs are not supported"));
                }
                "DOMAIN_MIN" => domain_min = parse_vec3(line_no, &fields[1..])?,
                "DOMAIN_MAX" => domain_max = parse_vec3(line_no, &fields[1..])?,
                keyword if keyword.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) => {
                    log::debug!("LUT line {}: ignoring keyword {}", line_no, keyword);
                }
                _ => {
                    if size.is_none() {
                        return Err(lut_error(line_no, "table data before LUT_3D_SIZE"));
                    }
                    entries.push(parse_vec3(line_no, &fields)?);
                }
            }
        }

        let size = size.ok_or_else(|| lut_error(last_line, "missing LUT_3D_SIZE"))?;
        let expected = (size * size * size) as usize;
        if entries.len() != expected {
            return Err(lut_error(
                last_line,
                format!("expected {} table rows, found {}", expected, entries.len()),
            ));
        }
        if domain_min.cmpge(domain_max).any() {
            return Err(lut_error(last_line, "DOMAIN_MIN must be below DOMAIN_MAX"));
        }

        Ok(Self {
            title,
            size,
            domain_min,
            domain_max,
            entries,
        })
    }

    /// A LUT that maps every colour to itself
    pub fn identity(size: u32) -> Self {
        let size = size.max(2);
        let step = 1.0 / (size - 1) as f32;
        let mut entries = Vec::with_capacity((size * size * size) as usize);
        for b in 0..size {
            for g in 0..size {
                for r in 0..size {
                    entries.push(Vec3::new(r as f32, g as f32, b as f32) * step);
                }
            }
        }
        Self {
            title: Some("identity".to_string()),
            size,
            domain_min: Vec3::ZERO,
            domain_max: Vec3::ONE,
            entries,
        }
    }

    /// Entry at grid coordinates
    pub fn get(&self, r: u32, g: u32, b: u32) -> Vec3 {
        let n = self.size as usize;
        self.entries[r as usize + g as usize * n + b as usize * n * n]
    }

    /// Scale and offset taking an input colour from the domain into 0..1
    pub fn domain_transform(&self) -> (Vec3, Vec3) {
        let scale = Vec3::ONE / (self.domain_max - self.domain_min);
        (scale, -self.domain_min * scale)
    }

    /// Output colours clamped to 0..1 and quantised to RGBA8 in upload order
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.entries
            .iter()
            .flat_map(|e| {
                let c = e.clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
                [c.x.round() as u8, c.y.round() as u8, c.z.round() as u8, 255]
            })
            .collect()
    }

    /// Upload as a linear RGBA8 3D texture
    pub fn upload<B: GraphicsBackend>(&self, backend: &mut B) -> BackendResult<GpuTexture> {
        GpuTexture::upload(
            backend,
            self.title.as_deref().unwrap_or("lut"),
            self.size,
            self.size,
            self.size,
            TextureDimension::D3,
            TextureFormat::Rgba8Unorm,
            &self.to_rgba8(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WARM: &str = r#"# Created by hand
TITLE "Warm"
LUT_3D_SIZE 2

# table
0.0 0.0 0.0
1.0 0.0 0.0
0.0 0.9 0.0
1.0 0.9 0.0
0.0 0.0 0.8
1.0 0.0 0.8
0.0 0.9 0.8
1.0 0.9 0.8
"#;

    #[test]
    fn parses_title_size_and_rows() {
        let lut = Lut3d::parse(WARM).unwrap();
        assert_eq!(lut.title.as_deref(), Some("Warm"));
        assert_eq!(lut.size, 2);
        assert_eq!(lut.entries.len(), 8);
        // red varies fastest
        assert!((lut.get(1, 0, 0) - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
        assert!((lut.get(0, 1, 0) - Vec3::new(0.0, 0.9, 0.0)).length() < 1e-6);
        assert!((lut.get(1, 1, 1) - Vec3::new(1.0, 0.9, 0.8)).length() < 1e-6);
    }

    #[test]
    fn domain_scales_input_not_table() {
        let text = "LUT_3D_SIZE 2\nDOMAIN_MIN 0 0 0\nDOMAIN_MAX 2 2 2\n".to_string()
            + &"0.5 0.5 0.5\n".repeat(8);
        let lut = Lut3d::parse(&text).unwrap();
        assert_eq!(lut.domain_max, Vec3::splat(2.0));
        let bytes = lut.to_rgba8();
        assert_eq!(&bytes[0..4], &[128, 128, 128, 255]);

        let (scale, offset) = lut.domain_transform();
        assert!((Vec3::splat(2.0) * scale + offset - Vec3::ONE).length() < 1e-6);
        assert!((Vec3::ZERO * scale + offset).length() < 1e-6);
    }

    #[test]
    fn shifted_domain_maps_to_unit_range() {
        let mut lut = Lut3d::identity(2);
        lut.domain_min = Vec3::splat(-1.0);
        lut.domain_max = Vec3::splat(1.0);
        let (scale, offset) = lut.domain_transform();
        assert!((Vec3::ZERO * scale + offset - Vec3::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn missing_size_is_an_error() {
        let err = Lut3d::parse("TITLE \"x\"\n").unwrap_err();
        assert!(matches!(err, AssetError::Lut { .. }));
    }

    #[test]
    fn wrong_row_count_is_an_error() {
        let text = "LUT_3D_SIZE 2\n0 0 0\n1 1 1\n";
        let err = Lut3d::parse(text).unwrap_err();
        assert!(err.to_string().contains("expected 8 table rows, found 2"));
    }

    #[test]
    fn malformed_number_reports_its_line() {
        let text = "LUT_3D_SIZE 2\n0 0 0\n0 x 0\n";
        match Lut3d::parse(text) {
            Err(AssetError::Lut { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn one_dimensional_luts_are_rejected() {
        let err = Lut3d::parse("LUT_1D_SIZE 4\n").unwrap_err();
        assert!(err.to_string().contains("1D"));
    }

    #[test]
    fn identity_maps_grid_to_itself() {
        let lut = Lut3d::identity(4);
        assert_eq!(lut.entries.len(), 64);
        let c = lut.get(3, 1, 2);
        assert!((c - Vec3::new(1.0, 1.0 / 3.0, 2.0 / 3.0)).length() < 1e-6);
        let bytes = lut.to_rgba8();
        assert_eq!(&bytes[bytes.len() - 4..], &[255, 255, 255, 255]);
    }
}
