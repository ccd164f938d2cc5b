//! The brick figure scene
//!
//! Loads every asset relative to an asset root. A missing or broken file is
//! logged and replaced by a fallback so the scene still comes up.

use bevy_ecs::prelude::*;
use glam::{Mat4, Vec3};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::backend::{BackendResult, GraphicsBackend};
use crate::error::{AssetResult, DemoResult};
use crate::pipeline::ForwardPass;
use crate::resources::{
    load_obj, CubeMapData, Lut3d, MaterialId, Mesh, MeshId, ShaderKind, ShaderMaterial,
    TextureData, TextureId,
};
use crate::scene::{
    BehaviourBinding, Camera, CameraControlBehaviour, FollowPathBehaviour, GameScene,
    RendererComponent, RotateObjectBehaviour, Transform,
};

pub const SKYBOX_RENDER_LAYER: i32 = 100;
pub const ENVIRONMENT_MAP: &str = "images/cubemaps/skybox/space.jpg";
pub const COLOUR_LUT: &str = "cubes/WarmCorrection.cube";

/// Reads assets below a root directory, substituting fallbacks on failure
pub struct AssetLoader {
    root: PathBuf,
    fallbacks: usize,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            fallbacks: 0,
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Number of assets replaced by a fallback so far
    pub fn fallback_count(&self) -> usize {
        self.fallbacks
    }

    fn or_fallback<T>(&mut self, relative: &str, result: AssetResult<T>, fallback: impl FnOnce() -> T) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                log::warn!("{} unavailable, using fallback: {}", relative, err);
                self.fallbacks += 1;
                fallback()
            }
        }
    }

    pub fn mesh(&mut self, relative: &str) -> Mesh {
        let result = load_obj(self.path(relative));
        self.or_fallback(relative, result, Mesh::cube)
    }

    pub fn texture(&mut self, relative: &str) -> TextureData {
        let result = TextureData::from_file(self.path(relative));
        self.or_fallback(relative, result, TextureData::white)
    }

    pub fn cube_map(&mut self, relative: &str) -> CubeMapData {
        let result = CubeMapData::from_files(self.path(relative));
        self.or_fallback(relative, result, || {
            CubeMapData::solid_color([128, 128, 128, 255], "flat")
        })
    }

    pub fn lut(&mut self, relative: &str) -> Lut3d {
        let result = Lut3d::from_file(self.path(relative));
        self.or_fallback(relative, result, || Lut3d::identity(32))
    }
}

/// Uploads assets once and hands out their ids
struct SceneBuilder<'a, B: GraphicsBackend> {
    backend: &'a mut B,
    forward: &'a mut ForwardPass,
    loader: AssetLoader,
    meshes: HashMap<String, MeshId>,
    textures: HashMap<String, TextureId>,
}

impl<'a, B: GraphicsBackend> SceneBuilder<'a, B> {
    fn mesh(&mut self, relative: &str) -> BackendResult<MeshId> {
        if let Some(&id) = self.meshes.get(relative) {
            return Ok(id);
        }
        let mesh = self.loader.mesh(relative);
        let id = self.forward.add_mesh(self.backend, &mesh)?;
        self.meshes.insert(relative.to_string(), id);
        Ok(id)
    }

    fn generated_mesh(&mut self, mesh: &Mesh) -> BackendResult<MeshId> {
        self.forward.add_mesh(self.backend, mesh)
    }

    fn texture(&mut self, relative: &str) -> BackendResult<TextureId> {
        if let Some(&id) = self.textures.get(relative) {
            return Ok(id);
        }
        let data = self.loader.texture(relative);
        let id = self.forward.add_texture(self.backend, &data)?;
        self.textures.insert(relative.to_string(), id);
        Ok(id)
    }

    fn cube_map(&mut self, relative: &str) -> BackendResult<TextureId> {
        if let Some(&id) = self.textures.get(relative) {
            return Ok(id);
        }
        let data = self.loader.cube_map(relative);
        let id = self.forward.add_cube_map(self.backend, &data)?;
        self.textures.insert(relative.to_string(), id);
        Ok(id)
    }

    /// Plain textured material with the given diffuse and specular maps
    fn textured(&mut self, name: &str, diffuse: &str, specular: &str) -> BackendResult<MaterialId> {
        let material = ShaderMaterial::new(name, ShaderKind::BlinnPhongTextured)
            .with_diffuse(self.texture(diffuse)?)
            .with_specular(self.texture(specular)?)
            .with_shininess(8.0)
            .with_texture_mix(0.0);
        self.forward.add_material(self.backend, material)
    }
}

/// Handles of interest after the scene is built
pub struct DemoScene {
    pub camera: Entity,
    pub lut: Lut3d,
    pub fallbacks: usize,
}

fn spawn_renderer(scene: &mut GameScene, name: &str, mesh: MeshId, material: MaterialId, transform: Transform) -> Entity {
    let entity = scene.create_entity(name);
    let mut entity_mut = scene.world_mut().entity_mut(entity);
    entity_mut.insert((transform, RendererComponent { mesh, material }));
    entity
}

/// Populate `scene` with the brick figures, the camera and the skybox
pub fn build_demo_scene<B: GraphicsBackend>(
    backend: &mut B,
    forward: &mut ForwardPass,
    scene: &mut GameScene,
    asset_root: &Path,
) -> DemoResult<DemoScene> {
    log::info!("Building scene from {}", asset_root.display());

    let mut builder = SceneBuilder {
        backend,
        forward,
        loader: AssetLoader::new(asset_root),
        meshes: HashMap::new(),
        textures: HashMap::new(),
    };

    let environment = builder.cube_map(ENVIRONMENT_MAP)?;
    let environment_rotation = Mat4::from_rotation_x(90f32.to_radians());

    let offwhite = "images/offwhite.png";
    let floor_material = builder.textured("legoblock1", "images/Red.png", offwhite)?;
    let table_material = builder.textured("legoblock2", "images/Brown.png", offwhite)?;

    let stone = ShaderMaterial::new("stone_box", ShaderKind::BlinnPhongReflective)
        .with_diffuse(builder.texture("images/Stone_001_Diffuse.png")?)
        .with_diffuse2(builder.texture("images/box.bmp")?)
        .with_specular(builder.texture("images/Stone_001_Specular.png")?)
        .with_reflectivity(builder.texture("images/box-reflections.bmp")?)
        .with_environment(environment)
        .with_environment_rotation(environment_rotation)
        .with_texture_mix(0.5);
    builder.forward.add_material(builder.backend, stone)?;

    let chrome = ShaderMaterial::new("reflective", ShaderKind::Reflective)
        .with_environment(environment)
        .with_environment_rotation(environment_rotation);
    builder.forward.add_material(builder.backend, chrome)?;

    let floor_mesh = builder.mesh("models/LegoFloor.obj")?;
    let table_mesh = builder.mesh("models/LegoTable.obj")?;
    spawn_renderer(scene, "lego_floor", floor_mesh, floor_material, Transform::default());
    spawn_renderer(scene, "lego_table", table_mesh, table_material, Transform::default());

    // (entity, diffuse, specular, position, rotation about Z in degrees)
    let characters = [
        ("lego_character", "images/HappyBusinessman.png", "images/HappyBusinessman_s.png", Vec3::new(0.0, -3.0, 0.0), 0.0),
        ("lego_character1", "images/Magician.png", offwhite, Vec3::new(3.0, 0.0, 0.0), 90.0),
        ("lego_character2", "images/ShellLady.png", offwhite, Vec3::new(-3.0, 0.0, 0.0), -90.0),
        ("lego_character3", "images/Wonderwoman.png", offwhite, Vec3::new(0.0, 3.0, 0.0), 180.0),
    ];
    let character_mesh = builder.mesh("models/LegoCharacter.obj")?;
    for (name, diffuse, specular, position, rotation) in characters {
        let material = builder.textured(name, diffuse, specular)?;
        let transform = Transform::from_position(position)
            .with_rotation_degrees(Vec3::new(0.0, 0.0, rotation));
        spawn_renderer(scene, name, character_mesh, material, transform);
    }

    let head_mesh = builder.mesh("models/LegoHead.obj")?;
    let head_material = builder.textured("lego_head", "images/LegoHead.png", offwhite)?;
    let head = spawn_renderer(
        scene,
        "lego_character4",
        head_mesh,
        head_material,
        Transform::from_position(Vec3::new(0.0, 0.0, 3.5)),
    );
    scene.world_mut().entity_mut(head).insert(
        BehaviourBinding::new()
            .with(RotateObjectBehaviour::default())
            .with(FollowPathBehaviour::new(
                vec![Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, 4.0)],
                0.6,
            )),
    );

    let camera = scene.create_entity("Camera");
    {
        let mut transform = Transform::from_position(Vec3::new(3.0, 3.0, 3.0));
        transform.look_at(Vec3::ZERO, Vec3::Z);
        scene.world_mut().entity_mut(camera).insert((
            transform,
            Camera::default(),
            BehaviourBinding::new().with(CameraControlBehaviour::default()),
        ));
    }

    let mut sky_mesh = Mesh::icosphere(Vec3::ZERO, 1.0, 2);
    sky_mesh.invert_faces();
    sky_mesh.name = "skybox".to_string();
    let sky_mesh = builder.generated_mesh(&sky_mesh)?;
    let sky_material = ShaderMaterial::new("skybox", ShaderKind::Skybox)
        .with_environment(environment)
        .with_environment_rotation(environment_rotation)
        .with_render_layer(SKYBOX_RENDER_LAYER);
    let sky_material = builder.forward.add_material(builder.backend, sky_material)?;
    spawn_renderer(scene, "skybox", sky_mesh, sky_material, Transform::default());

    let lut = builder.loader.lut(COLOUR_LUT);
    let fallbacks = builder.loader.fallback_count();
    if fallbacks > 0 {
        log::warn!("{} assets replaced by fallbacks", fallbacks);
    }
    log::info!(
        "Scene ready: {} entities, {} meshes, {} materials",
        scene.entity_count(),
        builder.forward.mesh_count(),
        builder.forward.material_count()
    );

    Ok(DemoScene {
        camera,
        lut,
        fallbacks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("brick-scene-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_assets_fall_back() {
        let mut loader = AssetLoader::new("/nonexistent/brick-scene-assets");
        let mesh = loader.mesh("models/LegoFloor.obj");
        assert_eq!(mesh.name, "cube");
        let texture = loader.texture("images/Red.png");
        assert_eq!((texture.width, texture.height), (1, 1));
        let cube = loader.cube_map(ENVIRONMENT_MAP);
        assert_eq!(cube.size, 1);
        let lut = loader.lut(COLOUR_LUT);
        assert_eq!(lut.size, 32);
        assert_eq!(loader.fallback_count(), 4);
    }

    #[test]
    fn present_assets_load() {
        let dir = scratch_dir("assets");
        std::fs::create_dir_all(dir.join("models")).unwrap();
        std::fs::create_dir_all(dir.join("cubes")).unwrap();
        std::fs::write(
            dir.join("models/tri.obj"),
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("cubes/id.cube"),
            "LUT_3D_SIZE 2\n0 0 0\n1 0 0\n0 1 0\n1 1 0\n0 0 1\n1 0 1\n0 1 1\n1 1 1\n",
        )
        .unwrap();

        let mut loader = AssetLoader::new(&dir);
        let mesh = loader.mesh("models/tri.obj");
        assert_eq!(mesh.triangle_count(), 1);
        let lut = loader.lut("cubes/id.cube");
        assert_eq!(lut, Lut3d { title: lut.title.clone(), ..Lut3d::identity(2) });
        assert_eq!(loader.fallback_count(), 0);

        std::fs::remove_dir_all(&dir).ok();
    }
}
