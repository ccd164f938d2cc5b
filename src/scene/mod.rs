//! Scene management

mod behaviour;
mod camera;
mod lighting;
mod transform;

pub use behaviour::*;
pub use camera::*;
pub use lighting::*;
pub use transform::*;

use bevy_ecs::prelude::*;

use crate::input::InputState;
use crate::resources::{MaterialId, MeshId, ShaderKind};
use crate::timing::Timing;

/// Name of a scene entity
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct GameObjectTag(pub String);

/// Draws a mesh with a material at the entity's transform
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererComponent {
    pub mesh: MeshId,
    pub material: MaterialId,
}

/// Everything needed to order and issue one draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub entity: Entity,
    pub mesh: MeshId,
    pub material: MaterialId,
    pub render_layer: i32,
    pub shader: ShaderKind,
}

impl DrawItem {
    pub fn sort_key(&self) -> (i32, ShaderKind, MaterialId) {
        (self.render_layer, self.shader, self.material)
    }
}

/// Order draws by render layer, then shader, then material, so state
/// changes between consecutive draws stay rare and higher layers draw last
pub fn sort_draw_items(items: &mut [DrawItem]) {
    items.sort_by_key(DrawItem::sort_key);
}

/// The scene: a world of named entities plus the shared per-frame resources
pub struct GameScene {
    world: World,
}

impl Default for GameScene {
    fn default() -> Self {
        Self::new()
    }
}

impl GameScene {
    pub fn new() -> Self {
        let mut world = World::new();
        world.insert_resource(Timing::new(0.0));
        world.insert_resource(InputState::new());
        world.insert_resource(LightSettings::default());
        Self { world }
    }

    /// Spawn a named entity with a default transform
    pub fn create_entity(&mut self, name: &str) -> Entity {
        self.world
            .spawn((GameObjectTag(name.to_string()), Transform::default()))
            .id()
    }

    /// First entity with the given name
    pub fn find_entity(&mut self, name: &str) -> Option<Entity> {
        self.world
            .query::<(Entity, &GameObjectTag)>()
            .iter(&self.world)
            .find(|(_, tag)| tag.0 == name)
            .map(|(entity, _)| entity)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn update_behaviours(&mut self) {
        update_behaviours(&mut self.world);
    }

    /// The first entity carrying a camera, with its world matrix
    pub fn main_camera(&mut self) -> Option<(Entity, Camera, glam::Mat4)> {
        self.world
            .query::<(Entity, &Camera, &Transform)>()
            .iter(&self.world)
            .next()
            .map(|(entity, camera, transform)| (entity, camera.clone(), transform.matrix()))
    }

    pub fn entity_count(&self) -> usize {
        self.world.entities().len() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn item(world: &mut World, layer: i32, shader: ShaderKind, material: u32) -> DrawItem {
        DrawItem {
            entity: world.spawn_empty().id(),
            mesh: MeshId(0),
            material: MaterialId(material),
            render_layer: layer,
            shader,
        }
    }

    #[test]
    fn draws_sort_by_layer_shader_material() {
        let mut world = World::new();
        let sky = item(&mut world, 100, ShaderKind::Skybox, 0);
        let reflective = item(&mut world, 0, ShaderKind::Reflective, 1);
        let lit_b = item(&mut world, 0, ShaderKind::BlinnPhongTextured, 4);
        let lit_a = item(&mut world, 0, ShaderKind::BlinnPhongTextured, 2);
        let lit_a2 = item(&mut world, 0, ShaderKind::BlinnPhongTextured, 2);

        let mut items = vec![sky, reflective, lit_b, lit_a, lit_a2];
        sort_draw_items(&mut items);

        let materials: Vec<u32> = items.iter().map(|i| i.material.0).collect();
        assert_eq!(materials, vec![2, 2, 4, 1, 0]);
        assert_eq!(items.last().unwrap().shader, ShaderKind::Skybox);
        // stable for equal keys
        assert_eq!(items[0].entity, lit_a.entity);
        assert_eq!(items[1].entity, lit_a2.entity);
    }

    #[test]
    fn entities_are_found_by_name() {
        let mut scene = GameScene::new();
        let floor = scene.create_entity("lego_floor");
        let camera = scene.create_entity("Camera");

        assert_eq!(scene.find_entity("Camera"), Some(camera));
        assert_eq!(scene.find_entity("lego_floor"), Some(floor));
        assert_eq!(scene.find_entity("missing"), None);
        assert_eq!(
            scene.world().get::<Transform>(floor),
            Some(&Transform::default())
        );
    }

    #[test]
    fn main_camera_reports_world_matrix() {
        let mut scene = GameScene::new();
        let entity = scene.create_entity("Camera");
        scene.world_mut().entity_mut(entity).insert(Camera::default());
        scene.world_mut().get_mut::<Transform>(entity).unwrap().position = Vec3::new(3.0, 3.0, 3.0);

        let (found, _, matrix) = scene.main_camera().unwrap();
        assert_eq!(found, entity);
        assert!((matrix.w_axis.truncate() - Vec3::new(3.0, 3.0, 3.0)).length() < 1e-6);
    }
}
