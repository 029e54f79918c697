//! Scene state: flat entity and light arrays plus the named object list the
//! debug GUI browses.

use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::{data_structures::uniform::UniformRange, resources::ModelId};

/// Stable handle of a scene object. Never reused.
pub type ObjectId = u32;

#[derive(Debug)]
pub struct Entity {
    pub world_matrix: Matrix4<f32>,
    pub model: ModelId,
    /// This frame's slice of the uniform buffer. Overwritten every update;
    /// `None` when the entity did not fit and is skipped this frame.
    pub local_params: Option<UniformRange>,
}

impl Entity {
    pub fn new(model: ModelId, world_matrix: Matrix4<f32>) -> Self {
        Self {
            world_matrix,
            model,
            local_params: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum LightType {
    Directional = 0,
    Point = 1,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightType,
    pub color: Vector3<f32>,
    /// Direction towards the light, used by directional lights.
    pub direction: Vector3<f32>,
    /// Used by point lights.
    pub position: Vector3<f32>,
}

impl Light {
    pub fn directional(direction: Vector3<f32>, color: Vector3<f32>) -> Self {
        Self {
            kind: LightType::Directional,
            color,
            direction,
            position: Vector3::new(0.0, 0.0, 0.0),
        }
    }

    pub fn point(position: Vector3<f32>, color: Vector3<f32>) -> Self {
        Self {
            kind: LightType::Point,
            color,
            direction: Vector3::new(0.0, -1.0, 0.0),
            position,
        }
    }

    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }
}

/// What a hierarchy entry points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Entity(usize),
    Light(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneObject {
    pub name: String,
    pub id: ObjectId,
    pub kind: ObjectKind,
}

#[derive(Debug, Default)]
pub struct Scene {
    pub entities: Vec<Entity>,
    pub lights: Vec<Light>,
    pub objects: Vec<SceneObject>,
    next_id: ObjectId,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entity(
        &mut self,
        name: impl Into<String>,
        model: ModelId,
        world_matrix: Matrix4<f32>,
    ) -> ObjectId {
        self.entities.push(Entity::new(model, world_matrix));
        self.push_object(name.into(), ObjectKind::Entity(self.entities.len() - 1))
    }

    pub fn add_light(&mut self, name: impl Into<String>, light: Light) -> ObjectId {
        self.lights.push(light);
        self.push_object(name.into(), ObjectKind::Light(self.lights.len() - 1))
    }

    fn push_object(&mut self, name: String, kind: ObjectKind) -> ObjectId {
        let id = self.next_id;
        self.next_id += 1;
        self.objects.push(SceneObject { name, id, kind });
        id
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// First object with the given name.
    pub fn find(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn entity_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.entities.get_mut(index)
    }

    pub fn light_mut(&mut self, index: usize) -> Option<&mut Light> {
        self.lights.get_mut(index)
    }

    /// World matrix of an entity, identity for anything else.
    pub fn world_matrix(&self, id: ObjectId) -> Matrix4<f32> {
        match self.object(id).map(|o| o.kind) {
            Some(ObjectKind::Entity(index)) => self
                .entities
                .get(index)
                .map(|e| e.world_matrix)
                .unwrap_or_else(Matrix4::identity),
            _ => Matrix4::identity(),
        }
    }
}
