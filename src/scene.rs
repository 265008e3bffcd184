pub mod buffer;
pub mod shader;
pub mod util;

use std::sync::Arc;

use nalgebra::{Matrix4, UnitQuaternion, Vector3};

use crate::model::Model;

/// Observer placed in the world. Looks down its local +z axis with +y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

impl Camera {
    pub fn new(position: Vector3<f64>) -> Camera {
        return Camera {
            position,
            rotation: UnitQuaternion::identity(),
        };
    }

    /// Camera at `position` turned towards `target`. `up` must not be parallel to the view direction.
    pub fn looking_at(position: Vector3<f64>, target: Vector3<f64>, up: Vector3<f64>) -> Camera {
        return Camera {
            position,
            rotation: UnitQuaternion::face_towards(&(target - position), &up),
        };
    }

    /// Moves the camera by `delta` given in its own frame.
    pub fn translate_local(&mut self, delta: Vector3<f64>) {
        self.position += self.rotation * delta;
    }

    /// World to view space.
    pub fn view_matrix(&self) -> Matrix4<f64> {
        return self.rotation.inverse().to_homogeneous() * Matrix4::new_translation(&-self.position);
    }
}

impl Default for Camera {
    fn default() -> Self {
        return Camera::new(Vector3::zeros());
    }
}

/// A model placed in the world.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub model: Arc<Model>,
    pub position: Vector3<f64>,
    pub scale: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

impl SceneObject {
    pub fn new(model: Arc<Model>, position: Vector3<f64>, scale: f64) -> SceneObject {
        return SceneObject {
            model,
            position,
            scale: Vector3::new(scale, scale, scale),
            rotation: UnitQuaternion::identity(),
        };
    }

    /// Object to world: scale, then rotate, then translate.
    pub fn world_matrix(&self) -> Matrix4<f64> {
        return Matrix4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale);
    }
}
