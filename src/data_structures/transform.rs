//! Editable entity transforms.
//!
//! Entities store a plain world matrix. The inspector works on a
//! [`Transform`] (position, Euler rotation in degrees, scale) that is
//! decomposed from the matrix when an entity is selected and recomposed
//! whenever a field changes.

use cgmath::{Deg, InnerSpace, Matrix4, Rad, Vector3};

/// Translation, XYZ Euler rotation in degrees and non-uniform scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    /// Degrees around X, Y and Z, applied in that order.
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    /// Identity transform.
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_position(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }

    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, degrees: Vector3<f32>) -> Self {
        self.rotation = degrees;
        self
    }

    /// `translate * rotX * rotY * rotZ * scale`
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_x(Deg(self.rotation.x))
            * Matrix4::from_angle_y(Deg(self.rotation.y))
            * Matrix4::from_angle_z(Deg(self.rotation.z))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Inverse of [`to_matrix`](Self::to_matrix) for matrices without shear.
    pub fn from_matrix(m: &Matrix4<f32>) -> Self {
        let position = m.w.truncate();
        let basis = [m.x.truncate(), m.y.truncate(), m.z.truncate()];
        let scale = Vector3::new(
            basis[0].magnitude(),
            basis[1].magnitude(),
            basis[2].magnitude(),
        );
        let unscale = |v: Vector3<f32>, s: f32| if s > f32::EPSILON { v / s } else { v };
        // Column-major: r[col][row] of the pure rotation Rx * Ry * Rz.
        let c0 = unscale(basis[0], scale.x);
        let c1 = unscale(basis[1], scale.y);
        let c2 = unscale(basis[2], scale.z);

        let sin_y = c2.x.clamp(-1.0, 1.0);
        let y = sin_y.asin();
        let (x, z) = if sin_y.abs() < 0.9999 {
            (Rad((-c2.y).atan2(c2.z)), Rad((-c1.x).atan2(c0.x)))
        } else {
            // Gimbal lock: fold the whole X/Z rotation into X.
            (Rad(c1.z.atan2(c1.y)), Rad(0.0))
        };
        let rotation = Vector3::new(Deg::from(x).0, Deg::from(Rad(y)).0, Deg::from(z).0);

        Self {
            position,
            rotation,
            scale,
        }
    }
}
