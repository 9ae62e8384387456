use shared::models::geometry::Vector3;

/// The six clipping planes of a view-projection matrix, normals pointing inwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [glm::Vec4; 6],
}

impl Frustum {
    pub fn from_matrix(view_projection: &glm::Mat4) -> Self {
        let m = view_projection;
        let row = |i: usize| glm::vec4(m[(i, 0)], m[(i, 1)], m[(i, 2)], m[(i, 3)]);

        let (x, y, z, w) = (row(0), row(1), row(2), row(3));
        let mut planes = [w + x, w - x, w + y, w - y, w + z, w - z];

        for plane in planes.iter_mut() {
            let length = glm::length(&plane.xyz());
            if length > f32::EPSILON {
                *plane /= length;
            }
        }

        Self { planes }
    }

    /// A frustum culling nothing.
    pub fn everything() -> Self {
        Self {
            planes: [glm::vec4(0.0, 0.0, 0.0, 1.0); 6],
        }
    }

    fn signed_distance(plane: &glm::Vec4, point: &Vector3) -> f32 {
        plane.x * point.x + plane.y * point.y + plane.z * point.z + plane.w
    }

    pub fn contains(&self, point: &Vector3) -> bool {
        self.planes
            .iter()
            .all(|plane| Self::signed_distance(plane, point) >= 0.0)
    }

    pub fn intersects_sphere(&self, center: &Vector3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| Self::signed_distance(plane, center) >= -radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_looking_down_negative_z() -> Frustum {
        let projection = glm::perspective(1.0, std::f32::consts::FRAC_PI_2, 0.1, 100.0);
        let view = glm::look_at(
            &glm::vec3(0.0, 0.0, 0.0),
            &glm::vec3(0.0, 0.0, -1.0),
            &glm::vec3(0.0, 1.0, 0.0),
        );

        Frustum::from_matrix(&(projection * view))
    }

    #[test]
    fn test_contains() {
        let frustum = camera_looking_down_negative_z();

        assert!(frustum.contains(&Vector3::new(0.0, 0.0, -10.0)));
        assert!(frustum.contains(&Vector3::new(5.0, -5.0, -10.0)));
        assert!(!frustum.contains(&Vector3::new(0.0, 0.0, 10.0)));
        assert!(!frustum.contains(&Vector3::new(0.0, 0.0, -200.0)));
        assert!(!frustum.contains(&Vector3::new(50.0, 0.0, -10.0)));
    }

    #[test]
    fn test_intersects_sphere() {
        let frustum = camera_looking_down_negative_z();

        assert!(frustum.intersects_sphere(&Vector3::new(0.0, 0.0, 10.0), 20.0));
        assert!(!frustum.intersects_sphere(&Vector3::new(0.0, 0.0, 10.0), 5.0));
    }

    #[test]
    fn test_everything() {
        let frustum = Frustum::everything();
        assert!(frustum.contains(&Vector3::new(1.0e6, -1.0e6, 3.0)));
    }
}
