//! Built-in interleaved vertex arrays.
//!
//! Every vertex is `position (3), normal (3), texcoord (2)`. Triangles are
//! counter-clockwise when seen from the side the normal points to. Texture
//! coordinates have v = 0 at the top of the image.

/// Unit cube centred on the origin, 36 vertices.
#[rustfmt::skip]
pub const CUBE: [f32; 288] = [
    // +Z
    -0.5, -0.5,  0.5,   0.0,  0.0,  1.0,   0.0, 1.0,
     0.5, -0.5,  0.5,   0.0,  0.0,  1.0,   1.0, 1.0,
     0.5,  0.5,  0.5,   0.0,  0.0,  1.0,   1.0, 0.0,
     0.5,  0.5,  0.5,   0.0,  0.0,  1.0,   1.0, 0.0,
    -0.5,  0.5,  0.5,   0.0,  0.0,  1.0,   0.0, 0.0,
    -0.5, -0.5,  0.5,   0.0,  0.0,  1.0,   0.0, 1.0,
    // -Z
     0.5, -0.5, -0.5,   0.0,  0.0, -1.0,   0.0, 1.0,
    -0.5, -0.5, -0.5,   0.0,  0.0, -1.0,   1.0, 1.0,
    -0.5,  0.5, -0.5,   0.0,  0.0, -1.0,   1.0, 0.0,
    -0.5,  0.5, -0.5,   0.0,  0.0, -1.0,   1.0, 0.0,
     0.5,  0.5, -0.5,   0.0,  0.0, -1.0,   0.0, 0.0,
     0.5, -0.5, -0.5,   0.0,  0.0, -1.0,   0.0, 1.0,
    // +X
     0.5, -0.5,  0.5,   1.0,  0.0,  0.0,   0.0, 1.0,
     0.5, -0.5, -0.5,   1.0,  0.0,  0.0,   1.0, 1.0,
     0.5,  0.5, -0.5,   1.0,  0.0,  0.0,   1.0, 0.0,
     0.5,  0.5, -0.5,   1.0,  0.0,  0.0,   1.0, 0.0,
     0.5,  0.5,  0.5,   1.0,  0.0,  0.0,   0.0, 0.0,
     0.5, -0.5,  0.5,   1.0,  0.0,  0.0,   0.0, 1.0,
    // -X
    -0.5, -0.5, -0.5,  -1.0,  0.0,  0.0,   0.0, 1.0,
    -0.5, -0.5,  0.5,  -1.0,  0.0,  0.0,   1.0, 1.0,
    -0.5,  0.5,  0.5,  -1.0,  0.0,  0.0,   1.0, 0.0,
    -0.5,  0.5,  0.5,  -1.0,  0.0,  0.0,   1.0, 0.0,
    -0.5,  0.5, -0.5,  -1.0,  0.0,  0.0,   0.0, 0.0,
    -0.5, -0.5, -0.5,  -1.0,  0.0,  0.0,   0.0, 1.0,
    // +Y
    -0.5,  0.5,  0.5,   0.0,  1.0,  0.0,   0.0, 1.0,
     0.5,  0.5,  0.5,   0.0,  1.0,  0.0,   1.0, 1.0,
     0.5,  0.5, -0.5,   0.0,  1.0,  0.0,   1.0, 0.0,
     0.5,  0.5, -0.5,   0.0,  1.0,  0.0,   1.0, 0.0,
    -0.5,  0.5, -0.5,   0.0,  1.0,  0.0,   0.0, 0.0,
    -0.5,  0.5,  0.5,   0.0,  1.0,  0.0,   0.0, 1.0,
    // -Y
    -0.5, -0.5, -0.5,   0.0, -1.0,  0.0,   0.0, 1.0,
     0.5, -0.5, -0.5,   0.0, -1.0,  0.0,   1.0, 1.0,
     0.5, -0.5,  0.5,   0.0, -1.0,  0.0,   1.0, 0.0,
     0.5, -0.5,  0.5,   0.0, -1.0,  0.0,   1.0, 0.0,
    -0.5, -0.5,  0.5,   0.0, -1.0,  0.0,   0.0, 0.0,
    -0.5, -0.5, -0.5,   0.0, -1.0,  0.0,   0.0, 1.0,
];

/// 10×10 floor at y = -0.5. The texture repeats twice across it.
#[rustfmt::skip]
pub const PLANE: [f32; 48] = [
     5.0, -0.5,  5.0,   0.0,  1.0,  0.0,   2.0, 2.0,
     5.0, -0.5, -5.0,   0.0,  1.0,  0.0,   2.0, 0.0,
    -5.0, -0.5, -5.0,   0.0,  1.0,  0.0,   0.0, 0.0,
    -5.0, -0.5, -5.0,   0.0,  1.0,  0.0,   0.0, 0.0,
    -5.0, -0.5,  5.0,   0.0,  1.0,  0.0,   0.0, 2.0,
     5.0, -0.5,  5.0,   0.0,  1.0,  0.0,   2.0, 2.0,
];

/// Unit quad in the z = 0 plane facing +Z, spanning x in [0, 1] and y in [-0.5, 0.5].
#[rustfmt::skip]
pub const WINDOW: [f32; 48] = [
    0.0,  0.5,  0.0,   0.0,  0.0,  1.0,   0.0, 0.0,
    0.0, -0.5,  0.0,   0.0,  0.0,  1.0,   0.0, 1.0,
    1.0, -0.5,  0.0,   0.0,  0.0,  1.0,   1.0, 1.0,
    0.0,  0.5,  0.0,   0.0,  0.0,  1.0,   0.0, 0.0,
    1.0, -0.5,  0.0,   0.0,  0.0,  1.0,   1.0, 1.0,
    1.0,  0.5,  0.0,   0.0,  0.0,  1.0,   1.0, 0.0,
];

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector3};

    use super::*;
    use crate::data_structures::model::ModelVertex;

    /// Every triangle must wind counter-clockwise around its own normal.
    fn assert_front_facing(data: &[f32]) {
        let vertices = ModelVertex::from_interleaved(data).unwrap();
        assert_eq!(vertices.len() % 3, 0);
        for tri in vertices.chunks_exact(3) {
            let p: Vec<Vector3<f32>> = tri.iter().map(|v| v.position.into()).collect();
            let n: Vector3<f32> = tri[0].normal.into();
            let winding = (p[1] - p[0]).cross(p[2] - p[0]);
            assert!(winding.dot(n) > 0.0, "clockwise triangle {:?}", tri);
        }
    }

    #[test]
    fn cube_faces_point_outwards() {
        assert_front_facing(&CUBE);
        let vertices = ModelVertex::from_interleaved(&CUBE).unwrap();
        for v in vertices {
            let p: Vector3<f32> = v.position.into();
            let n: Vector3<f32> = v.normal.into();
            assert!(p.dot(n) > 0.0);
        }
    }

    #[test]
    fn plane_and_window_face_their_normals() {
        assert_front_facing(&PLANE);
        assert_front_facing(&WINDOW);
    }
}
