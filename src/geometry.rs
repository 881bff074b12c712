//! Fixed geometry for the orbit scene.

use std::collections::{BTreeSet, HashMap};
use std::f32::consts::PI;

use glam::Vec3;
use rand::Rng;

/// Golden ratio; the icosahedron vertices are the cyclic permutations of
/// `(0, +-1, +-PHI)`.
const PHI: f32 = 1.618_034;

const ICOSAHEDRON_VERTICES: [[f32; 3]; 12] = [
    [-1.0, PHI, 0.0],
    [1.0, PHI, 0.0],
    [-1.0, -PHI, 0.0],
    [1.0, -PHI, 0.0],
    [0.0, -1.0, PHI],
    [0.0, 1.0, PHI],
    [0.0, -1.0, -PHI],
    [0.0, 1.0, -PHI],
    [PHI, 0.0, -1.0],
    [PHI, 0.0, 1.0],
    [-PHI, 0.0, -1.0],
    [-PHI, 0.0, 1.0],
];

const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// Indexed triangle mesh with every vertex on a sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyhedron {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub edges: Vec<[u32; 2]>,
}

impl Polyhedron {
    /// Geodesic icosphere. Each face is cut into `(detail + 1)^2`
    /// triangles before the vertices are pushed out to `radius`.
    pub fn icosahedron(radius: f32, detail: u32) -> Self {
        let mut builder = Builder::default();
        let cols = detail as usize + 1;

        for face in ICOSAHEDRON_FACES {
            let [a, b, c] = face.map(|i| Vec3::from_array(ICOSAHEDRON_VERTICES[i]));

            // grid[i][j]: row i runs from the a-c edge to the b-c edge.
            let grid: Vec<Vec<Vec3>> = (0..=cols)
                .map(|i| {
                    let t = i as f32 / cols as f32;
                    let (start, end) = (a.lerp(c, t), b.lerp(c, t));
                    let rows = cols - i;
                    (0..=rows)
                        .map(|j| {
                            if rows == 0 {
                                start
                            } else {
                                start.lerp(end, j as f32 / rows as f32)
                            }
                        })
                        .collect()
                })
                .collect();

            for i in 0..cols {
                for j in 0..2 * (cols - i) - 1 {
                    let k = j / 2;
                    let tri = if j % 2 == 0 {
                        [grid[i][k + 1], grid[i + 1][k], grid[i][k]]
                    } else {
                        [grid[i][k + 1], grid[i + 1][k + 1], grid[i + 1][k]]
                    };
                    builder.triangle(tri.map(|v| v.normalize() * radius));
                }
            }
        }

        builder.finish()
    }

    /// Edge endpoints flattened for line-list drawing.
    pub fn edge_indices(&self) -> Vec<u32> {
        self.edges.iter().flatten().copied().collect()
    }

    pub fn positions(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| v.to_array()).collect()
    }
}

#[derive(Default)]
struct Builder {
    vertices: Vec<Vec3>,
    lookup: HashMap<[i64; 3], u32>,
    triangles: Vec<[u32; 3]>,
    edges: BTreeSet<[u32; 2]>,
}

impl Builder {
    fn vertex(&mut self, v: Vec3) -> u32 {
        // Shared corners come out of different faces with rounding noise.
        let key = (v * 1e4).round().as_i64vec3().to_array();
        *self.lookup.entry(key).or_insert_with(|| {
            self.vertices.push(v);
            (self.vertices.len() - 1) as u32
        })
    }

    fn triangle(&mut self, corners: [Vec3; 3]) {
        let tri = corners.map(|v| self.vertex(v));
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            self.edges.insert([a.min(b), a.max(b)]);
        }
        self.triangles.push(tri);
    }

    fn finish(self) -> Polyhedron {
        Polyhedron {
            vertices: self.vertices,
            triangles: self.triangles,
            edges: self.edges.into_iter().collect(),
        }
    }
}

/// Points around a sphere, `radius + [0, thickness)` from the origin.
///
/// Azimuth and polar angle are both drawn uniformly, so points bunch up
/// toward the poles rather than covering the shell evenly.
pub fn sample_shell(count: usize, radius: f32, thickness: f32, rng: &mut impl Rng) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            let r = radius + rng.gen::<f32>() * thickness;
            let theta = rng.gen::<f32>() * PI * 2.0;
            let phi = rng.gen::<f32>() * PI;
            Vec3::new(
                r * phi.sin() * theta.cos(),
                r * phi.sin() * theta.sin(),
                r * phi.cos(),
            )
        })
        .collect()
}
