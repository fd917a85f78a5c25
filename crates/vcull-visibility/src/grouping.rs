//! Flatness grouping for experimental sampling.
//!
//! A random subset of faces is chosen as seeds. Every other face borrows
//! the verdict of the nearest seed (by centroid distance) whose normal lies
//! within the flatness angle of its own; a face with no such seed becomes
//! a seed itself, so every face ends up in exactly one group.
//!
//! Candidate seeds are bucketed by normal on a grid whose cell is the
//! chord of the flatness angle, so a face only compares against seeds in
//! the 27 cells around its own normal.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;
use vcull_math::{angle_between_deg, Dir3};
use vcull_mesh::MeshAccess;

/// Mapping from each face to the seed face whose verdict it takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceGroups {
    seed_of: Vec<usize>,
    seeds: Vec<usize>,
}

impl FaceGroups {
    /// Every face is its own seed (non-experimental runs).
    pub fn identity(face_count: usize) -> Self {
        Self {
            seed_of: (0..face_count).collect(),
            seeds: (0..face_count).collect(),
        }
    }

    /// Build groups from a seeded random sample of faces.
    ///
    /// `sampling_ratio` is a percentage of the face count and
    /// `flatness_angle` is in degrees. Faces without a normal are never
    /// candidates and form singleton groups.
    pub fn build<M: MeshAccess + ?Sized>(
        mesh: &M,
        sampling_ratio: f64,
        flatness_angle: f64,
        seed: u64,
    ) -> Self {
        let n = mesh.face_count();
        if n == 0 {
            return Self::identity(0);
        }

        let wanted = ((n as f64 * sampling_ratio / 100.0).round() as usize).clamp(1, n);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut initial = rand::seq::index::sample(&mut rng, n, wanted).into_vec();
        initial.sort_unstable();

        let normals: Vec<Option<Dir3>> = (0..n).map(|f| mesh.face_normal(f)).collect();
        let mut seed_of: Vec<Option<usize>> = vec![None; n];
        let mut candidates = NormalGrid::new(flatness_angle);
        for &s in &initial {
            seed_of[s] = Some(s);
            if let Some(normal) = &normals[s] {
                candidates.insert(s, normal);
            }
        }

        let mut promoted = 0usize;
        for face in 0..n {
            if seed_of[face].is_some() {
                continue;
            }
            let Some(normal) = normals[face] else {
                seed_of[face] = Some(face);
                promoted += 1;
                continue;
            };

            let centroid = mesh.face_centroid(face);
            let nearest = candidates
                .near(&normal)
                .filter_map(|s| {
                    let seed_normal = normals[s]?;
                    (angle_between_deg(&normal, &seed_normal) <= flatness_angle).then(|| {
                        let d = (mesh.face_centroid(s) - centroid).norm_squared();
                        (s, d)
                    })
                })
                .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
                .map(|(s, _)| s);

            match nearest {
                Some(s) => seed_of[face] = Some(s),
                None => {
                    seed_of[face] = Some(face);
                    candidates.insert(face, &normal);
                    promoted += 1;
                }
            }
        }

        let seed_of: Vec<usize> = seed_of
            .into_iter()
            .enumerate()
            .map(|(face, s)| s.unwrap_or(face))
            .collect();
        let seeds: Vec<usize> = (0..n).filter(|&f| seed_of[f] == f).collect();

        debug!(
            faces = n,
            sampled = wanted,
            promoted,
            groups = seeds.len(),
            "built flatness groups"
        );
        Self { seed_of, seeds }
    }

    /// Seed whose verdict `face` inherits.
    pub fn seed_of(&self, face: usize) -> usize {
        self.seed_of[face]
    }

    /// Faces that are ray-tested directly, ascending.
    pub fn seeds(&self) -> &[usize] {
        &self.seeds
    }

    /// Number of faces covered.
    pub fn face_count(&self) -> usize {
        self.seed_of.len()
    }
}

/// Seed candidates bucketed by unit normal. Two normals within the
/// flatness angle are at most one chord apart, so their cells differ by
/// at most one step on each axis.
struct NormalGrid {
    cell: f64,
    buckets: HashMap<[i32; 3], Vec<usize>>,
}

impl NormalGrid {
    fn new(flatness_angle: f64) -> Self {
        let chord = 2.0 * (flatness_angle.to_radians() / 2.0).sin();
        Self {
            cell: chord.max(1e-6),
            buckets: HashMap::new(),
        }
    }

    fn key(&self, normal: &Dir3) -> [i32; 3] {
        [normal.x, normal.y, normal.z].map(|c| (c / self.cell).floor() as i32)
    }

    fn insert(&mut self, face: usize, normal: &Dir3) {
        self.buckets.entry(self.key(normal)).or_default().push(face);
    }

    /// Candidates whose normal may lie within the flatness angle of `normal`.
    fn near(&self, normal: &Dir3) -> impl Iterator<Item = usize> + '_ {
        let [x, y, z] = self.key(normal);
        let offsets = (-1..=1).flat_map(|dx| {
            (-1..=1).flat_map(move |dy| (-1..=1).map(move |dz| [dx, dy, dz]))
        });
        offsets
            .map(move |[dx, dy, dz]| [x + dx, y + dy, z + dz])
            .filter_map(move |key| self.buckets.get(&key))
            .flatten()
            .copied()
    }
}
