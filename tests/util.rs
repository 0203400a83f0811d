#![allow(dead_code)]
use mesh_renumber::mesh::Mesh;
use mesh_renumber::numbering::ThreadGroups;
use mesh_renumber::permutation::Permutation;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Assert vec is a permutation of another vec (order-agnostic).
pub fn assert_permutation<T: Ord + Copy + std::fmt::Debug>(got: &[T], want: &[T]) {
    let mut a = got.to_vec();
    a.sort_unstable();
    let mut b = want.to_vec();
    b.sort_unstable();
    assert_eq!(a, b, "not a permutation\n got={:?}\nwant={:?}", got, want);
}

/// Assert `new_to_old` is a bijection of `[0, n)`.
pub fn assert_bijection(new_to_old: &[usize], n: usize) {
    let want: Vec<usize> = (0..n).collect();
    assert_permutation(new_to_old, &want);
}

/// Cells touched by the renumbered faces of (t, g).
pub fn touched_cells(
    faces: &[[usize; 2]],
    new_to_old: &[usize],
    tg: &ThreadGroups,
    t: usize,
    g: usize,
) -> Vec<usize> {
    let mut cells: Vec<usize> = tg
        .range(t, g)
        .into_iter()
        .flatten()
        .flat_map(|p| faces[new_to_old[p]])
        .collect();
    cells.sort_unstable();
    cells.dedup();
    cells
}

/// Brute-force check that no two threads of a group touch the same cell.
pub fn assert_groups_disjoint(faces: &[[usize; 2]], new_to_old: &[usize], tg: &ThreadGroups) {
    for g in 0..tg.n_groups() {
        for t1 in 0..tg.n_threads() {
            let a = touched_cells(faces, new_to_old, tg, t1, g);
            for t2 in t1 + 1..tg.n_threads() {
                let b = touched_cells(faces, new_to_old, tg, t2, g);
                let shared: Vec<_> = a.iter().filter(|c| b.binary_search(c).is_ok()).collect();
                assert!(
                    shared.is_empty(),
                    "threads {t1} and {t2} share cells {shared:?} in group {g}"
                );
            }
        }
    }
}

/// Sum of range lengths over every (thread, group).
pub fn coverage(tg: &ThreadGroups) -> usize {
    (0..tg.n_groups())
        .flat_map(|g| tg.group(g))
        .map(|(_, r)| r.len())
        .sum()
}

/// Random interior faces between distinct cells of `[0, n_cells)`.
pub fn random_faces(seed: u64, n_cells: usize, n_faces: usize) -> Vec<[usize; 2]> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n_faces)
        .map(|_| {
            let a = rng.gen_range(0..n_cells);
            let mut b = rng.gen_range(0..n_cells - 1);
            if b >= a {
                b += 1;
            }
            [a, b]
        })
        .collect()
}

pub fn random_permutation(seed: u64, n: usize) -> Permutation {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut v: Vec<usize> = (0..n).collect();
    v.shuffle(&mut rng);
    Permutation::try_from_new_to_old(v).unwrap()
}

/// Copy of the connectivity arrays a renumbering may touch.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub i_face_cells: Vec<[usize; 2]>,
    pub b_face_cells: Vec<usize>,
    pub i_face_vertices: Option<(Vec<usize>, Vec<usize>)>,
    pub b_face_vertices: Option<(Vec<usize>, Vec<usize>)>,
    pub cell_cells: Option<(Vec<usize>, Vec<usize>)>,
    pub cell_family: Option<Vec<i32>>,
    pub i_face_family: Option<Vec<i32>>,
    pub b_face_family: Option<Vec<i32>>,
}

pub fn snapshot(m: &Mesh) -> Snapshot {
    let list = |l: &Option<mesh_renumber::mesh::IndexedList>| {
        l.as_ref().map(|l| (l.index().to_vec(), l.values().to_vec()))
    };
    Snapshot {
        i_face_cells: m.i_face_cells.clone(),
        b_face_cells: m.b_face_cells.clone(),
        i_face_vertices: list(&m.i_face_vertices),
        b_face_vertices: list(&m.b_face_vertices),
        cell_cells: list(&m.cell_cells),
        cell_family: m.cell_family.clone(),
        i_face_family: m.i_face_family.clone(),
        b_face_family: m.b_face_family.clone(),
    }
}
