//! Face renumbering for fixed-width vector loops.
//!
//! Faces are laid out so that a vector block of `W` consecutive faces never
//! touches a cell twice, whichever way the partial block is aligned (at the
//! start or at the end of the array), and so that a face never shares a cell
//! with the face `W` positions before it (same lane, previous block).
//!
//! The search walks positions left to right and, on conflict, swaps the
//! current face with candidates taken from the next register onward,
//! wrapping around the array. A pass that never had to disturb an
//! already-placed face is a success. Failed passes are retried up to
//! [`MAX_PASSES`] times, with a deterministic shuffle every
//! [`SHUFFLE_PERIOD`] passes or after an aborted pass.

use crate::mesh::FaceCells;
use crate::partitioning::error::PartitionError;
use crate::permutation::Permutation;

pub const MAX_PASSES: usize = 100;
pub const SHUFFLE_PERIOD: usize = 10;

/// First earlier position whose face may not share a cell with the face at
/// `p`: the start of `p`'s block under either alignment of the partial block.
#[inline]
fn window_start(p: usize, w: usize, rem: usize) -> usize {
    let (r, k) = (p / w, p % w);
    if r == 0 {
        0
    } else if k < rem {
        (r - 1) * w + rem
    } else {
        r * w
    }
}

#[inline]
fn share_cell(a: &[usize], b: &[usize]) -> bool {
    a.iter().any(|c| b.contains(c))
}

/// Whether the face placed at `p` conflicts with an earlier position.
fn conflicts_at<C>(faces: &C, order: &[usize], p: usize, w: usize, rem: usize) -> bool
where
    C: FaceCells + ?Sized,
{
    let cur = faces.cells(order[p]);
    (window_start(p, w, rem)..p).any(|q| share_cell(cur, faces.cells(order[q])))
        || (p >= w && share_cell(cur, faces.cells(order[p - w])))
}

/// Number of positions of `new_to_old` whose face conflicts with an earlier
/// one for block width `w`. Zero means the layout is safe to vectorize.
pub fn count_vector_conflicts<C>(faces: &C, new_to_old: &[usize], w: usize) -> usize
where
    C: FaceCells + ?Sized,
{
    if w <= 1 {
        return 0;
    }
    let rem = new_to_old.len() % w;
    (0..new_to_old.len())
        .filter(|&p| conflicts_at(faces, new_to_old, p, w, rem))
        .count()
}

/// Swap mirrored pairs of the tail with the head, every other position.
fn shuffle(order: &mut [usize]) {
    let n = order.len();
    for ii in (0..n.saturating_sub(4) / 2).step_by(2) {
        order.swap(ii, n - ii - 1);
    }
}

/// Bounded swap search; returns a conflict-free `new_to_old` or fails.
fn search<C>(faces: &C, w: usize) -> Result<Vec<usize>, PartitionError>
where
    C: FaceCells + ?Sized,
{
    let n = faces.n_faces();
    let (rem, n_reg) = (n % w, n / w);
    let mut order: Vec<usize> = (0..n).collect();

    for pass in 0..MAX_PASSES {
        let mut mod_prev = false;
        let mut aborted = false;
        // 1-based register of the previous position; 0 before the first
        let mut reg = 0;
        let mut swap_id: isize = -1;

        'faces: for jj in 0..n {
            let reg_prev = reg;
            let lane = jj % w + 1;
            reg = jj / w + 1;

            let next = if (reg == n_reg && lane > rem) || reg == n_reg + 1 {
                0
            } else if lane > rem {
                reg * w + rem
            } else {
                reg * w
            };
            if reg != reg_prev {
                swap_id = next as isize - 1;
            }

            let mut wraps = 0;
            while conflicts_at(faces, &order, jj, w, rem) {
                swap_id += 1;
                if swap_id as usize >= n {
                    swap_id = 0;
                    wraps += 1;
                }
                if (swap_id as usize) < jj {
                    mod_prev = true;
                }
                if wraps >= 2 {
                    aborted = true;
                    break 'faces;
                }
                order.swap(swap_id as usize, jj);
            }
        }

        if !mod_prev && !aborted {
            log::debug!("vectorization (width {w}) converged after {} passes", pass + 1);
            return Ok(order);
        }
        if (pass + 1) % SHUFFLE_PERIOD == 0 || aborted {
            shuffle(&mut order);
        }
    }

    Err(PartitionError::NotVectorizable(format!(
        "no conflict-free layout for {n} faces with width {w} after {MAX_PASSES} passes"
    )))
}

/// Search, then re-check independently before handing the permutation out.
fn search_verified<C>(faces: &C, w: usize, what: &str) -> Result<Permutation, PartitionError>
where
    C: FaceCells + ?Sized,
{
    let order = search(faces, w)?;
    let n_conflicts = count_vector_conflicts(faces, &order, w);
    if n_conflicts > 0 {
        log::warn!(
            "{n_conflicts} conflicts in {what} renumbering for vectorization; faces are not renumbered"
        );
        return Err(PartitionError::NotVectorizable(format!(
            "{n_conflicts} conflicts after search"
        )));
    }
    Ok(Permutation::try_from_new_to_old(order)?)
}

/// Renumber interior faces for vector blocks of width `w`.
pub fn vectorize_interior_faces(
    face_cells: &[[usize; 2]],
    w: usize,
) -> Result<Permutation, PartitionError> {
    if w <= 1 {
        return Err(PartitionError::VectorizationDisabled);
    }
    if face_cells.is_empty() {
        return Err(PartitionError::Empty("interior faces"));
    }
    search_verified(face_cells, w, "interior face")
}

/// Renumber boundary faces for vector blocks of width `w`.
///
/// Rejects up front meshes where a cell has more boundary faces than there
/// are blocks, or where too many cells need one face in every block.
pub fn vectorize_boundary_faces(
    b_face_cells: &[usize],
    n_cells_ext: usize,
    w: usize,
) -> Result<Permutation, PartitionError> {
    if w <= 1 {
        return Err(PartitionError::VectorizationDisabled);
    }
    let n = b_face_cells.len();
    if n == 0 {
        return Err(PartitionError::Empty("boundary faces"));
    }
    let (rem, n_reg) = (n % w, n / w);

    let mut per_cell = vec![0usize; n_cells_ext];
    for &c in b_face_cells {
        per_cell[c] += 1;
    }
    let n_max = per_cell.iter().copied().max().unwrap_or(0);
    let n_full = per_cell.iter().filter(|&&k| k == n_reg + 1).count();
    if n_max > n_reg + 1 || (n_max == n_reg + 1 && n_full > rem) {
        return Err(PartitionError::NotVectorizable(format!(
            "a cell carries {n_max} of {n} boundary faces"
        )));
    }

    search_verified(b_face_cells, w, "boundary face")
}
