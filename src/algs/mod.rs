//! Graph construction, vectorization, connectivity update and race checks.

pub mod adjacency_graph;
pub mod renumber;
pub mod vectorize;
pub mod verify;

pub use adjacency_graph::{CsrGraph, build_cell_adjacency, build_cell_face_incidence};
pub use renumber::{renumber_cells, renumber_faces};
pub use vectorize::{count_vector_conflicts, vectorize_boundary_faces, vectorize_interior_faces};
pub use verify::{count_numbering_conflicts, count_thread_conflicts, verify_mesh_numbering};
