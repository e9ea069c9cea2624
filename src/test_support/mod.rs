//! Test fixtures shared by the unit tests.

pub mod fixtures;

pub use fixtures::{header_tree, qflags_project, read_tree, QFLAGS_RECIPE};
