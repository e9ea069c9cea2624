//! High-level operations.
//!
//! This module contains the implementation of headerpack commands.

pub mod archive;
pub mod copy;
pub mod export;
pub mod generators;
pub mod index;
pub mod new;
pub mod package;
pub mod test_package;
pub mod verify;

pub use archive::{create_archive, list_archive, ArchiveInfo};
pub use copy::{package, package_filtered, plan_copy, CopyFilter, CopyPlan, CopyReport};
pub use export::export_sources;
pub use generators::write_generators;
pub use index::{lookup, publish, IndexEntry, PackageIndex, PublishResult};
pub use new::{init_recipe, InitOptions};
pub use package::{create_package, PackageOptions, PackageResult};
pub use test_package::{find_cxx_compiler, test_package, TestOptions, TestOutcome};
pub use verify::{verify_package, VerifyReport};
