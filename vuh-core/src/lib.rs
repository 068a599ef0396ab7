pub mod config;
pub mod git;
pub mod pattern;
pub mod project;
pub mod select;
pub mod utils;
pub mod vhdl_ls;

pub use pattern::{FilePattern, Restriction};
pub use project::{LibraryRef, Manifest, Project, SourceOptions};
pub use select::{Selection, add_source_files, glob_in, select};
