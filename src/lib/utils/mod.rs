//! Helpers shared with the command line front end.

pub use crate::core::concurrency::determine_allowed_cpus;
pub use crate::core::errors::is_broken_pipe;
pub use crate::core::fs::{is_bgzipped, make_parent_dirs, with_name_suffix};
pub use crate::core::io::{get_line_reader, get_raw_writer, get_writer};
