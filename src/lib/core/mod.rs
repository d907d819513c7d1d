pub mod concurrency;
pub mod config;
pub mod error;
pub mod errors;
pub mod fs;
pub mod io;

pub mod prelude {
    pub use super::concurrency::determine_allowed_cpus;
    pub use super::config::{CrossType, Settings};
    pub use super::error::{Result, TriageError};
    pub use super::errors::is_broken_pipe;
    pub use super::fs::{is_bgzipped, make_parent_dirs, with_name_suffix};
    pub use super::io::{get_line_reader, get_raw_writer, get_writer};
}
