//! Infrastructure layer
//!
//! Handles all I/O with the outside world: the filesystem, the code
//! compiler process and git.

pub mod compiler;
pub mod filesystem;
pub mod git;
