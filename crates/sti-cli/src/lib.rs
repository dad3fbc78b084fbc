//! Library side of the `sti` binary: input loading and logging setup.

#![deny(unsafe_code)]

pub mod input;
pub mod logging;
