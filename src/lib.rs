// Copyright (c) 2016-2020 Fabian Schuiki

//! A compiler for hardware coverage specifications.

// Re-export everything from the common crate.
pub use mealy_common as common;

// Pull in the language implementation.
pub use mealy_cov as cov;
