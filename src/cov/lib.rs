// Copyright (c) 2016-2020 Fabian Schuiki

//! This crate implements the semantic core of the mealy coverage compiler:
//! width checking of coverage scripts and merging of raw runtime coverage
//! dumps into coverage reports.

pub mod ast;
pub mod dump;
pub mod konst;
pub mod merge;
pub mod symtbl;
pub mod typeck;

pub use crate::merge::{merge_coverage, Coverage, GroupCoverage, MergeFlags};
pub use crate::typeck::{check_script, width_of_expr, CheckedScript, WidthTable};
