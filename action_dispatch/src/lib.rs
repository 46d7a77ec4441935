//! Generator of action dispatch wrappers and handler interfaces.
//!
//! Given the description of an aggregate holding a nested `Action` enum, it synthesizes a
//! wrapper which matches every case and forwards it to a handler, plus the interface the
//! handler implements, one method per case.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

#[macro_use]
extern crate derive_more;
#[macro_use]
extern crate derive_new;

pub mod declaration;
pub mod diagnostic;
pub mod generator;
pub mod resolver;
