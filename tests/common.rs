//! Test utilities for tsgen integration tests

#![allow(dead_code)]

use tsgen::rules::Rule;
use tsgen::{Location, RuleKind};

/// Result type alias for tests
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Extract Ok value or panic with context
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("assertion failed: expected Ok, got Err({:?})", e),
        }
    };
    ($expr:expr, $msg:literal) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// A ts_project rule at the root; engine inputs move it to their location
pub fn ts_project(name: &str, srcs: &[&str], deps: &[&str]) -> Rule {
    Rule::new(RuleKind::TsProject, name, Location::root())
        .with_attr("srcs", srcs.to_vec())
        .with_attr("deps", deps.to_vec())
}
