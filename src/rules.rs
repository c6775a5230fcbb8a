#![forbid(unsafe_code)]

//! Rule records and attribute values

mod attr;
mod rule;

pub use attr::AttrValue;
pub use rule::{ExistingRule, GeneratedRule, MergedRule, Rule, RuleStatus};
