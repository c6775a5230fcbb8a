//! Output formatters (human and JSONL)

pub mod human;
pub mod jsonl;
pub mod kinds;

pub use human::HumanFormatter;
pub use jsonl::JsonlFormatter;
pub use kinds::{KindHumanFormatter, KindInfo, KindJsonlFormatter};
