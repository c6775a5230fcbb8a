//! Configuration file parsing and validation

pub mod tsgen_toml;

pub use tsgen_toml::{
    AmbiguityPolicy, Config, NpmConfig, OutputConfig, OutputFormat, ResolveConfig, ToolConfig,
    TsgenMeta,
};
