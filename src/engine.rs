//! Generation engine: reconciliation, symbol resolution and run orchestration

pub mod generator;
pub mod reconciler;
pub mod resolver;
pub mod snapshot;

pub use generator::{
    Candidate, CancellationToken, GenerationEngine, GenerationResult, LocationInput,
    LocationResult, ResolvedRule, SuppressedRule, SymbolDiagnostic, SymbolProblem,
};
pub use reconciler::{FileInventory, ForeignRule, MatchConflict, Reconciled, Reconciler};
pub use resolver::{
    IndexBuilder, NpmPackages, PackageIndex, Resolution, ResolutionIndex, Resolver,
};
pub use snapshot::Snapshot;
