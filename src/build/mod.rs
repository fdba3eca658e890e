//! anvil build engine

pub mod config;
pub use config::Config;
mod target;
pub use target::{ArtifactKind, Command, CommandId, SubprojectId, Target, TargetId, TargetKind};
mod project;
pub use project::Project;
mod commands_json;
pub use commands_json::CompileCommandEntry;
mod compile;
mod graph;
mod oracle;
mod run;
pub mod selfbuild;
mod subproject;
pub use subproject::Subproject;
mod toolchain;
pub use toolchain::ToolchainFamily;
mod wildcard;
pub use wildcard::match_wildcard;
