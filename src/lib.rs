//! A self-rebuilding build orchestrator for native code projects.
//!
//! The user's build driver is a small Rust program that declares targets,
//! commands and subprojects on a [`Project`], then hands its command-line
//! arguments to [`Project::run`]:
//!
//! ```no_run
//! use anvil::Project;
//!
//! fn main() {
//!     let mut project = Project::new();
//!     project.set_output_dir("build");
//!     project.enable_compile_commands(true);
//!
//!     let math = project.static_library("math");
//!     project.add_source(math, "lib/*.c");
//!
//!     let main = project.executable("main");
//!     project.add_source(main, "main.c");
//!     project.add_include_dir(main, "lib");
//!     project.link_target(main, math);
//!
//!     std::process::exit(project.run(std::env::args()));
//! }
//! ```
//!
//! The driver then understands `clean`, `--manifest`, and any registered
//! subcommand; with no arguments it brings every declared target up to
//! date, recompiling only sources whose objects are stale.

use clap::Parser;

pub mod build;
pub mod system;

pub use build::selfbuild::{self_rebuild_if_needed, self_rebuild_with_command};
pub use build::{
    ArtifactKind, Command, CommandId, CompileCommandEntry, Config, Project, Subproject,
    SubprojectId, Target, TargetId, TargetKind, ToolchainFamily,
};
pub use system::Error;

/// Command-line surface of a build driver
#[derive(Debug, Clone, Default, PartialEq, Parser)]
#[command(author, version, about)]
pub struct DriverArgs {
    /// Print the target manifest and exit
    #[clap(long)]
    pub manifest: bool,

    /// Print verbose output from commands
    #[clap(short, long)]
    pub verbose: bool,

    /// `clean` or the name of a registered subcommand
    pub command: Option<String>,
}
