//! Error types

use crate::system;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // configuration
    #[error("Cannot find required tool `{0}`. {1}")]
    MissingTool(String, String),
    #[error("Subproject `{0}` has no target named `{1}`")]
    UnknownSubprojectTarget(String, String),
    #[error("Unknown target kind `{0}` in manifest of subproject `{1}`")]
    UnknownManifestKind(String, String),
    #[error("Cannot load manifest from subproject `{0}`")]
    ManifestLoad(String),

    // fs
    #[error("Cannot find `{0}`")]
    NotFound(String),
    #[error("Invalid path `{0}`: {1}")]
    InvalidPath(String, std::io::Error),
    #[error("Cannot read file `{0}`: {1}")]
    ReadFile(String, std::io::Error),
    #[error("Cannot write file `{0}`: {1}")]
    WriteFile(String, std::io::Error),
    #[error("Cannot rename file `{0}` to `{1}`: {2}")]
    RenameFile(String, String, std::io::Error),
    #[error("Cannot remove file `{0}`: {1}")]
    RemoveFile(String, std::io::Error),
    #[error("Cannot create directory `{0}`: {1}")]
    CreateDirectory(String, std::io::Error),
    #[error("Cannot remove directory `{0}`: {1}")]
    RemoveDirectory(String, std::io::Error),
    #[error("Cannot set modified time for `{0}`: {1}")]
    SetModifiedTime(String, std::io::Error),

    // process
    #[error("error spawning `{0}`: {1}")]
    SpawnChild(String, std::io::Error),
    #[error("error executing `{0}`: {1}")]
    WaitForChild(String, std::io::Error),

    // build
    #[error("Command `{0}` failed with exit code {1}")]
    CommandFailed(String, i32),
    #[error("Circular dependency involving `{0}`")]
    CircularDependency(String),
    #[error("One or more sources failed to compile. Check the errors above.")]
    CompileError,
    #[error("Linking failed. Check the errors above.")]
    LinkError,

    // self-rebuild
    #[error("Rebuilding the build driver failed: `{0}`")]
    SelfRebuild(String),
}

impl Error {
    pub fn print(&self) {
        system::errorln!("Fatal", "{}", self);
    }
}
