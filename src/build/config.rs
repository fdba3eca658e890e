//! Global build configuration
//!
//! Configuration is programmatic: the driver mutates it through
//! [`Project`](crate::Project) setters before execution begins. No config
//! file and no environment variables are consulted.

use std::path::{Path, PathBuf};

use crate::build::toolchain::ToolchainFamily;
use crate::system;

/// Project-wide build settings
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) output_dir: PathBuf,
    pub(crate) jobs: usize,
    pub(crate) compiler: String,
    pub(crate) global_cflags: Option<String>,
    pub(crate) global_ldflags: Option<String>,
    pub(crate) global_defines: Vec<String>,
    pub(crate) emit_compile_commands: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("build"),
            jobs: system::cpu_count(),
            compiler: "cc".to_string(),
            global_cflags: None,
            global_ldflags: None,
            global_defines: Vec::new(),
            emit_compile_commands: false,
        }
    }
}

impl Config {
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    pub fn family(&self) -> ToolchainFamily {
        ToolchainFamily::infer(&self.compiler)
    }

    /// The archiver, inferred from the compiler (`lib` for MSVC, else `ar`)
    pub fn archiver(&self) -> &'static str {
        self.family().default_archiver()
    }

    /// The linker: the compiler itself on Unix/macOS, `ld` on Windows
    pub fn linker(&self) -> String {
        if cfg!(windows) {
            "ld".to_string()
        } else {
            self.compiler.clone()
        }
    }

    pub fn global_cflags(&self) -> Option<&str> {
        self.global_cflags.as_deref()
    }

    pub fn global_ldflags(&self) -> Option<&str> {
        self.global_ldflags.as_deref()
    }

    pub fn global_defines(&self) -> &[String] {
        &self.global_defines
    }

    pub(crate) fn set_compiler(&mut self, compiler: &str) {
        self.compiler = compiler.to_string();
    }

    pub(crate) fn add_global_cflags(&mut self, flags: &str) {
        append_flags(&mut self.global_cflags, flags);
    }

    pub(crate) fn add_global_ldflags(&mut self, flags: &str) {
        append_flags(&mut self.global_ldflags, flags);
    }

    pub(crate) fn add_global_define(&mut self, define: String) {
        self.global_defines.push(define);
    }
}

fn append_flags(dst: &mut Option<String>, flags: &str) {
    match dst {
        Some(existing) => {
            existing.push(' ');
            existing.push_str(flags);
        }
        None => *dst = Some(flags.to_string()),
    }
}
