//! Toolchain families and compile/link command synthesis
//!
//! Commands are argv vectors; the first element is the program. The family
//! decides flag spelling only. Artifact naming is a platform concern and
//! lives with the target model.

use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::build::config::Config;
use crate::build::target::{Target, TargetKind};

/// The flag dialect of the configured compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainFamily {
    /// cl.exe style: `/c /nologo /Fo /I /D /LIBPATH: /OUT: /DLL`
    Msvc,
    /// gcc/clang style: `-c -o -I -D -L -l -shared`
    Unix,
    /// Apple clang. Same dialect as [`ToolchainFamily::Unix`]; kept distinct
    /// because shared-library naming differs on the platform.
    Apple,
}

impl ToolchainFamily {
    /// Infer the family from the compiler executable name.
    ///
    /// `cl` without `clang` means MSVC; everything else is Unix-flavored,
    /// Apple when the host is macOS.
    pub fn infer(compiler: &str) -> Self {
        if compiler.contains("cl") && !compiler.contains("clang") {
            Self::Msvc
        } else if cfg!(target_os = "macos") {
            Self::Apple
        } else {
            Self::Unix
        }
    }

    pub fn is_msvc(self) -> bool {
        self == Self::Msvc
    }

    /// Default archiver executable for the family
    pub fn default_archiver(self) -> &'static str {
        match self {
            Self::Msvc => "lib",
            Self::Unix | Self::Apple => "ar",
        }
    }
}

/// Synthesizes per-source compile lines and per-target link/archive lines
pub(crate) struct CommandSynth<'a> {
    config: &'a Config,
    family: ToolchainFamily,
}

impl<'a> CommandSynth<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            family: config.family(),
        }
    }

    /// Compile line for one source of `target`, producing `object`.
    ///
    /// Order: compiler, compile-only + output flags, per-target flags if set
    /// else global flags, include dirs, global defines, target defines, source.
    pub fn compile_command(&self, target: &Target, source: &Path, object: &Path) -> Vec<String> {
        let mut args = vec![self.config.compiler().to_string()];
        if self.family.is_msvc() {
            args.push("/c".to_string());
            args.push("/nologo".to_string());
            args.push(format!("/Fo{}", object.display()));
            args.push("/showIncludes".to_string());
        } else {
            args.push("-c".to_string());
            args.push("-o".to_string());
            args.push(object.display().to_string());
        }
        let flags = match target.cflags() {
            Some(flags) => Some(flags),
            None => self.config.global_cflags(),
        };
        if let Some(flags) = flags {
            args.extend(flags.split_whitespace().map(str::to_string));
        }
        for dir in target.include_dirs() {
            if self.family.is_msvc() {
                args.push("/I".to_string());
                args.push(dir.display().to_string());
            } else {
                args.push(format!("-I{}", dir.display()));
            }
        }
        let define_flag = if self.family.is_msvc() { "/D" } else { "-D" };
        for define in self
            .config
            .global_defines()
            .iter()
            .chain(target.defines().iter())
        {
            args.push(format!("{define_flag}{define}"));
        }
        args.push(source.display().to_string());
        args
    }

    /// Archive line for a static library.
    ///
    /// Per-target and global link flags are never appended here; the
    /// archiver takes only the output and the objects.
    pub fn archive_command(&self, target: &Target, objects: &[PathBuf]) -> Vec<String> {
        let objects = objects.iter().map(|o| o.display().to_string());
        if self.family.is_msvc() {
            std::iter::once(self.config.archiver().to_string())
                .chain(std::iter::once(format!(
                    "/OUT:{}",
                    target.output_file().display()
                )))
                .chain(objects)
                .collect_vec()
        } else {
            [
                self.config.archiver().to_string(),
                "rcs".to_string(),
                target.output_file().display().to_string(),
            ]
            .into_iter()
            .chain(objects)
            .collect_vec()
        }
    }

    /// Link line for an executable or shared library.
    ///
    /// `deps` are the resolved dependency targets in declaration order;
    /// library-kind outputs (including proxies) are appended literally.
    pub fn link_command(
        &self,
        target: &Target,
        objects: &[PathBuf],
        deps: &[&Target],
    ) -> Vec<String> {
        let mut args = vec![
            self.config.linker().to_string(),
            "-o".to_string(),
            target.output_file().display().to_string(),
        ];
        args.extend(objects.iter().map(|o| o.display().to_string()));
        for dir in target.lib_dirs() {
            if self.family.is_msvc() {
                args.push(format!("/LIBPATH:{}", dir.display()));
            } else {
                args.push(format!("-L{}", dir.display()));
            }
        }
        for lib in target.link_libs() {
            if self.family.is_msvc() {
                args.push(format!("{lib}.lib"));
            } else {
                args.push(format!("-l{lib}"));
            }
        }
        for dep in deps {
            if dep.kind().links_as_library() {
                args.push(dep.output_file().display().to_string());
            }
        }
        if let Some(flags) = target.ldflags() {
            args.extend(flags.split_whitespace().map(str::to_string));
        }
        if let Some(flags) = self.config.global_ldflags() {
            args.extend(flags.split_whitespace().map(str::to_string));
        }
        if target.kind() == TargetKind::SharedLib {
            args.push(if self.family.is_msvc() {
                "/DLL".to_string()
            } else {
                "-shared".to_string()
            });
        }
        args
    }
}
