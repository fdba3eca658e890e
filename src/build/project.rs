//! The build context

use std::path::PathBuf;

use crate::build::commands_json::CompileCommandEntry;
use crate::build::config::Config;
use crate::build::graph::ExecState;
use crate::build::subproject::Subproject;
use crate::build::target::{
    Command, CommandId, Subcommand, SubcommandAction, Target, TargetId, TargetKind,
};
use crate::build::wildcard;
use crate::system::{self, Error};

/// A build project: the registries of targets, commands, subprojects and
/// subcommands, plus the global configuration.
///
/// The driver populates the project single-threaded, then calls
/// [`Project::run`] with its command-line arguments. Registration order is
/// the default build order. Output paths are computed when a target is
/// declared, so configure the output directory first.
#[derive(Default)]
pub struct Project {
    pub(crate) config: Config,
    pub(crate) targets: Vec<Target>,
    pub(crate) commands: Vec<Command>,
    pub(crate) subprojects: Vec<Subproject>,
    pub(crate) subcommands: Vec<Subcommand>,
    pub(crate) cc_entries: Vec<CompileCommandEntry>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn target(&self, id: TargetId) -> &Target {
        &self.targets[id.0]
    }

    // --- global configuration ---

    /// Set the output directory (default `build`). Must be called before
    /// declaring targets; their output paths derive from it.
    pub fn set_output_dir<P>(&mut self, dir: P)
    where
        P: Into<PathBuf>,
    {
        self.config.output_dir = dir.into();
    }

    /// Set the number of parallel compile jobs (minimum 1)
    pub fn set_parallelism(&mut self, jobs: usize) {
        self.config.jobs = jobs.max(1);
    }

    /// Set the compiler executable. The archiver and toolchain family are
    /// inferred from the name.
    pub fn set_compiler(&mut self, compiler: &str) {
        self.config.set_compiler(compiler);
    }

    /// Append to the global compile-flag string
    pub fn add_global_cflags(&mut self, flags: &str) {
        self.config.add_global_cflags(flags);
    }

    /// Append to the global link-flag string
    pub fn add_global_ldflags(&mut self, flags: &str) {
        self.config.add_global_ldflags(flags);
    }

    /// Add a global preprocessor define, `NAME` form
    pub fn add_global_define(&mut self, name: &str) {
        self.config.add_global_define(name.to_string());
    }

    /// Add a global preprocessor define, `NAME=VALUE` form
    pub fn add_global_define_val(&mut self, name: &str, value: &str) {
        self.config.add_global_define(format!("{name}={value}"));
    }

    /// Define `NAME=1` or `NAME=0` globally
    pub fn set_global_flag(&mut self, name: &str, value: bool) {
        self.add_global_define_val(name, if value { "1" } else { "0" });
    }

    /// Enable emission of `compile_commands.json` after a successful build
    pub fn enable_compile_commands(&mut self, enabled: bool) {
        self.config.emit_compile_commands = enabled;
    }

    // --- target declaration ---

    pub fn executable(&mut self, name: &str) -> TargetId {
        self.declare(name, TargetKind::Executable)
    }

    pub fn static_library(&mut self, name: &str) -> TargetId {
        self.declare(name, TargetKind::StaticLib)
    }

    pub fn shared_library(&mut self, name: &str) -> TargetId {
        self.declare(name, TargetKind::SharedLib)
    }

    fn declare(&mut self, name: &str, kind: TargetKind) -> TargetId {
        let id = TargetId(self.targets.len());
        self.targets.push(Target::new(name, kind, &self.config));
        id
    }

    /// Add a source file, expanding `*`/`?`/`**` patterns. An empty
    /// expansion is a warning, not an error.
    pub fn add_source<S>(&mut self, target: TargetId, source: S)
    where
        S: AsRef<str>,
    {
        let source = source.as_ref();
        if has_wildcard(source) {
            let matched = wildcard::expand(source);
            if matched.is_empty() {
                system::hintln!("Warning", "no files match pattern `{}`", source);
                return;
            }
            self.targets[target.0].sources.extend(matched);
        } else {
            self.targets[target.0].sources.push(PathBuf::from(source));
        }
    }

    /// Add an include directory; patterns expand and keep directories only
    pub fn add_include_dir<S>(&mut self, target: TargetId, dir: S)
    where
        S: AsRef<str>,
    {
        let dir = dir.as_ref();
        if has_wildcard(dir) {
            let matched: Vec<_> = wildcard::expand(dir)
                .into_iter()
                .filter(|p| system::dir_exists(p))
                .collect();
            if matched.is_empty() {
                system::hintln!("Warning", "no directories match pattern `{}`", dir);
                return;
            }
            self.targets[target.0].include_dirs.extend(matched);
        } else {
            self.targets[target.0].push_include_dir(PathBuf::from(dir));
        }
    }

    /// Add a library search directory; patterns expand and keep directories
    /// only
    pub fn add_library_dir<S>(&mut self, target: TargetId, dir: S)
    where
        S: AsRef<str>,
    {
        let dir = dir.as_ref();
        if has_wildcard(dir) {
            let matched: Vec<_> = wildcard::expand(dir)
                .into_iter()
                .filter(|p| system::dir_exists(p))
                .collect();
            if matched.is_empty() {
                system::hintln!("Warning", "no directories match pattern `{}`", dir);
                return;
            }
            self.targets[target.0].lib_dirs.extend(matched);
        } else {
            self.targets[target.0].push_lib_dir(PathBuf::from(dir));
        }
    }

    /// Add an external library to link, by name (`m` links as `-lm` or
    /// `m.lib`)
    pub fn add_link_library(&mut self, target: TargetId, name: &str) {
        self.targets[target.0].push_link_lib(name.to_string());
    }

    /// Link `dependency`'s artifact into `dependant` and order the build
    /// accordingly
    pub fn link_target(&mut self, dependant: TargetId, dependency: TargetId) {
        self.targets[dependant.0].deps.push(dependency);
    }

    /// Add a per-target preprocessor define, `NAME` form
    pub fn add_define(&mut self, target: TargetId, name: &str) {
        self.targets[target.0].push_define(name.to_string());
    }

    /// Add a per-target preprocessor define, `NAME=VALUE` form
    pub fn add_define_val(&mut self, target: TargetId, name: &str, value: &str) {
        self.targets[target.0].push_define(format!("{name}={value}"));
    }

    /// Define `NAME=1` or `NAME=0` on one target
    pub fn set_flag(&mut self, target: TargetId, name: &str, value: bool) {
        self.add_define_val(target, name, if value { "1" } else { "0" });
    }

    /// Append to the target's compile-flag string. When set, it replaces
    /// the global compile flags for this target's sources.
    pub fn add_target_cflags(&mut self, target: TargetId, flags: &str) {
        self.targets[target.0].append_cflags(flags);
    }

    /// Append to the target's link-flag string
    pub fn add_target_ldflags(&mut self, target: TargetId, flags: &str) {
        self.targets[target.0].append_ldflags(flags);
    }

    /// Schedule a command before the target's compile phase
    pub fn add_pre_command(&mut self, target: TargetId, command: CommandId) {
        self.targets[target.0].pre_commands.push(command);
    }

    /// Schedule a command after the target's link phase
    pub fn add_post_command(&mut self, target: TargetId, command: CommandId) {
        self.targets[target.0].post_commands.push(command);
    }

    // --- commands and subcommands ---

    /// Register a named shell command
    pub fn command(&mut self, name: &str, command_line: &str) -> CommandId {
        let id = CommandId(self.commands.len());
        self.commands.push(Command::new(name, command_line));
        id
    }

    /// Order `dependency` before `command`
    pub fn command_add_dependency(&mut self, command: CommandId, dependency: CommandId) {
        self.commands[command.0].deps.push(dependency);
    }

    /// Run a command now, dependencies first, memoized per driver
    /// invocation. Returns the exit code.
    pub fn run_command(&mut self, command: CommandId) -> i32 {
        let mut state = ExecState::default();
        match self.execute_command(command, &mut state) {
            Ok(()) => 0,
            Err(Error::CommandFailed(_, code)) => code,
            Err(e) => {
                e.print();
                -1
            }
        }
    }

    /// Register a driver subcommand that builds `target` then runs a shell
    /// command line
    pub fn register_subcommand(&mut self, name: &str, target: TargetId, command_line: &str) {
        self.subcommands.push(Subcommand {
            name: name.to_string(),
            target,
            action: SubcommandAction::Shell(command_line.to_string()),
        });
    }

    /// Register a driver subcommand that builds `target` then invokes a
    /// callback
    pub fn register_subcommand_callback<F>(&mut self, name: &str, target: TargetId, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.subcommands.push(Subcommand {
            name: name.to_string(),
            target,
            action: SubcommandAction::Callback(Box::new(callback)),
        });
    }

    #[cfg(test)]
    pub(crate) fn register_proxy_for_test(
        &mut self,
        name: &str,
        kind: crate::build::target::ArtifactKind,
        output_file: PathBuf,
        build_command: CommandId,
    ) -> TargetId {
        let mut proxy = Target::new_proxy(name, kind, output_file);
        proxy.pre_commands.push(build_command);
        let id = TargetId(self.targets.len());
        self.targets.push(proxy);
        id
    }
}

fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}
