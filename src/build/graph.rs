//! Graph executor: one depth-first traversal over targets and commands
//!
//! Targets and commands share a single node space so cycles through either
//! kind are caught by the same in-stack set. Targets are built at most once
//! per invocation via the visited set; commands memoize through their
//! `executed` flag and survive across invocations of the executor within
//! one driver run.

use std::collections::HashSet;

use crate::build::compile;
use crate::build::oracle;
use crate::build::target::{CommandId, TargetId, TargetKind};
use crate::build::toolchain::CommandSynth;
use crate::system::{self, run_shell, Error};
use crate::Project;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Node {
    Target(TargetId),
    Command(CommandId),
}

/// Per-invocation traversal state
#[derive(Debug, Default)]
pub(crate) struct ExecState {
    visited: HashSet<TargetId>,
    in_stack: HashSet<Node>,
}

impl Project {
    /// Bring one target up to date: pre-commands, dependencies, compile and
    /// link, post-commands, in that order
    pub(crate) fn execute_target(
        &mut self,
        id: TargetId,
        state: &mut ExecState,
    ) -> Result<(), Error> {
        if state.in_stack.contains(&Node::Target(id)) {
            return Err(Error::CircularDependency(self.targets[id.0].name.clone()));
        }
        if state.visited.contains(&id) {
            return Ok(());
        }
        state.in_stack.insert(Node::Target(id));
        let result = self.execute_target_phases(id, state);
        state.in_stack.remove(&Node::Target(id));
        if result.is_ok() {
            state.visited.insert(id);
        }
        result
    }

    fn execute_target_phases(&mut self, id: TargetId, state: &mut ExecState) -> Result<(), Error> {
        for command in self.targets[id.0].pre_commands.clone() {
            self.execute_command(command, state)?;
        }
        for dep in self.targets[id.0].deps.clone() {
            self.execute_target(dep, state)?;
        }
        self.build_target(id)?;
        for command in self.targets[id.0].post_commands.clone() {
            self.execute_command(command, state)?;
        }
        Ok(())
    }

    /// Execute a command node: dependencies first, then the command itself,
    /// at most once per driver invocation
    pub(crate) fn execute_command(
        &mut self,
        id: CommandId,
        state: &mut ExecState,
    ) -> Result<(), Error> {
        if state.in_stack.contains(&Node::Command(id)) {
            return Err(Error::CircularDependency(self.commands[id.0].name.clone()));
        }
        if self.commands[id.0].executed {
            let command = &self.commands[id.0];
            if command.result != 0 {
                return Err(Error::CommandFailed(command.name.clone(), command.result));
            }
            return Ok(());
        }
        state.in_stack.insert(Node::Command(id));
        let result = self.execute_command_phases(id, state);
        state.in_stack.remove(&Node::Command(id));
        result
    }

    fn execute_command_phases(&mut self, id: CommandId, state: &mut ExecState) -> Result<(), Error> {
        for dep in self.commands[id.0].deps.clone() {
            self.execute_command(dep, state)?;
        }
        let code = self.run_command_now(id)?;
        if code != 0 {
            return Err(Error::CommandFailed(self.commands[id.0].name.clone(), code));
        }
        Ok(())
    }

    /// Run the command's shell line and cache the exit code
    pub(crate) fn run_command_now(&mut self, id: CommandId) -> Result<i32, Error> {
        let (name, line) = {
            let command = &self.commands[id.0];
            (command.name.clone(), command.command_line.clone())
        };
        system::infoln!("Running", "{}", name);
        let output = run_shell(&line, false)?;
        let command = &mut self.commands[id.0];
        command.executed = true;
        command.result = output.code;
        if output.code != 0 {
            system::errorln!("Failed", "command `{}` exited with {}", name, output.code);
        }
        Ok(output.code)
    }

    /// Compile and link one target. Proxies build nothing themselves; their
    /// pre-command already ran the nested driver.
    fn build_target(&self, id: TargetId) -> Result<(), Error> {
        let target = &self.targets[id.0];
        if target.kind.is_proxy() {
            return Ok(());
        }
        let objects = compile::compile_phase(&self.config, target)?;

        let dep_outputs: Vec<_> = target
            .deps
            .iter()
            .map(|dep| self.targets[dep.0].output_file.as_path())
            .collect();
        if !oracle::needs_relink(&target.output_file, &objects, &dep_outputs) {
            system::verboseln!("Skipped", "{}", target.output_file.display());
            return Ok(());
        }
        if let Some(parent) = target.output_file.parent() {
            system::ensure_directory(parent)?;
        }

        let synth = CommandSynth::new(&self.config);
        let arguments = match target.kind {
            TargetKind::StaticLib => {
                system::infoln!("Archiving", "{}", target.output_file.display());
                synth.archive_command(target, &objects)
            }
            TargetKind::Executable | TargetKind::SharedLib => {
                let deps: Vec<_> = target.deps.iter().map(|dep| &self.targets[dep.0]).collect();
                system::infoln!("Linking", "{}", target.output_file.display());
                synth.link_command(target, &objects, &deps)
            }
            TargetKind::Proxy(_) => return Ok(()),
        };
        compile::run_link(&arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::target::ArtifactKind;

    #[test]
    fn command_runs_at_most_once() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("log");
        let mut project = Project::new();
        let cmd = project.command("stamp", &format!("echo ran >> '{}'", log.display()));
        assert_eq!(project.run_command(cmd), 0);
        assert_eq!(project.run_command(cmd), 0);
        let content = std::fs::read_to_string(&log).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn command_dependencies_run_first() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("log");
        let mut project = Project::new();
        let first = project.command("first", &format!("echo first >> '{}'", log.display()));
        let second = project.command("second", &format!("echo second >> '{}'", log.display()));
        project.command_add_dependency(second, first);
        assert_eq!(project.run_command(second), 0);
        let content = std::fs::read_to_string(&log).unwrap();
        assert_eq!(content.lines().collect::<Vec<_>>(), vec!["first", "second"]);
    }

    #[test]
    fn failed_command_exit_code_is_cached() {
        let mut project = Project::new();
        let cmd = project.command("boom", "exit 3");
        assert_eq!(project.run_command(cmd), 3);
        // second request reports the cached failure without re-running
        assert_eq!(project.run_command(cmd), 3);
    }

    #[test]
    fn target_cycle_is_detected_before_building() {
        let mut project = Project::new();
        project.set_output_dir(tempfile::tempdir().unwrap().path().join("build"));
        let a = project.static_library("a");
        let b = project.static_library("b");
        project.link_target(a, b);
        project.link_target(b, a);
        let mut state = ExecState::default();
        let err = project.execute_target(a, &mut state).unwrap_err();
        assert!(matches!(err, Error::CircularDependency(_)));
        // nothing was built
        assert!(!project.target(a).output_file().exists());
        assert!(!project.target(b).output_file().exists());
    }

    #[test]
    fn command_cycle_is_detected() {
        let mut project = Project::new();
        let a = project.command("a", "true");
        let b = project.command("b", "true");
        project.command_add_dependency(a, b);
        project.command_add_dependency(b, a);
        let mut state = ExecState::default();
        let err = project.execute_command(a, &mut state).unwrap_err();
        assert!(matches!(err, Error::CircularDependency(_)));
    }

    #[test]
    fn proxy_builds_nothing_but_runs_its_pre_command() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("log");
        let mut project = Project::new();
        let build_cmd =
            project.command("build subproject fake", &format!("echo built >> '{}'", log.display()));
        let proxy = project.register_proxy_for_test(
            "fake_math",
            ArtifactKind::StaticLib,
            tmp.path().join("libmath.a"),
            build_cmd,
        );
        let mut state = ExecState::default();
        project.execute_target(proxy, &mut state).unwrap();
        project.execute_target(proxy, &mut state).unwrap();
        let content = std::fs::read_to_string(&log).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
