//! Driver dispatch: manifest, clean, subcommands, and the default build

use std::time::Instant;

use clap::Parser;

use crate::build::commands_json;
use crate::build::graph::ExecState;
use crate::build::target::{SubcommandAction, TargetId};
use crate::system::{self, run_shell, Error};
use crate::{DriverArgs, Project};

impl Project {
    /// The driver entry point. Pass `std::env::args()`.
    ///
    /// Dispatches on the arguments: `--manifest` prints the target manifest
    /// and exits 0; `clean` cleans subprojects then the project outputs; a
    /// registered subcommand name builds its target then runs its action;
    /// anything else builds every top-level target in registration order.
    /// Returns the process exit code: 0 on success, 1 on failure.
    pub fn run<I, T>(&mut self, args: I) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let args = DriverArgs::parse_from(args);
        if args.verbose {
            system::enable_verbose();
        }
        match self.dispatch(&args) {
            Ok(()) => 0,
            Err(e) => {
                e.print();
                1
            }
        }
    }

    pub(crate) fn dispatch(&mut self, args: &DriverArgs) -> Result<(), Error> {
        if args.manifest {
            for line in self.manifest_lines() {
                println!("{line}");
            }
            return Ok(());
        }
        if self.config.emit_compile_commands {
            self.cc_entries = commands_json::collect(self);
        }
        match args.command.as_deref() {
            Some("clean") => self.clean(),
            Some(name) => match self.subcommands.iter().position(|s| s.name == name) {
                Some(index) => self.run_subcommand(index),
                // an unrecognized word falls through to a full build
                None => self.build_all(),
            },
            None => self.build_all(),
        }
    }

    /// The manifest wire format: one `TYPE NAME PATH` line per non-proxy
    /// target, in registration order
    pub fn manifest_lines(&self) -> Vec<String> {
        self.targets
            .iter()
            .filter_map(|target| {
                target.kind.artifact().map(|kind| {
                    format!(
                        "{} {} {}",
                        kind.manifest_tag(),
                        target.name,
                        target.output_file.display()
                    )
                })
            })
            .collect()
    }

    fn build_all(&mut self) -> Result<(), Error> {
        let start = Instant::now();
        let mut state = ExecState::default();
        for index in 0..self.targets.len() {
            self.execute_target(TargetId(index), &mut state)?;
        }
        if self.config.emit_compile_commands {
            system::ensure_directory(&self.config.output_dir)?;
            let path = self.config.output_dir.join("compile_commands.json");
            commands_json::write(&path, &self.cc_entries)?;
        }
        system::infoln!("Finished", "build in {:.2}s", start.elapsed().as_secs_f32());
        Ok(())
    }

    fn run_subcommand(&mut self, index: usize) -> Result<(), Error> {
        let target = self.subcommands[index].target;
        let mut state = ExecState::default();
        self.execute_target(target, &mut state)?;

        system::infoln!("Running", "subcommand `{}`", self.subcommands[index].name);
        let shell_line = match &mut self.subcommands[index].action {
            SubcommandAction::Shell(line) => Some(line.clone()),
            SubcommandAction::Callback(callback) => {
                callback();
                None
            }
        };
        if let Some(line) = shell_line {
            let output = run_shell(&line, false)?;
            if output.code != 0 {
                return Err(Error::CommandFailed(
                    self.subcommands[index].name.clone(),
                    output.code,
                ));
            }
        }
        Ok(())
    }

    /// Clean subprojects first, then every target's object directory and
    /// output file, then the output directory itself
    fn clean(&mut self) -> Result<(), Error> {
        system::infoln!("Cleaning", "build outputs");
        self.clean_subprojects();
        for index in 0..self.targets.len() {
            let (obj_dir, output_file) = {
                let target = &self.targets[index];
                (target.obj_dir.clone(), target.output_file.clone())
            };
            if let Some(obj_dir) = obj_dir {
                system::remove_directory(obj_dir)?;
            }
            system::remove_file(output_file)?;
        }
        system::remove_directory(&self.config.output_dir)?;
        system::infoln!("Finished", "clean");
        Ok(())
    }
}
