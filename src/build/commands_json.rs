//! compile_commands.json emission

use std::io::BufWriter;
use std::path::Path;

use itertools::Itertools;
use serde::Serialize;

use crate::build::compile;
use crate::build::toolchain::CommandSynth;
use crate::system::{self, Error};
use crate::Project;

/// One record of `compile_commands.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileCommandEntry {
    pub directory: String,
    pub command: String,
    pub file: String,
}

/// Pre-collect one record per source of every target, with the compile line
/// that would be issued. Runs before the build so the file reflects the
/// whole project even when most sources are up to date.
pub(crate) fn collect(project: &Project) -> Vec<CompileCommandEntry> {
    let directory = system::current_dir()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|_| ".".to_string());
    let synth = CommandSynth::new(&project.config);
    let mut entries = Vec::new();
    for target in &project.targets {
        let Some(obj_dir) = target.obj_dir() else {
            continue;
        };
        for source in target.sources() {
            let object = compile::object_path(obj_dir, source);
            let arguments = synth.compile_command(target, source, &object);
            entries.push(CompileCommandEntry {
                directory: directory.clone(),
                command: shell_join(&arguments),
                file: source.display().to_string(),
            });
        }
    }
    entries
}

/// Write the collected records as a JSON array
pub(crate) fn write(path: &Path, entries: &[CompileCommandEntry]) -> Result<(), Error> {
    system::verboseln!("Saving", "{}", path.display());
    let file = BufWriter::new(system::create(path)?);
    serde_json::to_writer_pretty(file, entries)
        .map_err(|e| Error::WriteFile(path.display().to_string(), std::io::Error::other(e)))
}

fn shell_join(arguments: &[String]) -> String {
    arguments
        .iter()
        .map(|arg| {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                format!("\"{arg}\"")
            } else {
                arg.clone()
            }
        })
        .join(" ")
}
