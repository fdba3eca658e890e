//! Compile phase: job selection and the parallel scheduler

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use itertools::Itertools;
use regex::Regex;

use crate::build::config::Config;
use crate::build::oracle;
use crate::build::target::Target;
use crate::build::toolchain::{CommandSynth, ToolchainFamily};
use crate::system::{self, ChildBuilder, Error, Executer};

/// One pending compilation for the worker pool
struct CompileJob {
    source: PathBuf,
    object: PathBuf,
    depfile: PathBuf,
    arguments: Vec<String>,
}

struct CompileOutcome {
    success: bool,
    errors: Vec<String>,
}

/// Object path for a source: `<obj_dir>/<basename-without-extension>.o`
pub(crate) fn object_path(obj_dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    obj_dir.join(format!("{stem}.o"))
}

/// Compile every out-of-date source of `target` on the worker pool.
///
/// Returns the full object list for the link step. The pool is sized by the
/// configured job count and exists only for this target's compile phase; a
/// failure flips the shared flag so queued jobs drain without compiling.
pub(crate) fn compile_phase(config: &Config, target: &Target) -> Result<Vec<PathBuf>, Error> {
    let Some(obj_dir) = target.obj_dir() else {
        return Ok(Vec::new());
    };
    if target.sources().is_empty() {
        return Ok(Vec::new());
    }
    system::ensure_directory(obj_dir)?;

    let synth = CommandSynth::new(config);
    let mut objects = Vec::with_capacity(target.sources().len());
    let mut jobs = Vec::new();
    for source in target.sources() {
        let object = object_path(obj_dir, source);
        if oracle::needs_recompile(source, &object) {
            jobs.push(CompileJob {
                arguments: synth.compile_command(target, source, &object),
                source: source.clone(),
                depfile: PathBuf::from(format!("{}.d", object.display())),
                object: object.clone(),
            });
        }
        objects.push(object);
    }
    if jobs.is_empty() {
        return Ok(objects);
    }

    check_compiler(config.compiler())?;
    let family = config.family();
    let failed = Arc::new(AtomicBool::new(false));
    let pool = Executer::new(config.jobs());
    let tasks = jobs
        .into_iter()
        .map(|job| {
            let failed = Arc::clone(&failed);
            pool.execute(move || run_compile_job(job, family, &failed))
        })
        .collect_vec();

    let mut any_failed = false;
    for task in tasks {
        let outcome = task.wait();
        if !outcome.success {
            any_failed = true;
            for line in outcome.errors {
                system::errorln!("Error", "{}", line);
            }
        }
    }
    if any_failed {
        return Err(Error::CompileError);
    }
    Ok(objects)
}

fn run_compile_job(job: CompileJob, family: ToolchainFamily, failed: &AtomicBool) -> CompileOutcome {
    // cooperative cancellation: drain without compiling once a job failed
    if failed.load(Ordering::Relaxed) {
        return CompileOutcome {
            success: true,
            errors: Vec::new(),
        };
    }
    system::infoln!("Compiling", "{}", job.source.display());
    system::verboseln!("Running", "{}", job.arguments.iter().join(" "));

    let builder = ChildBuilder::new(&job.arguments[0]).args(&job.arguments[1..]);
    let builder = if family.is_msvc() {
        builder.pipe_stdout().pipe_stderr()
    } else {
        builder.silence_stdout().pipe_stderr()
    };
    let mut child = match builder.spawn() {
        Ok(child) => child,
        Err(e) => {
            failed.store(true, Ordering::Relaxed);
            return CompileOutcome {
                success: false,
                errors: vec![e.to_string()],
            };
        }
    };

    // stderr drains on its own thread so a chatty compiler cannot deadlock
    // against the stdout read below
    let stderr_reader = child.take_stderr().map(|reader| {
        std::thread::spawn(move || reader.lines().map_while(Result::ok).collect::<Vec<_>>())
    });
    let mut stdout_lines = Vec::new();
    if let Some(reader) = child.take_stdout() {
        stdout_lines.extend(reader.lines().map_while(Result::ok));
    }
    let status = child.wait();
    let mut errors = stderr_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    if family.is_msvc() {
        write_depfile(&job.object, &job.source, &job.depfile, &stdout_lines);
    }

    match status {
        Ok(status) if status.success() => CompileOutcome {
            success: true,
            errors: Vec::new(),
        },
        Ok(_) => {
            failed.store(true, Ordering::Relaxed);
            // cl reports diagnostics on stdout
            errors.extend(stdout_lines);
            CompileOutcome {
                success: false,
                errors,
            }
        }
        Err(e) => {
            failed.store(true, Ordering::Relaxed);
            errors.push(e.to_string());
            CompileOutcome {
                success: false,
                errors,
            }
        }
    }
}

static INCLUDE_NOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Note: including file:\s*(.+)").unwrap());

/// Record the headers `/showIncludes` reported, makefile style, next to the
/// object. The file is written for downstream tooling and not read back.
fn write_depfile(object: &Path, source: &Path, depfile: &Path, stdout_lines: &[String]) {
    let mut content = format!("{}: {}", object.display(), source.display());
    for line in stdout_lines {
        if let Some(captures) = INCLUDE_NOTE.captures(line) {
            let include = captures[1].trim();
            if !include.is_empty() {
                content.push_str(" \\\n  ");
                content.push_str(include);
            }
        }
    }
    content.push('\n');
    let _ = system::write_file(depfile, content);
}

fn check_compiler(compiler: &str) -> Result<(), Error> {
    if compiler.contains('/') || compiler.contains('\\') {
        return Ok(());
    }
    which::which(compiler).map(|_| ()).map_err(|_| {
        Error::MissingTool(
            compiler.to_string(),
            "Please ensure it is installed in the system.".to_string(),
        )
    })
}

/// Run a synthesized link or archive line, surfacing captured stderr on
/// failure
pub(crate) fn run_link(arguments: &[String]) -> Result<(), Error> {
    system::verboseln!("Running", "{}", arguments.iter().join(" "));
    let mut child = ChildBuilder::new(&arguments[0])
        .args(&arguments[1..])
        .silence_stdout()
        .pipe_stderr()
        .spawn()?;
    let errors: Vec<String> = child
        .take_stderr()
        .map(|reader| reader.lines().map_while(Result::ok).collect())
        .unwrap_or_default();
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        for line in errors {
            system::errorln!("Error", "{}", line);
        }
        Err(Error::LinkError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_path_strips_extension() {
        let obj_dir = Path::new("build/obj_app");
        assert_eq!(
            object_path(obj_dir, Path::new("src/main.c")),
            PathBuf::from("build/obj_app/main.o")
        );
        assert_eq!(
            object_path(obj_dir, Path::new("noext")),
            PathBuf::from("build/obj_app/noext.o")
        );
    }

    #[test]
    fn depfile_records_reported_includes() {
        let tmp = tempfile::tempdir().unwrap();
        let depfile = tmp.path().join("main.o.d");
        let lines = vec![
            "Note: including file: C:\\src\\util.h".to_string(),
            "main.c".to_string(),
            "Note: including file:   C:\\src\\deep.h".to_string(),
        ];
        write_depfile(
            Path::new("o/main.o"),
            Path::new("main.c"),
            &depfile,
            &lines,
        );
        let content = std::fs::read_to_string(&depfile).unwrap();
        assert!(content.starts_with("o/main.o: main.c"));
        assert!(content.contains("C:\\src\\util.h"));
        assert!(content.contains("C:\\src\\deep.h"));
        // the plain diagnostic line is not recorded as a dependency
        assert_eq!(content.lines().count(), 3);
    }
}
