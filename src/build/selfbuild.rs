//! Self-rebuild protocol for the build driver
//!
//! The driver hands over the list of its own source files at startup. When
//! any of them is newer than the running executable, the executable is
//! renamed aside, rebuilt, and the process image is replaced with the fresh
//! binary carrying the original arguments.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::system::{self, run_shell, Error, PathExt};

/// Rebuild and re-exec the driver if any of `sources` is newer than the
/// running executable. Uses the platform-default rebuild command
/// (`cc -o '<exe>' build.c -I. -Iinclude`, or the MSVC analogue).
///
/// Returns normally when the driver is up to date. Exits the process with
/// code 1 when the rebuild fails; never returns after a successful rebuild.
pub fn self_rebuild_if_needed<S>(sources: &[S])
where
    S: AsRef<Path>,
{
    self_rebuild_with_command(sources, None)
}

/// Like [`self_rebuild_if_needed`], with a custom shell rebuild command
pub fn self_rebuild_with_command<S>(sources: &[S], rebuild_command: Option<&str>)
where
    S: AsRef<Path>,
{
    let args: Vec<String> = std::env::args().collect();
    let exe = driver_exe_path(&args);
    let old = PathBuf::from(format!("{}.old", exe.display()));
    // a lingering .old means the previous run rebuilt itself
    let _ = std::fs::remove_file(&old);

    if !sources_newer_than(&exe, sources) {
        return;
    }
    system::infoln!("Rebuilding", "build driver sources changed");
    if let Err(e) = system::rename_file(&exe, &old) {
        e.print();
        std::process::exit(1);
    }
    let command = match rebuild_command {
        Some(command) => command.to_string(),
        None => default_rebuild_command(&exe),
    };
    match run_shell(&command, false) {
        Ok(output) if output.code == 0 => exec_replace(&exe, &args),
        _ => {
            Error::SelfRebuild(command).print();
            std::process::exit(1);
        }
    }
}

/// The running executable: `current_exe` reads `/proc/self/exe` on Linux
/// and `GetModuleFileNameA` on Windows; argv[0] is the fallback
fn driver_exe_path(args: &[String]) -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        return exe;
    }
    let fallback = PathBuf::from(args.first().map(String::as_str).unwrap_or_default());
    fallback.canonicalize2().unwrap_or(fallback)
}

/// True when the executable is missing or older than any existing source
fn sources_newer_than<S>(exe: &Path, sources: &[S]) -> bool
where
    S: AsRef<Path>,
{
    let Ok(exe_mtime) = system::modified_time(exe) else {
        return true;
    };
    sources.iter().any(|source| {
        matches!(system::modified_time(source.as_ref()), Ok(t) if t > exe_mtime)
    })
}

fn default_rebuild_command(exe: &Path) -> String {
    if cfg!(windows) {
        format!("cl /nologo /Fe:{} build.c /I. /Iinclude", exe.display())
    } else {
        format!("cc -o '{}' build.c -I. -Iinclude", exe.display())
    }
}

#[cfg(unix)]
fn exec_replace(exe: &Path, args: &[String]) -> ! {
    use std::os::unix::process::CommandExt;
    let error = Command::new(exe).args(&args[1..]).exec();
    Error::SpawnChild(exe.display().to_string(), error).print();
    std::process::exit(1);
}

#[cfg(not(unix))]
fn exec_replace(exe: &Path, args: &[String]) -> ! {
    let status = Command::new(exe).args(&args[1..]).status();
    match status {
        Ok(status) => std::process::exit(status.code().unwrap_or(1)),
        Err(error) => {
            Error::SpawnChild(exe.display().to_string(), error).print();
            std::process::exit(1);
        }
    }
}
