//! End-to-end build scenarios driving the system C toolchain
#![cfg(unix)]

use std::path::{Path, PathBuf};

use filetime::FileTime;
use tempfile::TempDir;

use anvil::Project;

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn set_mtime(path: &Path, seconds: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(seconds, 0)).unwrap();
}

fn mtime(path: &Path) -> FileTime {
    FileTime::from_last_modification_time(&path.metadata().unwrap())
}

/// A scratch project: `main.c` calling `add` from a static `math` library
struct Scratch {
    tmp: TempDir,
}

impl Scratch {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(
            &root.join("main.c"),
            "#include \"m.h\"\nint main(void) { return add(2, 2) - 4; }\n",
        );
        write(&root.join("lib/m.h"), "int add(int a, int b);\n");
        write(
            &root.join("lib/m.c"),
            "int add(int a, int b) { return a + b; }\n",
        );
        Self { tmp }
    }

    fn root(&self) -> &Path {
        self.tmp.path()
    }

    fn build_dir(&self) -> PathBuf {
        self.root().join("build")
    }

    /// Fresh driver invocation: registries are rebuilt the way a driver
    /// process would rebuild them on every run
    fn project(&self) -> Project {
        let root = self.root();
        let mut project = Project::new();
        project.set_output_dir(self.build_dir());
        let math = project.static_library("math");
        project.add_source(math, root.join("lib/m.c").display().to_string());
        let main = project.executable("main");
        project.add_source(main, root.join("main.c").display().to_string());
        project.add_include_dir(main, root.join("lib").display().to_string());
        project.link_target(main, math);
        project
    }

    fn main_obj(&self) -> PathBuf {
        self.build_dir().join("obj_main/main.o")
    }

    fn math_obj(&self) -> PathBuf {
        self.build_dir().join("obj_math/m.o")
    }

    fn math_lib(&self) -> PathBuf {
        self.build_dir().join("libmath.a")
    }

    fn main_exe(&self) -> PathBuf {
        self.build_dir().join("main")
    }

    /// Pin every input and artifact to known timestamps so rebuild
    /// decisions are observable regardless of filesystem resolution
    fn settle_mtimes(&self) {
        set_mtime(&self.root().join("main.c"), 1_000);
        set_mtime(&self.root().join("lib/m.c"), 1_000);
        set_mtime(&self.root().join("lib/m.h"), 1_000);
        set_mtime(&self.main_obj(), 2_000);
        set_mtime(&self.math_obj(), 2_000);
        set_mtime(&self.math_lib(), 3_000);
        set_mtime(&self.main_exe(), 3_000);
    }
}

#[test]
fn build_then_noop_then_incremental_rebuild() {
    let scratch = Scratch::new();

    // first run compiles both sources, archives, links
    assert_eq!(scratch.project().run(["driver"]), 0);
    assert!(scratch.main_exe().exists());
    assert!(scratch.math_lib().exists());
    assert!(scratch.main_obj().exists());
    assert!(scratch.math_obj().exists());
    let status = std::process::Command::new(scratch.main_exe()).status().unwrap();
    assert!(status.success());

    // a run with no changes touches nothing
    scratch.settle_mtimes();
    assert_eq!(scratch.project().run(["driver"]), 0);
    assert_eq!(mtime(&scratch.main_obj()), FileTime::from_unix_time(2_000, 0));
    assert_eq!(mtime(&scratch.math_obj()), FileTime::from_unix_time(2_000, 0));
    assert_eq!(mtime(&scratch.math_lib()), FileTime::from_unix_time(3_000, 0));
    assert_eq!(mtime(&scratch.main_exe()), FileTime::from_unix_time(3_000, 0));

    // touching one library source recompiles it, rearchives and relinks,
    // but does not recompile the other source
    set_mtime(&scratch.root().join("lib/m.c"), 4_000);
    assert_eq!(scratch.project().run(["driver"]), 0);
    assert_eq!(mtime(&scratch.main_obj()), FileTime::from_unix_time(2_000, 0));
    assert_ne!(mtime(&scratch.math_obj()), FileTime::from_unix_time(2_000, 0));
    assert_ne!(mtime(&scratch.math_lib()), FileTime::from_unix_time(3_000, 0));
    assert_ne!(mtime(&scratch.main_exe()), FileTime::from_unix_time(3_000, 0));
}

#[test]
fn clean_removes_outputs_and_full_rebuild_follows() {
    let scratch = Scratch::new();
    assert_eq!(scratch.project().run(["driver"]), 0);
    assert!(scratch.build_dir().exists());

    assert_eq!(scratch.project().run(["driver", "clean"]), 0);
    assert!(!scratch.build_dir().exists());

    assert_eq!(scratch.project().run(["driver"]), 0);
    assert!(scratch.main_exe().exists());
    assert!(scratch.math_lib().exists());
}

#[test]
fn dependency_cycle_fails_without_building() {
    let tmp = tempfile::tempdir().unwrap();
    let mut project = Project::new();
    project.set_output_dir(tmp.path().join("build"));
    let a = project.static_library("a");
    let b = project.static_library("b");
    project.link_target(a, b);
    project.link_target(b, a);
    assert_eq!(project.run(["driver"]), 1);
    assert!(!tmp.path().join("build").exists());
}

#[test]
fn compile_commands_are_emitted_after_a_successful_build() {
    let scratch = Scratch::new();
    let mut project = scratch.project();
    project.enable_compile_commands(true);
    assert_eq!(project.run(["driver"]), 0);

    let path = scratch.build_dir().join("compile_commands.json");
    let content = std::fs::read_to_string(&path).unwrap();
    let entries: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
    assert_eq!(entries.len(), 2);
    for entry in &entries {
        assert!(entry["directory"].is_string());
        assert!(entry["command"].as_str().unwrap().contains("-c"));
        assert!(entry["file"].as_str().unwrap().ends_with(".c"));
    }
    let files: Vec<_> = entries
        .iter()
        .map(|e| e["file"].as_str().unwrap().to_string())
        .collect();
    assert!(files.iter().any(|f| f.ends_with("m.c")));
    assert!(files.iter().any(|f| f.ends_with("main.c")));
}

#[test]
fn subcommands_build_their_target_then_run() {
    let scratch = Scratch::new();
    let log = scratch.root().join("ran.log");
    let mut project = Project::new();
    project.set_output_dir(scratch.build_dir());
    let math = project.static_library("math");
    project.add_source(math, scratch.root().join("lib/m.c").display().to_string());
    let main = project.executable("main");
    project.add_source(main, scratch.root().join("main.c").display().to_string());
    project.add_include_dir(main, scratch.root().join("lib").display().to_string());
    project.link_target(main, math);
    project.register_subcommand("stamp", main, &format!("echo done >> '{}'", log.display()));

    assert_eq!(project.run(["driver", "stamp"]), 0);
    assert!(scratch.main_exe().exists());
    let content = std::fs::read_to_string(&log).unwrap();
    assert_eq!(content.trim(), "done");
}

#[test]
fn subcommand_callbacks_are_invoked() {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let scratch = Scratch::new();
    let ran = Arc::new(AtomicBool::new(false));
    let mut project = Project::new();
    project.set_output_dir(scratch.build_dir());
    let math = project.static_library("math");
    project.add_source(math, scratch.root().join("lib/m.c").display().to_string());
    let seen = Arc::clone(&ran);
    project.register_subcommand_callback("mark", math, move || {
        seen.store(true, Ordering::Relaxed);
    });

    assert_eq!(project.run(["driver", "mark"]), 0);
    assert!(scratch.math_lib().exists());
    assert!(ran.load(Ordering::Relaxed));
}
