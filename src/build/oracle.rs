//! Mtime-based rebuild decisions
//!
//! Header dependencies are not consulted: a source triggers recompilation
//! only through its own mtime. MSVC-family depfiles are written by the
//! compile phase but never read back here.

use std::path::{Path, PathBuf};

use crate::system;

/// A source needs recompiling when its object is missing or older
pub(crate) fn needs_recompile(source: &Path, object: &Path) -> bool {
    if !object.exists() {
        return true;
    }
    let (Ok(src), Ok(obj)) = (system::modified_time(source), system::modified_time(object))
    else {
        return true;
    };
    src > obj
}

/// A target needs relinking when its output is missing, any object is
/// missing or newer, or any dependency output is newer
pub(crate) fn needs_relink(output: &Path, objects: &[PathBuf], dep_outputs: &[&Path]) -> bool {
    let Ok(out) = system::modified_time(output) else {
        return true;
    };
    for object in objects {
        match system::modified_time(object) {
            Ok(t) if t <= out => {}
            _ => return true,
        }
    }
    for dep in dep_outputs {
        if let Ok(t) = system::modified_time(dep) {
            if t > out {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use std::fs;

    fn touch(path: &Path, seconds: i64) {
        fs::write(path, "").unwrap();
        system::set_modified_time(path, FileTime::from_unix_time(seconds, 0)).unwrap();
    }

    #[test]
    fn missing_object_recompiles() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("a.c");
        touch(&src, 1_000);
        assert!(needs_recompile(&src, &tmp.path().join("a.o")));
    }

    #[test]
    fn newer_source_recompiles() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("a.c");
        let obj = tmp.path().join("a.o");
        touch(&src, 2_000);
        touch(&obj, 1_000);
        assert!(needs_recompile(&src, &obj));
    }

    #[test]
    fn up_to_date_object_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("a.c");
        let obj = tmp.path().join("a.o");
        touch(&src, 1_000);
        touch(&obj, 2_000);
        assert!(!needs_recompile(&src, &obj));
    }

    #[test]
    fn missing_output_relinks() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(needs_relink(&tmp.path().join("app"), &[], &[]));
    }

    #[test]
    fn newer_object_relinks() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("app");
        let obj = tmp.path().join("a.o");
        touch(&out, 1_000);
        touch(&obj, 2_000);
        assert!(needs_relink(&out, &[obj], &[]));
    }

    #[test]
    fn newer_dependency_output_relinks() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("app");
        let dep = tmp.path().join("libmath.a");
        touch(&out, 1_000);
        touch(&dep, 2_000);
        assert!(needs_relink(&out, &[], &[dep.as_path()]));
    }

    #[test]
    fn settled_target_does_not_relink() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("app");
        let obj = tmp.path().join("a.o");
        let dep = tmp.path().join("libmath.a");
        touch(&obj, 1_000);
        touch(&dep, 1_500);
        touch(&out, 2_000);
        assert!(!needs_relink(&out, &[obj], &[dep.as_path()]));
        // a missing dependency output is not a reason to relink
        assert!(!needs_relink(&out, &[], &[tmp.path().join("nope.a").as_path()]));
    }
}
