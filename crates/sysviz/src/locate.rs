//! Model auto-discovery.
//!
//! When the CLI is not handed explicit inputs it scans a directory tree
//! for `.sysml` files, combines them into one source body, and picks the
//! first declared package as the default visualization target.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use regex::Regex;
use walkdir::WalkDir;

/// Recursively collect every `.sysml` file under `root`, sorted.
///
/// An empty result is not an error here; the caller decides whether zero
/// models is acceptable.
pub fn find_models(root: &Path) -> Vec<PathBuf> {
    let mut models: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = err.to_string(); "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("sysml"))
        })
        .map(|entry| entry.into_path())
        .collect();

    models.sort();
    debug!(root = root.display().to_string(), count = models.len(); "Model discovery complete");
    models
}

/// Concatenate model files into a single source body.
///
/// Each file is preceded by a comment banner naming its origin, so kernel
/// error messages can be traced back to a file.
pub fn combine_sources(paths: &[PathBuf]) -> io::Result<String> {
    let mut combined = String::new();
    for path in paths {
        let content = fs::read_to_string(path)?;
        combined.push_str(&format!("// From file: {}\n", path.display()));
        combined.push_str(&content);
        combined.push('\n');
    }
    Ok(combined)
}

/// The first `package <Name>` declaration in `source`, used as the default
/// `%viz` target when no element path is given.
pub fn primary_package(source: &str) -> Option<String> {
    let pattern = Regex::new(r"(?m)^\s*package\s+(\w+)").unwrap();
    pattern
        .captures(source)
        .map(|captures| captures[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn finds_models_across_nesting_depths() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("top.sysml"), "package Top {}");
        touch(&tmp.path().join("a/mid.sysml"), "package Mid {}");
        touch(&tmp.path().join("a/b/c/deep.sysml"), "package Deep {}");
        touch(&tmp.path().join("a/readme.md"), "not a model");
        touch(&tmp.path().join("notes.txt"), "not a model");

        let models = find_models(tmp.path());
        assert_eq!(models.len(), 3);
        assert!(models.iter().all(|p| p.extension().unwrap() == "sysml"));
    }

    #[test]
    fn discovery_is_sorted_and_repeatable() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("z.sysml"), "");
        touch(&tmp.path().join("a.sysml"), "");

        let first = find_models(tmp.path());
        let second = find_models(tmp.path());
        assert_eq!(first, second);
        assert!(first[0].ends_with("a.sysml"));
    }

    #[test]
    fn empty_tree_yields_empty_set() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(find_models(tmp.path()).is_empty());
    }

    #[test]
    fn combine_banners_each_file() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.sysml");
        let b = tmp.path().join("b.sysml");
        touch(&a, "package A {}");
        touch(&b, "package B {}");

        let combined = combine_sources(&[a.clone(), b.clone()]).unwrap();
        assert!(combined.contains(&format!("// From file: {}", a.display())));
        assert!(combined.contains("package A {}"));
        assert!(combined.contains("package B {}"));
    }

    #[test]
    fn primary_package_takes_first_declaration() {
        let source = "// header\npackage VehicleExample {\n  part def Vehicle;\n}\npackage Other {}\n";
        assert_eq!(primary_package(source).as_deref(), Some("VehicleExample"));
    }

    #[test]
    fn primary_package_absent_when_no_declaration() {
        assert_eq!(primary_package("part def Loose;"), None);
    }
}
