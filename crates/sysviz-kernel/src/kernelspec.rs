//! Jupyter kernelspec discovery.
//!
//! A kernelspec is a directory `kernels/<name>/` holding a `kernel.json`
//! that describes how to launch the kernel. This module scans the standard
//! Jupyter data paths plus the usual conda installation trees, so a kernel
//! installed with `conda install -c conda-forge jupyter-sysml-kernel` is
//! found even when the conda environment is not activated.

use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};

use directories::BaseDirs;
use log::debug;
use serde::Deserialize;

use crate::error::KernelError;

/// Contents of a `kernel.json` file.
#[derive(Debug, Clone, Deserialize)]
pub struct KernelSpec {
    /// Command line used to launch the kernel. The placeholder
    /// `{connection_file}` is substituted at launch time.
    pub argv: Vec<String>,

    /// Human-readable kernel name.
    #[serde(default)]
    pub display_name: String,

    /// Language the kernel executes.
    #[serde(default)]
    pub language: String,

    /// Extra environment variables for the kernel process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// A kernelspec together with where it was found.
#[derive(Debug, Clone)]
pub struct ResolvedKernelSpec {
    /// Kernel name, i.e. the kernelspec directory name.
    pub name: String,

    /// Directory containing `kernel.json`.
    pub resource_dir: PathBuf,

    /// Parsed spec.
    pub spec: KernelSpec,
}

impl ResolvedKernelSpec {
    /// The launch command with `{connection_file}` and `{resource_dir}`
    /// placeholders substituted.
    pub fn launch_argv(&self, connection_file: &Path) -> Vec<String> {
        let connection = connection_file.to_string_lossy();
        let resources = self.resource_dir.to_string_lossy();
        self.spec
            .argv
            .iter()
            .map(|arg| {
                arg.replace("{connection_file}", &connection)
                    .replace("{resource_dir}", &resources)
            })
            .collect()
    }
}

/// Jupyter data directories searched for kernelspecs, in priority order.
///
/// `JUPYTER_PATH` entries come first, then the per-user data directory,
/// then system-wide locations, then conda installation trees.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(jupyter_path) = env::var_os("JUPYTER_PATH") {
        paths.extend(env::split_paths(&jupyter_path));
    }

    if let Some(base) = BaseDirs::new() {
        paths.push(base.data_dir().join("jupyter"));
        paths.push(base.home_dir().join(".jupyter"));
    }

    paths.push(PathBuf::from("/usr/local/share/jupyter"));
    paths.push(PathBuf::from("/usr/share/jupyter"));

    paths.extend(conda_data_dirs());
    paths.retain(|path| path.is_dir());
    paths
}

/// `share/jupyter` directories under common conda installation roots.
fn conda_data_dirs() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Some(base) = BaseDirs::new() {
        let home = base.home_dir();
        for name in [
            "miniconda",
            "miniconda3",
            "anaconda",
            "anaconda3",
            "miniforge",
            "miniforge3",
            "mambaforge",
        ] {
            roots.push(home.join(name));
        }
    }

    for root in ["/opt/conda", "/opt/miniconda3", "/opt/miniforge3", "/usr/local/conda"] {
        roots.push(PathBuf::from(root));
    }

    if let Some(prefix) = env::var_os("CONDA_PREFIX") {
        roots.push(PathBuf::from(prefix));
    }

    roots
        .into_iter()
        .map(|root| root.join("share").join("jupyter"))
        .collect()
}

/// Returns a conda root directory if one is present on this machine.
///
/// Only used for diagnostics output; discovery itself goes through
/// [`search_paths`].
pub fn conda_root() -> Option<PathBuf> {
    conda_data_dirs()
        .into_iter()
        .filter_map(|share| Some(share.parent()?.parent()?.to_path_buf()))
        .find(|root| root.is_dir())
}

/// Find the kernelspec for `name` in the standard search paths.
///
/// # Errors
///
/// Returns [`KernelError::Unavailable`] listing the searched directories
/// when no matching kernelspec exists.
pub fn find(name: &str) -> Result<ResolvedKernelSpec, KernelError> {
    find_in(name, &search_paths())
}

/// Find the kernelspec for `name` under the given Jupyter data directories.
///
/// Each directory is expected to contain `kernels/<name>/kernel.json`.
/// Earlier directories shadow later ones, matching Jupyter's own behavior.
///
/// # Errors
///
/// Returns [`KernelError::Unavailable`] when no matching kernelspec exists
/// or its `kernel.json` cannot be parsed.
pub fn find_in(name: &str, paths: &[PathBuf]) -> Result<ResolvedKernelSpec, KernelError> {
    for data_dir in paths {
        let resource_dir = data_dir.join("kernels").join(name);
        let spec_file = resource_dir.join("kernel.json");
        if !spec_file.is_file() {
            continue;
        }

        debug!(path = spec_file.display().to_string(); "Found kernelspec");
        let content = fs::read_to_string(&spec_file)?;
        let spec: KernelSpec = serde_json::from_str(&content).map_err(|err| {
            KernelError::Unavailable(format!(
                "kernelspec {} is malformed: {err}",
                spec_file.display()
            ))
        })?;

        if spec.argv.is_empty() {
            return Err(KernelError::Unavailable(format!(
                "kernelspec {} has an empty argv",
                spec_file.display()
            )));
        }

        return Ok(ResolvedKernelSpec {
            name: name.to_string(),
            resource_dir,
            spec,
        });
    }

    let searched: Vec<String> = paths
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    Err(KernelError::Unavailable(format!(
        "no `{name}` kernelspec found (searched: {})",
        if searched.is_empty() {
            "no Jupyter data directories exist".to_string()
        } else {
            searched.join(", ")
        }
    )))
}

/// List every kernelspec under the given Jupyter data directories.
///
/// Malformed specs are skipped; this is a diagnostic aid, not a validator.
pub fn list_in(paths: &[PathBuf]) -> Vec<ResolvedKernelSpec> {
    let mut found = Vec::new();
    for data_dir in paths {
        let kernels = data_dir.join("kernels");
        let Ok(entries) = fs::read_dir(&kernels) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if found
                .iter()
                .any(|spec: &ResolvedKernelSpec| spec.name == name)
            {
                continue;
            }
            if let Ok(spec) = find_in(&name, std::slice::from_ref(data_dir)) {
                found.push(spec);
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_spec(data_dir: &Path, name: &str, json: &str) {
        let dir = data_dir.join("kernels").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("kernel.json"), json).unwrap();
    }

    #[test]
    fn finds_spec_in_explicit_path() {
        let tmp = tempfile::tempdir().unwrap();
        write_spec(
            tmp.path(),
            "sysml",
            r#"{"argv": ["java", "-jar", "kernel.jar", "{connection_file}"],
                "display_name": "SysML", "language": "sysml"}"#,
        );

        let resolved = find_in("sysml", &[tmp.path().to_path_buf()]).unwrap();
        assert_eq!(resolved.name, "sysml");
        assert_eq!(resolved.spec.language, "sysml");
        assert_eq!(resolved.spec.argv.len(), 4);
    }

    #[test]
    fn earlier_path_shadows_later() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_spec(
            first.path(),
            "sysml",
            r#"{"argv": ["first", "{connection_file}"]}"#,
        );
        write_spec(
            second.path(),
            "sysml",
            r#"{"argv": ["second", "{connection_file}"]}"#,
        );

        let paths = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let resolved = find_in("sysml", &paths).unwrap();
        assert_eq!(resolved.spec.argv[0], "first");
    }

    #[test]
    fn missing_spec_reports_searched_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let err = find_in("sysml", &[tmp.path().to_path_buf()]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("no `sysml` kernelspec found"));
        assert!(message.contains(&tmp.path().display().to_string()));
    }

    #[test]
    fn empty_argv_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write_spec(tmp.path(), "sysml", r#"{"argv": []}"#);
        let err = find_in("sysml", &[tmp.path().to_path_buf()]).unwrap_err();
        assert!(err.to_string().contains("empty argv"));
    }

    #[test]
    fn launch_argv_substitutes_placeholders() {
        let tmp = tempfile::tempdir().unwrap();
        write_spec(
            tmp.path(),
            "sysml",
            r#"{"argv": ["java", "-f", "{connection_file}", "--res", "{resource_dir}"]}"#,
        );

        let resolved = find_in("sysml", &[tmp.path().to_path_buf()]).unwrap();
        let argv = resolved.launch_argv(Path::new("/tmp/conn.json"));
        assert_eq!(argv[2], "/tmp/conn.json");
        assert_eq!(argv[4], resolved.resource_dir.display().to_string());
    }

    #[test]
    fn list_in_collects_all_specs() {
        let tmp = tempfile::tempdir().unwrap();
        write_spec(tmp.path(), "sysml", r#"{"argv": ["a"]}"#);
        write_spec(tmp.path(), "python3", r#"{"argv": ["b"]}"#);

        let specs = list_in(&[tmp.path().to_path_buf()]);
        let mut names: Vec<&str> = specs.iter().map(|spec| spec.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["python3", "sysml"]);
    }
}
