//! Dependency diagnostics.
//!
//! The visualizer leans on external software it does not control: the
//! SysML kernelspec, the ZMQ transport it is launched over, and the
//! PlantUML/GraphViz pair used by the standalone fallback. This module
//! probes for all of them and renders the findings for `--check-deps` and
//! `--diagnose`.

use std::{fmt::Write as _, path::PathBuf};

use sysviz_kernel::kernelspec::{self, ResolvedKernelSpec};

/// Results of probing the external toolchain.
#[derive(Debug)]
pub struct DependencyReport {
    /// Kernel name that was probed for.
    pub kernel_name: String,
    /// The resolved kernelspec, when one was found.
    pub kernel_spec: Option<ResolvedKernelSpec>,
    /// Jupyter data directories that were searched.
    pub search_paths: Vec<PathBuf>,
    /// Every kernelspec visible in the search paths.
    pub installed_kernels: Vec<ResolvedKernelSpec>,
    /// `jupyter` executable on PATH, informational only.
    pub jupyter: Option<PathBuf>,
    /// A conda installation root, if one was detected.
    pub conda_root: Option<PathBuf>,
    /// GraphViz `dot` on PATH.
    pub graphviz: Option<PathBuf>,
    /// `plantuml` on PATH.
    pub plantuml: Option<PathBuf>,
}

impl DependencyReport {
    /// Probe the standard search paths for `kernel_name` and the PATH for
    /// the auxiliary tools.
    pub fn collect(kernel_name: &str) -> Self {
        let search_paths = kernelspec::search_paths();
        Self::collect_in(kernel_name, search_paths)
    }

    /// Probe explicit Jupyter data directories. Split out so tests can run
    /// hermetically against a temp directory.
    pub fn collect_in(kernel_name: &str, search_paths: Vec<PathBuf>) -> Self {
        let kernel_spec = kernelspec::find_in(kernel_name, &search_paths).ok();
        let installed_kernels = kernelspec::list_in(&search_paths);
        Self {
            kernel_name: kernel_name.to_string(),
            kernel_spec,
            search_paths,
            installed_kernels,
            jupyter: which::which("jupyter").ok(),
            conda_root: kernelspec::conda_root(),
            graphviz: which::which("dot").ok(),
            plantuml: which::which("plantuml").ok(),
        }
    }

    /// True when the authentic kernel path can run.
    pub fn kernel_available(&self) -> bool {
        self.kernel_spec.is_some()
    }

    /// True when the standalone PlantUML path can run.
    pub fn fallback_available(&self) -> bool {
        self.plantuml.is_some()
    }

    /// True when at least one visualization method can run.
    pub fn any_method_available(&self) -> bool {
        self.kernel_available() || self.fallback_available()
    }

    /// Short status summary for `--check-deps`.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let mark = |present: bool| if present { "ok " } else { "MISSING" };

        let _ = writeln!(out, "Dependency status:");
        let _ = writeln!(
            out,
            "  [{}] {} kernelspec",
            mark(self.kernel_available()),
            self.kernel_name
        );
        if let Some(spec) = &self.kernel_spec {
            let _ = writeln!(out, "        found at {}", spec.resource_dir.display());
        }
        let _ = writeln!(out, "  [{}] jupyter on PATH", mark(self.jupyter.is_some()));
        let _ = writeln!(out, "  [{}] conda installation", mark(self.conda_root.is_some()));
        let _ = writeln!(out, "  [{}] graphviz (dot)", mark(self.graphviz.is_some()));
        let _ = writeln!(out, "  [{}] plantuml", mark(self.plantuml.is_some()));
        let _ = writeln!(out);

        if self.any_method_available() {
            let mut methods = Vec::new();
            if self.kernel_available() {
                methods.push("kernel");
            }
            if self.fallback_available() {
                methods.push("standalone");
            }
            let _ = writeln!(out, "Available methods: {}", methods.join(", "));
        } else {
            let _ = writeln!(out, "No visualization method is available.");
            let _ = writeln!(out, "{}", install_guidance());
        }
        out
    }

    /// Verbose listing for `--diagnose`.
    pub fn diagnose(&self) -> String {
        let mut out = self.summary();
        let _ = writeln!(out, "\nJupyter data directories searched:");
        if self.search_paths.is_empty() {
            let _ = writeln!(out, "  (none exist on this machine)");
        }
        for path in &self.search_paths {
            let _ = writeln!(out, "  {}", path.display());
        }

        let _ = writeln!(out, "\nInstalled kernels:");
        if self.installed_kernels.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for spec in &self.installed_kernels {
            let _ = writeln!(
                out,
                "  {:<12} {}",
                spec.name,
                spec.resource_dir.display()
            );
        }

        if let Some(spec) = &self.kernel_spec {
            let _ = writeln!(out, "\nKernel launch command:");
            let _ = writeln!(out, "  {}", spec.spec.argv.join(" "));
        }
        out
    }
}

/// Installation guidance shown when the kernel is missing.
pub fn install_guidance() -> String {
    [
        "To install the SysML v2 kernel:",
        "  conda install -c conda-forge jupyter-sysml-kernel",
        "For the standalone fallback instead:",
        "  install `plantuml` and GraphViz `dot` and put them on the PATH",
    ]
    .join("\n")
}
