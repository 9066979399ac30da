//! Standalone rendering without the kernel.
//!
//! When the SysML kernel cannot be used, a reduced pipeline is available:
//! a lightweight scan of the model source recovers packages, part
//! definitions, and part usages, a PlantUML document is generated in the
//! kernel's visual idiom, and the installed `plantuml` executable turns it
//! into SVG over a stdin/stdout pipe. Only structural diagrams come out of
//! this path; behavioral views need the real kernel.

use std::{
    io::Write,
    process::{Command, Stdio},
};

use log::{debug, info};
use regex::Regex;

use crate::{config::FallbackConfig, error::VizError};

/// A scanned SysML package.
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub part_defs: Vec<PartDef>,
}

/// A `part def` block with its attributes and nested part usages.
#[derive(Debug, Clone)]
pub struct PartDef {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub parts: Vec<PartUsage>,
}

/// A `part <name> : <Type>[mult]` usage.
#[derive(Debug, Clone)]
pub struct PartUsage {
    pub name: String,
    pub ty: String,
    pub multiplicity: Option<String>,
}

impl PartUsage {
    fn label(&self) -> String {
        match &self.multiplicity {
            Some(mult) => format!("{}: {}[{}]", self.name, self.ty, mult),
            None => format!("{}: {}", self.name, self.ty),
        }
    }
}

/// Scan SysML source for package structure.
///
/// This is deliberately shallow: enough structure for a fallback diagram,
/// not a SysML parser. Nested packages and imports are ignored.
pub fn scan_model(source: &str) -> Vec<Package> {
    let package_re = Regex::new(r"package\s+(\w+)\s*\{").unwrap();
    let mut packages = Vec::new();

    for captures in package_re.captures_iter(source) {
        let header = captures.get(0).unwrap();
        let Some(body) = balanced_block(source, header.end() - 1) else {
            continue;
        };
        packages.push(Package {
            name: captures[1].to_string(),
            part_defs: scan_part_defs(body),
        });
    }

    debug!(packages = packages.len(); "Model scan complete");
    packages
}

fn scan_part_defs(body: &str) -> Vec<PartDef> {
    let def_re = Regex::new(r"part\s+def\s+(\w+)\s*([{;])").unwrap();
    let attr_re = Regex::new(r"attribute\s+(\w+)\s*:\s*(\w+)\s*;").unwrap();
    let part_re = Regex::new(r"part\s+(\w+)\s*:\s*(\w+)(?:\s*\[([^\]]+)\])?\s*[;{]").unwrap();

    let mut defs = Vec::new();
    for captures in def_re.captures_iter(body) {
        let name = captures[1].to_string();
        let content = if &captures[2] == "{" {
            balanced_block(body, captures.get(0).unwrap().end() - 1).unwrap_or("")
        } else {
            ""
        };

        defs.push(PartDef {
            name,
            attributes: attr_re
                .captures_iter(content)
                .map(|c| (c[1].to_string(), c[2].to_string()))
                .collect(),
            parts: part_re
                .captures_iter(content)
                .map(|c| PartUsage {
                    name: c[1].to_string(),
                    ty: c[2].to_string(),
                    multiplicity: c.get(3).map(|m| m.as_str().to_string()),
                })
                .collect(),
        });
    }
    defs
}

/// The text between the brace at `open` and its matching close brace.
fn balanced_block(source: &str, open: usize) -> Option<&str> {
    let bytes = source.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    for (offset, byte) in bytes[open..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&source[open + 1..open + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Generate a PlantUML document for the scanned packages.
///
/// The output mirrors the component style the kernel's own renderer
/// produces, with deterministic `E<n>` identifiers so repeated runs of the
/// same model generate identical documents.
///
/// # Errors
///
/// Returns [`VizError::InvalidRequest`] when the source declares no
/// packages; there is nothing to draw.
pub fn plantuml_source(source: &str) -> Result<String, VizError> {
    let packages = scan_model(source);
    if packages.is_empty() {
        return Err(VizError::InvalidRequest(
            "model contains no package declarations".into(),
        ));
    }

    let mut lines = vec![
        "@startuml".to_string(),
        "skinparam monochrome true".to_string(),
        "skinparam wrapWidth 300".to_string(),
        "hide circle".to_string(),
        String::new(),
    ];
    let mut next_id = 1usize;
    let fresh = |next_id: &mut usize| {
        let id = format!("E{next_id}");
        *next_id += 1;
        id
    };
    // (part def name, id) pairs for resolving typing edges afterwards.
    let mut def_ids: Vec<(String, String)> = Vec::new();
    let mut compositions: Vec<(String, String)> = Vec::new();
    let mut typings: Vec<(String, String)> = Vec::new();

    for package in &packages {
        let package_id = fresh(&mut next_id);
        lines.push(format!("package \"{}\" as {package_id} {{", package.name));

        for def in &package.part_defs {
            let def_id = fresh(&mut next_id);
            lines.push(format!(
                "component \"{}\" as {def_id} <<(T,blue) part  def>> {{",
                def.name
            ));
            lines.push("}".to_string());
            def_ids.push((def.name.clone(), def_id.clone()));

            for part in &def.parts {
                let part_id = fresh(&mut next_id);
                lines.push(format!(
                    "component \"{}\" as {part_id} <<(T,blue) part>> {{",
                    part.label()
                ));
                lines.push("}".to_string());
                compositions.push((def_id.clone(), part_id.clone()));
                typings.push((part_id, part.ty.clone()));
            }
        }

        lines.push("}".to_string());
        lines.push(String::new());
    }

    for (def_id, part_id) in compositions {
        lines.push(format!("{def_id} *-- {part_id}"));
    }
    // Typing edges are resolved last so forward references to part defs
    // declared later in the source still connect.
    for (part_id, ty) in typings {
        if let Some((_, def_id)) = def_ids.iter().find(|(name, _)| *name == ty) {
            lines.push(format!("{part_id} --|> {def_id}"));
        }
    }

    lines.push("@enduml".to_string());
    Ok(lines.join("\n"))
}

/// Render a model to SVG through the local PlantUML installation.
///
/// # Errors
///
/// - [`VizError::KernelUnavailable`] when `plantuml` is not installed.
/// - [`VizError::KernelCommunication`] when PlantUML exits with an error.
/// - [`VizError::EmptyOutput`] when PlantUML produces no bytes.
pub fn render_standalone(source: &str, config: &FallbackConfig) -> Result<Vec<u8>, VizError> {
    let document = plantuml_source(source)?;
    let command = config.plantuml_command();

    which::which(command).map_err(|_| {
        VizError::KernelUnavailable(format!(
            "`{command}` is not installed; the standalone fallback needs PlantUML \
             (and GraphViz `dot`) on the PATH"
        ))
    })?;

    info!(command = command; "Rendering via PlantUML fallback");
    let mut child = Command::new(command)
        .arg("-tsvg")
        .arg("-pipe")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| {
            VizError::KernelUnavailable(format!("failed to spawn `{command}`: {err}"))
        })?;

    // A write failure (PlantUML died before reading its input) must still
    // reap the child; the exit status and stderr say more than the EPIPE.
    let mut write_error = None;
    if let Some(mut stdin) = child.stdin.take() {
        if let Err(err) = stdin.write_all(document.as_bytes()) {
            write_error = Some(err);
        }
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VizError::KernelCommunication(format!(
            "plantuml failed ({}): {}",
            output.status,
            stderr.trim()
        )));
    }
    if let Some(err) = write_error {
        return Err(VizError::KernelCommunication(format!(
            "plantuml stopped reading its input: {err}"
        )));
    }
    if output.stdout.is_empty() {
        return Err(VizError::EmptyOutput);
    }
    Ok(output.stdout)
}
