use std::{
    io::{self, Write},
    path::Path,
};

use colored::Colorize;
use log::{debug, trace};

use depslist_core::{SpecKind, Specifier};

use crate::types::DepsList;

/// Shows `path` relative to `cwd` when it lies inside it.
fn display_path(path: &Path, cwd: &Path) -> String {
    match path.strip_prefix(cwd) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().to_string(),
        _ => {
            trace!("Keeping absolute path for {}", path.display());
            path.to_string_lossy().to_string()
        }
    }
}

pub fn print_deps_list<W: Write>(writer: &mut W, result: &DepsList, cwd: &Path) -> io::Result<()> {
    debug!("Printing {} files", result.files.len());

    writeln!(
        writer,
        "{} {} files in dependency closure\n",
        "●".bright_blue(),
        result.files.len().to_string().cyan().bold()
    )?;

    for file in &result.files {
        writeln!(writer, "  {}", display_path(file, cwd).blue())?;
    }

    if let Some(ms) = result.last_modified_ms {
        writeln!(writer)?;
        if ms.is_finite() {
            writeln!(writer, "Last modified: {} ms", format!("{:.0}", ms).yellow())?;
        } else {
            writeln!(writer, "Last modified: {}", "never".dimmed())?;
        }
    }

    if let Some(packages) = &result.packages {
        writeln!(writer, "\n{} ({})", "Packages".bold(), packages.len())?;
        for (idx, name) in packages.iter().enumerate() {
            let prefix = if idx == packages.len() - 1 { "└──" } else { "├──" };
            writeln!(writer, "{}  {}", prefix.dimmed(), name)?;
        }
    }

    writer.flush()?;
    Ok(())
}

pub fn print_specifiers<W: Write>(
    writer: &mut W,
    file: &Path,
    specifiers: &[Specifier],
) -> io::Result<()> {
    debug!("Printing {} specifiers", specifiers.len());

    if specifiers.is_empty() {
        writeln!(writer, "{} No specifiers in {}", "✓".green().bold(), file.display())?;
        writer.flush()?;
        return Ok(());
    }

    writeln!(writer, "{}", file.display().to_string().bright_white().bold())?;
    for (idx, specifier) in specifiers.iter().enumerate() {
        let prefix = if idx == specifiers.len() - 1 { "└──" } else { "├──" };
        let kind = match specifier.kind {
            SpecKind::Static => specifier.kind.as_str().green(),
            SpecKind::Dynamic => specifier.kind.as_str().yellow(),
            SpecKind::ReExport => specifier.kind.as_str().cyan(),
            SpecKind::Require => specifier.kind.as_str().magenta(),
        };
        writeln!(writer, "{}  {} ({})", prefix.dimmed(), specifier.request, kind)?;
    }

    writer.flush()?;
    Ok(())
}
