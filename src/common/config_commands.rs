//! Handlers for the `config` subcommand family.
//!
//! Reset stages the new contents in a sibling temp file and renames it
//! into place, so an interrupted write never leaves a truncated config.

use crate::common::config::{config_path, AppConfig};
use anyhow::{bail, Context, Result};
use std::fs;
use std::io::{BufRead, IsTerminal, Write};
use std::path::Path;
use uuid::Uuid;

/// `config path`: print where settings are read from.
pub fn run_config_path() -> Result<()> {
    println!("{}", config_path().display());
    Ok(())
}

/// `config show`: dump the file, or the built-in defaults when there is none.
pub fn run_config_show() -> Result<()> {
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    render_config(&config_path(), &mut stdout.lock(), &mut stderr.lock())
}

/// `config reset`: overwrite with defaults, prompting unless `--yes`.
pub fn run_config_reset(yes: bool) -> Result<bool> {
    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    let stdout = std::io::stdout();
    apply_reset(
        &config_path(),
        yes,
        interactive,
        &mut stdin.lock(),
        &mut stdout.lock(),
    )
}

fn default_settings() -> Result<String> {
    toml::to_string_pretty(&AppConfig::default()).context("Cannot render default settings")
}

fn render_config(path: &Path, out: &mut dyn Write, err: &mut dyn Write) -> Result<()> {
    match fs::read_to_string(path) {
        Ok(text) => out
            .write_all(text.as_bytes())
            .context("Cannot write config to stdout")?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            writeln!(err, "{} does not exist; built-in defaults apply:", path.display())?;
            err.write_all(default_settings()?.as_bytes())?;
        }
        Err(e) => return Err(e).with_context(|| format!("Cannot read {}", path.display())),
    }
    Ok(())
}

fn apply_reset(
    path: &Path,
    yes: bool,
    interactive: bool,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<bool> {
    if !yes && !interactive {
        bail!("stdin is not a terminal; pass --yes to reset without a prompt");
    }

    if !yes {
        write!(out, "Overwrite {} with default settings? [y/N] ", path.display())?;
        out.flush()?;

        let mut answer = String::new();
        input.read_line(&mut answer)?;
        if !matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            writeln!(out, "Left the existing config in place.")?;
            return Ok(false);
        }
    }

    replace_config(path, &default_settings()?)?;
    writeln!(out, "Wrote default settings to {}", path.display())?;
    Ok(true)
}

/// Stage next to the target, fsync, then rename over it.
fn replace_config(path: &Path, text: &str) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("Cannot create {}", parent.display()))?;

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("config.toml");
    let staged = path.with_file_name(format!(".{name}.{}.part", Uuid::new_v4().simple()));

    let mut file = fs::File::create(&staged)
        .with_context(|| format!("Cannot stage {}", staged.display()))?;
    file.write_all(text.as_bytes())
        .with_context(|| format!("Cannot write {}", staged.display()))?;
    file.sync_all()
        .with_context(|| format!("Cannot sync {}", staged.display()))?;
    drop(file);

    fs::rename(&staged, path)
        .with_context(|| format!("Cannot move {} into place", staged.display()))?;
    Ok(())
}
