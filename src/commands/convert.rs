//! purpose: Implements the conversion run. Resolves the parsed arguments into a Plan (one
//!     file to a destination, or a batch rewritten in place), reads the sources, runs the
//!     Converter and persists the results.
//!
//! when-editing:
//!     - !plan() is pure; every filesystem check it needs is the is_dir probe on the input
//!     - !A file whose conversion fails is never written
//!     - Relative paths are resolved against --root; messages show them as given
//!
//! invariants:
//!     - Batch mode only ever rewrites in place and requires --update-in-place
//!     - Batch mode writes only files whose text changed
//!     - Any failed file makes the run fail after every other file was processed
//!
//! do-not:
//!     - Never write to stdout in single-file stdout mode except the converted text
//!
//! gotchas:
//!     - Positionals fill the input first, then the output, after --in/--out are applied
//!     - Glob results are filtered by exclusion patterns but not by .gitignore
//!
//! flows:
//!     - Plan: map flags and positionals to Single or Batch
//!     - Collect: expand the glob or walk the directory
//!     - Convert: per file, in parallel for batches
//!     - Persist: write file, stdout, or report under --dry-run

use crate::cli::ConvertArgs;
use crate::config::Config;
use crate::exclusion::{
    build_exclude_globset, build_walker, in_default_excluded_dir, ExclusionConfig,
};
use crate::rewrite::Converter;
use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// File extensions picked up when a directory is walked
pub const SUPPORTED_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"];

const STDIN_LABEL: &str = "<stdin>";
const STDOUT_LABEL: &str = "<stdout>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    fn label(&self) -> String {
        match self {
            Input::Stdin => STDIN_LABEL.to_string(),
            Input::File(path) => path.display().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    InPlace,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchSource {
    Glob(String),
    Directory(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Single {
        input: Input,
        destination: Destination,
    },
    Batch(BatchSource),
}

/// Map parsed arguments onto what the run will do.
pub fn plan(args: &ConvertArgs, root: &Path) -> Result<Plan> {
    let mut input = args.input.clone();
    let mut output = args.output.clone();
    for path in &args.paths {
        if input.is_none() {
            input = Some(path.clone());
        } else if output.is_none() {
            output = Some(path.clone());
        } else {
            bail!("Too many arguments");
        }
    }

    if let Some(pattern) = &args.glob {
        if !args.update_in_place {
            bail!("Globbing only supported with the --update-in-place flag.");
        }
        return Ok(Plan::Batch(BatchSource::Glob(pattern.clone())));
    }

    let Some(input) = input else {
        bail!("Invalid input, please use either --in or --glob");
    };

    if input.as_os_str() == "-" {
        if args.update_in_place {
            bail!("Cannot update stdin in place");
        }
        let destination = output.map_or(Destination::Stdout, Destination::File);
        return Ok(Plan::Single {
            input: Input::Stdin,
            destination,
        });
    }

    if resolve(root, &input).is_dir() {
        if !args.update_in_place {
            bail!(
                "{} is a directory; directories are only supported with the --update-in-place flag.",
                input.display()
            );
        }
        if output.is_some() {
            bail!("An output file cannot be combined with a directory input");
        }
        return Ok(Plan::Batch(BatchSource::Directory(input)));
    }

    let destination = match output {
        Some(output) => Destination::File(output),
        None if args.update_in_place => Destination::InPlace,
        None => Destination::Stdout,
    };
    Ok(Plan::Single {
        input: Input::File(input),
        destination,
    })
}

pub fn run_convert(args: &ConvertArgs, root: &Path, verbose: bool) -> Result<()> {
    let config = Config::load(root);
    let converter = Converter::new(config.rule_table());
    log::debug!("Loaded {} tag rules", converter.rules().len());

    match plan(args, root)? {
        Plan::Single { input, destination } => {
            convert_single(&converter, &input, &destination, root, args.dry_run)
        }
        Plan::Batch(source) => {
            let exclusion = args.exclusion_config(&config.exclude);
            let (label, files) = match &source {
                BatchSource::Glob(pattern) => (
                    pattern.clone(),
                    glob_files(pattern, root, &exclusion.patterns)?,
                ),
                BatchSource::Directory(dir) => (
                    dir.display().to_string(),
                    walk_files(&resolve(root, dir), &exclusion),
                ),
            };
            convert_batch(&converter, &label, &files, args.dry_run, verbose)
        }
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn convert_single(
    converter: &Converter,
    input: &Input,
    destination: &Destination,
    root: &Path,
    dry_run: bool,
) -> Result<()> {
    let label = input.label();
    let source = match input {
        Input::Stdin => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            buffer
        }
        Input::File(path) => fs::read_to_string(resolve(root, path))
            .with_context(|| format!("Failed to read input file {}", path.display()))?,
    };

    let out_label = match destination {
        Destination::Stdout => STDOUT_LABEL.to_string(),
        Destination::InPlace => label.clone(),
        Destination::File(path) => path.display().to_string(),
    };
    let to_stdout = matches!(destination, Destination::Stdout);
    let report = |message: String| {
        if to_stdout {
            eprintln!("{}", message);
        } else {
            println!("{}", message);
        }
    };
    report(format!("{} --> {}", label, out_label));

    let conversion = converter
        .convert(&source, &label)
        .with_context(|| format!("Failed to convert {}", label))?;
    log::debug!("{}: {:?}", label, conversion.stats);

    if dry_run {
        if conversion.stats.changed() {
            report(format!("Would rewrite: {}", out_label));
        }
        return Ok(());
    }

    match (destination, input) {
        (Destination::Stdout, _) => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(conversion.text.as_bytes())
                .context("Failed to write to stdout")?;
            stdout.flush().context("Failed to write to stdout")?;
        }
        (Destination::InPlace, Input::File(path)) => {
            if conversion.stats.changed() {
                write_file(&resolve(root, path), &conversion.text)?;
            }
        }
        (Destination::InPlace, Input::Stdin) => bail!("Cannot update stdin in place"),
        (Destination::File(path), _) => write_file(&resolve(root, path), &conversion.text)?,
    }
    Ok(())
}

fn write_file(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    Converted,
    Unchanged,
}

fn convert_batch(
    converter: &Converter,
    label: &str,
    files: &[PathBuf],
    dry_run: bool,
    verbose: bool,
) -> Result<()> {
    println!("{} --> {} files", label, files.len());

    let results: Vec<(&PathBuf, Result<FileOutcome>)> = files
        .par_iter()
        .map(|path| (path, convert_in_place(converter, path, dry_run)))
        .collect();

    let mut converted = 0;
    let mut unchanged = 0;
    let mut errors = 0;

    for (path, result) in results {
        match result {
            Ok(FileOutcome::Converted) => {
                converted += 1;
                if dry_run {
                    println!("Would rewrite: {}", path.display());
                } else if verbose {
                    println!("Rewrote {}", path.display());
                }
            }
            Ok(FileOutcome::Unchanged) => unchanged += 1,
            Err(e) => {
                eprintln!("Error processing {}: {:#}", path.display(), e);
                errors += 1;
            }
        }
    }

    println!(
        "Converted: {}, Unchanged: {}, Errors: {}",
        converted, unchanged, errors
    );

    if errors > 0 {
        bail!("{} files failed to convert", errors);
    }
    Ok(())
}

fn convert_in_place(converter: &Converter, path: &Path, dry_run: bool) -> Result<FileOutcome> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let conversion = converter.convert(&source, &path.display().to_string())?;
    log::debug!("{}: {:?}", path.display(), conversion.stats);

    if !conversion.stats.changed() {
        return Ok(FileOutcome::Unchanged);
    }
    if !dry_run {
        fs::write(path, &conversion.text)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(FileOutcome::Converted)
}

/// Expand a glob pattern (relative patterns are anchored at `root`) into a sorted file list.
pub fn glob_files(pattern: &str, root: &Path, exclude: &[String]) -> Result<Vec<PathBuf>> {
    let anchored = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        format!("{}/{}", glob::Pattern::escape(&root.to_string_lossy()), pattern)
    };
    let excluded = build_exclude_globset(exclude);

    let entries = glob::glob(&anchored)
        .with_context(|| format!("Invalid glob pattern '{}'", pattern))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Skipping unreadable path: {}", e);
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(&path);
        if in_default_excluded_dir(relative) {
            continue;
        }
        if excluded.as_ref().is_some_and(|set| set.is_match(relative)) {
            log::debug!("Excluded {}", relative.display());
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// Walk `dir` and collect files with a supported extension.
pub fn walk_files(dir: &Path, exclusion: &ExclusionConfig) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = build_walker(dir, exclusion)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable path: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| has_supported_extension(path))
        .collect();
    files.sort();
    files
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}
