//! Conditional source file selection.
//!
//! Include patterns are expanded first, then every file matched by an
//! exclude pattern is removed from the result. Each pattern is only
//! evaluated when its [Restriction](crate::pattern::Restriction) allows the
//! active simulator.

use crate::pattern::FilePattern;
use crate::project::{
    LibraryRef, Project, ProjectError, Result, SourceOptions,
};
use camino::{Utf8Path, Utf8PathBuf};
use glob::MatchOptions;
use itertools::Itertools;
use std::collections::HashSet;

/// What happened to a single pattern during selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternOutcome {
    /// The pattern matched this many paths.
    Matched(usize),

    /// The pattern applied to the simulator but matched nothing.
    Empty,

    /// The pattern does not apply to the active simulator.
    Skipped,
}

/// The result of evaluating include and exclude patterns.
#[derive(Debug, Default)]
pub struct Selection {
    /// The remaining files: unique, in discovery order.
    pub files: Vec<Utf8PathBuf>,

    /// Every path matched by an include pattern, duplicates included.
    pub included: Vec<Utf8PathBuf>,

    /// Every path matched by an exclude pattern.
    pub excluded: Vec<Utf8PathBuf>,

    /// One outcome per include pattern, in order.
    pub include_outcomes: Vec<PatternOutcome>,

    /// One outcome per exclude pattern, in order.
    pub exclude_outcomes: Vec<PatternOutcome>,
}

impl Selection {
    /// Did any applicable pattern match nothing?
    pub fn has_empty_patterns(&self) -> bool {
        self.include_outcomes
            .iter()
            .chain(&self.exclude_outcomes)
            .any(|o| *o == PatternOutcome::Empty)
    }
}

/// Wildcards never match a leading `.`, so editor lock files and hidden tool
/// directories (`.cache/`, `.Xil/`) stay out of the selection.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: true,
};

/// Expand a glob pattern against the filesystem. `**` matches any number of
/// directories.
pub fn expand(pattern: &str) -> Result<Vec<Utf8PathBuf>> {
    let paths = glob::glob_with(pattern, MATCH_OPTIONS).map_err(|error| {
        ProjectError::Pattern {
            pattern: pattern.to_string(),
            error,
        }
    })?;
    paths
        .map(|entry| {
            let path = entry?;
            Utf8PathBuf::from_path_buf(path).map_err(ProjectError::NonUtf8Path)
        })
        .collect()
}

/// Build a glob pattern for `pattern` inside `dir`. Glob metacharacters in
/// `dir` are escaped so they match literally; absolute patterns are kept.
pub fn glob_in(dir: &Utf8Path, pattern: &str) -> String {
    if Utf8Path::new(pattern).is_absolute() {
        return pattern.to_string();
    }
    Utf8Path::new(&glob::Pattern::escape(dir.as_str()))
        .join(pattern)
        .into_string()
}

/// Evaluate `patterns` for `context`, appending matches to `files`.
fn collect(
    kind: &str,
    patterns: &[FilePattern],
    context: &str,
    files: &mut Vec<Utf8PathBuf>,
) -> Result<Vec<PatternOutcome>> {
    let mut outcomes = Vec::with_capacity(patterns.len());
    for file_pattern in patterns {
        if !file_pattern.applies_to(context) {
            log::debug!(
                "{kind} pattern {file_pattern} was not processed due to the used simulator ({context})"
            );
            outcomes.push(PatternOutcome::Skipped);
            continue;
        }

        let matches = expand(&file_pattern.pattern)?;
        if matches.is_empty() {
            log::warn!(
                "{kind} file pattern {} did not match any file!",
                file_pattern.pattern
            );
            outcomes.push(PatternOutcome::Empty);
        } else {
            outcomes.push(PatternOutcome::Matched(matches.len()));
            files.extend(matches);
        }
    }
    Ok(outcomes)
}

/// Select the files matched by `include` but not by `exclude` when `context`
/// is the active simulator.
pub fn select(
    include: &[FilePattern],
    exclude: &[FilePattern],
    context: &str,
) -> Result<Selection> {
    let mut included = vec![];
    let include_outcomes = collect("Include", include, context, &mut included)?;

    let mut excluded = vec![];
    let exclude_outcomes = collect("Exclude", exclude, context, &mut excluded)?;

    let excluded_set: HashSet<&Utf8PathBuf> = excluded.iter().collect();
    let files = included
        .iter()
        .filter(|f| !excluded_set.contains(f))
        .unique()
        .cloned()
        .collect();

    Ok(Selection {
        files,
        included,
        excluded,
        include_outcomes,
        exclude_outcomes,
    })
}

/// Select files for the project's simulator and register them with `lib`.
///
/// Errors from the project are passed through unchanged.
pub fn add_source_files<P: Project + ?Sized>(
    project: &mut P,
    lib: LibraryRef,
    include: &[FilePattern],
    exclude: &[FilePattern],
    options: &SourceOptions,
) -> Result<Selection> {
    let selection = select(include, exclude, project.simulator_name())?;

    for incl in &selection.included {
        log::debug!("including {incl}");
    }
    for excl in &selection.excluded {
        log::debug!("excluding {excl}");
    }
    for remaining in &selection.files {
        log::debug!("remaining {remaining}");
    }

    project.add_source_files(lib, &selection.files, options)?;
    Ok(selection)
}
