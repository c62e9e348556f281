//! purpose: File exclusion for batch conversion. Directory walks honour .gitignore and the
//!     patterns from tsdocify.toml/--exclude; glob matches are filtered through the same
//!     patterns and the default excluded directories.
//!
//! when-editing:
//!     - !Override patterns use ! prefix to negate (exclude), so we add ! to user patterns
//!     - The ignore crate handles gitignore parsing automatically
//!     - Patterns come from the tsdocify.toml exclude array and CLI --exclude flags
//!
//! invariants:
//!     - Default exclusions (node_modules, .git, etc.) are always applied
//!     - CLI --exclude patterns are combined with tsdocify.toml exclude patterns
//!     - Gitignore is respected by default unless --no-gitignore is passed
//!
//! do-not:
//!     - Never remove default exclusions without explicit user override
//!
//! gotchas:
//!     - The ignore crate's override patterns are inclusive by default, so we negate them
//!     - Glob mode does not walk, so default directories are checked per path component

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::path::{Component, Path};

/// Configuration for file exclusion in batch mode
#[derive(Debug, Clone)]
pub struct ExclusionConfig {
    /// Glob patterns to exclude (config file plus --exclude flags)
    pub patterns: Vec<String>,
    /// Whether to respect .gitignore files (default: true)
    pub respect_gitignore: bool,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            respect_gitignore: true,
        }
    }
}

/// Directories that never hold sources worth converting
const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "coverage",
    ".next",
    ".nuxt",
    "vendor",
    "target",
];

/// Build a WalkBuilder with the given exclusion configuration
pub fn build_walker(root: &Path, config: &ExclusionConfig) -> WalkBuilder {
    let mut builder = WalkBuilder::new(root);

    builder.git_ignore(config.respect_gitignore);
    builder.git_global(config.respect_gitignore);
    builder.git_exclude(config.respect_gitignore);

    // .git is handled by the default exclusions
    builder.hidden(false);

    let mut overrides = OverrideBuilder::new(root);

    for dir in DEFAULT_EXCLUDED_DIRS {
        let _ = overrides.add(&format!("!{}/**", dir));
        let _ = overrides.add(&format!("!{}", dir));
    }

    for pattern in &config.patterns {
        let exclude_pattern = format!("!{}", pattern);
        if let Err(e) = overrides.add(&exclude_pattern) {
            log::warn!("invalid exclude pattern '{}': {}", pattern, e);
        }
    }

    match overrides.build() {
        Ok(built) => {
            builder.overrides(built);
        }
        Err(e) => log::warn!("could not build exclusion overrides: {}", e),
    }

    builder
}

/// Build a GlobSet from patterns for filtering glob matches
pub fn build_exclude_globset(patterns: &[String]) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => {
                log::warn!("invalid exclude pattern '{}': {}", pattern, e);
            }
        }
    }

    builder.build().ok()
}

/// Check if a directory name should be excluded by default
pub fn is_default_excluded_dir(name: &str) -> bool {
    DEFAULT_EXCLUDED_DIRS.contains(&name)
}

/// True when any directory component of `path` is a default excluded directory
pub fn in_default_excluded_dir(path: &Path) -> bool {
    let Some(parent) = path.parent() else {
        return false;
    };
    parent.components().any(|c| match c {
        Component::Normal(name) => name.to_str().is_some_and(is_default_excluded_dir),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn walk(root: &Path, config: &ExclusionConfig) -> Vec<PathBuf> {
        let mut files: Vec<_> = build_walker(root, config)
            .build()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_default_excluded_dirs() {
        assert!(is_default_excluded_dir("node_modules"));
        assert!(is_default_excluded_dir(".git"));
        assert!(is_default_excluded_dir("coverage"));
        assert!(is_default_excluded_dir("dist"));
        assert!(!is_default_excluded_dir("src"));
        assert!(!is_default_excluded_dir("lib"));
    }

    #[test]
    fn test_in_default_excluded_dir() {
        assert!(in_default_excluded_dir(Path::new(
            "node_modules/pkg/index.js"
        )));
        assert!(in_default_excluded_dir(Path::new("./web/dist/app.js")));
        assert!(!in_default_excluded_dir(Path::new("src/dist.js")));
        assert!(!in_default_excluded_dir(Path::new("index.ts")));
    }

    #[test]
    fn test_exclusion_config_default() {
        let config = ExclusionConfig::default();
        assert!(config.patterns.is_empty());
        assert!(config.respect_gitignore);
    }

    #[test]
    fn test_build_exclude_globset_empty() {
        assert!(build_exclude_globset(&[]).is_none());
    }

    #[test]
    fn test_build_exclude_globset_valid_patterns() {
        let patterns = vec!["*.min.js".to_string(), "legacy/**".to_string()];
        let globset = build_exclude_globset(&patterns).unwrap();
        assert!(globset.is_match("app.min.js"));
        assert!(globset.is_match("legacy/old.js"));
        assert!(!globset.is_match("main.ts"));
    }

    #[test]
    fn test_default_dirs_skipped_by_walker() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("node_modules/pkg")).unwrap();
        fs::write(temp_dir.path().join("node_modules/pkg/index.js"), "x").unwrap();
        fs::create_dir(temp_dir.path().join("coverage")).unwrap();
        fs::write(temp_dir.path().join("coverage/report.js"), "x").unwrap();
        fs::write(temp_dir.path().join("main.ts"), "x").unwrap();

        let files = walk(temp_dir.path(), &ExclusionConfig::default());
        assert_eq!(files, vec![PathBuf::from("main.ts")]);
    }

    #[test]
    fn test_gitignore_respected() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join(".git")).unwrap();
        fs::write(
            temp_dir.path().join(".gitignore"),
            "ignored_dir/\n*.ignored.ts",
        )
        .unwrap();
        fs::create_dir(temp_dir.path().join("ignored_dir")).unwrap();
        fs::write(temp_dir.path().join("ignored_dir/file.ts"), "x").unwrap();
        fs::write(temp_dir.path().join("test.ignored.ts"), "x").unwrap();
        fs::write(temp_dir.path().join("main.ts"), "x").unwrap();

        let files = walk(temp_dir.path(), &ExclusionConfig::default());
        let ts_files: Vec<_> = files
            .iter()
            .filter(|p| p.extension().is_some_and(|e| e == "ts"))
            .collect();
        assert_eq!(ts_files, vec![&PathBuf::from("main.ts")]);
    }

    #[test]
    fn test_gitignore_not_respected() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join(".git")).unwrap();
        fs::write(temp_dir.path().join(".gitignore"), "ignored_dir/").unwrap();
        fs::create_dir(temp_dir.path().join("ignored_dir")).unwrap();
        fs::write(temp_dir.path().join("ignored_dir/file.ts"), "x").unwrap();
        fs::write(temp_dir.path().join("main.ts"), "x").unwrap();

        let config = ExclusionConfig {
            patterns: vec![],
            respect_gitignore: false,
        };
        let files = walk(temp_dir.path(), &config);
        assert!(files.contains(&PathBuf::from("ignored_dir/file.ts")));
        assert!(files.contains(&PathBuf::from("main.ts")));
    }

    #[test]
    fn test_exclude_patterns() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("main.ts"), "x").unwrap();
        fs::write(temp_dir.path().join("bundle.min.js"), "x").unwrap();
        fs::create_dir(temp_dir.path().join("legacy")).unwrap();
        fs::write(temp_dir.path().join("legacy/old.js"), "x").unwrap();

        let config = ExclusionConfig {
            patterns: vec!["*.min.js".to_string(), "legacy/**".to_string()],
            respect_gitignore: true,
        };
        let files = walk(temp_dir.path(), &config);
        assert_eq!(files, vec![PathBuf::from("main.ts")]);
    }
}
