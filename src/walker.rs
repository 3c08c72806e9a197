/*!
 * Depth-first traversal of the repository tree
 *
 * The walker prunes excluded directories and applies the name-based file
 * rules. Size bounds and content checks need a stat or a read, so they are
 * left to the processor; every rule is therefore applied exactly once.
 */

use std::io;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::classify;
use crate::config::Rules;
use crate::pattern::PatternSet;
use crate::types::SkipReason;

/// One file entry seen by the walker
#[derive(Debug)]
pub enum WalkItem {
    /// Passed the pattern rules; still subject to size and content checks
    Candidate(PathBuf),
    /// Rejected by a name or path rule
    Filtered { path: PathBuf, reason: SkipReason },
    /// A directory or file that could not be read while walking
    Unreadable { path: PathBuf, error: io::Error },
}

/// Walks a root with a fixed set of compiled rules
#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: PathBuf,
    rules: Rules,
}

impl TreeWalker {
    pub fn new(root: impl Into<PathBuf>, rules: Rules) -> Self {
        Self {
            root: root.into(),
            rules,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the tree.
    ///
    /// Siblings are visited in file-name order so that output is stable
    /// across runs and platforms. Symlinks are not followed and only regular
    /// files are reported. Each call starts a fresh walk; dropping the
    /// iterator early simply stops it.
    pub fn walk(&self) -> impl Iterator<Item = WalkItem> {
        let exclude_dirs = self.rules.exclude_dirs.clone();
        let walker = self.clone();

        WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !is_pruned(&exclude_dirs, entry))
            .filter_map(move |result| match result {
                Ok(entry) if entry.file_type().is_file() => Some(walker.check_file(entry.path())),
                Ok(_) => None,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| walker.root.clone());
                    let error = err
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop"));
                    Some(WalkItem::Unreadable { path, error })
                }
            })
    }

    fn check_file(&self, path: &Path) -> WalkItem {
        match self.file_rule(path) {
            Some(reason) => WalkItem::Filtered {
                path: path.to_path_buf(),
                reason,
            },
            None => WalkItem::Candidate(path.to_path_buf()),
        }
    }

    /// Name-based rejection for a file, if any.
    ///
    /// Patterns are tried against the root-relative path and against the
    /// basename, so `*.ts` and `.DS_Store` both apply at any depth while
    /// `src/*` still targets a subtree.
    ///
    /// Paths that cannot be written verbatim into the document are rejected
    /// first, so two names never collapse into one lossy path.
    pub fn file_rule(&self, path: &Path) -> Option<SkipReason> {
        let Some(relative) = xml_path(&self.root, path) else {
            return Some(SkipReason::InvalidPath);
        };
        if self.rules.skip_paths.iter().any(|skip| skip == path) {
            return Some(SkipReason::Excluded);
        }

        let basename = path.file_name().unwrap_or_default().to_string_lossy();
        let hit = |set: &PatternSet| set.matches(&relative) || set.matches(&basename);

        if !self.rules.include_files.is_empty() && !hit(&self.rules.include_files) {
            return Some(SkipReason::NotIncluded);
        }
        if hit(&self.rules.exclude_files) {
            return Some(SkipReason::Excluded);
        }

        None
    }
}

/// Directory exclusion acts on the directory's own name only
fn is_pruned(exclude_dirs: &PatternSet, entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && exclude_dirs.matches(&entry.file_name().to_string_lossy())
}

/// Root-relative path with forward slashes, if it is UTF-8 and XML-safe
fn xml_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    let joined = parts.join("/");
    classify::is_xml_safe(&joined).then_some(joined)
}

/// Root-relative path with forward slashes
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    fn touch(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        write!(file, "{}", content).unwrap();
    }

    fn rules(exclude_dirs: &[&str], exclude_files: &[&str], include_files: &[&str]) -> Rules {
        Config {
            exclude_dirs: crate::config::to_strings(exclude_dirs),
            exclude_files: crate::config::to_strings(exclude_files),
            include_files: crate::config::to_strings(include_files),
            ..Config::default()
        }
        .compile_rules()
        .unwrap()
    }

    fn candidates(walker: &TreeWalker) -> Vec<String> {
        walker
            .walk()
            .filter_map(|item| match item {
                WalkItem::Candidate(path) => Some(relative_path(walker.root(), &path)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_pruned_directories_are_not_visited() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.ts"), "x");
        touch(&dir.path().join("node_modules/b.ts"), "y");
        touch(&dir.path().join("src/node_modules/c.ts"), "z");

        let rules = rules(&["node_modules"], &[], &["*.ts"]);
        let walker = TreeWalker::new(dir.path(), rules);
        let items: Vec<WalkItem> = walker.walk().collect();

        assert_eq!(items.len(), 1);
        assert_eq!(candidates(&walker), vec!["a.ts"]);
    }

    #[test]
    fn test_include_cannot_override_pruning() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("build/keep.rs"), "x");

        let rules = rules(&["build"], &[], &["*", "build/keep.rs"]);
        let walker = TreeWalker::new(dir.path(), rules);
        assert_eq!(walker.walk().count(), 0);
    }

    #[test]
    fn test_sorted_depth_first_order() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("b.txt"), "");
        touch(&dir.path().join("a/z.txt"), "");
        touch(&dir.path().join("a/y/x.txt"), "");
        touch(&dir.path().join("c.txt"), "");

        let rules = rules(&[], &[], &[]);
        let walker = TreeWalker::new(dir.path(), rules);
        assert_eq!(
            candidates(&walker),
            vec!["a/y/x.txt", "a/z.txt", "b.txt", "c.txt"]
        );
    }

    #[test]
    fn test_filtered_files_carry_reason() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("main.rs"), "");
        touch(&dir.path().join("notes.md"), "");
        touch(&dir.path().join("debug.log"), "");

        let rules = rules(&[], &["*.log"], &["*.rs", "*.log"]);
        let walker = TreeWalker::new(dir.path(), rules);
        let mut reasons: Vec<(String, SkipReason)> = walker
            .walk()
            .filter_map(|item| match item {
                WalkItem::Filtered { path, reason } => Some((relative_path(dir.path(), &path), reason)),
                _ => None,
            })
            .collect();
        reasons.sort();

        assert_eq!(
            reasons,
            vec![
                ("debug.log".to_string(), SkipReason::Excluded),
                ("notes.md".to_string(), SkipReason::NotIncluded),
            ]
        );
    }

    #[test]
    fn test_basename_literal_applies_at_depth() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("deep/er/.DS_Store"), "");
        touch(&dir.path().join("deep/er/ok.txt"), "");

        let rules = rules(&[], &[".DS_Store"], &[]);
        let walker = TreeWalker::new(dir.path(), rules);
        assert_eq!(candidates(&walker), vec!["deep/er/ok.txt"]);
    }

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = Path::new("/repo");
        let path = Path::new("/repo").join("src").join("lib.rs");
        assert_eq!(relative_path(root, &path), "src/lib.rs");
    }

    fn filtered(walker: &TreeWalker) -> Vec<(String, SkipReason)> {
        walker
            .walk()
            .filter_map(|item| match item {
                WalkItem::Filtered { path, reason } => Some((relative_path(walker.root(), &path), reason)),
                _ => None,
            })
            .collect()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names_are_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        // Both names collapse to "caf\u{FFFD}.txt" under lossy conversion
        touch(&dir.path().join(OsStr::from_bytes(b"caf\xe9.txt")), "a");
        touch(&dir.path().join(OsStr::from_bytes(b"caf\xe8.txt")), "b");
        touch(&dir.path().join("ok.txt"), "c");

        let walker = TreeWalker::new(dir.path(), rules(&[], &[], &[]));
        assert_eq!(candidates(&walker), vec!["ok.txt"]);

        let reasons: Vec<SkipReason> = filtered(&walker).into_iter().map(|(_, r)| r).collect();
        assert_eq!(reasons, vec![SkipReason::InvalidPath, SkipReason::InvalidPath]);
    }

    #[cfg(unix)]
    #[test]
    fn test_control_characters_in_names_are_rejected() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("esc\u{1b}[0m.txt"), "a");
        touch(&dir.path().join(" spaced name.txt"), "b");

        let walker = TreeWalker::new(dir.path(), rules(&[], &[], &[]));
        assert_eq!(candidates(&walker), vec![" spaced name.txt"]);
        assert_eq!(
            filtered(&walker),
            vec![("esc\u{1b}[0m.txt".to_string(), SkipReason::InvalidPath)]
        );
    }

    #[test]
    fn test_skip_paths_match_literally() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("out*.xml"), "old output");
        touch(&dir.path().join("out-keep.xml"), "<keep/>");

        let mut rules = rules(&[], &[], &[]);
        rules.skip_paths.push(dir.path().join("out*.xml"));
        let walker = TreeWalker::new(dir.path(), rules);

        assert_eq!(candidates(&walker), vec!["out-keep.xml"]);
        assert_eq!(
            filtered(&walker),
            vec![("out*.xml".to_string(), SkipReason::Excluded)]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_isolated() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        touch(&dir.path().join("locked/secret.txt"), "");
        touch(&dir.path().join("open.txt"), "");
        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root ignores permission bits; nothing to observe in that case
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let rules = rules(&[], &[], &[]);
        let walker = TreeWalker::new(dir.path(), rules);
        let items: Vec<WalkItem> = walker.walk().collect();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let unreadable = items
            .iter()
            .filter(|item| matches!(item, WalkItem::Unreadable { .. }))
            .count();
        let accepted: Vec<String> = items
            .iter()
            .filter_map(|item| match item {
                WalkItem::Candidate(path) => Some(relative_path(dir.path(), path)),
                _ => None,
            })
            .collect();

        assert_eq!(unreadable, 1);
        assert_eq!(accepted, vec!["open.txt"]);
    }
}
