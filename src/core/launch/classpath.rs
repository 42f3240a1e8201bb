// ─── Classpath Builder ───
// Flattens the merged game + loader library list into the `-cp` string.
// Installer-only records never reach the classpath; when two versions of the
// same artifact survive, the older one is dropped.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::core::files::{ExtraFileRecord, FileKind, FileOrigin, FileRecord};
use crate::core::paths::arg_path;

fn parse_numeric_version_parts(raw: &str) -> Vec<u32> {
    raw.split(|c: char| !c.is_ascii_digit())
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| segment.parse::<u32>().ok())
        .collect()
}

/// Numeric segment comparison, missing trailing segments count as zero.
fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts = parse_numeric_version_parts(a);
    let b_parts = parse_numeric_version_parts(b);

    let max_len = a_parts.len().max(b_parts.len());
    for idx in 0..max_len {
        let a_val = a_parts.get(idx).copied().unwrap_or(0);
        let b_val = b_parts.get(idx).copied().unwrap_or(0);
        match a_val.cmp(&b_val) {
            Ordering::Equal => continue,
            non_eq => return non_eq,
        }
    }
    Ordering::Equal
}

/// A library laid out as `<artifact dir>/<version>/<file>`.
struct Layout<'a> {
    record: &'a FileRecord,
    /// Directory shared by every version of the artifact.
    artifact_dir: String,
    version: &'a str,
    /// File name after `<artifact>-<version>`, e.g. `.jar` or `-natives-linux.jar`.
    suffix: Option<&'a str>,
}

impl<'a> Layout<'a> {
    fn new(record: &'a FileRecord) -> Self {
        let segments: Vec<&str> = record.path.split('/').filter(|s| !s.is_empty()).collect();
        let (artifact_dir, version, artifact) = match segments.as_slice() {
            [parents @ .., artifact, version] => {
                let mut dir = parents.join("/");
                if !dir.is_empty() {
                    dir.push('/');
                }
                dir.push_str(artifact);
                (dir, *version, *artifact)
            }
            _ => (segments.join("/"), "", ""),
        };
        let suffix = record
            .name
            .strip_prefix(&format!("{}-{}", artifact, version))
            .filter(|_| !version.is_empty());
        Self {
            record,
            artifact_dir,
            version,
            suffix,
        }
    }

    fn is_client_archive(&self) -> bool {
        self.record.path.starts_with("versions/")
    }

    fn comparable_with(&self, other: &Layout<'_>) -> bool {
        self.artifact_dir == other.artifact_dir
            && self.suffix.is_some()
            && self.suffix == other.suffix
    }
}

/// Whether `rival` makes `candidate` redundant. `candidate_later` breaks the
/// tie between two copies of the same content.
fn supersedes(rival: &Layout<'_>, candidate: &Layout<'_>, candidate_later: bool) -> bool {
    if let (Some(a), Some(b)) = (&rival.record.sha1, &candidate.record.sha1) {
        if a.eq_ignore_ascii_case(b) {
            return candidate_later;
        }
    }
    compare_versions(rival.version, candidate.version) == Ordering::Greater
}

/// Library records that belong on the runtime classpath, in order.
pub fn classpath_records(libraries: &[ExtraFileRecord]) -> Vec<&FileRecord> {
    let mut seen = HashSet::new();
    let candidates: Vec<Layout<'_>> = libraries
        .iter()
        .filter(|r| r.origin != FileOrigin::InstallerOnly && r.file.kind == FileKind::Library)
        .filter(|r| seen.insert(r.file.identity()))
        .map(|r| Layout::new(&r.file))
        .collect();

    let mut out = Vec::with_capacity(candidates.len());
    for (i, candidate) in candidates.iter().enumerate() {
        let dropped = !candidate.is_client_archive()
            && candidates.iter().enumerate().any(|(j, rival)| {
                i != j
                    && !rival.is_client_archive()
                    && rival.comparable_with(candidate)
                    && supersedes(rival, candidate, i > j)
            });
        if dropped {
            debug!("Dropping superseded {}", candidate.record.identity());
            continue;
        }
        out.push(candidate.record);
    }
    out
}

/// Absolute classpath string for `libraries` under `root`.
pub fn build_classpath(root: &Path, libraries: &[ExtraFileRecord], separator: &str) -> String {
    classpath_records(libraries)
        .into_iter()
        .map(|r| arg_path(&r.destination(root)))
        .collect::<Vec<_>>()
        .join(separator)
}
