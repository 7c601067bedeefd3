//! Target file naming for downloaded materials.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use super::constants::PART_FILE_SUFFIX;

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "download.bin".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized.chars().map(|c| if c == '.' { '_' } else { c }).collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Sanitizes every name and suffixes repeats (`file.pdf`, `file_2.pdf`, ...)
/// so no two materials of one batch share a target file.
pub(crate) fn unique_batch_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut taken = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            let filename = sanitize_filename(name);
            if taken.insert(filename.clone()) {
                return filename;
            }
            let (stem, ext) = match filename.rfind('.') {
                Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
                _ => (filename.as_str(), ""),
            };
            let mut suffix = 2;
            loop {
                let candidate = format!("{stem}_{suffix}{ext}");
                if taken.insert(candidate.clone()) {
                    return candidate;
                }
                suffix += 1;
            }
        })
        .collect()
}

/// Path of the part file that collects chunks for `final_path`.
pub(crate) fn part_path(final_path: &Path) -> PathBuf {
    let mut name = final_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(PART_FILE_SUFFIX);
    final_path.with_file_name(name)
}
