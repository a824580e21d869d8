use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use walkdir::WalkDir;

use crate::config::matches_extension;

pub(crate) fn discover_files(
    root: &Path,
    extensions: &[String],
) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = BTreeSet::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !matches_extension(extensions, entry.path()) {
            continue;
        }
        let path = fs::canonicalize(entry.path()).unwrap_or_else(|_| entry.path().to_path_buf());
        files.insert(path);
    }
    Ok(files.into_iter().collect())
}

/// In parallel mode the list is cut into one contiguous chunk per CPU and
/// each worker numbers its own chunk from 1, so indexes repeat across
/// workers.
pub(crate) fn process_files<F>(files: &[PathBuf], parallel: bool, process: F)
where
    F: Fn(&Path, u64) + Sync,
{
    if !parallel || files.len() < 2 {
        for (offset, path) in files.iter().enumerate() {
            process(path, offset as u64 + 1);
        }
        return;
    }

    let workers = num_cpus::get().max(1);
    let chunk_size = files.len().div_ceil(workers).max(1);
    let process = &process;
    thread::scope(|scope| {
        for chunk in files.chunks(chunk_size) {
            scope.spawn(move || {
                for (offset, path) in chunk.iter().enumerate() {
                    process(path, offset as u64 + 1);
                }
            });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn discovery_filters_by_extension_recursively() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.mp3"));
        touch(&dir.path().join("Artist/Album/02.FLAC"));
        touch(&dir.path().join("Artist/Album/cover.jpg"));
        touch(&dir.path().join("Artist/notes"));
        let files = discover_files(dir.path(), &["mp3".into(), "flac".into()]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|p| p.ends_with("Artist/Album/02.FLAC")));
        assert!(files.iter().any(|p| p.ends_with("a.mp3")));
    }

    #[test]
    fn missing_root_is_a_walk_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_files(&dir.path().join("nope"), &["mp3".into()]).is_err());
    }

    #[test]
    fn sequential_indexes_are_one_based_and_ordered() {
        let files: Vec<PathBuf> = (0..5).map(|i| PathBuf::from(format!("/m/{i}.mp3"))).collect();
        let seen = Mutex::new(Vec::new());
        process_files(&files, false, |path, index| seen.lock().push((path.to_path_buf(), index)));
        let seen = seen.into_inner();
        let indexes: Vec<u64> = seen.iter().map(|(_, index)| *index).collect();
        assert_eq!(indexes, vec![1, 2, 3, 4, 5]);
        assert_eq!(seen[4].0, files[4]);
    }

    #[test]
    fn parallel_mode_visits_every_file_once() {
        let files: Vec<PathBuf> = (0..37).map(|i| PathBuf::from(format!("/m/{i}.mp3"))).collect();
        let seen = Mutex::new(Vec::new());
        process_files(&files, true, |path, index| {
            assert!(index >= 1);
            seen.lock().push(path.to_path_buf());
        });
        let mut seen = seen.into_inner();
        seen.sort();
        let mut expected = files.clone();
        expected.sort();
        assert_eq!(seen, expected);
    }
}
