use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use livecalc_core::constants::{CACHE_FILE_MAGIC, CACHE_FILE_VERSION};

use crate::metadata::CacheEntry;

/// Resolves the OS-standard cache root. A caller-supplied root always
/// overrides this.
pub fn default_cache_root() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(local_appdata) = std::env::var("LOCALAPPDATA") {
            return PathBuf::from(local_appdata).join("LiveCalc").join("Cache");
        }
        return PathBuf::from("C:\\Temp\\LiveCalc\\Cache");
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = dirs_home() {
            return home.join("Library").join("Caches").join("LiveCalc");
        }
        return PathBuf::from("/tmp/LiveCalc/Cache");
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(home) = dirs_home() {
            return home.join(".cache").join("livecalc");
        }
        PathBuf::from("/tmp/livecalc/cache")
    }
}

#[cfg(not(target_os = "windows"))]
fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Filename for `key`: colons replaced with underscores, `.cache` suffix.
pub fn cache_path(root: &Path, key: &str) -> PathBuf {
    let filename = format!("{}.cache", key.replace(':', "_"));
    root.join(filename)
}

/// Writes `entry` to `path` via a temp-file-then-rename, so concurrent
/// readers never observe a partial write. Any I/O failure is swallowed:
/// the cache degrades to memory-only and the caller sees no error
/// (fail-open).
pub fn save_to_disk(root: &Path, entry: &CacheEntry) {
    if std::fs::create_dir_all(root).is_err() {
        return;
    }
    let path = cache_path(root, &entry.metadata.key);
    let tmp_path = path.with_extension("cache.tmp");

    let result = (|| -> std::io::Result<()> {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(&[CACHE_FILE_MAGIC])?;
        file.write_all(&[CACHE_FILE_VERSION])?;
        file.write_all(&(entry.data.len() as u64).to_le_bytes())?;
        for sample in &entry.data {
            file.write_all(&sample.to_le_bytes())?;
        }
        file.sync_all()?;
        Ok(())
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
        return;
    }

    if std::fs::rename(&tmp_path, &path).is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
}

/// Loads a raw sample vector from `path`, or `None` if the file is absent,
/// unreadable, or carries an unrecognized magic/version (treated as
/// absent).
pub fn load_from_disk(root: &Path, key: &str) -> Option<Vec<f64>> {
    let path = cache_path(root, key);
    let mut file = std::fs::File::open(path).ok()?;

    let mut header = [0u8; 10];
    file.read_exact(&mut header).ok()?;
    if header[0] != CACHE_FILE_MAGIC || header[1] != CACHE_FILE_VERSION {
        return None;
    }
    let count = u64::from_le_bytes(header[2..10].try_into().ok()?) as usize;

    let mut data = Vec::with_capacity(count);
    let mut buf = [0u8; 8];
    for _ in 0..count {
        file.read_exact(&mut buf).ok()?;
        data.push(f64::from_le_bytes(buf));
    }
    Some(data)
}

/// Removes the on-disk file for `key`, if any. Errors are swallowed.
pub fn remove_from_disk(root: &Path, key: &str) {
    let _ = std::fs::remove_file(cache_path(root, key));
}

/// Removes every `*.cache` file under `root`. Errors are swallowed.
pub fn clear_disk(root: &Path) {
    let Ok(entries) = std::fs::read_dir(root) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("cache") {
            let _ = std::fs::remove_file(path);
        }
    }
}
