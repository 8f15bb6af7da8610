use std::io::Write;
use std::{fs::File, path::PathBuf};

pub type TempDir = PathBuf;
pub type TempFile = PathBuf;

/// Writes `content` to `name` inside the system temp directory.
pub fn create_file(name: &str, content: &str) -> (TempDir, TempFile) {
    let temp_dir = std::env::temp_dir();
    let temp_file_path = temp_dir.join(name);
    if let Some(parent) = temp_file_path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create temp directory");
    }
    let mut file = File::create(&temp_file_path).expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");

    (temp_dir, temp_file_path)
}

/// Creates a fresh directory `name` in the system temp directory holding the
/// given `(relative path, content)` files.
pub fn create_dir(name: &str, files: &[(&str, &str)]) -> TempDir {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create temp directory");
        }
        let mut file = File::create(&file_path).expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
    }

    dir
}
