//! Finding and parsing input documents.

use std::fs;
use std::path::{Path, PathBuf};

use qdsl_lang::{Node, to_tree};
use rayon::prelude::*;
use regex_lite::Regex;
use walkdir::WalkDir;
use yaml_rust2::YamlLoader;

/// Expands `paths` into the files to load. Directories are walked
/// recursively without following symlinks; paths matching `ignore` are
/// dropped.
pub fn collect_files(paths: &[PathBuf], ignore: Option<&Regex>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        for entry in WalkDir::new(path).follow_links(false).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let file = entry.into_path();
            if ignore.is_some_and(|re| re.is_match(&file.to_string_lossy())) {
                log::debug!("ignoring {}", file.display());
                continue;
            }
            files.push(file);
        }
    }

    files
}

/// Loads every file in parallel, keeping the input order. Files that cannot
/// be read or parsed are skipped with a warning.
pub fn load_files(files: &[PathBuf]) -> Vec<Node> {
    let trees = files
        .par_iter()
        .map(|file| load_file(file))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

    log::debug!("loaded {} documents from {} files", trees.len(), files.len());
    trees
}

fn load_file(path: &Path) -> Vec<Node> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("skipping {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let source = path.display().to_string();
    match parse(&content, path, &source) {
        Ok(trees) => trees,
        Err(e) => {
            log::warn!("skipping {}: {}", source, e);
            Vec::new()
        }
    }
}

/// Parses `content` as JSON when `path` ends in `.json` and as a YAML stream
/// otherwise. Each YAML document becomes its own tree.
pub fn parse(content: &str, path: &Path, source: &str) -> Result<Vec<Node>, Box<dyn std::error::Error + Send + Sync>> {
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        let doc: serde_json::Value = serde_json::from_str(content)?;
        return Ok(vec![to_tree(&doc, Some(source))?]);
    }

    let docs = YamlLoader::load_from_str(content)?;
    let mut trees = Vec::with_capacity(docs.len());
    for (i, doc) in docs.iter().enumerate() {
        match to_tree(doc, Some(source)) {
            Ok(tree) => trees.push(tree),
            Err(e) => log::warn!("skipping document {} of {}: {}", i + 1, source, e),
        }
    }
    Ok(trees)
}
