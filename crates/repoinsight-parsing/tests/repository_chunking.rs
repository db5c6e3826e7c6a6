//! Scanner + chunker over a realistic repository layout

use repoinsight_config::ApplicationConfig;
use repoinsight_parsing::{
    read_file_content, CodeChunker, FileContent, FileScanner, FileType,
};
use std::path::Path;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(
        root,
        "src/service.py",
        r#"import json
import logging

logger = logging.getLogger(__name__)

DEFAULT_LIMIT = 10

class SearchService:
    def __init__(self, store):
        self.store = store

    def search(self, query, limit=DEFAULT_LIMIT):
        results = self.store.query(query)
        return results[:limit]

def build_service(store):
    return SearchService(store)
"#,
    );
    write(
        root,
        "web/handler.js",
        r#"import { search } from "./search";

export function handleRequest(request) {
    const results = search(request.query);
    return { status: 200, body: JSON.stringify(results) };
}

class RequestLogger {
    log(request) {
        console.log(request.path);
    }
}
"#,
    );
    write(
        root,
        "core/src/lib.rs",
        r#"use std::collections::HashMap;

pub struct Index {
    entries: HashMap<String, usize>,
}

impl Index {
    pub fn insert(&mut self, key: String) {
        let next = self.entries.len();
        self.entries.entry(key).or_insert(next);
    }
}
"#,
    );
    write(root, "README.md", "# Fixture\n\nA small multi-language fixture.\n");
    write(root, "Dockerfile", "FROM rust:1.85\nRUN cargo build --release\n");
    write(root, ".gitignore", "target/\n*.log\n");
    write(root, "target/debug/build.rs", "fn main() {}");
    write(root, "server.log", "should be ignored");
    dir
}

#[test]
fn fixture_repository_chunks_cleanly() {
    let config = ApplicationConfig::default();
    let scanner = FileScanner::from_config(&config.scanner);
    let chunker = CodeChunker::new(config.chunking);

    let fixture = fixture();
    let files = scanner.scan(fixture.path()).unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();

    // Gitignore and binary rules applied during the walk
    assert!(paths.contains(&"src/service.py"));
    assert!(paths.contains(&"web/handler.js"));
    assert!(paths.contains(&"core/src/lib.rs"));
    assert!(paths.contains(&"README.md"));
    assert!(paths.contains(&"Dockerfile"));
    assert!(!paths.iter().any(|p| p.starts_with("target/")));
    assert!(!paths.contains(&"server.log"));

    let mut total_chunks = 0;
    let mut languages_seen = Vec::new();

    for file in &files {
        let content = match read_file_content(&file.absolute_path, config.chunking.max_file_size_bytes)
            .unwrap()
        {
            FileContent::Text(text) => text,
            other => panic!("fixture file {} not readable: {other:?}", file.relative_path),
        };

        let chunks = chunker.chunk_file(&content, &file.relative_path, file.file_type, file.language);
        assert!(
            !chunks.is_empty(),
            "no chunks for {}",
            file.relative_path
        );
        total_chunks += chunks.len();

        for (index, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata.chunk_index, index);
            assert!(chunk.metadata.start_line <= chunk.metadata.end_line);
            assert!(
                chunk.non_whitespace_len() <= config.chunking.max_chunk_size,
                "oversize chunk in {}",
                file.relative_path
            );
            assert_eq!(chunk.metadata.file_path, file.relative_path);

            // Every metadata value must be storable as a scalar
            for value in chunk.metadata_map().values() {
                assert!(value.is_string() || value.is_number() || value.is_boolean());
            }
        }

        if file.file_type == FileType::Code {
            if let Some(language) = file.language {
                languages_seen.push(language);
            }
        }
    }

    assert!(total_chunks >= files.len());
    for expected in ["python", "javascript", "rust"] {
        assert!(
            languages_seen.contains(&expected),
            "missing language {expected}"
        );
    }
}

#[test]
fn code_chunks_carry_element_names() {
    let config = ApplicationConfig::default();
    let chunker = CodeChunker::new(config.chunking);
    let fixture = fixture();

    let content = std::fs::read_to_string(fixture.path().join("src/service.py")).unwrap();
    let chunks = chunker.chunk_file(&content, "src/service.py", FileType::Code, Some("python"));

    let mut names: Vec<String> = Vec::new();
    for chunk in &chunks {
        match &chunk.metadata.merged_names {
            Some(merged) => names.extend(merged.clone()),
            None => names.push(chunk.metadata.element_name.clone()),
        }
    }

    for expected in ["SearchService", "build_service"] {
        assert!(
            names.iter().any(|n| n == expected),
            "missing element {expected} in {names:?}"
        );
    }
}
