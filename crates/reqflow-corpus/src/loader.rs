//! Corpus loading.
//!
//! Enumerates requirement sources under a directory and parses them.
//! Each document's parse is independent, so files are parsed on
//! separate workers and merged only at the end; per-file failures are
//! reported without discarding the documents that did parse.

use std::path::{Path, PathBuf};

use futures::future::join_all;
use reqflow_core::{Issue, IssueKind, ParseReport};
use reqflow_parser::parse_document;
use tokio::fs;
use tracing::{debug, instrument};

use crate::corpus::Corpus;
use crate::error::CorpusError;

/// File extensions recognized as requirement sources.
const EXTENSIONS: [&str; 2] = ["md", "req"];

/// One file that failed to parse.
#[derive(Debug)]
pub struct LoadFailure {
    /// Source path.
    pub path: PathBuf,
    /// Every violation found in that file.
    pub report: ParseReport,
}

/// Result of loading a directory.
#[derive(Debug)]
pub struct LoadedCorpus {
    /// Documents that parsed completely.
    pub corpus: Corpus,
    /// Files that failed, with their full violation lists.
    pub failures: Vec<LoadFailure>,
    /// Non-fatal warnings from successful parses, keyed by document ID.
    pub warnings: Vec<(String, Vec<Issue>)>,
}

/// Load every requirement source under `root`, recursively.
#[instrument(skip_all, fields(root = %root.as_ref().display()))]
pub async fn load_dir(root: impl AsRef<Path>) -> Result<LoadedCorpus, CorpusError> {
    let files = enumerate(root.as_ref()).await?;
    debug!(count = files.len(), "enumerated requirement sources");

    // Parsing is CPU-bound and independent per file; each worker owns
    // its document until the merge below.
    let tasks = files.into_iter().map(|path| async move {
        let bytes = fs::read(&path).await;
        let parsed = tokio::task::spawn_blocking(move || match bytes {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => parse_document(&text).map_err(ParseFail::Report),
                Err(_) => Err(ParseFail::Report(ParseReport {
                    document_id: None,
                    issues: vec![Issue::new(
                        IssueKind::Encoding,
                        "file is not valid UTF-8",
                    )],
                })),
            },
            Err(e) => Err(ParseFail::Io(e)),
        })
        .await;
        (path, parsed)
    });

    let mut corpus = Corpus::new();
    let mut failures = Vec::new();
    let mut warnings = Vec::new();

    for (path, parsed) in join_all(tasks).await {
        let parsed = parsed.map_err(|e| CorpusError::Io(std::io::Error::other(e)))?;
        match parsed {
            Ok(outcome) => {
                if !outcome.warnings.is_empty() {
                    warnings.push((outcome.document.id.clone(), outcome.warnings.clone()));
                }
                if let Err(CorpusError::DuplicateId { id }) = corpus.insert(outcome.document) {
                    failures.push(LoadFailure {
                        path,
                        report: ParseReport {
                            document_id: Some(id.clone()),
                            issues: vec![Issue::new(
                                IssueKind::Schema,
                                format!("requirement id {id} already defined by another file"),
                            )],
                        },
                    });
                }
            }
            Err(ParseFail::Report(report)) => failures.push(LoadFailure { path, report }),
            Err(ParseFail::Io(e)) => return Err(e.into()),
        }
    }

    Ok(LoadedCorpus {
        corpus,
        failures,
        warnings,
    })
}

enum ParseFail {
    Report(ParseReport),
    Io(std::io::Error),
}

async fn enumerate(root: &Path) -> Result<Vec<PathBuf>, CorpusError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| EXTENSIONS.contains(&e))
            {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
