pub mod record;
pub mod time;

pub use record::{CandidateRecord, ParseError, ParsedSource, RecordParser};
pub use time::TimeParser;

use flate2::read::GzDecoder;
use serde_derive::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{read_dir, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How raw comment files are laid out on disk.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// One file per user source, named by the source identifier.
    Users,
    /// One file per movie, named by the movie id, each record carrying a `user` field.
    Movies,
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Users
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" => Ok(Layout::Users),
            "movies" => Ok(Layout::Movies),
            other => Err(format!("Unknown layout: {}", other)),
        }
    }
}

/// One user source: an opaque name and its raw, unvalidated records.
#[derive(Clone, Debug, PartialEq)]
pub struct Source {
    pub name: String,
    pub records: Vec<Value>,
}

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("I/O error for {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        error: io::Error,
    },
    #[error("JSON error for {path:?} at line {line}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        error: serde_json::Error,
    },
    #[error("Not a list of records: {0:?}")]
    NotList(PathBuf),
    #[error("Invalid source file name: {0:?}")]
    InvalidName(PathBuf),
}

type SourceResult<T> = Result<T, SourceError>;

/// Enumerates raw sources under a directory in a deterministic order.
pub struct SourceReader {
    base: Box<Path>,
    layout: Layout,
}

impl SourceReader {
    const EXTENSIONS: [&'static str; 3] = [".gz", ".jsonl", ".json"];

    pub fn new<P: AsRef<Path>>(path: P, layout: Layout) -> Self {
        SourceReader {
            base: path.as_ref().to_path_buf().into_boxed_path(),
            layout,
        }
    }

    /// Regular files under the base directory, sorted by source name.
    ///
    /// Per-movie files are sorted by numeric movie id, with non-numeric names
    /// last.
    pub fn paths(&self) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();

        for entry in read_dir(&self.base)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                paths.push(entry.path());
            }
        }

        match self.layout {
            Layout::Users => paths.sort_by_key(|path| (source_name(path), path.clone())),
            Layout::Movies => paths.sort_by_key(|path| {
                let name = source_name(path);
                let movie = name.as_deref().and_then(|name| name.parse::<u64>().ok());
                (movie.is_none(), movie, name, path.clone())
            }),
        }

        Ok(paths)
    }

    /// Sources in scan order.
    ///
    /// Failing to list the base directory is fatal; failing to read any single
    /// file yields an error item in place of that file's source.
    pub fn sources(&self) -> io::Result<Box<dyn Iterator<Item = SourceResult<Source>>>> {
        let paths = self.paths()?;

        Ok(match self.layout {
            Layout::Users => Box::new(paths.into_iter().map(|path| -> SourceResult<Source> {
                let name =
                    source_name(&path).ok_or_else(|| SourceError::InvalidName(path.clone()))?;
                let records = load_records(&path)?;

                Ok(Source { name, records })
            })),
            Layout::Movies => Box::new(group_by_user(paths).into_iter()),
        })
    }
}

/// Regroups per-movie comment files into per-user sources.
///
/// Sources are ordered by first appearance of their user. Records without a
/// movie field take the movie id from the file name.
fn group_by_user(paths: Vec<PathBuf>) -> Vec<SourceResult<Source>> {
    let mut results: Vec<SourceResult<Source>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut orphans = 0;

    for path in paths {
        let records = match load_records(&path) {
            Ok(records) => records,
            Err(error) => {
                results.push(Err(error));
                continue;
            }
        };
        let movie = source_name(&path).and_then(|name| name.parse::<u64>().ok());

        for mut record in records {
            let user = match record.get("user") {
                Some(Value::String(user)) => user.clone(),
                Some(Value::Number(user)) => user.to_string(),
                _ => {
                    orphans += 1;
                    continue;
                }
            };

            if let (Some(fields), Some(movie)) = (record.as_object_mut(), movie) {
                if !fields.contains_key("movie_idx") && !fields.contains_key("movie") {
                    fields.insert("movie_idx".to_string(), Value::from(movie));
                }
            }

            match positions.get(&user) {
                Some(position) => {
                    if let Some(Ok(source)) = results.get_mut(*position) {
                        source.records.push(record);
                    }
                }
                None => {
                    positions.insert(user.clone(), results.len());
                    results.push(Ok(Source {
                        name: user,
                        records: vec![record],
                    }));
                }
            }
        }
    }

    if orphans > 0 {
        log::warn!("Dropped {} records without a user field", orphans);
    }

    results
}

/// The source name for a file: its file name without data-file extensions.
pub fn source_name<P: AsRef<Path>>(path: P) -> Option<String> {
    let mut name = path.as_ref().file_name()?.to_str()?;

    for extension in &SourceReader::EXTENSIONS {
        if let Some(stripped) = name.strip_suffix(extension) {
            name = stripped;
        }
    }

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Reads a list of raw records from a JSON array or JSON-lines file.
///
/// Files ending in `.gz` are decompressed first.
pub fn load_records<P: AsRef<Path>>(p: P) -> SourceResult<Vec<Value>> {
    let path = p.as_ref();
    let io_error = |error| SourceError::Io {
        path: path.to_path_buf(),
        error,
    };

    let file = File::open(path).map_err(io_error)?;
    let mut doc = String::new();

    let read = if path.extension().and_then(|ext| ext.to_str()) == Some("gz") {
        GzDecoder::new(file).read_to_string(&mut doc)
    } else {
        io::BufReader::new(file).read_to_string(&mut doc)
    };
    read.map_err(io_error)?;

    parse_records(path, &doc)
}

fn parse_records(path: &Path, doc: &str) -> SourceResult<Vec<Value>> {
    if doc.trim_start().starts_with('[') {
        match serde_json::from_str::<Value>(doc) {
            Ok(Value::Array(records)) => Ok(records),
            Ok(_) => Err(SourceError::NotList(path.to_path_buf())),
            Err(error) => Err(SourceError::Json {
                path: path.to_path_buf(),
                line: error.line(),
                error,
            }),
        }
    } else {
        doc.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str::<Value>(line.trim()).map_err(|error| SourceError::Json {
                    path: path.to_path_buf(),
                    line: index + 1,
                    error,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn source_name_strips_extensions() {
        assert_eq!(source_name("data/8215405"), Some("8215405".to_string()));
        assert_eq!(source_name("data/8215405.json.gz"), Some("8215405".to_string()));
        assert_eq!(source_name("data/alice.jsonl"), Some("alice".to_string()));
        assert_eq!(source_name("data/.gz"), None);
    }

    #[test]
    fn parse_records_json_lines_and_array() {
        let path = Path::new("test");
        let lines = "{\"idx\": 1}\n\n{\"idx\": 2}\n";
        let array = "[{\"idx\": 1}, {\"idx\": 2}]";

        let expected = vec![json!({"idx": 1}), json!({"idx": 2})];

        assert_eq!(parse_records(path, lines).unwrap(), expected);
        assert_eq!(parse_records(path, array).unwrap(), expected);
    }

    #[test]
    fn parse_records_failures() {
        let path = Path::new("test");

        match parse_records(path, "{\"idx\": 1}\n{broken\n") {
            Err(SourceError::Json { line, .. }) => assert_eq!(line, 2),
            other => panic!("Unexpected result: {:?}", other),
        }

        assert!(matches!(
            parse_records(path, "[1, 2"),
            Err(SourceError::Json { .. })
        ));
    }

    #[test]
    fn reader_users_layout_is_sorted_and_tolerant() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bob"), "{\"idx\": 2}\n").unwrap();
        std::fs::write(dir.path().join("alice.json"), "[{\"idx\": 1}]").unwrap();
        std::fs::write(dir.path().join("carol"), "not json").unwrap();

        let mut gz = GzEncoder::new(
            File::create(dir.path().join("dave.gz")).unwrap(),
            Compression::default(),
        );
        gz.write_all(b"{\"idx\": 4}\n").unwrap();
        gz.finish().unwrap();

        let reader = SourceReader::new(dir.path(), Layout::Users);
        let sources = reader.sources().unwrap().collect::<Vec<_>>();

        assert_eq!(sources.len(), 4);
        assert_eq!(sources[0].as_ref().unwrap().name, "alice");
        assert_eq!(sources[1].as_ref().unwrap().name, "bob");
        assert!(matches!(sources[2], Err(SourceError::Json { .. })));
        assert_eq!(
            sources[3].as_ref().unwrap(),
            &Source {
                name: "dave".to_string(),
                records: vec![json!({"idx": 4})]
            }
        );
    }

    #[test]
    fn reader_orders_same_name_files_by_path() {
        let dir = tempfile::tempdir().unwrap();
        for name in &["alice.json", "alice.gz", "alice", "alice.jsonl"] {
            std::fs::write(dir.path().join(name), "[]").unwrap();
        }

        let reader = SourceReader::new(dir.path(), Layout::Users);
        let names = reader
            .paths()
            .unwrap()
            .into_iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["alice", "alice.gz", "alice.json", "alice.jsonl"]);
    }

    #[test]
    fn reader_movies_layout_groups_by_user() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("100"),
            "{\"user\": \"b\", \"idx\": 1}\n{\"user\": 7, \"idx\": 2}\n{\"idx\": 3}\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("20"),
            "{\"user\": \"a\", \"idx\": 4}\n{\"user\": \"b\", \"idx\": 5, \"movie_idx\": 1}\n",
        )
        .unwrap();

        let reader = SourceReader::new(dir.path(), Layout::Movies);
        let sources = reader
            .sources()
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        let names = sources.iter().map(|s| s.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "b", "7"]);
        assert_eq!(
            sources[1].records,
            vec![
                json!({"user": "b", "idx": 5, "movie_idx": 1}),
                json!({"user": "b", "idx": 1, "movie_idx": 100}),
            ]
        );
    }
}
