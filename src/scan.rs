use crate::identity::{submission_key, Decision, DuplicateIndex, UserRegistry};
use crate::source::{CandidateRecord, RecordParser, Source, SourceError};
use serde_derive::Serialize;

const PROGRESS_INTERVAL: usize = 10_000;

/// A candidate record tagged with the scan-time user index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AcceptedRecord {
    pub user: usize,
    pub comment_id: u64,
    pub movie_id: u64,
    pub rating: i64,
    pub unix_time: i64,
    pub text: String,
    pub agree: u64,
    pub disagree: u64,
}

impl AcceptedRecord {
    fn new(user: usize, record: CandidateRecord) -> Self {
        AcceptedRecord {
            user,
            comment_id: record.comment_id,
            movie_id: record.movie_id,
            rating: record.rating,
            unix_time: record.unix_time,
            text: record.text,
            agree: record.agree,
            disagree: record.disagree,
        }
    }
}

/// Diagnostic counters. None of these feed back into scan decisions.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ScanStats {
    pub sources: usize,
    pub unreadable: usize,
    pub empty: usize,
    pub similar: usize,
    pub duplicates: usize,
    pub merged: usize,
    pub exceptions: usize,
    pub repeated: usize,
    pub users: usize,
    pub records: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Accepted { user: usize },
    Merged { user: usize },
    Duplicate { of: usize },
    Empty,
}

/// Everything a completed scan hands to the ranker.
#[derive(Debug)]
pub struct ScanResult {
    pub records: Vec<AcceptedRecord>,
    pub registry: UserRegistry,
    pub stats: ScanStats,
}

pub struct Scanner {
    parser: RecordParser,
    index: DuplicateIndex,
    registry: UserRegistry,
    records: Vec<AcceptedRecord>,
    stats: ScanStats,
}

impl Scanner {
    pub fn new(parser: RecordParser) -> Self {
        Scanner {
            parser,
            index: DuplicateIndex::new(),
            registry: UserRegistry::new(),
            records: Vec::new(),
            stats: ScanStats::default(),
        }
    }

    /// Scans every source in order, skipping the unreadable ones.
    pub fn scan<I: IntoIterator<Item = Result<Source, SourceError>>>(&mut self, sources: I) {
        for source in sources {
            match source {
                Ok(source) => {
                    self.scan_source(&source);
                }
                Err(error) => self.skip(&error),
            }

            let seen = self.stats.sources + self.stats.unreadable;
            if seen % PROGRESS_INTERVAL == 0 {
                log::info!(
                    "Scanned {} rates from {} users ({} sources)",
                    self.records.len(),
                    self.index.len(),
                    seen
                );
            }
        }
    }

    pub fn skip(&mut self, error: &SourceError) {
        log::warn!("Skipping unreadable source: {}", error);
        self.stats.unreadable += 1;
    }

    pub fn scan_source(&mut self, source: &Source) -> Outcome {
        self.stats.sources += 1;

        let parsed = self.parser.parse_source(&source.records);
        self.stats.repeated += parsed.repeated;
        self.stats.exceptions += parsed.errors.len();

        for error in &parsed.errors {
            log::debug!("Invalid record in {}: {}", source.name, error);
        }

        if parsed.records.is_empty() {
            self.stats.empty += 1;
            return Outcome::Empty;
        }

        let key = submission_key(&parsed.records);

        let (user, outcome, added) = match self.index.check(&key) {
            Decision::Duplicate { of } => {
                log::debug!(
                    "Dropping {} as a duplicate of {}",
                    source.name,
                    self.registry.name(of).unwrap_or_default()
                );
                self.stats.similar += 1;
                self.stats.duplicates += 1;
                return Outcome::Duplicate { of };
            }
            Decision::Accept { similar } => {
                if similar {
                    self.stats.similar += 1;
                }

                match self.registry.index(&source.name) {
                    Some(user) => {
                        log::warn!("Merging repeated source name {} into one user", source.name);
                        let added = self.index.extend(user, key);
                        self.stats.merged += 1;
                        (user, Outcome::Merged { user }, Some(added))
                    }
                    None => {
                        let user = self.index.register(key);
                        let registered = self.registry.insert(&source.name);
                        debug_assert_eq!(user, registered);
                        (user, Outcome::Accepted { user }, None)
                    }
                }
            }
        };

        self.records.extend(
            parsed
                .records
                .into_iter()
                .filter(|record| {
                    added
                        .as_ref()
                        .map_or(true, |added| added.contains(&record.submission()))
                })
                .map(|record| AcceptedRecord::new(user, record)),
        );

        outcome
    }

    pub fn finish(self) -> ScanResult {
        let mut stats = self.stats;
        stats.users = self.registry.len();
        stats.records = self.records.len();

        log::info!(
            "Scanned {} sources: {} users, {} records, {} duplicates dropped, {} similar, {} exceptions, {} unreadable, {} empty",
            stats.sources,
            stats.users,
            stats.records,
            stats.duplicates,
            stats.similar,
            stats.exceptions,
            stats.unreadable,
            stats.empty
        );

        ScanResult {
            records: self.records,
            registry: self.registry,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::TimeParser;
    use serde_json::{json, Value};
    use std::path::PathBuf;

    fn comment(idx: u64, movie: u64, score: i64, written_at: &str) -> Value {
        json!({"idx": idx, "movie_idx": movie, "score": score, "written_at": written_at})
    }

    fn source(name: &str, records: Vec<Value>) -> Source {
        Source {
            name: name.to_string(),
            records,
        }
    }

    fn scanner() -> Scanner {
        Scanner::new(RecordParser::new(TimeParser::new(0).unwrap()))
    }

    #[test]
    fn identical_source_is_accepted_once() {
        let records = vec![
            comment(1, 10, 8, "20.01.01 10:00"),
            comment(2, 11, 6, "20.01.02 10:00"),
        ];
        let mut scanner = scanner();

        assert_eq!(
            scanner.scan_source(&source("a", records.clone())),
            Outcome::Accepted { user: 0 }
        );
        assert_eq!(
            scanner.scan_source(&source("b", records)),
            Outcome::Duplicate { of: 0 }
        );

        let result = scanner.finish();
        assert_eq!(result.stats.users, 1);
        assert_eq!(result.stats.duplicates, 1);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.registry.names(), &["a".to_string()]);
    }

    #[test]
    fn overlapping_ids_with_different_times_survive() {
        let mut scanner = scanner();

        scanner.scan_source(&source("a", vec![comment(1, 10, 8, "20.01.01 10:00")]));
        let outcome = scanner.scan_source(&source(
            "b",
            vec![
                comment(1, 10, 8, "20.01.01 11:00"),
                comment(5, 12, 2, "20.01.03"),
            ],
        ));

        assert_eq!(outcome, Outcome::Accepted { user: 1 });

        let result = scanner.finish();
        assert_eq!(result.stats.similar, 1);
        assert_eq!(result.stats.duplicates, 0);
        assert_eq!(result.stats.users, 2);
        assert_eq!(result.records.len(), 3);
    }

    #[test]
    fn empty_and_unreadable_sources_allocate_nothing() {
        let mut scanner = scanner();

        scanner.scan(vec![
            Ok(source("bad", vec![json!({"idx": "?"})])),
            Err(SourceError::NotList(PathBuf::from("x"))),
            Ok(source("good", vec![comment(1, 10, 8, "20.01.01")])),
        ]);

        let result = scanner.finish();
        assert_eq!(result.stats.sources, 2);
        assert_eq!(result.stats.empty, 1);
        assert_eq!(result.stats.unreadable, 1);
        assert_eq!(result.stats.exceptions, 1);
        assert_eq!(result.registry.index("good"), Some(0));
        assert_eq!(result.records[0].user, 0);
    }

    #[test]
    fn repeated_name_is_merged() {
        let mut scanner = scanner();

        scanner.scan_source(&source("a", vec![comment(1, 10, 8, "20.01.01")]));
        let outcome = scanner.scan_source(&source("a", vec![comment(2, 11, 8, "20.01.01")]));

        assert_eq!(outcome, Outcome::Merged { user: 0 });

        let result = scanner.finish();
        assert_eq!(result.stats.users, 1);
        assert_eq!(result.records.len(), 2);
    }

    #[test]
    fn repeated_name_keeps_known_submissions_once() {
        let mut scanner = scanner();

        scanner.scan_source(&source("alice", vec![comment(1, 10, 8, "19.01.23")]));
        let outcome = scanner.scan_source(&source(
            "alice",
            vec![comment(1, 10, 8, "19.01.23"), comment(2, 11, 6, "19.01.24")],
        ));

        assert_eq!(outcome, Outcome::Merged { user: 0 });

        let result = scanner.finish();
        assert_eq!(result.stats.records, 2);
        assert_eq!(
            result
                .records
                .iter()
                .map(|record| (record.user, record.comment_id, record.unix_time))
                .collect::<Vec<_>>(),
            vec![(0, 1, 1548201600), (0, 2, 1548288000)]
        );
    }
}
