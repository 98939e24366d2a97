use super::writer::{FILTERED_DIR_NAME, FULL_DIR_NAME, TEXTS_FILE_NAME, USER_LIST_FILE_NAME};
use crate::error::{Error, Result};
use csv::ReaderBuilder;
use itertools::Itertools;
use serde_derive::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::path::{Path, PathBuf};

pub const SIZES: [&str; 3] = ["small", "2m", "5m"];

/// Locations of one dataset variant's files.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DatasetPaths {
    pub rates: PathBuf,
    pub texts: PathBuf,
    pub users: PathBuf,
}

impl DatasetPaths {
    /// Resolves the files for a dataset size under `directory`.
    ///
    /// `small` is the filtered variant; any other size names a full rates
    /// file such as `rates-2m.csv`. Unknown sizes are rejected unless `force`
    /// is set.
    pub fn resolve<P: AsRef<Path>>(directory: P, size: &str, force: bool) -> Result<Self> {
        if !force && !SIZES.contains(&size) {
            return Err(Error::InvalidSize(size.to_string()));
        }

        let (dir, rates_file_name) = if size == "small" {
            (directory.as_ref().join(FILTERED_DIR_NAME), "rates.csv".to_string())
        } else {
            (
                directory.as_ref().join(FULL_DIR_NAME),
                format!("rates-{}.csv", size),
            )
        };

        let paths = DatasetPaths {
            rates: dir.join(rates_file_name),
            texts: dir.join(TEXTS_FILE_NAME),
            users: dir.join(USER_LIST_FILE_NAME),
        };

        if paths.rates.is_file() {
            Ok(paths)
        } else {
            Err(Error::MissingFile(paths.rates))
        }
    }
}

#[derive(Debug, Deserialize)]
struct RateRow {
    user: u64,
    movie: u64,
    rate: i64,
    time: i64,
}

/// A ratings table in coordinate form: row `i` of each column is one rating.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RateTable {
    pub users: Vec<u64>,
    pub movies: Vec<u64>,
    pub rates: Vec<i64>,
    pub times: Vec<i64>,
    /// Rows dropped because their `(user, movie)` pair was already present.
    pub skipped: usize,
}

impl RateTable {
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn check(&self) -> Result<()> {
        let n = self.users.len();

        if self.movies.len() == n && self.rates.len() == n && self.times.len() == n {
            Ok(())
        } else {
            Err(Error::Inconsistent(format!(
                "column lengths differ: {} users, {} movies, {} rates, {} times",
                n,
                self.movies.len(),
                self.rates.len(),
                self.times.len()
            )))
        }
    }

    pub fn describe(&self) -> Description {
        let n_rows = self.users.iter().max().map_or(0, |max| max + 1);
        let n_cols = self.movies.iter().max().map_or(0, |max| max + 1);
        let n_unique_rows = self.users.iter().unique().count() as u64;
        let n_unique_cols = self.movies.iter().unique().count() as u64;

        Description {
            n_rows,
            n_cols,
            n_unique_rows,
            n_unique_cols,
            nnz: self.len() as u64,
        }
    }
}

/// Reads a `user,movie,rate,time` table, keeping the first rating of each
/// `(user, movie)` pair.
pub fn load_rates<P: AsRef<Path>>(path: P) -> Result<RateTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(File::open(path.as_ref())?);
    let mut table = RateTable::default();
    let mut exists = HashSet::new();

    for result in reader.deserialize() {
        let row: RateRow = result?;

        if exists.insert((row.user, row.movie)) {
            table.users.push(row.user);
            table.movies.push(row.movie);
            table.rates.push(row.rate);
            table.times.push(row.time);
        } else {
            table.skipped += 1;
        }
    }

    if table.skipped > 0 {
        table.check()?;
        log::info!("Skipped {} lines, #uniques={}", table.skipped, table.len());
    }

    Ok(table)
}

/// Per-user `(movie, rate, time)` histories in file order.
pub fn load_histories<P: AsRef<Path>>(path: P) -> Result<BTreeMap<u64, Vec<(u64, i64, i64)>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(File::open(path.as_ref())?);
    let mut histories: BTreeMap<u64, Vec<(u64, i64, i64)>> = BTreeMap::new();

    for result in reader.deserialize() {
        let row: RateRow = result?;
        histories
            .entry(row.user)
            .or_insert_with(Vec::new)
            .push((row.movie, row.rate, row.time));
    }

    Ok(histories)
}

/// Shape and sparsity of a ratings table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Description {
    pub n_rows: u64,
    pub n_cols: u64,
    pub n_unique_rows: u64,
    pub n_unique_cols: u64,
    pub nnz: u64,
}

impl Description {
    pub fn sparsity(&self) -> f64 {
        Self::ratio_missing(self.nnz, self.n_rows * self.n_cols)
    }

    /// Sparsity when only users and movies that occur are counted.
    pub fn compact_sparsity(&self) -> f64 {
        Self::ratio_missing(self.nnz, self.n_unique_rows * self.n_unique_cols)
    }

    fn ratio_missing(nnz: u64, cells: u64) -> f64 {
        if cells == 0 {
            0.0
        } else {
            1.0 - nnz as f64 / cells as f64
        }
    }

    fn percent(part: u64, whole: u64) -> f64 {
        if whole == 0 {
            0.0
        } else {
            100.0 * part as f64 / whole as f64
        }
    }
}

impl Display for Description {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        writeln!(f, " - num user : {}", self.n_rows)?;
        writeln!(f, " - num item : {}", self.n_cols)?;
        writeln!(
            f,
            " - num unique user : {} ({:.4} %)",
            self.n_unique_rows,
            Self::percent(self.n_unique_rows, self.n_rows)
        )?;
        writeln!(
            f,
            " - num unique item : {} ({:.4} %)",
            self.n_unique_cols,
            Self::percent(self.n_unique_cols, self.n_cols)
        )?;
        writeln!(f, " - num of nonzero : {}", self.nnz)?;
        writeln!(f, " - sparsity : {}", self.sparsity())?;
        write!(f, " - sparsity (compacted) : {}", self.compact_sparsity())
    }
}
