use crate::error::Result;
use crate::identity::registry::write_user_list;
use crate::rank::{Partition, RatingRecord, Ranking, TextRecord};
use csv::{QuoteStyle, WriterBuilder};
use serde_derive::Deserialize;
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const RATES_HEADER: [&str; 4] = ["user", "movie", "rate", "time"];
pub const FILTERED_DIR_NAME: &str = "kmrd-small";
pub const FULL_DIR_NAME: &str = "kmrd";
pub const TEXTS_FILE_NAME: &str = "texts.txt";
pub const USER_LIST_FILE_NAME: &str = "userlist";

/// Which columns accompany the comment text.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TextColumns {
    /// `user movie agree disagree text`
    Votes,
    /// `user movie rate text`
    Rates,
}

impl Default for TextColumns {
    fn default() -> Self {
        TextColumns::Votes
    }
}

impl FromStr for TextColumns {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "votes" => Ok(TextColumns::Votes),
            "rates" => Ok(TextColumns::Rates),
            other => Err(format!("Unknown text columns: {}", other)),
        }
    }
}

impl TextColumns {
    fn header(&self) -> &'static [&'static str] {
        match self {
            TextColumns::Votes => &["user", "movie", "agree", "disagree", "text"],
            TextColumns::Rates => &["user", "movie", "rate", "text"],
        }
    }

    fn row(&self, text: &TextRecord) -> Vec<String> {
        match self {
            TextColumns::Votes => vec![
                text.user.to_string(),
                text.movie.to_string(),
                text.agree.to_string(),
                text.disagree.to_string(),
                text.text.clone(),
            ],
            TextColumns::Rates => vec![
                text.user.to_string(),
                text.movie.to_string(),
                text.rate.to_string(),
                text.text.clone(),
            ],
        }
    }
}

/// The size label used in full rates file names, e.g. `2m` for about two
/// million rows with the default unit.
pub fn volume_label(rows: usize, unit: usize) -> String {
    let unit = unit.max(1);
    let volume = (rows + unit / 2) / unit;

    match unit {
        1_000_000 => format!("{}m", volume),
        1_000 => format!("{}k", volume),
        1 => volume.to_string(),
        _ => format!("{}x{}", volume, unit),
    }
}

pub fn write_ratings<W: Write>(out: W, ratings: &[RatingRecord]) -> Result<()> {
    let mut csv = WriterBuilder::new().from_writer(out);
    csv.write_record(&RATES_HEADER)?;

    for rating in ratings {
        csv.write_record(&[
            rating.user.to_string(),
            rating.movie.to_string(),
            rating.rate.to_string(),
            rating.time.to_string(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

pub fn write_texts<W: Write>(out: W, texts: &[TextRecord], columns: TextColumns) -> Result<()> {
    let mut csv = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Necessary)
        .from_writer(out);
    csv.write_record(columns.header())?;

    for text in texts {
        csv.write_record(&columns.row(text))?;
    }

    csv.flush()?;
    Ok(())
}

/// Writes both dataset variants under a base directory.
pub struct DatasetWriter {
    base: Box<Path>,
    text_columns: TextColumns,
    volume_unit: usize,
}

impl DatasetWriter {
    pub fn new<P: AsRef<Path>>(base: P, text_columns: TextColumns, volume_unit: usize) -> Self {
        DatasetWriter {
            base: base.as_ref().to_path_buf().into_boxed_path(),
            text_columns,
            volume_unit,
        }
    }

    pub fn filtered_dir(&self) -> PathBuf {
        self.base.join(FILTERED_DIR_NAME)
    }

    pub fn full_dir(&self) -> PathBuf {
        self.base.join(FULL_DIR_NAME)
    }

    /// Writes every output file and returns their paths in write order.
    pub fn write(&self, ranking: &Ranking) -> Result<Vec<PathBuf>> {
        let full_rates = format!(
            "rates-{}.csv",
            volume_label(ranking.full.ratings.len(), self.volume_unit)
        );

        let mut written = self.write_partition(&self.filtered_dir(), "rates.csv", &ranking.filtered)?;
        written.extend(self.write_partition(&self.full_dir(), &full_rates, &ranking.full)?);

        Ok(written)
    }

    pub fn write_partition(
        &self,
        dir: &Path,
        rates_file_name: &str,
        partition: &Partition,
    ) -> Result<Vec<PathBuf>> {
        create_dir_all(dir)?;

        let rates_path = dir.join(rates_file_name);
        write_ratings(File::create(&rates_path)?, &partition.ratings)?;
        log::info!("Wrote {} ratings to {:?}", partition.ratings.len(), rates_path);

        let texts_path = dir.join(TEXTS_FILE_NAME);
        write_texts(
            File::create(&texts_path)?,
            &partition.texts,
            self.text_columns,
        )?;
        log::info!("Wrote {} texts to {:?}", partition.texts.len(), texts_path);

        let users_path = dir.join(USER_LIST_FILE_NAME);
        write_user_list(&users_path, &partition.users)?;
        log::info!("Wrote {} users to {:?}", partition.users.len(), users_path);

        Ok(vec![rates_path, texts_path, users_path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_labels() {
        assert_eq!(volume_label(2_167_619, 1_000_000), "2m");
        assert_eq!(volume_label(4_600_000, 1_000_000), "5m");
        assert_eq!(volume_label(12_400, 1_000), "12k");
        assert_eq!(volume_label(7, 1), "7");
        assert_eq!(volume_label(10, 4), "3x4");
    }

    #[test]
    fn write_ratings_with_header() {
        let mut buffer = vec![];
        let ratings = vec![
            RatingRecord { user: 0, movie: 10107, rate: 8, time: 1548246840 },
            RatingRecord { user: 1, movie: 39516, rate: 10, time: 1548201600 },
        ];

        write_ratings(&mut buffer, &ratings).unwrap();

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "user,movie,rate,time\n0,10107,8,1548246840\n1,39516,10,1548201600\n"
        );
    }

    #[test]
    fn write_texts_in_both_layouts() {
        let texts = vec![TextRecord {
            user: 3,
            movie: 10107,
            agree: 4,
            disagree: 1,
            text: "so good".to_string(),
            rate: 9,
        }];

        let mut votes = vec![];
        write_texts(&mut votes, &texts, TextColumns::Votes).unwrap();
        assert_eq!(
            String::from_utf8(votes).unwrap(),
            "user\tmovie\tagree\tdisagree\ttext\n3\t10107\t4\t1\tso good\n"
        );

        let mut rates = vec![];
        write_texts(&mut rates, &texts, TextColumns::Rates).unwrap();
        assert_eq!(
            String::from_utf8(rates).unwrap(),
            "user\tmovie\trate\ttext\n3\t10107\t9\tso good\n"
        );
    }
}
