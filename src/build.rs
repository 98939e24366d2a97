use crate::config::BuildConfig;
use crate::dataset::digest::FileDigest;
use crate::dataset::writer::DatasetWriter;
use crate::error::{Error, Result};
use crate::rank::split_by_min_count;
use crate::reports::{BuildReport, Report};
use crate::scan::Scanner;
use crate::source::{RecordParser, SourceReader, TimeParser};
use std::fs::create_dir_all;

pub const REPORT_FILE_NAME: &str = "BUILD.md";

/// Runs one full dataset build.
///
/// Nothing is written until every source has been scanned and the users
/// have been ranked.
pub fn build(config: &BuildConfig) -> Result<BuildReport> {
    let time = TimeParser::new(config.utc_offset_hours)
        .ok_or(Error::InvalidOffset(config.utc_offset_hours))?;
    let reader = SourceReader::new(&config.data_dir, config.layout);
    let sources = reader.sources()?;

    log::info!("Scanning sources in {:?}", config.data_dir);

    let mut scanner = Scanner::new(RecordParser::new(time));
    match config.limit {
        Some(limit) => scanner.scan(sources.take(limit)),
        None => scanner.scan(sources),
    }
    let scanned = scanner.finish();

    let ranking = split_by_min_count(
        &scanned.records,
        scanned.registry.names(),
        config.min_count,
    )?;

    let writer = DatasetWriter::new(
        &config.dataset_dir,
        config.text_columns,
        config.volume_unit,
    );
    let written = writer.write(&ranking)?;

    let files = written
        .iter()
        .map(FileDigest::compute)
        .collect::<std::io::Result<Vec<_>>>()?;

    let report = BuildReport::new(config.min_count, scanned.stats, &ranking, files);

    create_dir_all(&config.dataset_dir)?;
    std::fs::write(config.dataset_dir.join(REPORT_FILE_NAME), report.generate()?)?;

    Ok(report)
}
