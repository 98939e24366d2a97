use super::Report;
use crate::dataset::digest::FileDigest;
use crate::rank::Ranking;
use crate::scan::ScanStats;
use serde_derive::Serialize;
use std::fmt::{Display, Formatter};

const TEMPLATE: &str = "# {title}

* Minimum count: {min_count}
* Sources scanned: {stats.sources} ({stats.unreadable} unreadable, {stats.empty} empty)
* Duplicates dropped: {stats.duplicates} ({stats.similar} sources with overlapping comments)
* Repeated source names merged: {stats.merged}
* Invalid records: {stats.exceptions} ({stats.repeated} repeated records ignored)

| Variant | Users | Ratings | Texts |
| ------- | ----- | ------- | ----- |
| filtered | {filtered.users} | {filtered.ratings} | {filtered.texts} |
| full | {full.users} | {full.ratings} | {full.texts} |

## Files
{{ for file in files }}
* `{file.path}`: {file.digest}{{ endfor }}
";

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct VariantSummary {
    pub users: usize,
    pub ratings: usize,
    pub texts: usize,
}

/// Summary of one dataset build.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BuildReport {
    title: &'static str,
    min_count: usize,
    stats: ScanStats,
    filtered: VariantSummary,
    full: VariantSummary,
    files: Vec<FileDigest>,
}

impl BuildReport {
    pub fn new(
        min_count: usize,
        stats: ScanStats,
        ranking: &Ranking,
        files: Vec<FileDigest>,
    ) -> BuildReport {
        BuildReport {
            title: Self::title(),
            min_count,
            stats,
            filtered: VariantSummary {
                users: ranking.filtered.users.len(),
                ratings: ranking.filtered.ratings.len(),
                texts: ranking.filtered.texts.len(),
            },
            full: VariantSummary {
                users: ranking.full.users.len(),
                ratings: ranking.full.ratings.len(),
                texts: ranking.full.texts.len(),
            },
            files,
        }
    }
}

impl Report for BuildReport {
    fn title() -> &'static str {
        "KMRD build"
    }

    fn template() -> &'static str {
        TEMPLATE
    }
}

impl Display for BuildReport {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.generate() {
            Ok(report) => write!(f, "{}", report),
            Err(error) => {
                log::error!("Cannot render {}: {}", Self::title(), error);
                Err(std::fmt::Error)
            }
        }
    }
}
