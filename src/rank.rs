use crate::error::{Error, Result};
use crate::scan::AcceptedRecord;
use std::cmp::Reverse;

/// A final ratings row. Field order is the output sort order.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct RatingRecord {
    pub user: usize,
    pub movie: u64,
    pub rate: i64,
    pub time: i64,
}

/// A final comment text row, only produced for non-empty texts.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct TextRecord {
    pub user: usize,
    pub movie: u64,
    pub agree: u64,
    pub disagree: u64,
    pub text: String,
    pub rate: i64,
}

/// One dataset variant, with users renumbered.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Partition {
    pub ratings: Vec<RatingRecord>,
    pub texts: Vec<TextRecord>,
    /// Source names in final-index order.
    pub users: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ranking {
    /// Scan-time indices of users with at least `min_count` records, in final order.
    pub large: Vec<usize>,
    /// The remaining scan-time indices, in final order.
    pub small: Vec<usize>,
    /// Final index for each scan-time index.
    pub remap: Vec<usize>,
    pub filtered: Partition,
    pub full: Partition,
}

/// Per-user record counts, indexed by scan-time user index.
pub fn count_by_user(records: &[AcceptedRecord], users: usize) -> Result<Vec<usize>> {
    let mut counts = vec![0; users];

    for record in records {
        match counts.get_mut(record.user) {
            Some(count) => *count += 1,
            None => {
                return Err(Error::Inconsistent(format!(
                    "record references user {} of {}",
                    record.user, users
                )))
            }
        }
    }

    Ok(counts)
}

/// Splits users by activity and orders each side by descending count.
///
/// The sort is stable, so equal counts keep scan order.
pub fn rank_users(counts: &[usize], min_count: usize) -> (Vec<usize>, Vec<usize>) {
    let (mut large, mut small): (Vec<usize>, Vec<usize>) =
        (0..counts.len()).partition(|user| counts[*user] >= min_count);

    large.sort_by_key(|user| Reverse(counts[*user]));
    small.sort_by_key(|user| Reverse(counts[*user]));

    (large, small)
}

/// Builds the scan-time to final index map, checking it is a bijection.
fn build_remap(large: &[usize], small: &[usize], users: usize) -> Result<Vec<usize>> {
    let mut remap = vec![None; users];

    for (target, user) in large.iter().chain(small).enumerate() {
        match remap.get_mut(*user) {
            Some(slot) if slot.is_none() => *slot = Some(target),
            Some(_) => {
                return Err(Error::Inconsistent(format!("user {} ranked twice", user)))
            }
            None => return Err(Error::Inconsistent(format!("unknown user {}", user))),
        }
    }

    remap
        .into_iter()
        .enumerate()
        .map(|(user, target)| {
            target.ok_or_else(|| Error::Inconsistent(format!("user {} was not ranked", user)))
        })
        .collect()
}

/// Renumbers users by activity and produces the filtered and full variants.
///
/// `names` holds the source name of every scan-time user index.
pub fn split_by_min_count(
    records: &[AcceptedRecord],
    names: &[String],
    min_count: usize,
) -> Result<Ranking> {
    let counts = count_by_user(records, names.len())?;
    let (large, small) = rank_users(&counts, min_count);
    let remap = build_remap(&large, &small, names.len())?;

    let mut full = Partition::default();
    let mut filtered = Partition::default();

    for record in records {
        let user = remap[record.user];
        let rating = RatingRecord {
            user,
            movie: record.movie_id,
            rate: record.rating,
            time: record.unix_time,
        };
        let text = if record.text.is_empty() {
            None
        } else {
            Some(TextRecord {
                user,
                movie: record.movie_id,
                agree: record.agree,
                disagree: record.disagree,
                text: record.text.clone(),
                rate: record.rating,
            })
        };

        if user < large.len() {
            filtered.ratings.push(rating);
            if let Some(text) = &text {
                filtered.texts.push(text.clone());
            }
        }

        full.ratings.push(rating);
        full.texts.extend(text);
    }

    full.users = large
        .iter()
        .chain(&small)
        .map(|user| names[*user].clone())
        .collect();
    filtered.users = full.users[..large.len()].to_vec();

    for partition in [&mut filtered, &mut full].iter_mut() {
        partition.ratings.sort();
        partition.texts.sort();
    }

    log::info!(
        "Ranked {} users ({} with at least {} ratings): {} filtered and {} full ratings",
        names.len(),
        large.len(),
        min_count,
        filtered.ratings.len(),
        full.ratings.len()
    );

    Ok(Ranking {
        large,
        small,
        remap,
        filtered,
        full,
    })
}
