use crate::source::CandidateRecord;
use std::collections::{BTreeSet, HashMap, HashSet};

/// The set of `(comment_id, unix_time)` pairs submitted by one source.
pub type SubmissionKey = HashSet<(u64, i64)>;

pub fn submission_key(records: &[CandidateRecord]) -> SubmissionKey {
    records.iter().map(CandidateRecord::submission).collect()
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    /// A new identity. `similar` is set when some accepted user shares a
    /// comment id without matching the full key.
    Accept { similar: bool },
    /// A resubmission of the accepted user with this index.
    Duplicate { of: usize },
}

/// Tracks which accepted users submitted which comments.
///
/// Comment ids are only unique within a source, so overlapping ids alone do
/// not identify a user; only an exactly equal submission key does.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    comment_to_user: HashMap<u64, BTreeSet<usize>>,
    user_to_comments: Vec<SubmissionKey>,
}

impl DuplicateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accepted identities.
    pub fn len(&self) -> usize {
        self.user_to_comments.len()
    }

    pub fn similar_users(&self, key: &SubmissionKey) -> BTreeSet<usize> {
        key.iter()
            .filter_map(|(comment_id, _)| self.comment_to_user.get(comment_id))
            .flatten()
            .copied()
            .collect()
    }

    pub fn check(&self, key: &SubmissionKey) -> Decision {
        let similar_users = self.similar_users(key);
        let duplicate = similar_users
            .iter()
            .copied()
            .find(|user| self.user_to_comments.get(*user) == Some(key));

        match duplicate {
            Some(of) => Decision::Duplicate { of },
            None => Decision::Accept {
                similar: !similar_users.is_empty(),
            },
        }
    }

    /// Registers a key as a new identity and returns its index.
    pub fn register(&mut self, key: SubmissionKey) -> usize {
        let user = self.user_to_comments.len();

        for (comment_id, _) in &key {
            self.comment_to_user
                .entry(*comment_id)
                .or_insert_with(BTreeSet::new)
                .insert(user);
        }

        self.user_to_comments.push(key);
        user
    }

    /// Adds submissions to an already accepted identity and returns the ones
    /// it did not have yet.
    pub fn extend(&mut self, user: usize, key: SubmissionKey) -> SubmissionKey {
        let existing = match self.user_to_comments.get_mut(user) {
            Some(existing) => existing,
            None => return SubmissionKey::new(),
        };

        let added = key
            .into_iter()
            .filter(|submission| existing.insert(*submission))
            .collect::<SubmissionKey>();

        for (comment_id, _) in &added {
            self.comment_to_user
                .entry(*comment_id)
                .or_insert_with(BTreeSet::new)
                .insert(user);
        }

        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(pairs: &[(u64, i64)]) -> SubmissionKey {
        pairs.iter().copied().collect()
    }

    #[test]
    fn accept_unseen_key() {
        let index = DuplicateIndex::new();

        assert_eq!(
            index.check(&key(&[(1, 100), (2, 200)])),
            Decision::Accept { similar: false }
        );
    }

    #[test]
    fn identical_key_is_duplicate() {
        let mut index = DuplicateIndex::new();
        assert_eq!(index.register(key(&[(1, 100), (2, 200)])), 0);

        assert_eq!(
            index.check(&key(&[(2, 200), (1, 100)])),
            Decision::Duplicate { of: 0 }
        );
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn overlapping_ids_with_different_times_are_distinct() {
        let mut index = DuplicateIndex::new();
        index.register(key(&[(1, 100), (2, 200)]));

        assert_eq!(
            index.check(&key(&[(1, 100), (2, 201)])),
            Decision::Accept { similar: true }
        );
        assert_eq!(
            index.check(&key(&[(1, 100)])),
            Decision::Accept { similar: true }
        );
        assert_eq!(
            index.check(&key(&[(3, 100)])),
            Decision::Accept { similar: false }
        );
    }

    #[test]
    fn duplicate_matches_any_similar_user() {
        let mut index = DuplicateIndex::new();
        index.register(key(&[(1, 100), (2, 200)]));
        index.register(key(&[(1, 100), (3, 300)]));

        assert_eq!(
            index.similar_users(&key(&[(1, 5)])),
            vec![0, 1].into_iter().collect::<BTreeSet<_>>()
        );
        assert_eq!(
            index.check(&key(&[(3, 300), (1, 100)])),
            Decision::Duplicate { of: 1 }
        );
    }

    #[test]
    fn extend_returns_only_new_submissions() {
        let mut index = DuplicateIndex::new();
        index.register(key(&[(1, 100)]));

        assert_eq!(index.extend(0, key(&[(1, 100), (2, 200)])), key(&[(2, 200)]));
        assert_eq!(index.extend(0, key(&[(2, 200)])), key(&[]));
        assert_eq!(index.extend(5, key(&[(3, 300)])), key(&[]));
        assert_eq!(
            index.check(&key(&[(2, 200), (1, 100)])),
            Decision::Duplicate { of: 0 }
        );
        assert_eq!(index.len(), 1);
    }
}
