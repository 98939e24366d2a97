use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A bidirectional mapping between user source names and dense indices.
///
/// Indices are allocated in insertion order and never reassigned.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UserRegistry {
    by_name: HashMap<String, usize>,
    names: Vec<String>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing index for `name`, or allocates the next one.
    pub fn insert(&mut self, name: &str) -> usize {
        match self.by_name.get(name) {
            Some(index) => *index,
            None => {
                let index = self.names.len();
                self.by_name.insert(name.to_string(), index);
                self.names.push(name.to_string());
                index
            }
        }
    }

    pub fn index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(|name| name.as_str())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

pub fn write_user_list<P: AsRef<Path>, S: AsRef<str>>(path: P, names: &[S]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    for name in names {
        writeln!(writer, "{}", name.as_ref())?;
    }

    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::{write_user_list, UserRegistry};

    #[test]
    fn insert_returns_existing_or_allocates() {
        let mut registry = UserRegistry::new();

        assert_eq!(registry.insert("8215405"), 0);
        assert_eq!(registry.insert("446931"), 1);
        assert_eq!(registry.insert("8215405"), 0);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.index("446931"), Some(1));
        assert_eq!(registry.index("5021627"), None);
        assert_eq!(registry.name(1), Some("446931"));
    }

    #[test]
    fn lookup_does_not_allocate() {
        let registry = UserRegistry::new();

        assert_eq!(registry.index("missing"), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn write_names_in_index_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("userlist");
        let mut registry = UserRegistry::new();
        registry.insert("8215405");
        registry.insert("446931");
        registry.insert("5021627");

        write_user_list(&path, registry.names()).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "8215405\n446931\n5021627\n"
        );
    }
}
