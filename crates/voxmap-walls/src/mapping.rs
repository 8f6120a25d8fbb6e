use std::fs;
use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::error::PersistError;

/// A TOML document on disk addressed by key paths.
///
/// String paths split on `.`; the `_in` variants take explicit segments for
/// keys that may themselves contain dots.
#[derive(Clone, Debug)]
pub struct MappingFile {
    path: PathBuf,
    root: Table,
}

impl MappingFile {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let mut file = Self {
            path: path.into(),
            root: Table::new(),
        };
        file.load()?;
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&mut self) -> Result<(), PersistError> {
        self.root = match fs::read_to_string(&self.path) {
            Ok(s) => toml::from_str(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Table::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(())
    }

    /// Writes to a sibling temp file and renames it over the target.
    pub fn save(&self) -> Result<(), PersistError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let text = toml::to_string(&self.root)?;
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.get_in(&split(path))
    }

    pub fn get_in(&self, segments: &[&str]) -> Option<&Value> {
        let (last, parents) = segments.split_last()?;
        let mut table = &self.root;
        for seg in parents {
            table = table.get(*seg)?.as_table()?;
        }
        table.get(*last)
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path)?.as_integer()
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    pub fn get_list(&self, path: &str) -> Option<&Vec<Value>> {
        self.get(path)?.as_array()
    }

    pub fn get_table_in(&self, segments: &[&str]) -> Option<&Table> {
        if segments.is_empty() {
            return Some(&self.root);
        }
        self.get_in(segments)?.as_table()
    }

    /// Child keys of the table at `path`, sorted.
    pub fn keys(&self, path: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .get_table_in(&split(path))
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        self.set_in(&split(path), value);
    }

    /// Sets a value, creating (or replacing non-table) intermediate tables.
    pub fn set_in(&mut self, segments: &[&str], value: impl Into<Value>) {
        let Some((last, parents)) = segments.split_last() else {
            return;
        };
        let mut table = &mut self.root;
        for seg in parents {
            let entry = table
                .entry(seg.to_string())
                .or_insert(Value::Table(Table::new()));
            if !entry.is_table() {
                *entry = Value::Table(Table::new());
            }
            let Some(child) = entry.as_table_mut() else {
                return;
            };
            table = child;
        }
        table.insert(last.to_string(), value.into());
    }

    pub fn remove(&mut self, path: &str) -> Option<Value> {
        self.remove_in(&split(path))
    }

    pub fn remove_in(&mut self, segments: &[&str]) -> Option<Value> {
        let (last, parents) = segments.split_last()?;
        let mut table = &mut self.root;
        for seg in parents {
            table = table.get_mut(*seg)?.as_table_mut()?;
        }
        table.remove(*last)
    }
}

fn split(path: &str) -> Vec<&str> {
    path.split('.').filter(|s| !s.is_empty()).collect()
}
