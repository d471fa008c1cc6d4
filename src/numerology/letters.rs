//! Character-to-number lookup table.

use super::reduce::DEFAULT_MASTER_VALUES;
use crate::utils::error::{AppError, AppResult};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

const VOWELS: [char; 5] = ['A', 'E', 'I', 'O', 'U'];

/// Which letters of a name contribute to a sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetterFilter {
    All,
    Vowels,
    Consonants,
}

impl LetterFilter {
    fn accepts(&self, c: char) -> bool {
        match self {
            LetterFilter::All => true,
            LetterFilter::Vowels => VOWELS.contains(&c),
            LetterFilter::Consonants => !VOWELS.contains(&c),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LetterTableFile {
    letters: BTreeMap<String, u32>,
    #[serde(default)]
    master_values: Option<Vec<u32>>,
}

/// Immutable character lookup plus the master values that stop reduction.
#[derive(Debug, Clone)]
pub struct LetterTable {
    values: HashMap<char, u32>,
    master_values: Vec<u32>,
}

impl Default for LetterTable {
    /// Pythagorean table: A=1 .. I=9, J=1 .. R=9, S=1 .. Z=8.
    fn default() -> Self {
        let values = ('A'..='Z').map(|c| (c, (c as u32 - 'A' as u32) % 9 + 1)).collect();
        Self {
            values,
            master_values: DEFAULT_MASTER_VALUES.to_vec(),
        }
    }
}

impl LetterTable {
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read letter table {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let file: LetterTableFile = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse letter table: {}", e)))?;

        if file.letters.is_empty() {
            return Err(AppError::Config("Letter table must define at least one letter".to_string()));
        }

        let mut values = HashMap::with_capacity(file.letters.len());
        for (key, value) in file.letters {
            let mut chars = key.chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                return Err(AppError::Config(format!(
                    "Letter table key '{}' must be a single character",
                    key
                )));
            };
            if !(1..=9).contains(&value) {
                return Err(AppError::Config(format!(
                    "Letter table value for '{}' must be 1-9, got {}",
                    key, value
                )));
            }
            values.insert(c.to_uppercase().next().unwrap_or(c), value);
        }

        let master_values = file.master_values.unwrap_or_else(|| DEFAULT_MASTER_VALUES.to_vec());
        if let Some(bad) = master_values.iter().find(|&&m| m < 10) {
            return Err(AppError::Config(format!(
                "Master value {} must have at least two digits",
                bad
            )));
        }

        Ok(Self { values, master_values })
    }

    pub fn master_values(&self) -> &[u32] {
        &self.master_values
    }

    /// Value of a single character; characters outside the table have none.
    pub fn value(&self, c: char) -> Option<u32> {
        let upper = c.to_uppercase().next().unwrap_or(c);
        self.values.get(&upper).copied()
    }

    /// Sum of the mapped characters of `text` that pass `filter`; unmapped
    /// characters are skipped.
    pub fn sum(&self, text: &str, filter: LetterFilter) -> u32 {
        text.chars()
            .filter_map(|c| {
                let upper = c.to_uppercase().next().unwrap_or(c);
                self.values.get(&upper).filter(|_| filter.accepts(upper))
            })
            .sum()
    }

    /// Value of the first mapped character of `text`.
    pub fn initial(&self, text: &str) -> u32 {
        text.chars().find_map(|c| self.value(c)).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_table() {
        let table = LetterTable::default();
        assert_eq!(table.value('A'), Some(1));
        assert_eq!(table.value('i'), Some(9));
        assert_eq!(table.value('J'), Some(1));
        assert_eq!(table.value('Z'), Some(8));
        assert_eq!(table.value('田'), None);
    }

    #[test]
    fn test_sum_skips_unmapped_characters() {
        let table = LetterTable::default();
        // T=2 A=1 N=5 A=1 K=2 A=1
        assert_eq!(table.sum("TANAKA", LetterFilter::All), 12);
        assert_eq!(table.sum("TA-NA 田 KA", LetterFilter::All), 12);
        assert_eq!(table.sum("TANAKA", LetterFilter::Vowels), 3);
        assert_eq!(table.sum("TANAKA", LetterFilter::Consonants), 9);
        assert_eq!(table.sum("田中太郎", LetterFilter::All), 0);
    }

    #[test]
    fn test_load_custom_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "master_values = [11, 22, 33]\n[letters]\n\"あ\" = 1\n\"か\" = 2\n"
        )
        .unwrap();
        let table = LetterTable::load(file.path()).unwrap();
        assert_eq!(table.master_values(), &[11, 22, 33]);
        assert_eq!(table.sum("あかあ", LetterFilter::All), 4);
    }

    #[test]
    fn test_malformed_table_rejected() {
        for bad in [
            "[letters]\n",
            "[letters]\nAB = 1\n",
            "[letters]\nA = 10\n",
            "master_values = [7]\n[letters]\nA = 1\n",
            "letters = 3\n",
        ] {
            assert!(
                matches!(LetterTable::from_toml(bad), Err(AppError::Config(_))),
                "expected config error for {:?}",
                bad
            );
        }
    }
}
