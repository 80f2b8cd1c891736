//! Ingredient list confirmed on the capture screen before generation.

use serde::{Deserialize, Serialize};

/// One-tap shortcuts offered under the capture list
pub const COMMON_INGREDIENTS: &[&str] = &[
    "雞蛋", "豬絞肉", "蔥", "蒜頭", "洋蔥", "高麗菜", "番茄", "豆腐", "雞胸肉",
];

/// Pre-filled list shown after a capture
pub const DEFAULT_CAPTURED: &[&str] = &["雞蛋", "豬肉", "洋蔥"];

/// Editable, de-duplicated list of ingredient names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedIngredients {
    items: Vec<String>,
}

impl CapturedIngredients {
    pub fn new() -> Self {
        Self::default()
    }

    /// List pre-filled with [`DEFAULT_CAPTURED`]
    pub fn with_defaults() -> Self {
        Self::from_names(DEFAULT_CAPTURED.iter().copied())
    }

    /// Build from names, skipping blanks and duplicates
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for name in names {
            list.add(name.as_ref());
        }
        list
    }

    /// Add a name; returns `false` for blanks and names already present
    pub fn add(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.items.push(name.to_string());
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let name = name.trim();
        match self.items.iter().position(|item| item == name) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|item| item == name.trim())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let list = CapturedIngredients::with_defaults();
        assert_eq!(list.as_slice(), ["雞蛋", "豬肉", "洋蔥"]);
    }

    #[test]
    fn test_add_skips_blank_and_duplicates() {
        let mut list = CapturedIngredients::new();
        assert!(list.add(" 番茄 "));
        assert!(!list.add("番茄"));
        assert!(!list.add("   "));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut list = CapturedIngredients::from_names(["蔥", "蒜頭"]);
        assert!(list.remove("蔥"));
        assert!(!list.remove("蔥"));
        assert_eq!(list.as_slice(), ["蒜頭"]);
    }
}
