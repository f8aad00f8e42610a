//! Entry - a named secret

use serde::{Deserialize, Serialize};

/// A key/secret pair. Keys are not required to be unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// The name the user searches by (e.g. "github")
    pub key: String,
    /// The secret value. Older stores wrote this field as `password`.
    #[serde(alias = "password")]
    pub secret: String,
}

/// Which half of an entry a text edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Key,
    Secret,
}

/// How filled-in an entry is once trimmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// Both fields non-empty
    Complete,
    /// Both fields empty
    Blank,
    /// Exactly one field empty
    Partial,
}

impl Entry {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    /// The empty entry used as the edit buffer
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Key => &self.key,
            Field::Secret => &self.secret,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        match field {
            Field::Key => self.key = value.into(),
            Field::Secret => self.secret = value.into(),
        }
    }

    /// Copy with surrounding whitespace removed from both fields
    pub fn trimmed(&self) -> Self {
        Self {
            key: self.key.trim().to_string(),
            secret: self.secret.trim().to_string(),
        }
    }

    /// Classify the entry by its trimmed fields
    pub fn completeness(&self) -> Completeness {
        let has_key = !self.key.trim().is_empty();
        let has_secret = !self.secret.trim().is_empty();
        match (has_key, has_secret) {
            (true, true) => Completeness::Complete,
            (false, false) => Completeness::Blank,
            _ => Completeness::Partial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completeness() {
        assert_eq!(Entry::new("a", "p").completeness(), Completeness::Complete);
        assert_eq!(Entry::new("  ", "\t").completeness(), Completeness::Blank);
        assert_eq!(Entry::new("a", " ").completeness(), Completeness::Partial);
        assert_eq!(Entry::new("", "p").completeness(), Completeness::Partial);
    }

    #[test]
    fn test_trimmed() {
        let entry = Entry::new("  github ", " s3cret\n");
        assert_eq!(entry.trimmed(), Entry::new("github", "s3cret"));
    }

    #[test]
    fn test_set_field() {
        let mut entry = Entry::empty();
        entry.set(Field::Key, " raw ");
        entry.set(Field::Secret, "pw");
        assert_eq!(entry.field(Field::Key), " raw ");
        assert_eq!(entry.field(Field::Secret), "pw");
    }

    #[test]
    fn test_password_alias() {
        let entry: Entry = serde_json::from_str(r#"{"key":"mail","password":"pw"}"#).unwrap();
        assert_eq!(entry, Entry::new("mail", "pw"));

        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"key":"mail","secret":"pw"}"#);
    }
}
