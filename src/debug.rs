//! Labeled fields an external inspector can read and write.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum DebugValue {
    Number(f64),
    Text(String),
    Flag(bool),
}

impl std::fmt::Display for DebugValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DebugValue::Number(n) => write!(f, "{n}"),
            DebugValue::Text(text) => f.write_str(text),
            DebugValue::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

impl From<f64> for DebugValue {
    fn from(value: f64) -> Self {
        DebugValue::Number(value)
    }
}

impl From<usize> for DebugValue {
    fn from(value: usize) -> Self {
        DebugValue::Number(value as f64)
    }
}

impl From<bool> for DebugValue {
    fn from(value: bool) -> Self {
        DebugValue::Flag(value)
    }
}

impl From<&str> for DebugValue {
    fn from(value: &str) -> Self {
        DebugValue::Text(value.to_string())
    }
}

impl From<String> for DebugValue {
    fn from(value: String) -> Self {
        DebugValue::Text(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DebugPanel {
    fields: BTreeMap<String, DebugValue>,
    revision: u64,
}

impl DebugPanel {
    pub const TITLE: &'static str = "title";

    pub fn new(title: &str) -> Self {
        let mut panel = Self::default();
        panel.set(Self::TITLE, title);
        panel
    }

    /// Insert or overwrite a field. Bumps the revision only on change.
    pub fn set(&mut self, label: &str, value: impl Into<DebugValue>) {
        let value = value.into();
        if self.fields.get(label) != Some(&value) {
            self.fields.insert(label.to_string(), value);
            self.revision += 1;
        }
    }

    pub fn get(&self, label: &str) -> Option<&DebugValue> {
        self.fields.get(label)
    }

    pub fn title(&self) -> Option<&str> {
        match self.fields.get(Self::TITLE) {
            Some(DebugValue::Text(title)) => Some(title),
            _ => None,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &DebugValue)> {
        self.fields.iter().map(|(label, value)| (label.as_str(), value))
    }

    /// One line for a window title: the title followed by every other field.
    pub fn summary(&self) -> String {
        let mut line = self.title().unwrap_or_default().to_string();
        for (label, value) in self.fields() {
            if label == Self::TITLE {
                continue;
            }
            line.push_str(&format!(" | {label}: {value}"));
        }
        line
    }

    /// Increases on every effective write; hosts compare it to skip unchanged frames.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
