//! Minimal `.env` editing that keeps comments, ordering and unrelated keys.

use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    /// `raw` keeps the original text until the value is changed
    Entry {
        key: String,
        value: String,
        raw: Option<String>,
    },
    Other(String),
}

/// A parsed `.env` file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    lines: Vec<Line>,
}

impl EnvFile {
    pub fn parse(content: &str) -> Self {
        let lines = content
            .lines()
            .map(|raw| match parse_entry(raw) {
                Some((key, value)) => Line::Entry {
                    key,
                    value,
                    raw: Some(raw.to_string()),
                },
                None => Line::Other(raw.to_string()),
            })
            .collect();
        Self { lines }
    }

    /// Reads `path`, treating a missing file as empty
    pub fn load(path: &Path) -> std::io::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.render())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| match line {
            Line::Entry { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Replaces the value in place, or appends the key at the end
    pub fn set(&mut self, key: &str, value: &str) {
        let existing = self.lines.iter_mut().find_map(|line| match line {
            Line::Entry { key: k, value, raw } if *k == key => Some((value, raw)),
            _ => None,
        });

        match existing {
            Some((slot, raw)) => {
                *slot = value.to_string();
                *raw = None;
            }
            None => self.lines.push(Line::Entry {
                key: key.to_string(),
                value: value.to_string(),
                raw: None,
            }),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Entry {
                    raw: Some(raw), ..
                } => out.push_str(raw),
                Line::Entry { key, value, .. } => {
                    out.push_str(key);
                    out.push('=');
                    out.push_str(&quote(value));
                }
                Line::Other(raw) => out.push_str(raw),
            }
            out.push('\n');
        }
        out
    }
}

fn parse_entry(raw: &str) -> Option<(String, String)> {
    let trimmed = raw.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key.to_string(), unquote(value.trim())))
}

fn unquote(value: &str) -> String {
    for q in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(q) && value.ends_with(q) {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}

fn quote(value: &str) -> String {
    if value.contains(|c: char| c.is_whitespace() || c == '#') {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
