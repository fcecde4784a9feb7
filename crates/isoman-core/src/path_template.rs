//! Artifact path templates such as `~/ISO/{Distro}/{number}/{label}.iso`.
//!
//! Every placeholder also exists in a title-cased form (`{distro}` and
//! `{Distro}`). `{{` and `}}` produce literal braces. A leading `~/` expands
//! to `$HOME`.

use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Placeholder values; `None` renders as an empty string.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    values: BTreeMap<String, String>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` and its title-cased twin.
    pub fn set(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        let value = value.unwrap_or_default();
        self.values.insert(title_case(name), title_case(value));
        self.values.insert(name.to_string(), value.to_string());
        self
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Upper-case the first letter of every word, lower-case the rest. A word
/// starts after any non-alphabetic character.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

pub fn render(format: &str, vars: &TemplateVars) -> Result<PathBuf> {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => bail!("unclosed '{{' in path format {:?}", format),
                    }
                }
                match vars.get(&name) {
                    Some(v) => out.push_str(v),
                    None => bail!("unknown placeholder {{{}}} in path format", name),
                }
            }
            '}' => bail!("unmatched '}}' in path format {:?}", format),
            c => out.push(c),
        }
    }
    Ok(expand_home(&out))
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
