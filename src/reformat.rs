//! Chat-HTML reformatter
//!
//! Rewrites HTML copied out of a chat client with an ordered table of
//! substitutions. The table is configuration data: the built-in one is
//! `rules/chat.toml`, and [`RuleSet::load`] reads a replacement from disk.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use regex::{Captures, Regex};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::RuleError;

/// Table compiled into the binary
pub const BUILTIN_RULES: &str = include_str!("../rules/chat.toml");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleTable {
    #[serde(default)]
    reject: Vec<String>,
    #[serde(default, rename = "rule")]
    rules: Vec<RuleSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum RuleSpec {
    Literal { pairs: Vec<(String, String)> },
    Pattern { pattern: String, replace: String },
}

/// Replaces several literal strings in one pass.
///
/// At each position the leftmost match wins; when two needles match at the
/// same position the one listed first wins. Replaced text is never rescanned.
#[derive(Debug, Clone)]
pub struct LiteralReplacer {
    matcher: Option<Regex>,
    replacements: HashMap<String, String>,
}

impl LiteralReplacer {
    pub fn new(pairs: &[(String, String)]) -> Result<Self, regex::Error> {
        let mut replacements = HashMap::new();
        let mut alternatives = Vec::new();

        for (from, to) in pairs {
            if from.is_empty() {
                warn!(replacement = %to, "skipping literal pair with an empty needle");
                continue;
            }
            if !replacements.contains_key(from) {
                replacements.insert(from.clone(), to.clone());
                alternatives.push(regex::escape(from));
            }
        }

        let matcher = if alternatives.is_empty() {
            None
        } else {
            Some(Regex::new(&alternatives.join("|"))?)
        };

        Ok(Self { matcher, replacements })
    }

    pub fn replace<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let Some(matcher) = &self.matcher else {
            return Cow::Borrowed(text);
        };

        matcher.replace_all(text, |caps: &Captures| {
            self.replacements
                .get(&caps[0])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
    }
}

/// A single step of the table
#[derive(Debug, Clone)]
pub enum Rule {
    Literal(LiteralReplacer),
    Pattern { regex: Regex, replace: String },
}

impl Rule {
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            Rule::Literal(replacer) => replacer.replace(text),
            Rule::Pattern { regex, replace } => regex.replace_all(text, replace.as_str()),
        }
    }
}

/// Ordered substitution table plus reject guards
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    reject: Vec<String>,
}

impl RuleSet {
    /// The chat table shipped with the binary
    pub fn builtin() -> Result<Self, RuleError> {
        Self::from_toml(BUILTIN_RULES)
    }

    /// Parse and compile a TOML rule table
    pub fn from_toml(source: &str) -> Result<Self, RuleError> {
        let table: RuleTable = toml::from_str(source)?;

        let rules = table
            .rules
            .into_iter()
            .enumerate()
            .map(|(index, spec)| match spec {
                RuleSpec::Literal { pairs } => LiteralReplacer::new(&pairs)
                    .map(Rule::Literal)
                    .map_err(|source| RuleError::Pattern { index, source }),
                RuleSpec::Pattern { pattern, replace } => Regex::new(&pattern)
                    .map(|regex| Rule::Pattern { regex, replace })
                    .map_err(|source| RuleError::Pattern { index, source }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(rules = rules.len(), guards = table.reject.len(), "compiled rule table");

        Ok(Self {
            rules,
            reject: table.reject,
        })
    }

    /// Read a rule table from a file
    pub fn load(path: &Path) -> Result<Self, RuleError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml(&source)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Fail if the content contains a reject guard
    pub fn check(&self, html: &str) -> Result<(), RuleError> {
        match self.reject.iter().find(|guard| html.contains(guard.as_str())) {
            Some(guard) => Err(RuleError::Rejected { guard: guard.clone() }),
            None => Ok(()),
        }
    }

    /// Run every rule once, in order
    pub fn apply(&self, html: &str) -> String {
        let mut out = html.to_string();
        for rule in &self.rules {
            out = rule.apply(&out).into_owned();
        }
        out
    }

    /// Check the guards, then apply the table
    pub fn reformat(&self, html: &str) -> Result<String, RuleError> {
        self.check(html)?;
        Ok(self.apply(html))
    }
}
