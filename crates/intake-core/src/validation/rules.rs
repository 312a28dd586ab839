//! Upload validation rule grammar.
//!
//! Rules are written as pipe-separated constraints, e.g.
//! `required|image|mimes:jpeg,png,jpg|max:2048`. Sizes are expressed in kilobytes
//! everywhere in the system.

use std::fmt;
use std::str::FromStr;

/// A single constraint within a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleConstraint {
    Required,
    /// Absence of a file is allowed even if other constraints are present.
    Nullable,
    File,
    /// Content must be an image (`image/*`).
    Image,
    /// Allowed file extensions, lowercased.
    Mimes(Vec<String>),
    /// Allowed MIME types; entries may end in `/*`.
    MimeTypes(Vec<String>),
    /// Maximum size in kilobytes.
    Max(u64),
    /// Minimum size in kilobytes.
    Min(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleParseError {
    #[error("unknown validation constraint '{0}'")]
    UnknownConstraint(String),

    #[error("constraint '{name}' requires a value")]
    MissingValue { name: String },

    #[error("invalid value '{value}' for constraint '{name}'")]
    InvalidValue { name: String, value: String },

    #[error("invalid field rule entry '{0}', expected field=rule")]
    InvalidFieldEntry(String),
}

/// An ordered list of constraints. Constraints are checked in the order they are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationRule {
    constraints: Vec<RuleConstraint>,
}

impl ValidationRule {
    pub fn new(constraints: Vec<RuleConstraint>) -> Self {
        Self { constraints }
    }

    pub fn constraints(&self) -> &[RuleConstraint] {
        &self.constraints
    }

    pub fn is_required(&self) -> bool {
        self.constraints.contains(&RuleConstraint::Required)
    }

    pub fn is_nullable(&self) -> bool {
        self.constraints.contains(&RuleConstraint::Nullable)
    }

    /// Largest accepted size in kilobytes, if the rule bounds it.
    pub fn max_kilobytes(&self) -> Option<u64> {
        self.constraints.iter().find_map(|c| match c {
            RuleConstraint::Max(kb) => Some(*kb),
            _ => None,
        })
    }

    /// Same as [`max_kilobytes`](Self::max_kilobytes) expressed in bytes.
    pub fn max_bytes(&self) -> Option<u64> {
        self.max_kilobytes().map(|kb| kb.saturating_mul(1024))
    }
}

fn parse_list(name: &str, value: Option<&str>) -> Result<Vec<String>, RuleParseError> {
    let value = value.ok_or_else(|| RuleParseError::MissingValue {
        name: name.to_string(),
    })?;
    let items: Vec<String> = value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        return Err(RuleParseError::MissingValue {
            name: name.to_string(),
        });
    }
    Ok(items)
}

fn parse_kilobytes(name: &str, value: Option<&str>) -> Result<u64, RuleParseError> {
    let value = value.ok_or_else(|| RuleParseError::MissingValue {
        name: name.to_string(),
    })?;
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| RuleParseError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        })
}

impl FromStr for RuleConstraint {
    type Err = RuleParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();
        let (name, value) = match token.split_once(':') {
            Some((name, value)) => (name.trim(), Some(value)),
            None => (token, None),
        };

        match name.to_lowercase().as_str() {
            "required" => Ok(RuleConstraint::Required),
            "nullable" => Ok(RuleConstraint::Nullable),
            "file" => Ok(RuleConstraint::File),
            "image" => Ok(RuleConstraint::Image),
            "mimes" => parse_list(name, value).map(RuleConstraint::Mimes),
            "mimetypes" => parse_list(name, value).map(RuleConstraint::MimeTypes),
            "max" => parse_kilobytes(name, value).map(RuleConstraint::Max),
            "min" => parse_kilobytes(name, value).map(RuleConstraint::Min),
            _ => Err(RuleParseError::UnknownConstraint(token.to_string())),
        }
    }
}

impl FromStr for ValidationRule {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let constraints = s
            .split('|')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(RuleConstraint::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { constraints })
    }
}

impl fmt::Display for RuleConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleConstraint::Required => write!(f, "required"),
            RuleConstraint::Nullable => write!(f, "nullable"),
            RuleConstraint::File => write!(f, "file"),
            RuleConstraint::Image => write!(f, "image"),
            RuleConstraint::Mimes(list) => write!(f, "mimes:{}", list.join(",")),
            RuleConstraint::MimeTypes(list) => write!(f, "mimetypes:{}", list.join(",")),
            RuleConstraint::Max(kb) => write!(f, "max:{}", kb),
            RuleConstraint::Min(kb) => write!(f, "min:{}", kb),
        }
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.constraints.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join("|"))
    }
}

/// Parse per-field rules written as `avatar=required|image|max:512;resume=mimes:pdf`.
pub fn parse_field_rules(s: &str) -> Result<Vec<(String, ValidationRule)>, RuleParseError> {
    s.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (field, rule) = entry
                .split_once('=')
                .ok_or_else(|| RuleParseError::InvalidFieldEntry(entry.to_string()))?;
            let field = field.trim();
            if field.is_empty() {
                return Err(RuleParseError::InvalidFieldEntry(entry.to_string()));
            }
            Ok((field.to_string(), rule.parse()?))
        })
        .collect()
}
