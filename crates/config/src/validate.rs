//! Configuration validation engine.
//!
//! Validates configuration files (TOML, YAML or JSON) against the known
//! schema, detects unknown/misspelled fields, and reports rule-table mistakes.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use crate::{
    loader::ConfigFormat,
    schema::{CrosslinkConfig, ForwardMode},
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "rule", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "forward.rules[0].target"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Expected shape of the configuration.
enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Array(Box<KnownKeys>),
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Array, Leaf, Struct};

    let rule = Struct(HashMap::from([
        ("source", Leaf),
        ("target", Leaf),
        ("self_id", Leaf),
        ("selfId", Leaf),
        ("guild_id", Leaf),
        ("guildId", Leaf),
    ]));

    Struct(HashMap::from([
        (
            "forward",
            Struct(HashMap::from([
                ("mode", Leaf),
                ("rules", Array(Box::new(rule))),
                ("reply_timeout", Leaf),
                ("replyTimeout", Leaf),
                ("direct_messages", Leaf),
                ("directMessages", Leaf),
                ("ignore_self", Leaf),
                ("ignoreSelf", Leaf),
            ])),
        ),
        (
            "database",
            Struct(HashMap::from([("url", Leaf), ("max_connections", Leaf)])),
        ),
    ]))
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (c, levenshtein(needle, c)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(c, _)| c)
}

/// Validate a config file at the given path, or the discovered one if `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Info,
                category: "file-ref",
                path: String::new(),
                message: "no config file found; using defaults".into(),
            }],
            config_path: None,
        };
    };

    match std::fs::read_to_string(actual_path) {
        Ok(content) => {
            let content = crate::env_subst::substitute_env(&content);
            let mut result = match ConfigFormat::from_path(actual_path) {
                Ok(format) => validate_str(&content, format),
                Err(e) => ValidationResult {
                    diagnostics: vec![Diagnostic {
                        severity: Severity::Error,
                        category: "syntax",
                        path: String::new(),
                        message: e.to_string(),
                    }],
                    config_path: None,
                },
            };
            result.config_path = Some(actual_path.clone());
            result
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("failed to read config file: {e}"),
            }],
            config_path: Some(actual_path.clone()),
        },
    }
}

/// Validate a TOML string without touching the filesystem.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    validate_str(toml_str, ConfigFormat::Toml)
}

/// Validate config text in the given format without touching the filesystem.
#[must_use]
pub fn validate_str(raw: &str, format: ConfigFormat) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let tree: serde_json::Value = match format.parse(raw) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("{} syntax error: {e}", format.name()),
            });
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&tree, &build_schema_map(), "", &mut diagnostics);

    match format.parse::<CrosslinkConfig>(raw) {
        Ok(config) => check_semantics(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: String::new(),
            message: format!("type error: {e}"),
        }),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(
    value: &serde_json::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (value, schema) {
        (serde_json::Value::Object(table), KnownKeys::Struct(fields)) => {
            let known_keys: Vec<&str> = fields.keys().copied().collect();
            for (key, child_value) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                if let Some(child_schema) = fields.get(key.as_str()) {
                    check_unknown_fields(child_value, child_schema, &path, diagnostics);
                    continue;
                }
                let message = match suggest(key, &known_keys, 3) {
                    Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
                    None => "unknown field".to_string(),
                };
                diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    category: "unknown-field",
                    path,
                    message,
                });
            }
        },
        (serde_json::Value::Array(items), KnownKeys::Array(item_schema)) => {
            for (i, item) in items.iter().enumerate() {
                check_unknown_fields(item, item_schema, &format!("{prefix}[{i}]"), diagnostics);
            }
        },
        // Leaf or type mismatch; type errors are reported by deserialization.
        _ => {},
    }
}

fn check_semantics(config: &CrosslinkConfig, diagnostics: &mut Vec<Diagnostic>) {
    let forward = &config.forward;

    if forward.reply_timeout == 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "rule",
            path: "forward.reply_timeout".into(),
            message: "reply_timeout must be a positive number of milliseconds".into(),
        });
    }

    if forward.mode == ForwardMode::Database && !forward.rules.is_empty() {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "rule",
            path: "forward.rules".into(),
            message: "rules are ignored unless forward.mode = \"config\"".into(),
        });
    }

    let mut seen = HashSet::new();
    for (i, rule) in forward.rules.iter().enumerate() {
        let path = format!("forward.rules[{i}]");
        for (field, address) in [("source", &rule.source), ("target", &rule.target)] {
            if !is_address_like(address) {
                diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    category: "rule",
                    path: format!("{path}.{field}"),
                    message: format!("\"{address}\" is not a platform:channel address"),
                });
            }
        }
        if rule.self_id.trim().is_empty() {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "rule",
                path: format!("{path}.self_id"),
                message: "self_id must name the bot that posts to the target".into(),
            });
        }
        if rule.source == rule.target {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                category: "rule",
                path: path.clone(),
                message: "rule forwards a channel into itself".into(),
            });
        }
        if !seen.insert((rule.source.as_str(), rule.target.as_str())) {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                category: "rule",
                path,
                message: format!("duplicate rule {} -> {}", rule.source, rule.target),
            });
        }
    }
}

/// Cheap syntactic check; the authoritative parse needs the live platform list.
fn is_address_like(address: &str) -> bool {
    matches!(address.split_once(':'), Some((platform, channel)) if !platform.is_empty() && !channel.is_empty())
}
