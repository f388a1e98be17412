//! Typed rules compiled from the metadata table.
//!
//! Compilation turns flag cells into [`ColumnRule`] values and regex cells into
//! [`RegexGroup`]s, validating every parameter up front so the stages never
//! look at metadata text.

use super::{Flag, MetadataRow, MetadataTable, Param};
use crate::config::{PipelineConfig, RegexScope};
use crate::error::{CleaningError, Result};
use crate::pipeline::CleaningStage;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::debug;

/// Constant used to fill missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillLiteral {
    /// `TRUE` or `FALSE`.
    Bool(bool),
    /// `0`.
    Zero,
}

impl FillLiteral {
    /// Decode a `fill_na_with` cell. Exactly `TRUE`, `FALSE` and `0` are recognized.
    pub fn parse(column: &str, literal: &str) -> Result<Self> {
        match literal {
            "TRUE" => Ok(Self::Bool(true)),
            "FALSE" => Ok(Self::Bool(false)),
            "0" => Ok(Self::Zero),
            other => Err(CleaningError::UnrecognizedFillLiteral {
                column: column.to_string(),
                literal: other.to_string(),
            }),
        }
    }

    /// The literal as written in the metadata.
    pub fn as_text(&self) -> &'static str {
        match self {
            Self::Bool(true) => "TRUE",
            Self::Bool(false) => "FALSE",
            Self::Zero => "0",
        }
    }
}

/// A single typed directive for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRule {
    DropRowsWithNa,
    DeriveToBool,
    Drop,
    /// `None` strips whitespace.
    Strip { chars: Option<String> },
    DateToOrdinal,
    FloatToObject,
    ZeroFill { width: usize },
    FillMissing(FillLiteral),
    StrToInt,
    ObjectToInt,
    ObjectToFloat,
    FloatToInt,
}

impl ColumnRule {
    /// The stage that executes this rule.
    pub fn stage(&self) -> CleaningStage {
        match self {
            Self::DropRowsWithNa => CleaningStage::DropRowsWithNa,
            Self::DeriveToBool => CleaningStage::DeriveToBool,
            Self::Drop => CleaningStage::DropColumns,
            Self::Strip { .. } => CleaningStage::Strip,
            Self::DateToOrdinal => CleaningStage::DateToOrdinal,
            Self::FloatToObject => CleaningStage::FloatToObject,
            Self::ZeroFill { .. } => CleaningStage::ZeroFill,
            Self::FillMissing(_) => CleaningStage::FillMissing,
            Self::StrToInt => CleaningStage::StrToInt,
            Self::ObjectToInt => CleaningStage::ObjectToInt,
            Self::ObjectToFloat => CleaningStage::ObjectToFloat,
            Self::FloatToInt => CleaningStage::FloatToInt,
        }
    }
}

/// One compiled pattern and its replacement.
#[derive(Debug, Clone)]
pub struct RegexReplacement {
    pattern: Regex,
    replacement: String,
}

impl RegexReplacement {
    /// Compile `pattern`; `replacement` may use `\1` / `\g<name>` backreferences.
    pub fn new(group: &str, pattern: &str, replacement: &str) -> Result<Self> {
        let compiled = Regex::new(pattern).map_err(|e| CleaningError::InvalidRegex {
            group: group.to_string(),
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            pattern: compiled,
            replacement: translate_backreferences(replacement),
        })
    }

    /// The source pattern.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// The replacement in `regex` crate syntax.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replace every match in `value`.
    pub fn apply<'a>(&self, value: &'a str) -> Cow<'a, str> {
        self.pattern.replace_all(value, self.replacement.as_str())
    }
}

/// Columns of one regex group and the replacements each receives.
#[derive(Debug, Clone)]
pub struct RegexGroup {
    name: String,
    targets: Vec<(String, Vec<RegexReplacement>)>,
}

impl RegexGroup {
    /// Group name as written in the metadata.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `(column, replacements)` pairs, in metadata order.
    pub fn targets(&self) -> &[(String, Vec<RegexReplacement>)] {
        &self.targets
    }
}

/// Metadata compiled into typed rules, ready for the stages.
#[derive(Debug, Clone, Default)]
pub struct CleaningPlan {
    rules: Vec<(String, ColumnRule)>,
    regex_groups: Vec<RegexGroup>,
}

impl CleaningPlan {
    /// Compile `metadata` under `config`.
    pub fn compile(metadata: &MetadataTable, config: &PipelineConfig) -> Result<Self> {
        let mut rules = Vec::new();
        for row in metadata.rows() {
            for rule in compile_row(row)? {
                rules.push((row.column_name().to_string(), rule));
            }
        }

        let mut regex_groups = Vec::new();
        for group in metadata.regex_groups() {
            regex_groups.push(compile_group(metadata, group, config)?);
        }

        debug!(
            "Compiled {} column rules and {} regex groups",
            rules.len(),
            regex_groups.len()
        );
        Ok(Self {
            rules,
            regex_groups,
        })
    }

    /// Whether the plan does nothing.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.regex_groups.is_empty()
    }

    /// Every `(column, rule)` pair, in metadata order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &ColumnRule)> {
        self.rules
            .iter()
            .map(|(column, rule)| (column.as_str(), rule))
    }

    /// The `(column, rule)` pairs executed by `stage`.
    pub fn rules_for(&self, stage: CleaningStage) -> impl Iterator<Item = (&str, &ColumnRule)> {
        self.rules().filter(move |(_, rule)| rule.stage() == stage)
    }

    /// The columns `stage` will act upon.
    pub fn columns_for(&self, stage: CleaningStage) -> Vec<&str> {
        if stage == CleaningStage::RegexReplace {
            return self
                .regex_groups
                .iter()
                .flat_map(|group| group.targets.iter().map(|(column, _)| column.as_str()))
                .collect();
        }
        self.rules_for(stage).map(|(column, _)| column).collect()
    }

    /// Compiled regex groups.
    pub fn regex_groups(&self) -> &[RegexGroup] {
        &self.regex_groups
    }
}

fn compile_row(row: &MetadataRow) -> Result<Vec<ColumnRule>> {
    let column = row.column_name();
    let mut rules = Vec::new();

    for flag in Flag::ALL {
        if !row.is_set(flag) {
            continue;
        }
        let rule = match flag {
            Flag::DropRowsWithNa => ColumnRule::DropRowsWithNa,
            Flag::DeriveToBool => ColumnRule::DeriveToBool,
            Flag::StripChars => ColumnRule::Strip {
                chars: row.param(Param::CharsToStrip).map(str::to_string),
            },
            Flag::DateToOrdinal => ColumnRule::DateToOrdinal,
            Flag::FloatToObject => ColumnRule::FloatToObject,
            Flag::ZfillCol => ColumnRule::ZeroFill {
                width: parse_width(row)?,
            },
            Flag::FillNa => ColumnRule::FillMissing(FillLiteral::parse(
                column,
                row.param(Param::FillNaWith).unwrap_or_default(),
            )?),
            Flag::StrToInt => ColumnRule::StrToInt,
            Flag::ObjectToInt => ColumnRule::ObjectToInt,
            Flag::ObjectToFloat => ColumnRule::ObjectToFloat,
            Flag::FloatToInt => ColumnRule::FloatToInt,
        };
        rules.push(rule);
    }

    // Drop runs after derive-to-bool, so keep the stage order within the row.
    if row.is_dropped() {
        let at = rules
            .iter()
            .position(|rule| rule.stage() > CleaningStage::DropColumns)
            .unwrap_or(rules.len());
        rules.insert(at, ColumnRule::Drop);
    }

    Ok(rules)
}

fn parse_width(row: &MetadataRow) -> Result<usize> {
    let raw = row.param(Param::Z).ok_or_else(|| {
        CleaningError::InvalidMetadata(format!(
            "column '{}' sets zfill_col but has no 'z'",
            row.column_name()
        ))
    })?;
    raw.trim().parse::<usize>().map_err(|_| {
        CleaningError::InvalidMetadata(format!(
            "column '{}' has z = '{raw}', expected a non-negative integer",
            row.column_name()
        ))
    })
}

fn compile_group(
    metadata: &MetadataTable,
    group: &str,
    config: &PipelineConfig,
) -> Result<RegexGroup> {
    let delimiter = config.regex_pair_delimiter.as_str();
    let mut per_row = Vec::new();
    for row in metadata.rows_in_group(group) {
        per_row.push((row.column_name(), row_pairs(row, group, delimiter)?));
    }

    let targets = match config.regex_scope {
        RegexScope::GroupUnion => {
            let mut seen = HashSet::new();
            let mut union = Vec::new();
            for (pattern, replacement) in per_row.iter().flat_map(|(_, pairs)| pairs) {
                if seen.insert((pattern.as_str(), replacement.as_str())) {
                    union.push(RegexReplacement::new(group, pattern, replacement)?);
                }
            }
            per_row
                .iter()
                .map(|(column, _)| (column.to_string(), union.clone()))
                .collect()
        }
        RegexScope::PerColumn => {
            let mut targets = Vec::with_capacity(per_row.len());
            for (column, pairs) in &per_row {
                let replacements = pairs
                    .iter()
                    .map(|(pattern, replacement)| {
                        RegexReplacement::new(group, pattern, replacement)
                    })
                    .collect::<Result<Vec<_>>>()?;
                targets.push((column.to_string(), replacements));
            }
            targets
        }
    };

    Ok(RegexGroup {
        name: group.to_string(),
        targets,
    })
}

/// Expand one row's `regex` / `regex_replace` cells into parallel pairs.
fn row_pairs(row: &MetadataRow, group: &str, delimiter: &str) -> Result<Vec<(String, String)>> {
    let Some(patterns) = row.param(Param::Regex) else {
        return Ok(Vec::new());
    };
    let replacements = row.param(Param::RegexReplace).ok_or_else(|| {
        CleaningError::InvalidMetadata(format!(
            "column '{}' in regex group '{group}' has a regex but no regex_replace",
            row.column_name()
        ))
    })?;

    let patterns: Vec<&str> = patterns.split(delimiter).collect();
    let replacements: Vec<&str> = replacements.split(delimiter).collect();
    if patterns.len() != replacements.len() {
        return Err(CleaningError::InvalidMetadata(format!(
            "column '{}' in regex group '{group}' declares {} patterns but {} replacements",
            row.column_name(),
            patterns.len(),
            replacements.len()
        )));
    }

    Ok(patterns
        .into_iter()
        .zip(replacements)
        .map(|(pattern, replacement)| (pattern.to_string(), replacement.to_string()))
        .collect())
}

/// Rewrite `\1` and `\g<name>` backreferences into `${1}` / `${name}`,
/// escaping literal `$`.
fn translate_backreferences(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() => {
                    let mut digits = String::new();
                    while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                        digits.push(d);
                        chars.next();
                    }
                    out.push_str(&format!("${{{digits}}}"));
                }
                Some('g') => {
                    chars.next();
                    if chars.peek() == Some(&'<') {
                        chars.next();
                        let name: String = chars.by_ref().take_while(|c| *c != '>').collect();
                        out.push_str(&format!("${{{name}}}"));
                    } else {
                        out.push_str("\\g");
                    }
                }
                Some('\\') => {
                    chars.next();
                    out.push('\\');
                }
                _ => out.push('\\'),
            },
            other => out.push(other),
        }
    }

    out
}
