//! Case conversion and padding.

use super::registry::{info_mismatch, RuleDefinition};
use super::types::{ExecArgs, RuleInfo, RuleKind, MAX_PAD_WIDTH};
use crate::error::RuleError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStyle {
    #[default]
    Keep,
    Lower,
    Upper,
    /// First letter of every word upper, the rest lower
    Title,
    /// First letter upper, the rest lower
    Sentence,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadSide {
    #[default]
    Left,
    Right,
}

/// Pad the whole result to `width` characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadSpec {
    pub width: usize,
    #[serde(default = "default_fill")]
    pub fill: char,
    #[serde(default)]
    pub side: PadSide,
}

fn default_fill() -> char {
    '0'
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatInfo {
    pub case: CaseStyle,
    /// Zero-pad every run of digits to this width
    pub pad_numbers: Option<usize>,
    pub pad: Option<PadSpec>,
    pub include_ext: bool,
}

impl FormatInfo {
    pub fn case(case: CaseStyle) -> Self {
        Self {
            case,
            ..Self::default()
        }
    }

    pub fn apply(&self, input: &str) -> String {
        let mut out = apply_case(input, self.case);
        if let Some(width) = self.pad_numbers {
            out = pad_digit_runs(&out, width.min(MAX_PAD_WIDTH));
        }
        if let Some(pad) = &self.pad {
            out = pad_to(&out, pad);
        }
        out
    }
}

fn apply_case(input: &str, case: CaseStyle) -> String {
    match case {
        CaseStyle::Keep => input.to_string(),
        CaseStyle::Lower => input.to_lowercase(),
        CaseStyle::Upper => input.to_uppercase(),
        CaseStyle::Title => {
            let mut out = String::with_capacity(input.len());
            let mut word_start = true;
            for c in input.chars() {
                if c.is_alphanumeric() {
                    if word_start {
                        out.extend(c.to_uppercase());
                    } else {
                        out.extend(c.to_lowercase());
                    }
                    word_start = false;
                } else {
                    out.push(c);
                    word_start = c != '\'';
                }
            }
            out
        }
        CaseStyle::Sentence => {
            let mut out = String::with_capacity(input.len());
            let mut seen_letter = false;
            for c in input.chars() {
                if !seen_letter && c.is_alphabetic() {
                    out.extend(c.to_uppercase());
                    seen_letter = true;
                } else {
                    out.extend(c.to_lowercase());
                }
            }
            out
        }
    }
}

fn pad_digit_runs(input: &str, width: usize) -> String {
    let mut out = String::with_capacity(input.len());
    let mut run = String::new();
    for c in input.chars() {
        if c.is_ascii_digit() {
            run.push(c);
            continue;
        }
        flush_run(&mut out, &mut run, width);
        out.push(c);
    }
    flush_run(&mut out, &mut run, width);
    out
}

fn flush_run(out: &mut String, run: &mut String, width: usize) {
    if run.is_empty() {
        return;
    }
    for _ in run.len()..width {
        out.push('0');
    }
    out.push_str(run);
    run.clear();
}

fn pad_to(input: &str, pad: &PadSpec) -> String {
    let width = pad.width.min(MAX_PAD_WIDTH);
    let len = input.chars().count();
    if len >= width {
        return input.to_string();
    }
    let fill: String = std::iter::repeat(pad.fill).take(width - len).collect();
    match pad.side {
        PadSide::Left => format!("{}{}", fill, input),
        PadSide::Right => format!("{}{}", input, fill),
    }
}

pub struct FormatDefinition;

impl RuleDefinition for FormatDefinition {
    fn kind(&self) -> RuleKind {
        RuleKind::Format
    }

    fn label(&self) -> &'static str {
        "Format"
    }

    fn default_info(&self) -> RuleInfo {
        RuleInfo::Format(FormatInfo::default())
    }

    fn describe(&self, info: &RuleInfo) -> String {
        let RuleInfo::Format(info) = info else {
            return String::new();
        };
        let mut parts = Vec::new();
        match info.case {
            CaseStyle::Keep => {}
            CaseStyle::Lower => parts.push("lowercase".to_string()),
            CaseStyle::Upper => parts.push("uppercase".to_string()),
            CaseStyle::Title => parts.push("title case".to_string()),
            CaseStyle::Sentence => parts.push("sentence case".to_string()),
        }
        if let Some(width) = info.pad_numbers {
            parts.push(format!("numbers padded to {}", width));
        }
        if let Some(pad) = &info.pad {
            parts.push(format!("padded to {} with '{}'", pad.width, pad.fill));
        }
        if parts.is_empty() {
            "Format (no change)".to_string()
        } else {
            format!("Format: {}", parts.join(", "))
        }
    }

    fn exec(&self, info: &RuleInfo, args: &ExecArgs<'_>) -> Result<String, RuleError> {
        let RuleInfo::Format(info) = info else {
            return Err(info_mismatch(RuleKind::Format, info));
        };
        Ok(info.apply(args.input(info.include_ext)))
    }
}
