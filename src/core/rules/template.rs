//! Placeholder templates such as `{date:%Y%m%d}_{index:3}{name}`.

use super::registry::{info_mismatch, RuleDefinition};
use super::types::{ExecArgs, RuleInfo, RuleKind, MAX_PAD_WIDTH};
use crate::error::RuleError;
use chrono::format::{Item, StrftimeItems};
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateInfo {
    pub template: String,
    /// Added to the display index for `{index}`
    pub index_start: usize,
    pub include_ext: bool,
}

impl Default for TemplateInfo {
    fn default() -> Self {
        Self {
            template: "{name}".to_string(),
            index_start: 1,
            include_ext: false,
        }
    }
}

impl TemplateInfo {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    pub fn render(&self, args: &ExecArgs<'_>) -> Result<String, RuleError> {
        let segments = parse(&self.template)?;
        let file = args.file_info;
        let mut out = String::new();

        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(&text),
                Segment::Name => out.push_str(&file.name),
                Segment::Ext => out.push_str(file.ext.trim_start_matches('.')),
                Segment::Full => out.push_str(&file.full_name),
                Segment::Index(width) => {
                    let value = args.index.saturating_add(self.index_start);
                    let _ = write!(out, "{:0width$}", value, width = width.unwrap_or(0));
                }
                Segment::Total => {
                    let _ = write!(out, "{}", args.total);
                }
                Segment::Date(format) => {
                    let Some(dt) = file
                        .timestamp
                        .and_then(|ts| Local.timestamp_opt(ts, 0).single())
                    else {
                        continue;
                    };
                    let format = format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT);
                    write!(out, "{}", dt.format(format)).map_err(|_| {
                        malformed(&self.template, format!("cannot render date format '{}'", format))
                    })?;
                }
                Segment::Time => out.push_str(file.time_string.as_deref().unwrap_or_default()),
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Name,
    Ext,
    Full,
    Index(Option<usize>),
    Total,
    Date(Option<String>),
    Time,
}

fn malformed(template: &str, reason: impl Into<String>) -> RuleError {
    RuleError::MalformedTemplate {
        template: template.to_string(),
        reason: reason.into(),
    }
}

fn parse(template: &str) -> Result<Vec<Segment>, RuleError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '}' => return Err(malformed(template, "unmatched '}'")),
            '{' => {
                let mut body = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => return Err(malformed(template, "nested '{'")),
                        Some(c) => body.push(c),
                        None => return Err(malformed(template, "unclosed '{'")),
                    }
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(placeholder(template, &body)?);
            }
            c => literal.push(c),
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn placeholder(template: &str, body: &str) -> Result<Segment, RuleError> {
    let (key, arg) = match body.split_once(':') {
        Some((key, arg)) => (key, Some(arg)),
        None => (body, None),
    };

    let segment = match (key, arg) {
        ("name", None) => Segment::Name,
        ("ext", None) => Segment::Ext,
        ("full", None) => Segment::Full,
        ("total", None) => Segment::Total,
        ("time", None) => Segment::Time,
        ("index", None) => Segment::Index(None),
        ("index", Some(width)) => {
            let width = width
                .parse::<usize>()
                .ok()
                .filter(|w| *w <= MAX_PAD_WIDTH)
                .ok_or_else(|| malformed(template, format!("invalid index width '{}'", width)))?;
            Segment::Index(Some(width))
        }
        ("date", None) => Segment::Date(None),
        ("date", Some(format)) => {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(malformed(template, format!("invalid date format '{}'", format)));
            }
            Segment::Date(Some(format.to_string()))
        }
        _ => return Err(malformed(template, format!("unknown placeholder '{{{}}}'", body))),
    };
    Ok(segment)
}

pub struct TemplateDefinition;

impl RuleDefinition for TemplateDefinition {
    fn kind(&self) -> RuleKind {
        RuleKind::Template
    }

    fn label(&self) -> &'static str {
        "Template"
    }

    fn default_info(&self) -> RuleInfo {
        RuleInfo::Template(TemplateInfo::default())
    }

    fn describe(&self, info: &RuleInfo) -> String {
        let RuleInfo::Template(info) = info else {
            return String::new();
        };
        format!("Template \"{}\"", info.template)
    }

    fn exec(&self, info: &RuleInfo, args: &ExecArgs<'_>) -> Result<String, RuleError> {
        let RuleInfo::Template(info) = info else {
            return Err(info_mismatch(RuleKind::Template, info));
        };
        info.render(args)
    }
}
