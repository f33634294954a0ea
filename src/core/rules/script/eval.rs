//! Tree-walking evaluator with a step budget and a nesting limit.
//!
//! The only names a script can see are the file bindings installed by
//! [`run`] and the primitives below; there is no way to reach the
//! filesystem, environment, clock, or process.

use super::reader::{self, Expr};
use super::ScriptLimits;
use crate::core::rules::types::ExecArgs;
use crate::error::ScriptError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
        }
    }

    fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false))
    }

    fn display(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
        }
    }
}

/// Evaluate `source` against one file and return the resulting name
pub fn run(source: &str, args: &ExecArgs<'_>, limits: ScriptLimits) -> Result<String, ScriptError> {
    let forms = reader::parse_with_depth(source, limits.max_depth)?;
    if forms.is_empty() {
        return Err(ScriptError::InvalidForm {
            message: "script is empty".to_string(),
        });
    }

    let mut evaluator = Evaluator::new(args, limits);
    let mut last = Value::Bool(false);
    for form in &forms {
        last = evaluator.eval(form)?;
    }
    match last {
        Value::Str(s) => Ok(s),
        other => Err(ScriptError::NotAString {
            found: other.type_name(),
        }),
    }
}

struct Evaluator {
    limits: ScriptLimits,
    steps: usize,
    depth: usize,
    /// Innermost binding last
    scope: Vec<(String, Value)>,
}

impl Evaluator {
    fn new(args: &ExecArgs<'_>, limits: ScriptLimits) -> Self {
        let file = args.file_info;
        let scope = vec![
            ("name".to_string(), Value::Str(file.name.clone())),
            ("ext".to_string(), Value::Str(file.ext.clone())),
            ("full-name".to_string(), Value::Str(file.full_name.clone())),
            ("index".to_string(), Value::Int(to_int(args.index))),
            ("total".to_string(), Value::Int(to_int(args.total))),
            ("timestamp".to_string(), Value::Int(file.timestamp.unwrap_or(0))),
            (
                "time-string".to_string(),
                Value::Str(file.time_string.clone().unwrap_or_default()),
            ),
            ("image?".to_string(), Value::Bool(file.is_image)),
            ("video?".to_string(), Value::Bool(file.is_video)),
        ];
        Self {
            limits,
            steps: 0,
            depth: 0,
            scope,
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(ScriptError::StepLimit {
                limit: self.limits.max_steps,
            });
        }
        if self.depth >= self.limits.max_depth {
            return Err(ScriptError::DepthLimit {
                limit: self.limits.max_depth,
            });
        }

        self.depth += 1;
        let result = self.eval_inner(expr);
        self.depth -= 1;
        result
    }

    fn eval_inner(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
        match expr {
            Expr::Int(i) => Ok(Value::Int(*i)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Symbol(name) => self.lookup(name),
            Expr::List(items) => self.eval_list(items),
        }
    }

    fn lookup(&self, name: &str) -> Result<Value, ScriptError> {
        self.scope
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| ScriptError::UnknownName {
                name: name.to_string(),
            })
    }

    fn eval_list(&mut self, items: &[Expr]) -> Result<Value, ScriptError> {
        let Some((head, rest)) = items.split_first() else {
            return Err(invalid("empty call ()"));
        };
        let Expr::Symbol(op) = head else {
            return Err(invalid("call head must be a name"));
        };

        match op.as_str() {
            "if" => self.eval_if(rest),
            "let" => self.eval_let(rest),
            "begin" => self.eval_body(rest),
            "and" => {
                let mut last = Value::Bool(true);
                for expr in rest {
                    last = self.eval(expr)?;
                    if !last.is_truthy() {
                        break;
                    }
                }
                Ok(last)
            }
            "or" => {
                let mut last = Value::Bool(false);
                for expr in rest {
                    last = self.eval(expr)?;
                    if last.is_truthy() {
                        break;
                    }
                }
                Ok(last)
            }
            _ => {
                let args = rest
                    .iter()
                    .map(|expr| self.eval(expr))
                    .collect::<Result<Vec<_>, _>>()?;
                call_primitive(op, &args, self.limits.max_output_len)
            }
        }
    }

    fn eval_if(&mut self, rest: &[Expr]) -> Result<Value, ScriptError> {
        if rest.len() != 2 && rest.len() != 3 {
            return Err(arity("if", "2 or 3", rest.len()));
        }
        if self.eval(&rest[0])?.is_truthy() {
            self.eval(&rest[1])
        } else if let Some(otherwise) = rest.get(2) {
            self.eval(otherwise)
        } else {
            Ok(Value::Str(String::new()))
        }
    }

    /// `(let ((a 1) (b "x")) body...)`; bindings see earlier ones
    fn eval_let(&mut self, rest: &[Expr]) -> Result<Value, ScriptError> {
        let Some((Expr::List(bindings), body)) = rest.split_first() else {
            return Err(invalid("let expects a binding list"));
        };

        let mark = self.scope.len();
        let result = self.bind_all(bindings).and_then(|()| self.eval_body(body));
        self.scope.truncate(mark);
        result
    }

    fn bind_all(&mut self, bindings: &[Expr]) -> Result<(), ScriptError> {
        for binding in bindings {
            let Expr::List(pair) = binding else {
                return Err(invalid("let binding must be (name value)"));
            };
            let [Expr::Symbol(name), value] = pair.as_slice() else {
                return Err(invalid("let binding must be (name value)"));
            };
            let value = self.eval(value)?;
            self.scope.push((name.clone(), value));
        }
        Ok(())
    }

    fn eval_body(&mut self, body: &[Expr]) -> Result<Value, ScriptError> {
        let mut last = Value::Str(String::new());
        for expr in body {
            last = self.eval(expr)?;
        }
        Ok(last)
    }
}

fn to_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn invalid(message: &str) -> ScriptError {
    ScriptError::InvalidForm {
        message: message.to_string(),
    }
}

fn arity(op: &str, expected: &str, found: usize) -> ScriptError {
    ScriptError::Arity {
        operation: op.to_string(),
        expected: expected.to_string(),
        found,
    }
}

fn expect_arity(op: &str, args: &[Value], min: usize, max: usize) -> Result<(), ScriptError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else if max == usize::MAX {
            format!("at least {}", min)
        } else {
            format!("{} to {}", min, max)
        };
        return Err(arity(op, &expected, args.len()));
    }
    Ok(())
}

fn int(op: &str, value: &Value) -> Result<i64, ScriptError> {
    match value {
        Value::Int(i) => Ok(*i),
        other => Err(mismatch(op, "integer", other)),
    }
}

fn string<'v>(op: &str, value: &'v Value) -> Result<&'v str, ScriptError> {
    match value {
        Value::Str(s) => Ok(s.as_str()),
        other => Err(mismatch(op, "string", other)),
    }
}

fn mismatch(op: &str, expected: &'static str, found: &Value) -> ScriptError {
    ScriptError::TypeMismatch {
        operation: op.to_string(),
        expected,
        found: found.type_name(),
    }
}

fn overflow(op: &str) -> ScriptError {
    ScriptError::InvalidForm {
        message: format!("integer overflow in '{}'", op),
    }
}

/// Fails before allocating a string longer than `max_len` characters
fn check_len(len: usize, max_len: usize) -> Result<(), ScriptError> {
    if len > max_len {
        return Err(ScriptError::OutputLimit { limit: max_len });
    }
    Ok(())
}

/// Non-negative character count from an integer argument
fn count(op: &str, value: &Value) -> Result<usize, ScriptError> {
    Ok(usize::try_from(int(op, value)?.max(0)).unwrap_or(usize::MAX))
}

fn pad(op: &str, args: &[Value], at_start: bool, max_len: usize) -> Result<Value, ScriptError> {
    expect_arity(op, args, 2, 3)?;
    let s = string(op, &args[0])?;
    let width = count(op, &args[1])?;
    check_len(width, max_len)?;
    let fill = match args.get(2) {
        Some(value) => string(op, value)?,
        None => " ",
    };
    let len = s.chars().count();
    if len >= width || fill.is_empty() {
        return Ok(Value::Str(s.to_string()));
    }
    let padding: String = fill.chars().cycle().take(width - len).collect();
    Ok(Value::Str(if at_start {
        format!("{}{}", padding, s)
    } else {
        format!("{}{}", s, padding)
    }))
}

fn call_primitive(op: &str, args: &[Value], max_len: usize) -> Result<Value, ScriptError> {
    match op {
        "str" => {
            let parts: Vec<String> = args.iter().map(Value::display).collect();
            let len = parts
                .iter()
                .fold(0usize, |acc, part| acc.saturating_add(part.chars().count()));
            check_len(len, max_len)?;
            Ok(Value::Str(parts.concat()))
        }
        "+" => args
            .iter()
            .try_fold(0i64, |acc, v| {
                acc.checked_add(int(op, v)?).ok_or_else(|| overflow(op))
            })
            .map(Value::Int),
        "*" => args
            .iter()
            .try_fold(1i64, |acc, v| {
                acc.checked_mul(int(op, v)?).ok_or_else(|| overflow(op))
            })
            .map(Value::Int),
        "-" => {
            expect_arity(op, args, 1, usize::MAX)?;
            let first = int(op, &args[0])?;
            if args.len() == 1 {
                return first.checked_neg().map(Value::Int).ok_or_else(|| overflow(op));
            }
            args[1..]
                .iter()
                .try_fold(first, |acc, v| {
                    acc.checked_sub(int(op, v)?).ok_or_else(|| overflow(op))
                })
                .map(Value::Int)
        }
        "/" | "%" => {
            expect_arity(op, args, 2, 2)?;
            let (a, b) = (int(op, &args[0])?, int(op, &args[1])?);
            if b == 0 {
                return Err(ScriptError::DivisionByZero);
            }
            let result = if op == "/" { a.checked_div(b) } else { a.checked_rem(b) };
            result.map(Value::Int).ok_or_else(|| overflow(op))
        }
        "=" => {
            expect_arity(op, args, 2, 2)?;
            Ok(Value::Bool(args[0] == args[1]))
        }
        "<" | ">" | "<=" | ">=" => {
            expect_arity(op, args, 2, 2)?;
            let (a, b) = (int(op, &args[0])?, int(op, &args[1])?);
            Ok(Value::Bool(match op {
                "<" => a < b,
                ">" => a > b,
                "<=" => a <= b,
                _ => a >= b,
            }))
        }
        "not" => {
            expect_arity(op, args, 1, 1)?;
            Ok(Value::Bool(!args[0].is_truthy()))
        }
        "upper" | "lower" | "trim" | "len" => {
            expect_arity(op, args, 1, 1)?;
            let s = string(op, &args[0])?;
            Ok(match op {
                "upper" => Value::Str(s.to_uppercase()),
                "lower" => Value::Str(s.to_lowercase()),
                "trim" => Value::Str(s.trim().to_string()),
                _ => Value::Int(to_int(s.chars().count())),
            })
        }
        "substr" => {
            expect_arity(op, args, 2, 3)?;
            let s = string(op, &args[0])?;
            let start = count(op, &args[1])?;
            let taken = match args.get(2) {
                Some(len) => count(op, len)?,
                None => usize::MAX,
            };
            Ok(Value::Str(s.chars().skip(start).take(taken).collect()))
        }
        "replace" => {
            expect_arity(op, args, 3, 3)?;
            let s = string(op, &args[0])?;
            let from = string(op, &args[1])?;
            let to = string(op, &args[2])?;
            if from.is_empty() {
                return Ok(Value::Str(s.to_string()));
            }
            let hits = s.matches(from).count();
            let (from_len, to_len) = (from.chars().count(), to.chars().count());
            let kept = s.chars().count() - hits * from_len;
            let len = kept.saturating_add(hits.saturating_mul(to_len));
            check_len(len, max_len)?;
            Ok(Value::Str(s.replace(from, to)))
        }
        "pad-start" => pad(op, args, true, max_len),
        "pad-end" => pad(op, args, false, max_len),
        "starts-with?" | "ends-with?" | "contains?" => {
            expect_arity(op, args, 2, 2)?;
            let s = string(op, &args[0])?;
            let needle = string(op, &args[1])?;
            Ok(Value::Bool(match op {
                "starts-with?" => s.starts_with(needle),
                "ends-with?" => s.ends_with(needle),
                _ => s.contains(needle),
            }))
        }
        "parse-int" => {
            // (parse-int s) fails on bad input; (parse-int s fallback) does not
            expect_arity(op, args, 1, 2)?;
            let s = string(op, &args[0])?;
            match (s.trim().parse::<i64>(), args.get(1)) {
                (Ok(n), _) => Ok(Value::Int(n)),
                (Err(_), Some(fallback)) => Ok(Value::Int(int(op, fallback)?)),
                (Err(_), None) => Err(ScriptError::InvalidForm {
                    message: format!("cannot parse '{}' as an integer", s),
                }),
            }
        }
        _ => Err(ScriptError::UnknownFunction {
            name: op.to_string(),
        }),
    }
}
