//! Message template compilation
//!
//! Templates use printf-style named placeholders resolved against a JSON
//! view of the record: `%(objectName)s`, `%(details.population)i`,
//! `%(details.ratio).2f`. A placeholder is
//!
//! ```text
//! %(path)[+][0|'c][-][width][.precision]type
//! ```
//!
//! with `type` one of `s d i u f j b o x X t`, and `%%` for a literal `%`.
//!
//! [`MessageCompiler::compile`] never fails: any error degrades to an
//! empty message.

use serde_json::Value;
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

use crate::merge::get_path;

/// Why a template could not be rendered
///
/// Never escapes [`MessageCompiler::compile`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateCompilationError {
    /// Placeholder cut short by the end of the template
    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),

    /// Placeholder without a `(name)`
    #[error("positional placeholder at byte {0} is not supported")]
    Positional(usize),

    /// Conversion character not supported
    #[error("unsupported conversion '{0}'")]
    UnsupportedConversion(char),

    /// Path does not exist in the record
    #[error("field '{0}' not found")]
    MissingField(String),

    /// Numeric conversion applied to a non-numeric value
    #[error("field '{field}' expects a number, got {value}")]
    NotANumber { field: String, value: String },

    /// Width or precision above [`MAX_WIDTH`]
    #[error("width or precision {0} exceeds the maximum")]
    WidthTooLarge(String),
}

/// Largest width or precision a placeholder may ask for
pub const MAX_WIDTH: usize = 4096;

type Render<T> = std::result::Result<T, TemplateCompilationError>;

/// Renders message templates
pub struct MessageCompiler;

impl MessageCompiler {
    /// Render `template` against `fields`, failing soft to an empty string
    pub fn compile(template: &str, fields: &Value) -> String {
        match Self::render(template, fields) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(template = %template, error = %e, "Message template failed to compile");
                String::new()
            }
        }
    }

    /// Render `template` against `fields`, reporting the first error
    pub fn render(
        template: &str,
        fields: &Value,
    ) -> std::result::Result<String, TemplateCompilationError> {
        let mut out = String::with_capacity(template.len());
        let mut chars = template.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.peek() {
                Some((_, '%')) => {
                    chars.next();
                    out.push('%');
                }
                Some((_, '(')) => {
                    chars.next();
                    let spec = Placeholder::parse(pos, &mut chars)?;
                    out.push_str(&spec.format(fields)?);
                }
                Some(_) => return Err(TemplateCompilationError::Positional(pos)),
                None => return Err(TemplateCompilationError::Unterminated(pos)),
            }
        }

        Ok(out)
    }
}

/// One parsed `%(...)` placeholder
#[derive(Debug)]
struct Placeholder {
    path: String,
    plus: bool,
    pad: Option<char>,
    left: bool,
    width: usize,
    precision: Option<usize>,
    kind: char,
}

impl Placeholder {
    /// Parse after the opening `%(`
    fn parse(start: usize, chars: &mut Peekable<CharIndices<'_>>) -> Render<Self> {
        let mut path = String::new();
        loop {
            match chars.next() {
                Some((_, ')')) => break,
                Some((_, c)) => path.push(c),
                None => return Err(TemplateCompilationError::Unterminated(start)),
            }
        }

        let mut spec = Placeholder {
            path,
            plus: false,
            pad: None,
            left: false,
            width: 0,
            precision: None,
            kind: 's',
        };

        if next_is(chars, '+') {
            spec.plus = true;
        }
        if next_is(chars, '0') {
            spec.pad = Some('0');
        } else if next_is(chars, '\'') {
            match chars.next() {
                Some((_, c)) => spec.pad = Some(c),
                None => return Err(TemplateCompilationError::Unterminated(start)),
            }
        }
        if next_is(chars, '-') {
            spec.left = true;
        }
        spec.width = read_number(chars)?.unwrap_or(0);
        if next_is(chars, '.') {
            spec.precision = Some(read_number(chars)?.unwrap_or(0));
        }

        match chars.next() {
            Some((_, c)) if "sdiufjboxXt".contains(c) => spec.kind = c,
            Some((_, c)) => return Err(TemplateCompilationError::UnsupportedConversion(c)),
            None => return Err(TemplateCompilationError::Unterminated(start)),
        }
        Ok(spec)
    }

    fn format(&self, fields: &Value) -> Render<String> {
        let value = get_path(fields, &self.path)
            .filter(|v| !v.is_null())
            .ok_or_else(|| TemplateCompilationError::MissingField(self.path.clone()))?;

        let (sign, body) = match self.kind {
            's' => {
                let text = text_of(value);
                match self.precision {
                    Some(p) => (String::new(), text.chars().take(p).collect()),
                    None => (String::new(), text),
                }
            }
            'd' | 'i' => {
                let n = self.number(value)?.trunc();
                signed(n, self.plus, format!("{}", n.abs()))
            }
            'u' => {
                let n = self.number(value)?.trunc() as i64 as u32;
                (String::new(), n.to_string())
            }
            'f' => {
                let n = self.number(value)?;
                let body = match self.precision {
                    Some(p) => format!("{:.*}", p, n.abs()),
                    None => format!("{}", n.abs()),
                };
                signed(n, self.plus, body)
            }
            'b' => (String::new(), format!("{:b}", self.unsigned(value)?)),
            'o' => (String::new(), format!("{:o}", self.unsigned(value)?)),
            'x' => (String::new(), format!("{:x}", self.unsigned(value)?)),
            'X' => (String::new(), format!("{:X}", self.unsigned(value)?)),
            'j' => (String::new(), value.to_string()),
            't' => (String::new(), truthy(value).to_string()),
            other => return Err(TemplateCompilationError::UnsupportedConversion(other)),
        };

        Ok(self.pad(sign, body))
    }

    fn number(&self, value: &Value) -> Render<f64> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|n| n.is_finite())
            .ok_or_else(|| TemplateCompilationError::NotANumber {
                field: self.path.clone(),
                value: value.to_string(),
            })
    }

    fn unsigned(&self, value: &Value) -> Render<u64> {
        Ok(self.number(value)?.trunc() as i64 as u32 as u64)
    }

    fn pad(&self, sign: String, body: String) -> String {
        let len = sign.chars().count() + body.chars().count();
        if len >= self.width {
            return format!("{}{}", sign, body);
        }
        let fill_char = self.pad.unwrap_or(' ');
        if self.left {
            let fill: String = std::iter::repeat(' ').take(self.width - len).collect();
            return format!("{}{}{}", sign, body, fill);
        }
        let fill: String = std::iter::repeat(fill_char).take(self.width - len).collect();
        if fill_char == '0' {
            format!("{}{}{}", sign, fill, body)
        } else {
            format!("{}{}{}", fill, sign, body)
        }
    }
}

fn next_is(chars: &mut Peekable<CharIndices<'_>>, expected: char) -> bool {
    match chars.peek() {
        Some((_, c)) if *c == expected => {
            chars.next();
            true
        }
        _ => false,
    }
}

/// Width or precision digits, `None` when there are none
fn read_number(chars: &mut Peekable<CharIndices<'_>>) -> Render<Option<usize>> {
    let mut digits = String::new();
    while let Some((_, c)) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(*c);
        chars.next();
    }
    if digits.is_empty() {
        return Ok(None);
    }
    match digits.parse::<usize>() {
        Ok(n) if n <= MAX_WIDTH => Ok(Some(n)),
        _ => Err(TemplateCompilationError::WidthTooLarge(digits)),
    }
}

fn signed(n: f64, plus: bool, body: String) -> (String, String) {
    let sign = if n < 0.0 {
        "-"
    } else if plus {
        "+"
    } else {
        ""
    };
    (sign.to_string(), body)
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> Value {
        json!({
            "objectType": "City",
            "objectName": "Barcelona",
            "details": {
                "population": 2873000,
                "ratio": 0.4567,
                "minutes": "15",
                "delta": -12,
                "flags": 10,
                "tags": ["a", "b"]
            }
        })
    }

    #[test]
    fn test_named_string_and_integer() {
        let msg = MessageCompiler::render(
            "%(objectName)s population is now %(details.population)i",
            &fields(),
        )
        .unwrap();
        assert_eq!(msg, "Barcelona population is now 2873000");
    }

    #[test]
    fn test_numeric_string_is_accepted_for_integer() {
        let msg = MessageCompiler::render("%(details.minutes)d minutes", &fields()).unwrap();
        assert_eq!(msg, "15 minutes");
    }

    #[test]
    fn test_float_precision_and_sign() {
        let f = fields();
        assert_eq!(MessageCompiler::render("%(details.ratio).2f", &f).unwrap(), "0.46");
        assert_eq!(MessageCompiler::render("%(details.delta)+d", &f).unwrap(), "-12");
        assert_eq!(MessageCompiler::render("%(details.population)+d", &f).unwrap(), "+2873000");
    }

    #[test]
    fn test_padding() {
        let f = fields();
        assert_eq!(MessageCompiler::render("[%(details.delta)05d]", &f).unwrap(), "[-0012]");
        assert_eq!(MessageCompiler::render("[%(objectType)6s]", &f).unwrap(), "[  City]");
        assert_eq!(MessageCompiler::render("[%(objectType)-6s]", &f).unwrap(), "[City  ]");
        assert_eq!(MessageCompiler::render("[%(objectType)'*6s]", &f).unwrap(), "[**City]");
    }

    #[test]
    fn test_radix_json_and_bool_conversions() {
        let f = fields();
        assert_eq!(MessageCompiler::render("%(details.flags)b", &f).unwrap(), "1010");
        assert_eq!(MessageCompiler::render("%(details.flags)x", &f).unwrap(), "a");
        assert_eq!(MessageCompiler::render("%(details.flags)X", &f).unwrap(), "A");
        assert_eq!(MessageCompiler::render("%(details.flags)o", &f).unwrap(), "12");
        assert_eq!(MessageCompiler::render("%(details.tags)j", &f).unwrap(), r#"["a","b"]"#);
        assert_eq!(MessageCompiler::render("%(details.tags.1)s", &f).unwrap(), "b");
        assert_eq!(MessageCompiler::render("%(objectName)t", &f).unwrap(), "true");
    }

    #[test]
    fn test_string_precision_truncates() {
        assert_eq!(MessageCompiler::render("%(objectName).4s", &fields()).unwrap(), "Barc");
    }

    #[test]
    fn test_literal_percent() {
        assert_eq!(
            MessageCompiler::render("100%% of %(objectName)s", &fields()).unwrap(),
            "100% of Barcelona"
        );
    }

    #[test]
    fn test_missing_field_errors() {
        let err = MessageCompiler::render("%(details.mayor)s", &fields()).unwrap_err();
        assert_eq!(err, TemplateCompilationError::MissingField("details.mayor".to_string()));
    }

    #[test]
    fn test_null_field_is_missing() {
        let f = json!({"objectName": null, "details": {"mayor": null}});
        assert_eq!(
            MessageCompiler::render("%(objectName)s", &f).unwrap_err(),
            TemplateCompilationError::MissingField("objectName".to_string())
        );
        assert_eq!(MessageCompiler::compile("a %(details.mayor)s", &f), "");
    }

    #[test]
    fn test_oversized_width_errors() {
        let f = fields();
        assert_eq!(
            MessageCompiler::render("%(objectName)1000000000000s", &f).unwrap_err(),
            TemplateCompilationError::WidthTooLarge("1000000000000".to_string())
        );
        assert!(matches!(
            MessageCompiler::render("%(objectName)99999999999999999999999s", &f),
            Err(TemplateCompilationError::WidthTooLarge(_))
        ));
        assert_eq!(MessageCompiler::compile("%(objectName)1000000000000s", &f), "");
        assert_eq!(MessageCompiler::render("[%(objectType)4096s]", &f).unwrap().len(), 4098);
    }

    #[test]
    fn test_oversized_precision_errors() {
        let f = fields();
        assert!(matches!(
            MessageCompiler::render("%(details.ratio).1000000000f", &f),
            Err(TemplateCompilationError::WidthTooLarge(_))
        ));
        assert_eq!(MessageCompiler::compile("%(objectName).5000s", &f), "");
    }

    #[test]
    fn test_type_mismatch_errors() {
        let err = MessageCompiler::render("%(objectName)i", &fields()).unwrap_err();
        assert!(matches!(err, TemplateCompilationError::NotANumber { .. }));
    }

    #[test]
    fn test_malformed_placeholders_error() {
        let f = fields();
        assert!(matches!(
            MessageCompiler::render("%(objectName", &f),
            Err(TemplateCompilationError::Unterminated(0))
        ));
        assert!(matches!(
            MessageCompiler::render("oops %", &f),
            Err(TemplateCompilationError::Unterminated(5))
        ));
        assert!(matches!(
            MessageCompiler::render("%s", &f),
            Err(TemplateCompilationError::Positional(0))
        ));
        assert!(matches!(
            MessageCompiler::render("%(objectName)q", &f),
            Err(TemplateCompilationError::UnsupportedConversion('q'))
        ));
    }

    #[test]
    fn test_compile_never_fails() {
        let f = fields();
        assert_eq!(MessageCompiler::compile("%(nope)s", &f), "");
        assert_eq!(MessageCompiler::compile("%(objectName)i", &f), "");
        assert_eq!(MessageCompiler::compile("%(objectName", &f), "");
        assert_eq!(MessageCompiler::compile("%(objectName)s", &f), "Barcelona");
    }
}
