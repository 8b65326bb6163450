//! Rendering of resolved values by declared datatype.

use crate::flatten::{DataType, ScalarValue};

/// A value rendered for substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    /// Text that replaces the quoted token in a template.
    pub replacement: String,
    /// Unquoted text, used for headers, delay and status specials.
    pub plain: String,
}

pub fn format_value(value: &ScalarValue, datatype: DataType) -> Formatted {
    match datatype {
        DataType::Bool => same(value.to_bool().to_string()),
        DataType::Float64 => same(value.to_f64().to_string()),
        DataType::Int => same(value.to_i64().to_string()),
        DataType::Invalid => same("null".to_string()),
        DataType::XmlString => same(value.to_string()),
        DataType::String => {
            let plain = value.to_string();
            let replacement =
                serde_json::to_string(&plain).unwrap_or_else(|_| format!("\"{plain}\""));
            Formatted { replacement, plain }
        }
    }
}

fn same(text: String) -> Formatted {
    Formatted {
        replacement: text.clone(),
        plain: text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquoted_types() {
        assert_eq!(format_value(&"1".into(), DataType::Bool).replacement, "true");
        assert_eq!(format_value(&"nope".into(), DataType::Bool).replacement, "false");
        assert_eq!(format_value(&"2.50".into(), DataType::Float64).replacement, "2.5");
        assert_eq!(format_value(&ScalarValue::Float(9.9), DataType::Int).replacement, "9");
        assert_eq!(format_value(&"x".into(), DataType::Invalid).replacement, "null");
        assert_eq!(format_value(&"<b>".into(), DataType::XmlString).replacement, "<b>");
    }

    #[test]
    fn test_strings_are_quoted_and_escaped() {
        let f = format_value(&"say \"hi\"".into(), DataType::String);
        assert_eq!(f.replacement, r#""say \"hi\"""#);
        assert_eq!(f.plain, "say \"hi\"");
        assert_eq!(format_value(&ScalarValue::Int(7), DataType::String).replacement, "\"7\"");
    }
}
