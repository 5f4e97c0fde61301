use super::{Computed, Value};

/// Format a stored value for display. Unset and unresolved values are blank.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        Value::Unset | Value::Unresolved => String::new(),
    }
}

/// Format an engine result for display.
pub fn format_computed(computed: &Computed) -> String {
    match computed {
        Computed::Number(n) => format_number(*n),
        Computed::Unresolved => String::new(),
    }
}

/// Format a number for display.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "#NAN!".to_string()
    } else if n.is_infinite() {
        "#INF!".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else if n.abs() >= 1e15 {
        format!("{:.6e}", n)
    } else {
        format!("{:.2}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-2.5), "-2.50");
        assert_eq!(format_number(f64::INFINITY), "#INF!");
        assert_eq!(format_number(f64::NAN), "#NAN!");
        assert_eq!(format_number(1.5e20), "1.500000e20");
    }

    #[test]
    fn test_blank_values() {
        assert_eq!(format_value(&Value::Unset), "");
        assert_eq!(format_value(&Value::Unresolved), "");
        assert_eq!(format_computed(&Computed::Unresolved), "");
        assert_eq!(format_value(&Value::Number(7.0)), "7");
    }
}
