//! Lenient numeric input: take the leading number, fall back to zero.

use std::sync::LazyLock;

use regex::Regex;

static LEADING_FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").expect("float pattern")
});

static LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("int pattern"));

pub fn parse_float(input: &str) -> f64 {
    leading(&LEADING_FLOAT, input)
}

/// Integer part only: `"12.7"` gives `12`.
pub fn parse_int(input: &str) -> f64 {
    leading(&LEADING_INT, input)
}

fn leading(re: &Regex, input: &str) -> f64 {
    re.captures(input)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
