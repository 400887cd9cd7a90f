use chrono::{Datelike, NaiveDate};

/// Formatea un monto con dos decimales, separadores de miles y el prefijo
/// de moneda. El prefijo es ASCII estable; nunca un glifo Unicode.
pub fn format_money(amount: f64, prefix: &str) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let parts: Vec<&str> = formatted.split('.').collect();
    let integer = parts[0];
    let decimal = parts.get(1).unwrap_or(&"00");

    let mut grouped = String::new();
    for (i, c) in integer.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let integer: String = grouped.chars().rev().collect();

    if amount < 0.0 {
        format!("-{}{}.{}", prefix, integer, decimal)
    } else {
        format!("{}{}.{}", prefix, integer, decimal)
    }
}

/// Formatea un número sin ceros finales, con hasta dos decimales.
/// Se usa para cantidades y para las tasas dentro de las etiquetas
/// ("Discount (7.5%):", "Quantity: 2").
pub fn format_number(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

/// Parte una línea en trozos de hasta `max_chars`, cortando en espacios.
/// Una palabra más larga que el máximo queda entera en su propia línea.
pub fn wrap_line(line: &str, max_chars: usize) -> Vec<String> {
    if line.chars().count() <= max_chars {
        return vec![line.to_string()];
    }
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Fecha larga con sufijo ordinal: "August 23rd, 2026".
pub fn format_long_date(date: NaiveDate) -> String {
    let day = date.day();
    let suffix = match day {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    };
    format!("{} {}{}, {}", date.format("%B"), day, suffix, date.year())
}
