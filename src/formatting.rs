use std::time::{SystemTime, UNIX_EPOCH};

/// Longitud máxima de un valor dentro del reporte.
pub const MAX_VALUE_CHARS: usize = 500;
const ELLIPSIS: &str = "...";

pub fn format_size(bytes: u64) -> String {
    format!("{bytes} bytes")
}

/// Segundos desde la época Unix, con parte fraccionaria.
pub fn format_timestamp(time: SystemTime) -> String {
    let seconds = match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs_f64(),
        Err(error) => -error.duration().as_secs_f64(),
    };
    format_seconds(seconds)
}

pub fn format_seconds(seconds: f64) -> String {
    let rendered = seconds.to_string();
    if rendered.contains(['.', 'e', 'E']) || !seconds.is_finite() {
        rendered
    } else {
        format!("{rendered}.0")
    }
}

/// Recorta valores de más de 500 caracteres a 497 más `...`.
pub fn truncate_value(value: &str) -> String {
    if value.chars().count() <= MAX_VALUE_CHARS {
        return value.to_string();
    }

    let keep = MAX_VALUE_CHARS - ELLIPSIS.len();
    let mut truncated: String = value.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn short_values_are_verbatim() {
        assert_eq!(truncate_value(""), "");
        assert_eq!(truncate_value("Canon EOS R5"), "Canon EOS R5");

        let exact = "x".repeat(500);
        assert_eq!(truncate_value(&exact), exact);
    }

    #[test]
    fn long_values_are_cut_to_five_hundred_chars() {
        let long = "a".repeat(501);
        let rendered = truncate_value(&long);
        assert_eq!(rendered.chars().count(), 500);
        assert!(rendered.starts_with(&"a".repeat(497)));
        assert!(rendered.ends_with("..."));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let long = "é".repeat(600);
        let rendered = truncate_value(&long);
        assert_eq!(rendered.chars().count(), 500);
        assert_eq!(rendered.chars().filter(|c| *c == 'é').count(), 497);
    }

    #[test]
    fn timestamps_keep_a_fractional_part() {
        let whole = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(format_timestamp(whole), "1700000000.0");

        let fractional = UNIX_EPOCH + Duration::from_millis(1_700_000_000_250);
        assert_eq!(format_timestamp(fractional), "1700000000.25");
    }

    #[test]
    fn size_has_unit_suffix() {
        assert_eq!(format_size(0), "0 bytes");
        assert_eq!(format_size(2048), "2048 bytes");
    }
}
