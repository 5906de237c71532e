use crate::config::TIME_SENTINELS;
use crate::types::NormalizedTime;

/// Turn the page's free-form clock text into a minute count and a display label.
///
/// Only the digits are kept, so `45'` and `90+2'` both work. More than two digits
/// are read as two regulation digits followed by stoppage digits; a single-digit
/// regulation minute with stoppage (`5+10`) is therefore misread, which we accept.
/// Never fails: anything that can't be read comes back as `(0, raw)`.
pub fn normalize(raw: Option<&str>, max_minutes: u32) -> NormalizedTime {
    let raw = raw.unwrap_or("");
    if raw.is_empty() || is_sentinel(raw) {
        return passthrough(raw);
    }

    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() > 2 {
        let (regulation, stoppage) = digits.split_at(2);
        let (Ok(regulation), Ok(stoppage)) = (regulation.parse::<u32>(), stoppage.parse::<u32>())
        else {
            return passthrough(raw);
        };
        return NormalizedTime {
            minutes: regulation.saturating_add(stoppage).min(max_minutes),
            display: format!("{regulation}+{stoppage}'"),
        };
    }

    let minutes = if digits.is_empty() {
        0
    } else {
        match digits.parse::<u32>() {
            Ok(m) => m,
            Err(_) => return passthrough(raw),
        }
    };
    NormalizedTime {
        minutes: minutes.min(max_minutes),
        display: format!("{minutes}'"),
    }
}

fn is_sentinel(raw: &str) -> bool {
    let lowered = raw.trim().to_lowercase();
    TIME_SENTINELS.iter().any(|s| *s == lowered)
}

fn passthrough(raw: &str) -> NormalizedTime {
    NormalizedTime {
        minutes: 0,
        display: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_MINUTES;

    fn n(raw: &str) -> (u32, String) {
        let t = normalize(Some(raw), MAX_MINUTES);
        (t.minutes, t.display)
    }

    #[test]
    fn plain_minute() {
        assert_eq!(n("45'"), (45, "45'".to_string()));
        assert_eq!(n("7"), (7, "7'".to_string()));
    }

    #[test]
    fn stoppage_time() {
        assert_eq!(n("90+2'"), (92, "90+2'".to_string()));
        assert_eq!(n("902"), (92, "90+2'".to_string()));
    }

    #[test]
    fn long_digit_strings_split_two_and_rest() {
        assert_eq!(n("250"), (25, "25+0'".to_string()));
        assert_eq!(n("5+10"), (51, "51+0'".to_string()));
    }

    #[test]
    fn empty_and_absent_pass_through() {
        assert_eq!(n(""), (0, String::new()));
        let t = normalize(None, MAX_MINUTES);
        assert_eq!((t.minutes, t.display.as_str()), (0, ""));
    }

    #[test]
    fn sentinels_pass_through_untouched() {
        assert_eq!(n("Intervalo"), (0, "Intervalo".to_string()));
        assert_eq!(n("NÃO INICIADO"), (0, "NÃO INICIADO".to_string()));
    }

    #[test]
    fn no_digits_reads_as_zero() {
        assert_eq!(n("ao vivo"), (0, "0'".to_string()));
    }

    #[test]
    fn clamps_to_cap() {
        assert_eq!(normalize(Some("99"), 90).minutes, 90);
        assert_eq!(normalize(Some("90+45"), 120).minutes, 120);
    }

    #[test]
    fn overflow_falls_back_to_raw() {
        let raw = "90+99999999999999999999";
        assert_eq!(n(raw), (0, raw.to_string()));
    }

    #[test]
    fn minutes_never_exceed_cap() {
        for raw in ["0", "59'", "90+8'", "120", "9999", "45+15", "intervalo", "x"] {
            assert!(normalize(Some(raw), MAX_MINUTES).minutes <= MAX_MINUTES, "{raw}");
        }
    }
}
