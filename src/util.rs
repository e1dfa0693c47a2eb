/// Formats elapsed milliseconds as `MM:SS`, flooring both parts
pub fn format_mm_ss(elapsed_millis: u64) -> String {
    let minutes = elapsed_millis / 60_000;
    let seconds = (elapsed_millis % 60_000) / 1000;
    format!("{:02}:{:02}", minutes, seconds)
}

/// `round(correct / (correct + wrong) * 100)`, `None` when nothing was answered
pub fn accuracy_percent(correct: u32, wrong: u32) -> Option<u8> {
    let total = correct as u64 + wrong as u64;

    match total {
        positive if positive > 0 => {
            Some(((correct as f64 / total as f64) * 100.0).round() as u8)
        }
        _ => None,
    }
}

/// Reads the leading integer of `raw` after leading whitespace, ignoring
/// whatever follows it. `None` when no digits come first.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let text = raw.trim_start();
    let (negative, rest) = match text.as_bytes().first().copied() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let digits = &rest[..digits_len];
    let value = match digits.parse::<i64>() {
        Ok(v) => v,
        // too long for i64, and never a valid product either way
        Err(_) => i64::MAX,
    };
    Some(if negative { -value } else { value })
}
