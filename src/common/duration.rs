use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Parse a duration string such as "30m", "1h30m", "1.5h", "250ms" or "0s".
///
/// Accepts a sequence of decimal numbers, each followed by a unit
/// (ns, us, µs, ms, s, m, h). A bare "0" needs no unit. A negative duration
/// is accepted and yields zero, which callers treat as "no timeout".
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let invalid = || format!("invalid duration '{}'", s);

    let (negative, mut rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, after) = rest.split_at(int_len);
        let (frac_part, after) = match after.strip_prefix('.') {
            Some(tail) => {
                let frac_len = tail.bytes().take_while(u8::is_ascii_digit).count();
                tail.split_at(frac_len)
            }
            None => ("", after),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, next) = after.split_at(unit_len);
        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3600 * NANOS_PER_SEC,
            "" => return Err(format!("missing unit in duration '{}'", s)),
            _ => return Err(format!("unknown unit '{}' in duration '{}'", unit, s)),
        };

        if !int_part.is_empty() {
            let whole: u128 = int_part.parse().map_err(|_| invalid())?;
            total = whole
                .checked_mul(scale)
                .and_then(|v| total.checked_add(v))
                .ok_or_else(invalid)?;
        }
        if !frac_part.is_empty() {
            // Digits past nanosecond precision of the largest unit cannot matter.
            let digits = &frac_part[..frac_part.len().min(18)];
            let frac: u128 = digits.parse().map_err(|_| invalid())?;
            total += frac * scale / 10u128.pow(digits.len() as u32);
        }
        rest = next;
    }

    if negative {
        return Ok(Duration::ZERO);
    }
    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| invalid())?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}
