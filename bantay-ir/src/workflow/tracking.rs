//! Human-readable tracking codes (`BNT-YYYYMMDD-XXXXXX`)

use chrono::{DateTime, Utc};
use rand::Rng;

pub const TRACKING_CODE_PREFIX: &str = "BNT";

/// Uppercase alphanumerics without the easily confused 0/O and 1/I/L
const ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 6;

/// Generate a fresh code for a concern created at `created_at`
pub fn generate_tracking_code<R: Rng + ?Sized>(created_at: DateTime<Utc>, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!(
        "{}-{}-{}",
        TRACKING_CODE_PREFIX,
        created_at.format("%Y%m%d"),
        suffix
    )
}

/// Shape check used before hitting the database on public lookups
pub fn is_well_formed(code: &str) -> bool {
    let mut parts = code.split('-');
    let (Some(prefix), Some(date), Some(suffix), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    prefix == TRACKING_CODE_PREFIX
        && date.len() == 8
        && date.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix.bytes().all(|b| ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_code_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let ts = Utc.with_ymd_and_hms(2026, 10, 17, 8, 30, 0).unwrap();
        let code = generate_tracking_code(ts, &mut rng);
        assert!(code.starts_with("BNT-20261017-"));
        assert_eq!(code.len(), "BNT-20261017-".len() + 6);
        assert!(is_well_formed(&code));
    }

    #[test]
    fn test_codes_vary() {
        let mut rng = StdRng::seed_from_u64(42);
        let ts = Utc::now();
        let a = generate_tracking_code(ts, &mut rng);
        let b = generate_tracking_code(ts, &mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_codes_rejected() {
        assert!(!is_well_formed("BNT-2026101-ABCDEF"));
        assert!(!is_well_formed("XYZ-20261017-ABCDEF"));
        assert!(!is_well_formed("BNT-20261017-ABCDE0"));
        assert!(!is_well_formed("BNT-20261017-ABCDEF-1"));
        assert!(!is_well_formed(""));
    }
}
