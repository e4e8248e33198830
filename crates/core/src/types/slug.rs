//! URL-safe slugs for names.

use chrono::{DateTime, Utc};

/// Lowercase `name`, replace every run of characters outside `[a-z0-9]` with a
/// single `-`, and trim leading/trailing dashes.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// A slug suffixed with the timestamp in base 36 milliseconds, e.g.
/// `"blue-vase-m2x1q9ab"`. Used for new product ids and uploaded asset names.
#[must_use]
pub fn timestamped_slug(name: &str, at: DateTime<Utc>) -> String {
    let millis = u64::try_from(at.timestamp_millis()).unwrap_or_default();
    let stamp = to_base36(millis);
    let slug = slugify(name);
    if slug.is_empty() {
        stamp
    } else {
        format!("{slug}-{stamp}")
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        #[allow(clippy::cast_possible_truncation)] // remainder is always < 36
        let digit = DIGITS[(value % 36) as usize];
        out.push(digit);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Blue Ceramic Vase"), "blue-ceramic-vase");
        assert_eq!(slugify("  --Lamp!! (Brass)--"), "lamp-brass");
        assert_eq!(slugify("IMG_0042.jpg"), "img-0042-jpg");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn test_timestamped_slug() {
        let at = Utc.timestamp_millis_opt(36).single().unwrap_or_default();
        assert_eq!(timestamped_slug("Hero Image", at), "hero-image-10");
        assert_eq!(timestamped_slug("!!", at), "10");
    }
}
