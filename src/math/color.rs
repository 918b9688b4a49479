//! Color helpers: CSS-style hex parsing and HSL conversion.
//!
//! Colors travel through the crate as linear-ish RGB `Vec3`s in `[0, 1]`;
//! values above 1.0 are allowed and feed the bloom pass.

use super::Vec3;
use crate::error::{Error, Result};

/// Parse `#rrggbb`, `rrggbb`, or `#rgb` into RGB components in `[0, 1]`
pub fn parse_hex(input: &str) -> Result<Vec3> {
    let hex = input.trim().trim_start_matches('#');

    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return Err(Error::Config(format!("invalid color '{}'", input))),
    };

    let channel = |i: usize| {
        u8::from_str_radix(&expanded[i..i + 2], 16)
            .map(|v| v as f32 / 255.0)
            .map_err(|_| Error::Config(format!("invalid color '{}'", input)))
    };

    Ok(Vec3::new(channel(0)?, channel(2)?, channel(4)?))
}

/// Parse a whole palette, failing on the first bad entry
pub fn parse_palette(entries: &[String]) -> Result<Vec<Vec3>> {
    if entries.is_empty() {
        return Err(Error::Config("palette must not be empty".to_string()));
    }
    entries.iter().map(|e| parse_hex(e)).collect()
}

/// HSL to RGB conversion, all inputs in `[0, 1]`
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    if s <= 0.0 {
        return Vec3::splat(l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let hue = |t: f32| {
        let t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };

    Vec3::new(hue(h + 1.0 / 3.0), hue(h), hue(h - 1.0 / 3.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_long_and_short() {
        let pink = parse_hex("#FF007F").unwrap();
        assert!((pink.x - 1.0).abs() < 0.001);
        assert_eq!(pink.y, 0.0);
        assert!((pink.z - 127.0 / 255.0).abs() < 0.001);

        let white = parse_hex("fff").unwrap();
        assert_eq!(white, Vec3::ONE);
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#zzzzzz").is_err());
        assert!(parse_hex("").is_err());
    }

    #[test]
    fn test_parse_palette() {
        let palette = parse_palette(&["#C0C0C0".to_string(), "#00FFFF".to_string()]).unwrap();
        assert_eq!(palette.len(), 2);
        assert!(parse_palette(&[]).is_err());
        assert!(parse_palette(&["#C0C0C0".to_string(), "nope".to_string()]).is_err());
    }

    #[test]
    fn test_hsl_to_rgb() {
        assert_eq!(hsl_to_rgb(0.4, 0.0, 0.9), Vec3::splat(0.9));

        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((red.x - 1.0).abs() < 0.01);
        assert!(red.y.abs() < 0.01);
        assert!(red.z.abs() < 0.01);

        let green = hsl_to_rgb(1.0 / 3.0, 1.0, 0.5);
        assert!(green.x.abs() < 0.01);
        assert!((green.y - 1.0).abs() < 0.01);
    }
}
