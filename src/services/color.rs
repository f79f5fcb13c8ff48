//! Maps polish hex colors onto a small set of display families for
//! analytics. Buckets are non-overlapping: achromatic checks run first,
//! then the hue wheel is partitioned once.

/// Family for a `#RRGGBB` color. Anything unparseable is "other".
#[must_use]
pub fn color_family(hex: &str) -> &'static str {
    let Some((r, g, b)) = parse_hex(hex) else {
        return "other";
    };

    let (h, s, l) = rgb_to_hsl(r, g, b);

    if l < 0.12 {
        return "black";
    }
    if l > 0.92 && s < 0.20 {
        return "white";
    }
    if s < 0.10 {
        return "gray";
    }

    match h {
        h if h < 15.0 || h >= 335.0 => "red",
        h if h < 45.0 => "orange",
        h if h < 70.0 => "yellow",
        h if h < 160.0 => "green",
        h if h < 255.0 => "blue",
        h if h < 290.0 => "purple",
        _ => "pink",
    }
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Hue in degrees [0, 360), saturation and lightness in [0, 1].
fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let l = f64::midpoint(max, min);

    if delta.abs() < f64::EPSILON {
        return (0.0, 0.0, l);
    }

    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    let h = if (max - r).abs() < f64::EPSILON {
        ((g - b) / delta).rem_euclid(6.0)
    } else if (max - g).abs() < f64::EPSILON {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    (h * 60.0, s, l)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_hues() {
        assert_eq!(color_family("#FF0000"), "red");
        assert_eq!(color_family("#FF8800"), "orange");
        assert_eq!(color_family("#FFE135"), "yellow");
        assert_eq!(color_family("#2E8B57"), "green");
        assert_eq!(color_family("#1E90FF"), "blue");
        assert_eq!(color_family("#8A2BE2"), "purple");
        assert_eq!(color_family("#FF69B4"), "pink");
    }

    #[test]
    fn test_achromatic() {
        assert_eq!(color_family("#000000"), "black");
        assert_eq!(color_family("#111111"), "black");
        assert_eq!(color_family("#FFFFFF"), "white");
        assert_eq!(color_family("#808080"), "gray");
    }

    #[test]
    fn test_wraparound_red() {
        // Deep crimson sits just below 360 degrees.
        assert_eq!(color_family("#DC143C"), "red");
    }

    #[test]
    fn test_unparseable_is_other() {
        assert_eq!(color_family(""), "other");
        assert_eq!(color_family("red"), "other");
        assert_eq!(color_family("#12345"), "other");
        assert_eq!(color_family("#GGGGGG"), "other");
    }

    #[test]
    fn test_case_insensitive_digits() {
        assert_eq!(color_family("#ff0000"), "red");
    }
}
