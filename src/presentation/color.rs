use crate::domain::error::ScoreError;
use std::fmt;

/// 24-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const NO_SCORE: Rgb = Rgb(0xd4, 0x49, 0x37);
pub const LOW_SCORE: Rgb = Rgb(0xf7, 0x2d, 0x49);
pub const MID_SCORE: Rgb = Rgb(0xf9, 0x6b, 0x25);
pub const HIGH_SCORE: Rgb = Rgb(0x78, 0xcb, 0xd1);

impl Rgb {
    /// Parse a hex colour; characters that are not hex digits are ignored.
    ///
    /// With fewer than six digits the first three are doubled (`#abc` is
    /// `#aabbcc`); with more than six only the first six are read.
    pub fn parse(hex: &str) -> Result<Self, ScoreError> {
        let digits: Vec<u8> = hex
            .chars()
            .filter_map(|c| c.to_digit(16))
            .map(|d| d as u8)
            .collect();

        let channel = |hi: u8, lo: u8| hi * 16 + lo;
        match digits.as_slice() {
            [r1, r2, g1, g2, b1, b2, ..] => Ok(Rgb(
                channel(*r1, *r2),
                channel(*g1, *g2),
                channel(*b1, *b2),
            )),
            [r, g, b, ..] => Ok(Rgb(channel(*r, *r), channel(*g, *g), channel(*b, *b))),
            _ => Err(ScoreError::InvalidColor(hex.to_string())),
        }
    }

    /// Scale every channel by `1 + lum`: -0.1 is 10% darker, 0.1 is 10% lighter.
    pub fn adjust_luminance(self, lum: f64) -> Self {
        let lum = if lum.is_finite() { lum } else { 0.0 };
        let adjust = |c: u8| {
            let c = c as f64;
            (c + c * lum).clamp(0.0, 255.0).round() as u8
        };
        Rgb(adjust(self.0), adjust(self.1), adjust(self.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// String form of [`Rgb::adjust_luminance`].
pub fn adjust_luminance(hex: &str, lum: f64) -> Result<String, ScoreError> {
    Ok(Rgb::parse(hex)?.adjust_luminance(lum).to_string())
}

/// Text colour for a score: bracket colour darkened by how far the score is below 100.
pub fn color_for_score(score: Option<f64>) -> String {
    rgb_for_score(score).to_string()
}

pub fn rgb_for_score(score: Option<f64>) -> Rgb {
    let Some(score) = score.filter(|s| s.is_finite()).map(f64::trunc) else {
        return NO_SCORE;
    };

    let base = if score < 45.0 {
        LOW_SCORE
    } else if score < 70.0 {
        MID_SCORE
    } else {
        HIGH_SCORE
    };

    base.adjust_luminance(-(1.0 - score / 100.0))
}
