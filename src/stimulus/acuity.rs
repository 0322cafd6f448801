// Acuity tier -> stimulus parameters.
// Constants are the therapy protocol's tuned values; keep them bit-for-bit.
use strum::{Display, EnumIter, EnumString};

use super::FPS;

/// Banded visual-acuity classification read from client storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum AcuityTier {
    #[strum(to_string = "0.0-0.1", serialize = "0.0–0.1")]
    Severe,
    #[default]
    #[strum(to_string = "0.2-0.4", serialize = "0.2–0.4")]
    Moderate,
    #[strum(to_string = "0.5-0.6", serialize = "0.5–0.6")]
    Mild,
    #[strum(to_string = "0.7-0.9", serialize = "0.7–0.9")]
    NearNormal,
}

impl AcuityTier {
    /// Total parse: anything unrecognized maps to the default tier.
    pub fn parse_or_default(raw: &str) -> Self {
        raw.trim().parse().unwrap_or_default()
    }

    /// `(floor_min px, divisor, flicker Hz, rotation rad/frame)`.
    const fn constants(self) -> (f64, f64, f64, f64) {
        match self {
            AcuityTier::Severe => (20.0, 8.0, 1.0, 0.005),
            AcuityTier::Moderate => (10.0, 12.0, 2.0, 0.01),
            AcuityTier::Mild => (6.0, 20.0, 4.0, 0.02),
            AcuityTier::NearNormal => (4.0, 30.0, 6.0, 0.04),
        }
    }
}

/// Resolved per-frame stimulus parameters for one canvas size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StimulusParams {
    pub stripe_size: f64,
    pub frequency_hz: f64,
    pub rotation_speed: f64,
}

impl StimulusParams {
    pub fn resolve(tier: AcuityTier, width: f64, height: f64) -> Self {
        let (floor_min, divisor, frequency_hz, rotation_speed) = tier.constants();
        let min_dim = width.min(height);
        // NaN or negative dims collapse to the floor.
        let scaled = (min_dim / divisor).floor();
        let stripe_size = if scaled > floor_min { scaled } else { floor_min };
        Self { stripe_size, frequency_hz, rotation_speed }
    }

    /// Frames between contrast reversals at the nominal frame rate.
    pub fn flash_period(&self) -> u64 {
        ((FPS as f64 / self.frequency_hz).round() as u64).max(1)
    }

    pub fn flash_step(&self, frame: u64) -> u64 {
        frame / self.flash_period()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_moderate_example() {
        let p = StimulusParams::resolve(AcuityTier::Moderate, 800.0, 600.0);
        assert_eq!(p.stripe_size, 50.0);
        assert_eq!(p.flash_period(), 30);
    }

    #[test]
    fn test_floor_applies_on_small_canvas() {
        let p = StimulusParams::resolve(AcuityTier::Severe, 100.0, 90.0);
        assert_eq!(p.stripe_size, 20.0);
        let p = StimulusParams::resolve(AcuityTier::Moderate, 0.0, 0.0);
        assert_eq!(p.stripe_size, 10.0);
        let p = StimulusParams::resolve(AcuityTier::Mild, -50.0, 300.0);
        assert_eq!(p.stripe_size, 6.0);
    }

    #[test]
    fn test_en_dash_and_whitespace_parse() {
        assert_eq!(AcuityTier::parse_or_default(" 0.7–0.9 "), AcuityTier::NearNormal);
        assert_eq!(AcuityTier::parse_or_default("0.0-0.1"), AcuityTier::Severe);
        assert_eq!(AcuityTier::parse_or_default("garbage"), AcuityTier::Moderate);
        assert_eq!(AcuityTier::parse_or_default(""), AcuityTier::Moderate);
    }

    #[test]
    fn test_display_is_ascii_form() {
        assert_eq!(AcuityTier::Mild.to_string(), "0.5-0.6");
    }

    #[test]
    fn test_every_tier_in_range() {
        for tier in AcuityTier::iter() {
            let p = StimulusParams::resolve(tier, 1024.0, 768.0);
            assert!(p.stripe_size > 0.0);
            assert!((1.0..=6.0).contains(&p.frequency_hz), "{tier}");
            assert!((0.005..=0.04).contains(&p.rotation_speed), "{tier}");
        }
    }

    #[test]
    fn test_flash_periods() {
        let periods: Vec<u64> = AcuityTier::iter()
            .map(|t| StimulusParams::resolve(t, 640.0, 480.0).flash_period())
            .collect();
        assert_eq!(periods, vec![60, 30, 15, 10]);
    }

    #[test]
    fn test_flash_step() {
        let p = StimulusParams::resolve(AcuityTier::Moderate, 640.0, 480.0);
        assert_eq!(p.flash_step(0), 0);
        assert_eq!(p.flash_step(29), 0);
        assert_eq!(p.flash_step(30), 1);
    }
}
