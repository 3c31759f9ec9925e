//! Phonetic acoustic table and the band-energy phoneme classifier.
//!
//! The table covers the Japanese syllabary: five vowels plus the consonant rows
//! built on them. Each entry carries three formants, a pitch multiplier applied to
//! the base F0, an informational energy class and articulation flags that decide
//! which texture generator runs for frames of that category.

use crate::config::ProfileOverride;
use crate::error::{VocoderError, VocoderResult};
use crate::frame::band_mean;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Articulation(u8);

impl Articulation {
    pub const NONE: Self = Self(0);
    pub const BURST: Self = Self(1 << 0);
    pub const FRICATIVE: Self = Self(1 << 1);
    pub const NASAL: Self = Self(1 << 2);
    pub const BREATH: Self = Self(1 << 3);
    pub const LIQUID: Self = Self(1 << 4);
    pub const GLIDE: Self = Self(1 << 5);
    /// Stop consonants without a burst texture of their own.
    pub const PLOSIVE: Self = Self(1 << 6);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Articulation {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyClass {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhoneticProfile {
    pub formants: [f32; 3],
    pub pitch_mult: f32,
    pub energy: EnergyClass,
    pub flags: Articulation,
}

impl PhoneticProfile {
    const fn new(formants: [f32; 3], pitch_mult: f32, energy: EnergyClass, flags: Articulation) -> Self {
        Self { formants, pitch_mult, energy, flags }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhoneticCategory {
    A, I, U, E, O,
    Ka, Ki, Ku, Ke, Ko,
    Sa, Shi, Su, Se, So,
    Ta, Chi, Tsu, Te, To,
    Na, Ni, Nu, Ne, No,
    Ha, Hi, Fu, He, Ho,
    Ma, Mi, Mu, Me, Mo,
    Ya, Yu, Yo,
    Ra, Ri, Ru, Re, Ro,
    Wa, Wo,
    N,
}

impl PhoneticCategory {
    pub const COUNT: usize = 46;

    pub const ALL: [PhoneticCategory; Self::COUNT] = {
        use PhoneticCategory::*;
        [
            A, I, U, E, O,
            Ka, Ki, Ku, Ke, Ko,
            Sa, Shi, Su, Se, So,
            Ta, Chi, Tsu, Te, To,
            Na, Ni, Nu, Ne, No,
            Ha, Hi, Fu, He, Ho,
            Ma, Mi, Mu, Me, Mo,
            Ya, Yu, Yo,
            Ra, Ri, Ru, Re, Ro,
            Wa, Wo,
            N,
        ]
    };

    pub fn as_str(self) -> &'static str {
        use PhoneticCategory::*;
        match self {
            A => "a", I => "i", U => "u", E => "e", O => "o",
            Ka => "ka", Ki => "ki", Ku => "ku", Ke => "ke", Ko => "ko",
            Sa => "sa", Shi => "shi", Su => "su", Se => "se", So => "so",
            Ta => "ta", Chi => "chi", Tsu => "tsu", Te => "te", To => "to",
            Na => "na", Ni => "ni", Nu => "nu", Ne => "ne", No => "no",
            Ha => "ha", Hi => "hi", Fu => "fu", He => "he", Ho => "ho",
            Ma => "ma", Mi => "mi", Mu => "mu", Me => "me", Mo => "mo",
            Ya => "ya", Yu => "yu", Yo => "yo",
            Ra => "ra", Ri => "ri", Ru => "ru", Re => "re", Ro => "ro",
            Wa => "wa", Wo => "wo",
            N => "n",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn standard_profile(self) -> PhoneticProfile {
        use EnergyClass::{High, Low, Medium};
        use PhoneticCategory::*;
        let burst = Articulation::BURST;
        let fric = Articulation::FRICATIVE;
        let plos = Articulation::PLOSIVE;
        let nasal = Articulation::NASAL;
        let breath = Articulation::BREATH;
        let glide = Articulation::GLIDE;
        let liquid = Articulation::LIQUID;
        let none = Articulation::NONE;
        let p = PhoneticProfile::new;
        match self {
            A => p([730.0, 1090.0, 2440.0], 1.0, High, none),
            I => p([270.0, 2290.0, 3010.0], 1.1, Medium, none),
            U => p([300.0, 870.0, 2240.0], 0.9, Low, none),
            E => p([530.0, 1840.0, 2480.0], 1.0, Medium, none),
            O => p([570.0, 840.0, 2410.0], 0.95, Medium, none),

            Ka => p([730.0, 1200.0, 2400.0], 1.0, High, burst),
            Ki => p([270.0, 2400.0, 3100.0], 1.1, Medium, burst),
            Ku => p([300.0, 900.0, 2200.0], 0.9, Low, burst),
            Ke => p([530.0, 1900.0, 2500.0], 1.0, Medium, burst),
            Ko => p([570.0, 900.0, 2400.0], 0.95, Medium, burst),

            Sa => p([730.0, 1200.0, 2600.0], 1.0, High, fric),
            Shi => p([300.0, 2200.0, 3200.0], 1.1, Medium, fric),
            Su => p([300.0, 900.0, 2400.0], 0.9, Low, fric),
            Se => p([530.0, 1900.0, 2600.0], 1.0, Medium, fric),
            So => p([570.0, 900.0, 2500.0], 0.95, Medium, fric),

            Ta => p([730.0, 1200.0, 2400.0], 1.0, High, plos),
            Chi => p([300.0, 2100.0, 3000.0], 1.1, Medium, plos),
            Tsu => p([300.0, 900.0, 2300.0], 0.9, Low, plos),
            Te => p([530.0, 1800.0, 2500.0], 1.0, Medium, plos),
            To => p([570.0, 900.0, 2400.0], 0.95, Medium, plos),

            Na => p([730.0, 1200.0, 2400.0], 1.0, Medium, nasal),
            Ni => p([270.0, 2200.0, 3000.0], 1.1, Medium, nasal),
            Nu => p([300.0, 900.0, 2200.0], 0.9, Low, nasal),
            Ne => p([530.0, 1800.0, 2500.0], 1.0, Medium, nasal),
            No => p([570.0, 900.0, 2400.0], 0.95, Medium, nasal),

            Ha => p([730.0, 1200.0, 2400.0], 1.0, Medium, breath),
            Hi => p([270.0, 2200.0, 3100.0], 1.1, Medium, breath),
            Fu => p([300.0, 900.0, 2200.0], 0.9, Low, breath),
            He => p([530.0, 1800.0, 2500.0], 1.0, Medium, breath),
            Ho => p([570.0, 900.0, 2400.0], 0.95, Medium, breath),

            Ma => p([730.0, 1200.0, 2400.0], 1.0, Medium, nasal),
            Mi => p([270.0, 2200.0, 3000.0], 1.1, Medium, nasal),
            Mu => p([300.0, 900.0, 2200.0], 0.9, Low, nasal),
            Me => p([530.0, 1800.0, 2500.0], 1.0, Medium, nasal),
            Mo => p([570.0, 900.0, 2400.0], 0.95, Medium, nasal),

            Ya => p([730.0, 1200.0, 2400.0], 1.0, Medium, glide),
            Yu => p([300.0, 900.0, 2200.0], 0.9, Low, glide),
            Yo => p([570.0, 900.0, 2400.0], 0.95, Medium, glide),

            Ra => p([730.0, 1300.0, 2400.0], 1.0, Medium, liquid),
            Ri => p([270.0, 2300.0, 3000.0], 1.1, Medium, liquid),
            Ru => p([300.0, 1000.0, 2200.0], 0.9, Low, liquid),
            Re => p([530.0, 1900.0, 2500.0], 1.0, Medium, liquid),
            Ro => p([570.0, 1000.0, 2400.0], 0.95, Medium, liquid),

            Wa => p([730.0, 1200.0, 2400.0], 1.0, Medium, glide),
            Wo => p([570.0, 900.0, 2400.0], 0.95, Medium, glide),

            N => p([400.0, 1200.0, 2400.0], 0.8, Low, nasal),
        }
    }
}

impl fmt::Display for PhoneticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhoneticCategory {
    type Err = VocoderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        PhoneticCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| VocoderError::invalid_config("profile", format!("unknown phonetic category '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhoneticTable {
    profiles: [PhoneticProfile; PhoneticCategory::COUNT],
}

impl PhoneticTable {
    pub fn standard() -> &'static PhoneticTable {
        static TABLE: OnceLock<PhoneticTable> = OnceLock::new();
        TABLE.get_or_init(|| PhoneticTable {
            profiles: PhoneticCategory::ALL.map(PhoneticCategory::standard_profile),
        })
    }

    pub fn measured(overrides: &[ProfileOverride]) -> VocoderResult<PhoneticTable> {
        let mut table = Self::standard().clone();
        for entry in overrides {
            let category: PhoneticCategory = entry.name.parse()?;
            let profile = &mut table.profiles[category.index()];
            let [f1, f2, f3] = profile.formants;
            profile.formants = [
                entry.f1.unwrap_or(f1),
                entry.f2.unwrap_or(f2),
                entry.f3.unwrap_or(f3),
            ];
            if let Some(pitch) = entry.pitch {
                profile.pitch_mult = pitch;
            }

            let [f1, f2, f3] = profile.formants;
            if !(f1 > 0.0 && f1 < f2 && f2 < f3) {
                return Err(VocoderError::invalid_config(
                    "profile",
                    format!("formants for '{}' must be positive and ascending: {:?}", category, profile.formants),
                ));
            }
            if !(profile.pitch_mult.is_finite() && profile.pitch_mult > 0.0) {
                return Err(VocoderError::invalid_config(
                    "profile",
                    format!("pitch multiplier for '{}' must be positive", category),
                ));
            }
        }
        Ok(table)
    }

    pub fn get(&self, category: PhoneticCategory) -> &PhoneticProfile {
        &self.profiles[category.index()]
    }
}

/// Band edges and thresholds for [`classify_with`]. The values are hand-tuned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandLayout {
    pub low_end: usize,
    pub mid_end: usize,
    /// A low-dominant frame whose mid band sits below this reads as "u".
    pub quiet_mid: f32,
}

impl Default for BandLayout {
    fn default() -> Self {
        Self {
            low_end: 15,
            mid_end: 40,
            quiet_mid: -30.0,
        }
    }
}

pub fn classify(frame: &[f32]) -> PhoneticCategory {
    classify_with(frame, &BandLayout::default())
}

pub fn classify_with(frame: &[f32], layout: &BandLayout) -> PhoneticCategory {
    let low = band_mean(frame, 0..layout.low_end);
    let mid = band_mean(frame, layout.low_end..layout.mid_end);
    let high = band_mean(frame, layout.mid_end..frame.len());

    if high > mid && high > low {
        if mid > low { PhoneticCategory::I } else { PhoneticCategory::Shi }
    } else if low > mid && low > high {
        if mid < layout.quiet_mid { PhoneticCategory::U } else { PhoneticCategory::O }
    } else if mid > low && mid > high {
        PhoneticCategory::E
    } else {
        PhoneticCategory::A
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banded(low: f32, mid: f32, high: f32) -> Vec<f32> {
        (0..80)
            .map(|i| if i < 15 { low } else if i < 40 { mid } else { high })
            .collect()
    }

    #[test]
    fn test_classifier_rules() {
        assert_eq!(classify(&banded(-2.0, 0.0, 3.0)), PhoneticCategory::I);
        assert_eq!(classify(&banded(1.0, 0.0, 3.0)), PhoneticCategory::Shi);
        assert_eq!(classify(&banded(3.0, -40.0, -50.0)), PhoneticCategory::U);
        assert_eq!(classify(&banded(3.0, 0.0, -1.0)), PhoneticCategory::O);
        assert_eq!(classify(&banded(0.0, 3.0, 1.0)), PhoneticCategory::E);
        assert_eq!(classify(&banded(1.0, 1.0, 1.0)), PhoneticCategory::A);
        assert_eq!(classify(&banded(4.0, 4.0, -4.0)), PhoneticCategory::A);
    }

    #[test]
    fn test_classifier_is_deterministic() {
        let frame: Vec<f32> = (0..80).map(|i| ((i * 7) % 13) as f32 * 0.3 - 2.0).collect();
        let first = classify(&frame);
        for _ in 0..10 {
            assert_eq!(classify(&frame), first);
        }
    }

    #[test]
    fn test_narrow_frames_do_not_panic() {
        // 20 bins: no high band at all
        let frame = vec![0.5; 20];
        assert_eq!(classify(&frame), PhoneticCategory::A);
        assert_eq!(classify(&[]), PhoneticCategory::A);
    }

    #[test]
    fn test_custom_layout() {
        let layout = BandLayout { low_end: 10, mid_end: 20, quiet_mid: -1.0 };
        let frame: Vec<f32> = (0..40).map(|i| if i < 10 { 2.0 } else { -2.0 }).collect();
        assert_eq!(classify_with(&frame, &layout), PhoneticCategory::U);
    }

    #[test]
    fn test_standard_table() {
        let table = PhoneticTable::standard();
        let a = table.get(PhoneticCategory::A);
        assert_eq!(a.formants, [730.0, 1090.0, 2440.0]);
        assert!(a.flags.is_empty());
        assert!(table.get(PhoneticCategory::Ka).flags.contains(Articulation::BURST));
        assert!(table.get(PhoneticCategory::Shi).flags.contains(Articulation::FRICATIVE));
        assert!(table.get(PhoneticCategory::N).flags.contains(Articulation::NASAL));
        assert_eq!(table.get(PhoneticCategory::N).pitch_mult, 0.8);
        for category in PhoneticCategory::ALL {
            let [f1, f2, f3] = table.get(category).formants;
            assert!(f1 < f2 && f2 < f3, "{} formants not ascending", category);
        }
    }

    #[test]
    fn test_category_names_roundtrip() {
        for category in PhoneticCategory::ALL {
            assert_eq!(category.as_str().parse::<PhoneticCategory>().unwrap(), category);
        }
        assert!("xyz".parse::<PhoneticCategory>().is_err());
    }

    #[test]
    fn test_measured_overrides() {
        let overrides = vec![ProfileOverride {
            name: "a".into(),
            f1: Some(750.0),
            f2: None,
            f3: None,
            pitch: Some(1.05),
        }];
        let table = PhoneticTable::measured(&overrides).unwrap();
        let a = table.get(PhoneticCategory::A);
        assert_eq!(a.formants, [750.0, 1090.0, 2440.0]);
        assert_eq!(a.pitch_mult, 1.05);
        assert_eq!(table.get(PhoneticCategory::I), PhoneticTable::standard().get(PhoneticCategory::I));
    }

    #[test]
    fn test_measured_rejects_unordered_formants() {
        let overrides = vec![ProfileOverride {
            name: "o".into(),
            f1: Some(3000.0),
            f2: None,
            f3: None,
            pitch: None,
        }];
        assert!(PhoneticTable::measured(&overrides).is_err());
    }

    #[test]
    fn test_flags_compose() {
        let both = Articulation::NASAL | Articulation::GLIDE;
        assert!(both.contains(Articulation::NASAL));
        assert!(both.contains(Articulation::GLIDE));
        assert!(!both.contains(Articulation::BURST));
        assert!(!both.contains(Articulation::NONE));
    }
}
