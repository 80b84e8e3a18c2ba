use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Number of biotype groups; the inventory always holds exactly this many.
pub const BIOTYPE_COUNT: usize = 4;

/// Biometric modality of a device.
///
/// Declaration order is the service's wire order and the inventory's
/// group order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Biotype {
    #[strum(to_string = "fingerprint", serialize = "fp")]
    #[serde(rename = "fingerprint")]
    FingerPrint,
    #[strum(to_string = "fingervein", serialize = "finger-vein", serialize = "fv")]
    #[serde(rename = "fingervein")]
    FingerVein,
    Iris,
    #[strum(to_string = "voiceprint", serialize = "vp")]
    #[serde(rename = "voiceprint")]
    VoicePrint,
}

impl Biotype {
    /// Map the service's integer biotype. Unknown values yield `None`.
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::FingerPrint),
            1 => Some(Self::FingerVein),
            2 => Some(Self::Iris),
            3 => Some(Self::VoicePrint),
            _ => None,
        }
    }

    /// Group index inside the inventory.
    pub(crate) fn index(self) -> usize {
        match self {
            Self::FingerPrint => 0,
            Self::FingerVein => 1,
            Self::Iris => 2,
            Self::VoicePrint => 3,
        }
    }

    /// Human-readable label for headings.
    pub fn label(self) -> &'static str {
        match self {
            Self::FingerPrint => "Fingerprint",
            Self::FingerVein => "Finger vein",
            Self::Iris => "Iris",
            Self::VoicePrint => "Voiceprint",
        }
    }
}
