use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of the severe band, in centimeters.
pub const SAM_MAX_MUAC_CM: f64 = 11.0;

/// Upper bound (inclusive) of the moderate band, in centimeters.
pub const MAM_MAX_MUAC_CM: f64 = 12.0;

/// Acute malnutrition band derived from a MUAC reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NutritionClass {
    Sam,
    Mam,
    Normal,
}

impl NutritionClass {
    /// Label used for auto-filled remarks and export cells.
    pub fn label(&self) -> &'static str {
        match self {
            NutritionClass::Sam => "SAM",
            NutritionClass::Mam => "MAM",
            NutritionClass::Normal => "Normal",
        }
    }

    pub fn is_acute(&self) -> bool {
        !matches!(self, NutritionClass::Normal)
    }
}

impl std::fmt::Display for NutritionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Classify a mid-upper-arm-circumference reading.
///
/// `muac <= 11` is SAM, `11 < muac <= 12` is MAM and anything above 12 is
/// Normal. A NaN reading fails every comparison and lands in Normal.
pub fn classify(muac: f64) -> NutritionClass {
    if muac <= SAM_MAX_MUAC_CM {
        NutritionClass::Sam
    } else if muac <= MAM_MAX_MUAC_CM {
        NutritionClass::Mam
    } else {
        NutritionClass::Normal
    }
}
