use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde uses the same string as `as_str`, so knowledge-base JSON and
/// `FromStr` agree on spelling.
macro_rules! str_enum {
    ($(#[$attr:meta])* $name:ident { $($(#[$vattr:meta])* $variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        $(#[$attr])*
        pub enum $name {
            $($(#[$vattr])* #[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = EngineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(EngineError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(#[derive(Default)] Prevalence {
    VeryCommon => "very_common",
    Common => "common",
    #[default]
    Uncommon => "uncommon",
    Rare => "rare",
    VeryRare => "very_rare",
});

impl Prevalence {
    /// Prior probability for a condition in this prevalence bucket.
    pub fn prior(&self) -> f64 {
        match self {
            Self::VeryCommon => 0.1,
            Self::Common => 0.05,
            Self::Uncommon => 0.01,
            Self::Rare => 0.001,
            Self::VeryRare => 0.0001,
        }
    }
}

str_enum!(#[derive(Default)] Severity {
    Benign => "benign",
    Mild => "mild",
    MildModerate => "mild-moderate",
    #[default]
    Moderate => "moderate",
    ModerateSevere => "moderate-severe",
    Severe => "severe",
    Chronic => "chronic",
    Critical => "critical",
});

str_enum!(DurationHint {
    Acute => "acute",
    Chronic => "chronic",
    Any => "any",
});

str_enum!(Onset {
    Sudden => "sudden",
    Gradual => "gradual",
    Episodic => "episodic",
});

str_enum!(Progression {
    Worsening => "worsening",
    Stable => "stable",
    Fluctuating => "fluctuating",
    Improving => "improving",
});
