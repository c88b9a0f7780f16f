//! Operating modes and switches of the laser, as they appear in its commands.

use std::fmt::Display;

use scpirs::InstrumentError;

/// Generate `as_str`, `from_cmd_str`, and `Display` for a mode enum.
///
/// Replies are matched against the long form or the short (upper case) form of the mnemonic,
/// ignoring case, since the laser may answer with either.
macro_rules! mnemonic_enum {
    ($name:ident { $($variant:ident => $mnemonic:literal, $label:literal),+ $(,)? }) => {
        impl $name {
            /// All mnemonics, in declaration order.
            pub const MNEMONICS: &'static [&'static str] = &[$($mnemonic),+];

            /// The mnemonic that is sent to the laser.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $mnemonic),+
                }
            }

            /// Parse a mnemonic as returned by the laser.
            // Not every mode can be queried back.
            #[allow(dead_code)]
            pub(crate) fn from_cmd_str(value: &str) -> Result<Self, InstrumentError> {
                let value = value.trim();
                $(
                    if value.eq_ignore_ascii_case($mnemonic)
                        || value.eq_ignore_ascii_case(short_form($mnemonic))
                    {
                        return Ok($name::$variant);
                    }
                )+
                Err(InstrumentError::Protocol {
                    command: stringify!($name).to_string(),
                    response: value.to_string(),
                    reason: format!("expected one of {}", Self::MNEMONICS.join(", ")),
                })
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($name::$variant => write!(f, $label)),+
                }
            }
        }
    };
}

fn short_form(mnemonic: &str) -> &str {
    let end = mnemonic
        .find(|c: char| c.is_ascii_lowercase())
        .unwrap_or(mnemonic.len());
    &mnemonic[..end]
}

/// Power profile across a sweep or in fixed mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// The same power at every wavelength.
    #[default]
    Flat,
    /// Peak power in the center of the range, rolling off towards its ends.
    Gaussian,
    /// A user supplied profile file.
    Custom,
}

mnemonic_enum!(Profile {
    Flat => "FLAT", "Flat",
    Gaussian => "GAUSsian", "Gaussian",
    Custom => "CUSTom", "Custom",
});

/// Edge of the start sweep trigger that starts a wavelength sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEdge {
    /// Rising edge.
    #[default]
    Rising,
    /// Falling edge.
    Falling,
    /// Both edges.
    Both,
}

mnemonic_enum!(TriggerEdge {
    Rising => "RISing", "Rising",
    Falling => "FALLing", "Falling",
    Both => "BOTH", "Both",
});

/// Direction of a wavelength sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SweepDirection {
    /// From short to long wavelengths.
    #[default]
    Increasing,
    /// From long to short wavelengths.
    Decreasing,
    /// Back and forth, increasing first.
    Bidirectional,
}

mnemonic_enum!(SweepDirection {
    Increasing => "INCReasing", "Increasing",
    Decreasing => "DECReasing", "Decreasing",
    Bidirectional => "BINCreasing", "Bidirectional",
});

/// Who controls the laser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Hardware triggers.
    Hardware,
    /// Remote commands.
    Software,
}

mnemonic_enum!(ControlMode {
    Hardware => "HARDware", "Hardware",
    Software => "SOFTware", "Software",
});

/// A boolean setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    /// Enabled.
    On,
    /// Disabled.
    Off,
}

mnemonic_enum!(Switch {
    On => "ON", "On",
    Off => "OFF", "Off",
});

impl From<bool> for Switch {
    fn from(value: bool) -> Self {
        if value { Switch::On } else { Switch::Off }
    }
}

/// What a sweep preset optimizes for.
///
/// Presets configure the whole sweep at once from one leading value plus the wavelength range and
/// the inter-sweep delay. A sweep calibration must follow for them to take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepEmphasis {
    /// Number of points.
    Points,
    /// Sweep repetition rate.
    Rate,
    /// Optical frequency step.
    Step,
}

impl Display for SweepEmphasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepEmphasis::Points => write!(f, "Points"),
            SweepEmphasis::Rate => write!(f, "Rate"),
            SweepEmphasis::Step => write!(f, "Step"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("GAUSsian", Profile::Gaussian)]
    #[case("gaus", Profile::Gaussian)]
    #[case(" FLAT ", Profile::Flat)]
    #[case("custom", Profile::Custom)]
    fn test_profile_from_cmd_str(#[case] value: &str, #[case] exp: Profile) {
        assert_eq!(Profile::from_cmd_str(value).unwrap(), exp);
    }

    #[rstest]
    #[case("BINC", SweepDirection::Bidirectional)]
    #[case("DECReasing", SweepDirection::Decreasing)]
    fn test_direction_from_cmd_str(#[case] value: &str, #[case] exp: SweepDirection) {
        assert_eq!(SweepDirection::from_cmd_str(value).unwrap(), exp);
    }

    #[rstest]
    fn test_unknown_mnemonic() {
        assert!(matches!(
            TriggerEdge::from_cmd_str("UP"),
            Err(InstrumentError::Protocol { .. })
        ));
    }

    #[rstest]
    fn test_as_str_round_trip() {
        for edge in [TriggerEdge::Rising, TriggerEdge::Falling, TriggerEdge::Both] {
            assert_eq!(TriggerEdge::from_cmd_str(edge.as_str()).unwrap(), edge);
        }
        assert_eq!(Switch::from(true).as_str(), "ON");
        assert_eq!(ControlMode::Software.to_string(), "Software");
    }
}
