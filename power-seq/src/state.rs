use bitflags::bitflags;

/// Power states of the sequenced application processor.
///
/// The four steady states follow the ACPI naming; the remaining variants are
/// the transitional edges between them. The chipset task is always in exactly
/// one of these, and transitional states resolve within one pass of the
/// control loop (possibly after a bounded signal wait).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerState {
    /// Fully off, suspend regulator down.
    G3 = 0,
    /// Soft-off; always-on rails up, AP held in reset.
    S5 = 1,
    /// Suspend-to-RAM.
    S3 = 2,
    /// Fully on.
    S0 = 3,
    G3S5 = 4,
    S5S3 = 5,
    S3S0 = 6,
    S0S3 = 7,
    S3S5 = 8,
    S5G3 = 9,
}

impl PowerState {
    pub const fn name(self) -> &'static str {
        match self {
            PowerState::G3 => "G3",
            PowerState::S5 => "S5",
            PowerState::S3 => "S3",
            PowerState::S0 => "S0",
            PowerState::G3S5 => "G3->S5",
            PowerState::S5S3 => "S5->S3",
            PowerState::S3S0 => "S3->S0",
            PowerState::S0S3 => "S0->S3",
            PowerState::S3S5 => "S3->S5",
            PowerState::S5G3 => "S5->G3",
        }
    }

    pub const fn raw(self) -> u8 {
        self as u8
    }

    pub const fn from_raw(raw: u8) -> Option<PowerState> {
        match raw {
            0 => Some(PowerState::G3),
            1 => Some(PowerState::S5),
            2 => Some(PowerState::S3),
            3 => Some(PowerState::S0),
            4 => Some(PowerState::G3S5),
            5 => Some(PowerState::S5S3),
            6 => Some(PowerState::S3S0),
            7 => Some(PowerState::S0S3),
            8 => Some(PowerState::S3S5),
            9 => Some(PowerState::S5G3),
            _ => None,
        }
    }

    /// Mask a caller must fully accept for this state to match in
    /// [`crate::PowerShared::in_state`]. Transitional states are in between
    /// their neighbours and require both.
    pub const fn chipset_state(self) -> ChipsetState {
        match self {
            PowerState::G3 => ChipsetState::HARD_OFF,
            PowerState::G3S5 | PowerState::S5G3 => {
                ChipsetState::HARD_OFF.union(ChipsetState::SOFT_OFF)
            }
            PowerState::S5 => ChipsetState::SOFT_OFF,
            PowerState::S5S3 | PowerState::S3S5 => {
                ChipsetState::SOFT_OFF.union(ChipsetState::SUSPEND)
            }
            PowerState::S3 => ChipsetState::SUSPEND,
            PowerState::S3S0 | PowerState::S0S3 => {
                ChipsetState::SUSPEND.union(ChipsetState::ON)
            }
            PowerState::S0 => ChipsetState::ON,
        }
    }
}

bitflags! {
    /// Coarse chipset-state classes for callers that only care whether the
    /// AP is off, suspended, or running.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct ChipsetState: u8 {
        const HARD_OFF = 1 << 0;
        const SOFT_OFF = 1 << 1;
        const SUSPEND = 1 << 2;
        const ON = 1 << 3;
    }
}

impl ChipsetState {
    pub const ANY_OFF: ChipsetState = ChipsetState::HARD_OFF.union(ChipsetState::SOFT_OFF);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_round_trips() {
        for raw in 0..=9u8 {
            let state = PowerState::from_raw(raw).unwrap();
            assert_eq!(state.raw(), raw);
        }
        assert_eq!(PowerState::from_raw(10), None);
        assert_eq!(PowerState::from_raw(0xff), None);
    }

    #[test]
    fn transitional_states_match_both_neighbours() {
        assert!(PowerState::S3S0.chipset_state().contains(ChipsetState::SUSPEND));
        assert!(PowerState::S3S0.chipset_state().contains(ChipsetState::ON));
        assert!(PowerState::S5G3.chipset_state().contains(ChipsetState::HARD_OFF));
        assert_eq!(PowerState::S0.chipset_state(), ChipsetState::ON);
    }
}
