use super::{DroneProtocol, Modifier};

/// Drones on the target may take wounds in place of the model being shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaviourProtocol {
    protocol: DroneProtocol,
}

impl SaviourProtocol {
    /// Shield drones carry a 5+ feel-no-pain.
    #[must_use]
    pub const fn shield_drone() -> Self {
        Self {
            protocol: DroneProtocol {
                threshold: 2,
                fnp: 5,
            },
        }
    }

    #[must_use]
    pub const fn normal_drone() -> Self {
        Self {
            protocol: DroneProtocol {
                threshold: 2,
                fnp: 7,
            },
        }
    }
}

impl Modifier for SaviourProtocol {
    fn drone_protocol(&self) -> Option<DroneProtocol> {
        Some(self.protocol)
    }
}

/// Natural hit rolls of 1 wound the firer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overheat;

impl Modifier for Overheat {
    fn self_wound_threshold(&self) -> Option<i32> {
        Some(2)
    }
}
