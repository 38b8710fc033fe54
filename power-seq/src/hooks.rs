/// Chipset transition events fanned out to interested subsystems.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipsetEvent {
    /// Rails for S3 are up (G3/S5 -> S3).
    Startup,
    /// Rails for S0 are up (S3 -> S0).
    Resume,
    /// About to drop S0 rails (S0 -> S3).
    Suspend,
    /// About to drop the remaining rails (S3 -> S5).
    Shutdown,
}

pub type HookFn = fn(ChipsetEvent);

pub const MAX_HOOKS: usize = 8;

/// Registration past capacity; the table is sized for the fixed set of
/// subsystems known at build time.
#[derive(Debug)]
pub struct RegistryFull;

/// Fixed-size registry of chipset event hooks.
///
/// Populated during system init, immutable once the chipset task runs.
/// `notify` invokes matching hooks synchronously, in registration order,
/// before the state machine moves on; hooks must be bounded operations.
pub struct HookRegistry {
    entries: [Option<(ChipsetEvent, HookFn)>; MAX_HOOKS],
    len: usize,
}

impl HookRegistry {
    pub const fn new() -> Self {
        Self {
            entries: [None; MAX_HOOKS],
            len: 0,
        }
    }

    pub fn register(&mut self, event: ChipsetEvent, hook: HookFn) -> Result<(), RegistryFull> {
        if self.len == MAX_HOOKS {
            return Err(RegistryFull);
        }
        self.entries[self.len] = Some((event, hook));
        self.len += 1;
        Ok(())
    }

    pub fn notify(&self, event: ChipsetEvent) {
        debug!("chipset event {:?}", event);
        for (kind, hook) in self.entries[..self.len].iter().flatten() {
            if *kind == event {
                hook(event);
            }
        }
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
