use core::mem::MaybeUninit;

// Magic left in uninitialized RAM. It survives any reset that keeps the RAM
// powered (watchdog, firmware swap, debugger restart) and is garbage after a
// real power-on.
const WARM_BOOT_MAGIC: u32 = 0x5AFE_B007;

#[unsafe(link_section = ".uninit.WARM_BOOT_FLAG")]
static mut WARM_BOOT_FLAG: MaybeUninit<u32> = MaybeUninit::uninit();

/// True if this boot did not go through a power-on reset. Call once, before
/// tasks spawn; the flag is re-armed for the next boot as a side effect.
pub fn detect_warm_restart() -> bool {
    unsafe {
        let flag: *mut u32 = (&raw mut WARM_BOOT_FLAG).cast();
        let warm = flag.read_volatile() == WARM_BOOT_MAGIC;
        flag.write_volatile(WARM_BOOT_MAGIC);
        warm
    }
}
