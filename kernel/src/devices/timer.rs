/// SP804 dual-timer block. Timer1 of the pair drives preemption: it is
/// programmed as a 32-bit periodic down-counter whose interrupt fires about
/// once a second and lands on GIC line 36.
use bitflags::bitflags;
use core::ptr::{addr_of_mut, write_volatile};

pub const TIMER0_BASE: usize = 0x1001_1000;

/// Interrupt line the Timer0/1 pair raises on the GIC distributor.
pub const GIC_SOURCE_TIMER01: u32 = 36;

/// Reload value: 2^20 counter ticks, roughly one second on this board.
pub const TIMER1_RELOAD: u32 = 0x0010_0000;

bitflags! {
    /// TimerXControl register bits.
    pub struct TimerCtrl: u32 {
        const ONESHOT    = 1 << 0;
        const SIZE_32BIT = 1 << 1;
        const INT_ENABLE = 1 << 5;
        const PERIODIC   = 1 << 6;
        const ENABLE     = 1 << 7;
    }
}

/// Memory-mapped register block of one timer in the pair.
#[repr(C)]
pub struct Sp804 {
    pub timer1_load: u32,
    pub timer1_value: u32,
    pub timer1_ctrl: u32,
    pub timer1_int_clr: u32,
    pub timer1_ris: u32,
    pub timer1_mis: u32,
    pub timer1_bg_load: u32,
}

/// Program Timer1 for periodic 32-bit operation with its interrupt enabled.
pub fn setup_timer() {
    let regs = TIMER0_BASE as *mut Sp804;
    let ctrl = TimerCtrl::SIZE_32BIT | TimerCtrl::PERIODIC | TimerCtrl::INT_ENABLE | TimerCtrl::ENABLE;
    unsafe {
        write_volatile(addr_of_mut!((*regs).timer1_load), TIMER1_RELOAD);
        write_volatile(addr_of_mut!((*regs).timer1_ctrl), ctrl.bits());
    }
}

/// Acknowledge the pending timer interrupt at the device.
pub fn clear_interrupt() {
    let regs = TIMER0_BASE as *mut Sp804;
    unsafe {
        write_volatile(addr_of_mut!((*regs).timer1_int_clr), 0x01);
    }
}
