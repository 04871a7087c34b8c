/// GICv2 interrupt controller. Two register banks: the distributor routes
/// interrupt lines, the per-core CPU interface hands them to the processor.
/// Only the handful of registers the kernel touches are modelled.
use core::ptr::{addr_of, addr_of_mut, read_volatile, write_volatile};

pub const GICC0_BASE: usize = 0x1E00_0000;
pub const GICD0_BASE: usize = 0x1E00_1000;

/// Lowest priority the CPU interface will accept once unmasked.
const PMR_UNMASK_ALL: u32 = 0x0000_00F0;

/// CPU interface registers (per core).
#[repr(C)]
pub struct GicCpu {
    pub ctlr: u32,
    pub pmr: u32,
    pub bpr: u32,
    pub iar: u32,
    pub eoir: u32,
    pub rpr: u32,
    pub hppir: u32,
}

/// Distributor registers. The set-enable bank is one bit per interrupt
/// line, 32 lines per word.
#[repr(C)]
pub struct GicDist {
    pub ctlr: u32,
    pub typer: u32,
    pub iidr: u32,
    _reserved0: [u32; 29],
    pub igroupr: [u32; 32],
    pub isenabler: [u32; 32],
    pub icenabler: [u32; 32],
}

/// Route the timer line and open the delivery path: priority mask down,
/// line 36 enabled, then both the CPU interface and the distributor on.
pub fn setup_gic() {
    let gicc = GICC0_BASE as *mut GicCpu;
    let gicd = GICD0_BASE as *mut GicDist;
    unsafe {
        write_volatile(addr_of_mut!((*gicc).pmr), PMR_UNMASK_ALL);

        let bank = addr_of_mut!((*gicd).isenabler[1]);
        write_volatile(bank, read_volatile(bank) | 0x0000_0010);

        write_volatile(addr_of_mut!((*gicc).ctlr), 0x0000_0001);
        write_volatile(addr_of_mut!((*gicd).ctlr), 0x0000_0001);
    }
}

/// Read the interrupt-acknowledge register; identifies the pending source.
pub fn acknowledge() -> u32 {
    let gicc = GICC0_BASE as *const GicCpu;
    unsafe { read_volatile(addr_of!((*gicc).iar)) }
}

/// Signal completion of the interrupt previously acknowledged.
pub fn end_of_interrupt(id: u32) {
    let gicc = GICC0_BASE as *mut GicCpu;
    unsafe {
        write_volatile(addr_of_mut!((*gicc).eoir), id);
    }
}

/// Unmask IRQ delivery in the processor itself.
#[cfg(target_arch = "arm")]
pub fn irq_unmask() {
    unsafe {
        core::arch::asm!("cpsie i");
    }
}
