/// PL011 UART serial communication. UART0 sits at a fixed physical address
/// on the Versatile/RealView-class boards and QEMU models it ready for use;
/// the kernel only ever drives it as a blocking byte sink.
/// More information can be found here https://developer.arm.com/documentation/ddi0183.
use core::ptr::{addr_of, addr_of_mut, read_volatile, write_volatile};

pub const UART0_BASE: usize = 0x1000_9000;

const FR_TXFF: u32 = 1 << 5; // Transmit FIFO full
const CR_UARTEN: u32 = 1 << 0;
const CR_TXE: u32 = 1 << 8;
const CR_RXE: u32 = 1 << 9;

/// Memory-mapped PL011 register block.
#[repr(C)]
pub struct Pl011 {
    pub dr: u32,
    pub rsr_ecr: u32,
    _reserved0: [u32; 4],
    pub fr: u32,
    _reserved1: u32,
    pub ilpr: u32,
    pub ibrd: u32,
    pub fbrd: u32,
    pub lcrh: u32,
    pub cr: u32,
    pub ifls: u32,
    pub imsc: u32,
    pub ris: u32,
    pub mis: u32,
    pub icr: u32,
    pub dmacr: u32,
}

/// Byte sink every kernel trace and diagnostic goes through. The scheduler
/// and system-call handlers print via the sink the kernel owns, so the host
/// tests can substitute a capturing buffer for the hardware UART.
pub trait CharSink {
    fn putc(&mut self, byte: u8);

    fn puts(&mut self, s: &str) {
        for byte in s.bytes() {
            self.putc(byte);
        }
    }
}

/// Handle on UART0. Zero-sized; every instance talks to the same device.
#[derive(Clone, Copy)]
pub struct Uart0;

impl Uart0 {
    fn regs(self) -> *mut Pl011 {
        UART0_BASE as *mut Pl011
    }

    /// Blocking transmit: spin until the FIFO has room, then store the byte.
    pub fn put_byte(self, byte: u8) {
        let regs = self.regs();
        unsafe {
            while read_volatile(addr_of!((*regs).fr)) & FR_TXFF != 0 {
                core::hint::spin_loop();
            }
            write_volatile(addr_of_mut!((*regs).dr), byte as u32);
        }
    }
}

impl CharSink for Uart0 {
    fn putc(&mut self, byte: u8) {
        self.put_byte(byte);
    }
}

/// Make sure the transmitter is running. QEMU boots the PL011 enabled, but
/// re-asserting the control bits keeps the reset path self-contained.
pub fn uart_init() {
    let regs = UART0_BASE as *mut Pl011;
    unsafe {
        write_volatile(addr_of_mut!((*regs).cr), CR_UARTEN | CR_TXE | CR_RXE);
    }
}
