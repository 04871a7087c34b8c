use crate::fs::defs::MAX_FDS;

/// Size of the process table.
pub const MAX_PROCS: usize = 32;

/// CPSR value processes start with: USR mode, IRQ delivery enabled.
pub const CPSR_USR: u32 = 0x50;

/// Niceness bounds. Lower niceness means the scheduler favours the process.
pub const NICE_MIN: i32 = -19;
pub const NICE_MAX: i32 = 20;

/// Saved execution state of a process at the moment of trap entry, in the
/// order the trap shim pushes it: status word, program counter, the 13
/// general-purpose registers, stack pointer, link register. Byte-copied in
/// and out of PCBs; the scheduler treats it as opaque apart from that.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub cpsr: u32,
    pub pc: u32,
    pub gpr: [u32; 13],
    pub sp: u32,
    pub lr: u32,
}

impl Context {
    pub const fn new() -> Self {
        Context {
            cpsr: 0,
            pc: 0,
            gpr: [0; 13],
            sp: 0,
            lr: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    INVALID,
    READY,
    EXECUTING,
    TERMINATED,
}

/// Process control block. `pid` always equals the PCB's index in the
/// process table; `tos` is the top of its fixed stack slot in the arena.
#[derive(Debug, Clone, Copy)]
pub struct Pcb {
    pub pid: usize,
    pub status: Status,
    pub tos: u32,
    pub ctx: Context,
    pub last_exec: u32,
    pub niceness: i32,
    pub fd_tab: [i32; MAX_FDS],
}

impl Pcb {
    pub const fn empty() -> Self {
        Pcb {
            pid: 0,
            status: Status::INVALID,
            tos: 0,
            ctx: Context::new(),
            last_exec: 0,
            niceness: 0,
            fd_tab: [-1; MAX_FDS],
        }
    }
}
