//! The kernel's owned state: process table, open-file table, tick counter,
//! stack arena and console sink, gathered into one structure that every
//! handler receives. Handlers run with IRQs masked and to completion, so
//! `&mut Kernel` is the whole concurrency story.

use crate::devices::uart::CharSink;
use crate::fs::defs::{FileFlag, OpenFile, MAX_FDS, RESERVED_FDS};
use crate::memory::stack::StackArena;
use crate::scheduler::defs::{Context, Pcb, Status, CPSR_USR, MAX_PROCS};

pub struct Kernel<C: CharSink> {
    pub console: C,
    pub stacks: StackArena,
    pub procs: [Pcb; MAX_PROCS],
    pub files: [OpenFile; MAX_FDS],
    /// Global tick counter; advanced by every scheduler pass.
    pub time: u32,
    /// PCBs currently READY or EXECUTING.
    pub current_processes: usize,
    /// Index of the PCB whose context the shim is holding.
    pub executing: usize,
}

impl<C: CharSink> Kernel<C> {
    pub fn new(console: C, stacks: StackArena) -> Self {
        assert!(stacks.slots() >= MAX_PROCS, "[FATAL] stack arena too small");
        Kernel {
            console,
            stacks,
            procs: [Pcb::empty(); MAX_PROCS],
            files: core::array::from_fn(|_| OpenFile::unused()),
            time: 0,
            current_processes: 0,
            executing: 0,
        }
    }

    /// Reset-time initialisation: invalidate the process table, pin the
    /// three stdio entries, build the console's PCB in slot 0 and dispatch
    /// it. The boot marker `R` is the first byte the kernel ever prints.
    pub fn boot(&mut self, ctx: &mut Context, console_entry: u32) {
        self.console.putc(b'R');

        for pcb in self.procs.iter_mut() {
            *pcb = Pcb::empty();
        }

        for (i, entry) in self.files.iter_mut().enumerate() {
            *entry = OpenFile::unused();
            if i < RESERVED_FDS {
                entry.ref_count = 1;
                entry.flag = if i == 0 { FileFlag::RDONLY } else { FileFlag::WRONLY };
            }
        }

        let console = &mut self.procs[0];
        console.pid = 0;
        console.status = Status::READY;
        console.tos = self.stacks.tos(0);
        console.ctx.cpsr = CPSR_USR;
        console.ctx.pc = console_entry;
        console.ctx.sp = console.tos;
        console.last_exec = self.time;
        console.niceness = 0;

        self.current_processes = 1;

        self.dispatch(ctx, None, 0);
        self.procs[0].status = Status::EXECUTING;
    }
}
