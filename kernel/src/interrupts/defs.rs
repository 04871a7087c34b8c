use core::slice::{from_raw_parts, from_raw_parts_mut};

use crate::scheduler::defs::Context;

/// Supervisor call identifiers: the immediate operand of the `svc`
/// instruction, extracted by the trap shim.
pub mod svc {
    pub const YIELD: u32 = 0x00;
    pub const WRITE: u32 = 0x01;
    pub const READ: u32 = 0x02;
    pub const FORK: u32 = 0x03;
    pub const EXIT: u32 = 0x04;
    pub const EXEC: u32 = 0x05;
    pub const KILL: u32 = 0x06;
    pub const NICE: u32 = 0x07;
    pub const PIPE: u32 = 0x08;
    pub const CLOSE: u32 = 0x09;
}

/// A supervisor call decoded into a typed request. Integer arguments come
/// from r0..r2 of the trapped context; buffer arguments arrive as slices,
/// materialised once at the decode boundary so the handlers themselves
/// never touch raw user pointers.
pub enum Syscall<'a> {
    Yield,
    Write { fd: i32, buf: &'a [u8] },
    Read { fd: i32, buf: &'a mut [u8] },
    Fork,
    Exit { status: i32 },
    Exec { entry: u32 },
    Kill { pid: usize, signal: i32 },
    Nice { pid: usize, value: i32 },
    Pipe { fds: &'a mut [i32; 2] },
    Close { fd: i32 },
    Unknown(u32),
}

impl<'a> Syscall<'a> {
    /// Decode the register file the shim saved into a typed call. A
    /// negative length is treated as an empty buffer.
    ///
    /// # Safety
    /// Buffer arguments are raw user addresses. There is no MMU: the
    /// caller asserts that they reference memory that is readable (and,
    /// for `Read` and `Pipe`, writable) for the stated length and that
    /// stays untouched while the returned value is alive.
    pub unsafe fn decode(id: u32, ctx: &Context) -> Syscall<'a> {
        let len = (ctx.gpr[2] as i32).max(0) as usize;
        match id {
            svc::YIELD => Syscall::Yield,
            svc::WRITE => Syscall::Write {
                fd: ctx.gpr[0] as i32,
                buf: from_raw_parts(ctx.gpr[1] as *const u8, len),
            },
            svc::READ => Syscall::Read {
                fd: ctx.gpr[0] as i32,
                buf: from_raw_parts_mut(ctx.gpr[1] as *mut u8, len),
            },
            svc::FORK => Syscall::Fork,
            svc::EXIT => Syscall::Exit { status: ctx.gpr[0] as i32 },
            svc::EXEC => Syscall::Exec { entry: ctx.gpr[0] },
            svc::KILL => Syscall::Kill {
                pid: ctx.gpr[0] as usize,
                signal: ctx.gpr[1] as i32,
            },
            svc::NICE => Syscall::Nice {
                pid: ctx.gpr[0] as usize,
                value: ctx.gpr[1] as i32,
            },
            svc::PIPE => Syscall::Pipe {
                fds: &mut *(ctx.gpr[0] as *mut [i32; 2]),
            },
            svc::CLOSE => Syscall::Close { fd: ctx.gpr[0] as i32 },
            other => Syscall::Unknown(other),
        }
    }
}
