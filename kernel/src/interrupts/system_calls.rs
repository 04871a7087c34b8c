use crate::devices::uart::CharSink;
use crate::kcore::Kernel;
use crate::scheduler::defs::Context;

use super::defs::Syscall;

impl<C: CharSink> Kernel<C> {
    /// Every supervisor call lands here with the trapped context and the
    /// decoded request. Return values go back through r0 of the context;
    /// yield, fork and exit reach the context directly because they swap
    /// or replicate it. An unknown identifier is a silent no-op.
    pub fn handle_svc(&mut self, ctx: &mut Context, call: Syscall) {
        match call {
            Syscall::Yield => self.schedule(ctx),
            Syscall::Write { fd, buf } => ctx.gpr[0] = self.sys_write(fd, buf) as u32,
            Syscall::Read { fd, buf } => ctx.gpr[0] = self.sys_read(fd, buf) as u32,
            Syscall::Fork => {
                self.console.putc(b'F');
                self.sys_fork(ctx);
            }
            Syscall::Exit { status } => {
                self.console.putc(b'X');
                self.sys_exit(ctx, status);
            }
            Syscall::Exec { entry } => {
                self.console.putc(b'E');
                self.sys_exec(ctx, entry);
            }
            Syscall::Kill { pid, signal } => {
                self.console.putc(b'K');
                ctx.gpr[0] = self.sys_kill(pid, signal) as u32;
            }
            Syscall::Nice { pid, value } => {
                self.console.putc(b'N');
                ctx.gpr[0] = self.sys_nice(pid, value) as u32;
            }
            Syscall::Pipe { fds } => ctx.gpr[0] = self.sys_pipe(fds) as u32,
            Syscall::Close { fd } => ctx.gpr[0] = self.sys_close(fd) as u32,
            Syscall::Unknown(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kcore::testing::booted;

    #[test]
    fn fork_exit_exec_kill_nice_emit_their_letters() {
        let (mut kernel, mut ctx) = booted();

        kernel.handle_svc(&mut ctx, Syscall::Fork);
        assert!(kernel.console.take().starts_with('F'));

        kernel.handle_svc(&mut ctx, Syscall::Exec { entry: 0x9000 });
        assert_eq!(kernel.console.take(), "E");

        kernel.handle_svc(&mut ctx, Syscall::Nice { pid: 1, value: 2 });
        assert_eq!(kernel.console.take(), "N");

        kernel.handle_svc(&mut ctx, Syscall::Kill { pid: 1, signal: 0 });
        assert_eq!(kernel.console.take(), "K");

        kernel.handle_svc(&mut ctx, Syscall::Exit { status: 0 });
        assert!(kernel.console.take().starts_with('X'));
    }

    #[test]
    fn return_values_travel_through_r0() {
        let (mut kernel, mut ctx) = booted();

        let mut fds = [0i32; 2];
        kernel.handle_svc(&mut ctx, Syscall::Pipe { fds: &mut fds });
        assert_eq!(ctx.gpr[0], 0);

        kernel.handle_svc(&mut ctx, Syscall::Write { fd: fds[1], buf: b"ab" });
        assert_eq!(ctx.gpr[0], 2);

        let mut buf = [0u8; 2];
        kernel.handle_svc(&mut ctx, Syscall::Read { fd: fds[0], buf: &mut buf });
        assert_eq!(ctx.gpr[0], 2);
        assert_eq!(&buf, b"ab");

        kernel.handle_svc(&mut ctx, Syscall::Close { fd: fds[0] });
        assert_eq!(ctx.gpr[0], 0);
    }

    #[test]
    fn unknown_identifier_is_a_silent_no_op() {
        let (mut kernel, mut ctx) = booted();
        let before = ctx;

        kernel.handle_svc(&mut ctx, Syscall::Unknown(0x42));

        assert_eq!(ctx.gpr, before.gpr);
        assert_eq!(ctx.pc, before.pc);
        assert!(kernel.console.take().is_empty());
        assert_eq!(kernel.executing, 0);
    }
}
