use crate::devices::uart::CharSink;
use crate::fs::defs::MAX_FDS;
use crate::kcore::Kernel;

use super::defs::{Context, Pcb, Status, MAX_PROCS, NICE_MAX, NICE_MIN};
use super::error::ProcessError;

impl<C: CharSink> Kernel<C> {
    /// Slot a fork should build the child in: the lowest TERMINATED slot
    /// above 0, else the next never-used index. Slot 0 belongs to the
    /// console and is never recycled.
    fn alloc_slot(&self) -> Result<usize, ProcessError> {
        if self.current_processes >= MAX_PROCS {
            return Err(ProcessError::TableFull);
        }
        for i in 1..MAX_PROCS {
            if self.procs[i].status == Status::TERMINATED {
                return Ok(i);
            }
        }
        Ok(self.current_processes)
    }

    /// fork(). The child replicates the caller: saved context, the active
    /// portion of the stack (rebased into the child's own arena slot),
    /// niceness, and the descriptor table with every open file re-counted.
    /// The parent's return register carries the child PID, the child's 0.
    pub fn sys_fork(&mut self, ctx: &mut Context) {
        let child = match self.alloc_slot() {
            Ok(slot) => slot,
            Err(ProcessError::TableFull) => {
                self.console.puts("\nERR: process table full");
                ctx.gpr[0] = -1i32 as u32;
                return;
            }
        };
        self.current_processes += 1;

        let parent = self.executing;
        let tos = self.stacks.tos(child);

        self.procs[child] = Pcb::empty();
        self.procs[child].pid = child;
        self.procs[child].status = Status::READY;
        self.procs[child].tos = tos;
        self.procs[child].ctx = *ctx;
        self.procs[child].last_exec = self.time;
        self.procs[child].niceness = self.procs[parent].niceness;

        // same stack depth as the parent, in the child's own slot
        let used = self.procs[parent].tos - ctx.sp;
        self.procs[child].ctx.sp = tos - used;
        self.stacks.blit(ctx.sp, self.procs[child].ctx.sp, used);

        for i in 0..MAX_FDS {
            let fd = self.procs[parent].fd_tab[i];
            self.procs[child].fd_tab[i] = fd;
            if fd >= 0 {
                self.files[fd as usize].ref_count += 1;
            }
        }

        ctx.gpr[0] = child as u32;
        self.procs[child].ctx.gpr[0] = 0;
    }

    /// exec(entry). Replaces the program image: jump to the new entry point
    /// on a reset stack. Descriptors and niceness survive the call.
    pub fn sys_exec(&mut self, ctx: &mut Context, entry: u32) {
        ctx.pc = entry;
        ctx.sp = self.procs[self.executing].tos;
    }

    /// exit(status). Retires the caller and hands the CPU to whoever the
    /// scheduler picks; the status code is accepted and discarded.
    pub fn sys_exit(&mut self, ctx: &mut Context, _status: i32) {
        self.terminate(self.executing);
        self.schedule(ctx);
    }

    /// kill(pid, signal). Unconditional termination; the signal argument
    /// is accepted and discarded. The caller keeps the CPU. Killing a slot
    /// that holds no live process is a no-op.
    pub fn sys_kill(&mut self, pid: usize, _signal: i32) -> i32 {
        if pid >= MAX_PROCS {
            return -1;
        }
        if !matches!(self.procs[pid].status, Status::READY | Status::EXECUTING) {
            return 0;
        }
        self.terminate(pid);
        0
    }

    /// nice(pid, value). Clamps into the valid niceness range and returns
    /// the clamped value; a nonexistent target stores nothing.
    pub fn sys_nice(&mut self, pid: usize, value: i32) -> i32 {
        let value = value.clamp(NICE_MIN, NICE_MAX);
        if pid < MAX_PROCS {
            self.procs[pid].niceness = value;
        }
        value
    }

    /// Close every live descriptor of a PCB and mark it TERMINATED. The
    /// slot becomes eligible for reuse by a later fork.
    fn terminate(&mut self, pid: usize) {
        for i in 0..MAX_FDS {
            let fd = self.procs[pid].fd_tab[i];
            if fd >= 0 {
                let _ = self.close_fd(fd, pid);
            }
        }
        self.procs[pid].status = Status::TERMINATED;
        self.current_processes -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kcore::testing::booted;
    use crate::memory::defs::STACK_SIZE;

    #[test]
    fn fork_reports_pids_to_both_sides() {
        let (mut kernel, mut ctx) = booted();

        kernel.sys_fork(&mut ctx);

        assert_eq!(ctx.gpr[0], 1);
        assert_eq!(kernel.procs[1].ctx.gpr[0], 0);
        assert_eq!(kernel.procs[1].pid, 1);
        assert_eq!(kernel.procs[1].status, Status::READY);
        assert_eq!(kernel.current_processes, 2);
    }

    #[test]
    fn fork_rebases_the_child_stack() {
        let (mut kernel, mut ctx) = booted();

        // push 24 bytes of live parent stack and stamp them
        let used = 24u32;
        ctx.sp = kernel.procs[0].tos - used;
        let top = STACK_SIZE;
        kernel.stacks.storage_mut()[top - 24..top].copy_from_slice(&[0x5A; 24]);

        kernel.sys_fork(&mut ctx);

        let child_tos = kernel.procs[1].tos;
        assert_eq!(kernel.procs[1].ctx.sp, child_tos - used);

        let child_top = 2 * STACK_SIZE;
        assert_eq!(
            &kernel.stacks.storage_mut()[child_top - 24..child_top],
            &[0x5A; 24]
        );
    }

    #[test]
    fn fork_replicates_context_and_niceness() {
        let (mut kernel, mut ctx) = booted();
        kernel.sys_nice(0, 7);
        ctx.gpr[4] = 99;
        ctx.pc = 0x1234;

        kernel.sys_fork(&mut ctx);

        assert_eq!(kernel.procs[1].niceness, 7);
        assert_eq!(kernel.procs[1].ctx.gpr[4], 99);
        assert_eq!(kernel.procs[1].ctx.pc, 0x1234);
    }

    #[test]
    fn fork_duplicates_descriptors_and_counts() {
        let (mut kernel, mut ctx) = booted();
        let mut fds = [0i32; 2];
        kernel.sys_pipe(&mut fds);

        kernel.sys_fork(&mut ctx);

        assert_eq!(kernel.procs[1].fd_tab[0], fds[0]);
        assert_eq!(kernel.procs[1].fd_tab[1], fds[1]);
        assert_eq!(kernel.files[fds[0] as usize].ref_count, 2);
        assert_eq!(kernel.files[fds[1] as usize].ref_count, 2);
    }

    #[test]
    fn fork_with_full_table_fails() {
        let (mut kernel, mut ctx) = booted();
        for _ in 1..MAX_PROCS {
            kernel.sys_fork(&mut ctx);
            assert_ne!(ctx.gpr[0] as i32, -1);
        }

        kernel.sys_fork(&mut ctx);
        assert_eq!(ctx.gpr[0] as i32, -1);
        assert!(kernel.console.take().contains("ERR: process table full"));
        assert_eq!(kernel.current_processes, MAX_PROCS);
    }

    #[test]
    fn fork_reuses_the_lowest_terminated_slot() {
        let (mut kernel, mut ctx) = booted();
        kernel.sys_fork(&mut ctx); // child 1
        kernel.sys_fork(&mut ctx); // child 2

        kernel.sys_kill(1, 0);
        kernel.sys_fork(&mut ctx);
        assert_eq!(ctx.gpr[0], 1);
        assert_eq!(kernel.procs[1].status, Status::READY);
        assert_eq!(kernel.current_processes, 3);
    }

    #[test]
    fn exec_replaces_the_image_but_keeps_descriptors() {
        let (mut kernel, mut ctx) = booted();
        let mut fds = [0i32; 2];
        kernel.sys_pipe(&mut fds);
        ctx.sp = kernel.procs[0].tos - 64;

        kernel.sys_exec(&mut ctx, 0xC0DE);

        assert_eq!(ctx.pc, 0xC0DE);
        assert_eq!(ctx.sp, kernel.procs[0].tos);
        assert_eq!(kernel.procs[0].fd_tab[0], fds[0]);
        assert_eq!(kernel.files[fds[0] as usize].ref_count, 1);
    }

    #[test]
    fn exit_releases_descriptors_and_reschedules() {
        let (mut kernel, mut ctx) = booted();
        let mut fds = [0i32; 2];
        kernel.sys_pipe(&mut fds);
        kernel.sys_fork(&mut ctx); // child 1 shares the pipe

        // run as the child, then exit it
        kernel.schedule(&mut ctx);
        assert_eq!(kernel.executing, 1);
        kernel.sys_exit(&mut ctx, 0);

        assert_eq!(kernel.procs[1].status, Status::TERMINATED);
        assert_eq!(kernel.current_processes, 1);
        assert_eq!(kernel.executing, 0);
        assert_eq!(kernel.files[fds[0] as usize].ref_count, 1);
        assert_eq!(kernel.files[fds[1] as usize].ref_count, 1);
    }

    #[test]
    fn kill_terminates_without_rescheduling() {
        let (mut kernel, mut ctx) = booted();
        kernel.sys_fork(&mut ctx); // child 1

        assert_eq!(kernel.sys_kill(1, 9), 0);
        assert_eq!(kernel.procs[1].status, Status::TERMINATED);
        assert_eq!(kernel.procs[0].status, Status::EXECUTING);
        assert_eq!(kernel.executing, 0);
        assert_eq!(kernel.current_processes, 1);
    }

    #[test]
    fn kill_of_dead_or_invalid_slot_is_a_no_op() {
        let (mut kernel, _ctx) = booted();
        assert_eq!(kernel.sys_kill(5, 0), 0);
        assert_eq!(kernel.current_processes, 1);
        assert_eq!(kernel.sys_kill(MAX_PROCS, 0), -1);
    }

    #[test]
    fn nice_clamps_into_range() {
        let (mut kernel, _ctx) = booted();
        assert_eq!(kernel.sys_nice(0, 100), NICE_MAX);
        assert_eq!(kernel.procs[0].niceness, NICE_MAX);
        assert_eq!(kernel.sys_nice(0, -100), NICE_MIN);
        assert_eq!(kernel.procs[0].niceness, NICE_MIN);
        assert_eq!(kernel.sys_nice(0, 3), 3);

        // nonexistent target: clamped value reported, nothing stored
        assert_eq!(kernel.sys_nice(MAX_PROCS + 1, 50), NICE_MAX);
    }
}
