use crate::devices::uart::CharSink;
use crate::kcore::Kernel;

use super::defs::{Context, Status, MAX_PROCS};

impl<C: CharSink> Kernel<C> {
    /// Print a PID as one or two decimal digits.
    fn put_pid(&mut self, pid: usize) {
        if pid >= 10 {
            self.console.putc(b'0' + (pid / 10) as u8);
        }
        self.console.putc(b'0' + (pid % 10) as u8);
    }

    /// Swap the handler's context record between two PCBs and emit the
    /// `[prev->next]` trace. `prev` is absent exactly once, on reset, when
    /// there is no context worth preserving.
    pub fn dispatch(&mut self, ctx: &mut Context, prev: Option<usize>, next: usize) {
        self.console.putc(b'[');

        match prev {
            Some(prev) => {
                self.procs[prev].ctx = *ctx;
                self.put_pid(prev);
            }
            None => self.console.putc(b'?'),
        }

        self.console.putc(b'-');
        self.console.putc(b'>');

        *ctx = self.procs[next].ctx;
        self.put_pid(next);

        self.console.putc(b']');

        self.executing = next;
    }

    /// Pick the process to run next and switch to it. Every READY process
    /// is scored by how long it has waited minus its niceness, so waiting
    /// processes age into priority and nicer processes age slower. The
    /// incumbent defends its slot with a baseline of `niceness - 1`: any
    /// equally-eligible peer displaces it, and among equal scores the scan
    /// leaves the highest index holding the win.
    pub fn schedule(&mut self, ctx: &mut Context) {
        let prev = self.executing;
        let mut next = prev;
        let mut highest = self.procs[prev].niceness as i64 - 1;

        for i in 0..MAX_PROCS {
            if self.procs[i].status != Status::READY {
                continue;
            }
            let waited = self.time.wrapping_sub(self.procs[i].last_exec) as i64;
            let score = waited - self.procs[i].niceness as i64;
            if score >= highest {
                highest = score;
                next = i;
            }
        }

        self.dispatch(ctx, Some(prev), next);

        self.procs[prev].last_exec = self.time;
        if self.procs[prev].status == Status::EXECUTING {
            self.procs[prev].status = Status::READY;
        }
        self.procs[next].status = Status::EXECUTING;

        self.time += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kcore::testing::{booted, TraceSink};
    use crate::kcore::Kernel;

    /// Fork `n` children out of PCB 0 and clear the accumulated trace.
    fn with_children(n: usize) -> (Kernel<TraceSink>, Context) {
        let (mut kernel, mut ctx) = booted();
        for _ in 0..n {
            kernel.sys_fork(&mut ctx);
            ctx.gpr[0] = 0;
        }
        kernel.console.0.clear();
        (kernel, ctx)
    }

    #[test]
    fn lone_process_keeps_the_cpu() {
        let (mut kernel, mut ctx) = booted();
        kernel.schedule(&mut ctx);
        assert_eq!(kernel.executing, 0);
        assert_eq!(kernel.console.take(), "[0->0]");
        assert_eq!(kernel.procs[0].status, Status::EXECUTING);
    }

    #[test]
    fn equally_nice_peers_alternate() {
        let (mut kernel, mut ctx) = with_children(1);

        kernel.schedule(&mut ctx);
        assert_eq!(kernel.executing, 1);
        kernel.schedule(&mut ctx);
        assert_eq!(kernel.executing, 0);
        kernel.schedule(&mut ctx);
        assert_eq!(kernel.executing, 1);
        assert_eq!(kernel.console.take(), "[0->1][1->0][0->1]");
    }

    #[test]
    fn ties_go_to_the_highest_index() {
        let (mut kernel, mut ctx) = with_children(2);

        // both children waited equally long; the scan keeps the later one
        kernel.schedule(&mut ctx);
        assert_eq!(kernel.executing, 2);
    }

    #[test]
    fn lower_niceness_wins_more_dispatches() {
        let (mut kernel, mut ctx) = with_children(2);
        kernel.sys_nice(2, -5);

        let mut dispatches = [0usize; 3];
        for _ in 0..10 {
            kernel.schedule(&mut ctx);
            dispatches[kernel.executing] += 1;
        }

        assert!(dispatches[2] > dispatches[0]);
        assert!(dispatches[2] > dispatches[1]);
    }

    #[test]
    fn waiting_process_ages_into_priority() {
        let (mut kernel, mut ctx) = with_children(2);
        kernel.sys_nice(2, -5);

        // even against a favoured peer, the others are not starved
        let mut dispatches = [0usize; 3];
        for _ in 0..30 {
            kernel.schedule(&mut ctx);
            dispatches[kernel.executing] += 1;
        }
        assert!(dispatches[0] > 0);
        assert!(dispatches[1] > 0);
    }

    #[test]
    fn dispatch_preserves_and_restores_contexts() {
        let (mut kernel, mut ctx) = with_children(1);

        ctx.gpr[5] = 0xDEAD_BEEF;
        kernel.schedule(&mut ctx);
        assert_eq!(kernel.procs[0].ctx.gpr[5], 0xDEAD_BEEF);
        assert_eq!(ctx.gpr[5], 0);

        kernel.schedule(&mut ctx);
        assert_eq!(ctx.gpr[5], 0xDEAD_BEEF);
    }

    #[test]
    fn two_digit_pids_print_both_digits() {
        let (mut kernel, mut ctx) = with_children(11);

        kernel.schedule(&mut ctx);
        assert_eq!(kernel.executing, 11);
        assert_eq!(kernel.console.take(), "[0->11]");
    }
}
