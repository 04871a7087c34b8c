//! Rust side of the three trap entry points. The assembly shim owns the
//! vector table and the register save/restore; by the time control arrives
//! here it has materialised the trapped register file as a `Context` and
//! masked IRQs, so each handler runs to completion and mutates the one
//! kernel instance without further locking discipline.

use lazy_static::lazy_static;
use spin::Mutex;

use crate::devices::uart::{uart_init, Uart0};
use crate::devices::{gic, timer};
use crate::kcore::Kernel;
use crate::memory::defs::STACK_SIZE;
use crate::memory::heap::setup_heap;
use crate::memory::stack::StackArena;
use crate::scheduler::defs::{Context, MAX_PROCS};

use super::defs::Syscall;

const STACK_ARENA_SIZE: usize = MAX_PROCS * STACK_SIZE;

#[repr(align(8))]
struct StackStorage([u8; STACK_ARENA_SIZE]);

/// Backing memory for every process stack.
static mut PROC_STACKS: StackStorage = StackStorage([0; STACK_ARENA_SIZE]);

lazy_static! {
    static ref KERNEL: Mutex<Kernel<Uart0>> = {
        // The arena is handed out exactly once, when the reset handler
        // first touches the kernel instance.
        let storage = unsafe { &mut (*core::ptr::addr_of_mut!(PROC_STACKS)).0[..] };
        Mutex::new(Kernel::new(Uart0, StackArena::new(storage)))
    };
}

/// Reset: bring up the devices, then boot the process tables and dispatch
/// the console.
#[no_mangle]
pub extern "C" fn rst_entry(ctx: &mut Context) {
    uart_init();
    setup_heap();
    timer::setup_timer();
    gic::setup_gic();
    gic::irq_unmask();

    let entry: extern "C" fn() = user::console::main_console;
    KERNEL.lock().boot(ctx, entry as usize as u32);
}

/// IRQ: acknowledge, and on a timer tick run the scheduler.
#[no_mangle]
pub extern "C" fn irq_entry(ctx: &mut Context) {
    let id = gic::acknowledge();

    if id == timer::GIC_SOURCE_TIMER01 {
        timer::clear_interrupt();
        KERNEL.lock().schedule(ctx);
    }

    gic::end_of_interrupt(id);
}

/// SVC: decode the immediate operand and the register file, then dispatch.
#[no_mangle]
pub extern "C" fn svc_entry(ctx: &mut Context, id: u32) {
    let call = unsafe { Syscall::decode(id, ctx) };
    KERNEL.lock().handle_svc(ctx, call);
}
