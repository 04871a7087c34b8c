//! The console: the process the kernel boots into. It launches the dining
//! philosophers demo in a child and then idles, yielding its slice back so
//! the demo processes get the CPU.

use crate::libs::system_call::{exec, fork, write, yield_now, STDOUT_FILENO};
use crate::philosophers::main_philosophers;

#[no_mangle]
pub extern "C" fn main_console() {
    write(STDOUT_FILENO, b"\nconsole: launching philosophers");

    match fork() {
        0 => exec(main_philosophers),
        -1 => {
            write(STDOUT_FILENO, b"\nconsole: fork failed");
        }
        _ => {}
    }

    loop {
        yield_now();
    }
}
