use core::fmt;

use lazy_static::lazy_static;
use spin::Mutex;

use super::uart::{CharSink, Uart0};

/* ************ Macros ************ */

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ($crate::devices::debug::_print(format_args!($($arg)*)));
}

#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", format_args!($($arg)*)));
}

/// Formatted output for the boot path and the panic handler. Trace output
/// that is part of the kernel's observable behaviour goes through the
/// kernel-owned sink instead.
pub struct Console {
    uart: Uart0,
}

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.uart.puts(s);
        Ok(())
    }
}

lazy_static! {
    pub static ref CONSOLE: Mutex<Console> = Mutex::new(Console { uart: Uart0 });
}

pub fn _print(args: fmt::Arguments) {
    use core::fmt::Write;
    CONSOLE.lock().write_fmt(args).unwrap();
}
