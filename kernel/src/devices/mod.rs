#[macro_use]
pub mod debug;

pub mod gic;
pub mod timer;
pub mod uart;
