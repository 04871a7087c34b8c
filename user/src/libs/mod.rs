#[cfg(target_arch = "arm")]
pub mod system_call;

pub mod utils;
