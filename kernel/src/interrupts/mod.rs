pub mod defs;
pub mod system_calls;

cfg_if::cfg_if! {
    if #[cfg(target_arch = "arm")] {
        pub mod handlers;
    }
}
