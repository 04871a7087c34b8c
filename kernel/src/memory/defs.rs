/// Fixed stack region of every process, in bytes.
pub const STACK_SIZE: usize = 0x2000;

/// Backing store handed to the heap allocator at boot.
pub const KERNEL_HEAP_SIZE: usize = 64 * 1024;
