//! Kernel heap. A `linked_list_allocator` heap over a static backing array;
//! the only dynamic allocations the kernel makes are the pipe buffers owned
//! by open-file entries. Host test builds use the host allocator instead.

#[cfg(target_arch = "arm")]
use linked_list_allocator::LockedHeap;

#[cfg(target_arch = "arm")]
use super::defs::KERNEL_HEAP_SIZE;

#[cfg(target_arch = "arm")]
#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

#[cfg(target_arch = "arm")]
static mut HEAP_MEMORY: [u8; KERNEL_HEAP_SIZE] = [0; KERNEL_HEAP_SIZE];

/// Hand the static heap region to the allocator. Must run once, in the
/// reset path, before the first allocation.
#[cfg(target_arch = "arm")]
pub fn setup_heap() {
    unsafe {
        let start = core::ptr::addr_of_mut!(HEAP_MEMORY) as *mut u8;
        ALLOCATOR.lock().init(start, KERNEL_HEAP_SIZE);
    }
}
