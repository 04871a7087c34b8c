use super::defs::STACK_SIZE;

/// Pre-reserved arena holding every process stack. Slot `i` occupies
/// `[base + i*STACK_SIZE, base + (i+1)*STACK_SIZE)`; stacks are full
/// descending, so a slot's top-of-stack is the end of its region.
///
/// Stack pointers are plain `u32` addresses derived from the arena base,
/// and the arena translates them back to offsets before touching memory.
/// Fork's copy of the parent's active stack is therefore a bounds-checked
/// slice operation rather than a raw pointer blit.
pub struct StackArena {
    base: u32,
    storage: &'static mut [u8],
}

impl StackArena {
    pub fn new(storage: &'static mut [u8]) -> Self {
        let base = storage.as_ptr() as usize as u32;
        StackArena { base, storage }
    }

    /// Number of whole stack slots the backing region provides.
    pub fn slots(&self) -> usize {
        self.storage.len() / STACK_SIZE
    }

    /// Top of stack of a slot: one byte past the highest address it owns.
    pub fn tos(&self, slot: usize) -> u32 {
        assert!(slot < self.slots(), "[FATAL] stack slot out of range");
        self.base.wrapping_add(((slot + 1) * STACK_SIZE) as u32)
    }

    fn offset(&self, address: u32) -> usize {
        address.wrapping_sub(self.base) as usize
    }

    /// Copy the `len`-byte region starting at `src` onto `dst`. Both ranges
    /// must fall inside the arena.
    pub fn blit(&mut self, src: u32, dst: u32, len: u32) {
        if len == 0 {
            return;
        }
        let src = self.offset(src);
        let dst = self.offset(dst);
        let len = len as usize;
        assert!(
            src + len <= self.storage.len() && dst + len <= self.storage.len(),
            "[FATAL] stack copy outside the arena"
        );
        self.storage.copy_within(src..src + len, dst);
    }

    #[cfg(test)]
    pub(crate) fn storage_mut(&mut self) -> &mut [u8] {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(slots: usize) -> StackArena {
        let storage = Box::leak(vec![0u8; slots * STACK_SIZE].into_boxed_slice());
        StackArena::new(storage)
    }

    #[test]
    fn slots_are_disjoint_and_sized() {
        let arena = arena(4);
        assert_eq!(arena.slots(), 4);
        for slot in 0..4 {
            let tos = arena.tos(slot);
            assert_eq!(tos.wrapping_sub(arena.base), ((slot + 1) * STACK_SIZE) as u32);
        }
    }

    #[test]
    fn blit_copies_active_region() {
        let mut arena = arena(2);
        let parent_tos = arena.tos(0);
        let child_tos = arena.tos(1);

        let used = 16u32;
        let src = parent_tos - used;
        let dst = child_tos - used;

        let base = arena.base;
        let src_off = src.wrapping_sub(base) as usize;
        arena.storage_mut()[src_off..src_off + 16].copy_from_slice(&[0xAB; 16]);

        arena.blit(src, dst, used);

        let dst_off = dst.wrapping_sub(base) as usize;
        assert_eq!(&arena.storage_mut()[dst_off..dst_off + 16], &[0xAB; 16]);
    }

    #[test]
    #[should_panic]
    fn blit_outside_arena_is_rejected() {
        let mut arena = arena(1);
        let tos = arena.tos(0);
        arena.blit(tos, tos.wrapping_sub(8), 16);
    }
}
