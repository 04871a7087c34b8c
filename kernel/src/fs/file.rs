use alloc::boxed::Box;

use crate::devices::uart::CharSink;
use crate::kcore::Kernel;

use super::defs::{FileBacking, FileFlag, OpenFile, MAX_FDS, RESERVED_FDS};
use super::error::FdError;
use super::pipe::PipeBuffer;

impl<C: CharSink> Kernel<C> {
    /// Install a backing into the first free open-file slot above the
    /// reserved entries and record the resulting descriptor in the calling
    /// process's table. Nothing is touched unless both slots exist.
    pub fn open_fd(&mut self, backing: FileBacking, flag: FileFlag) -> Result<i32, FdError> {
        let fd = (RESERVED_FDS..MAX_FDS)
            .find(|&i| self.files[i].ref_count == 0)
            .ok_or(FdError::OpenFileTableFull)?;

        let fd_tab = &mut self.procs[self.executing].fd_tab;
        let slot = fd_tab
            .iter()
            .position(|&entry| entry < 0)
            .ok_or(FdError::DescriptorTableFull)?;

        fd_tab[slot] = fd as i32;
        self.files[fd] = OpenFile { ref_count: 1, flag, file: backing };
        Ok(fd as i32)
    }

    /// Drop the reference process `pid` holds on `fd`. The caller must own
    /// the descriptor; the reserved stdio entries are pinned and closing
    /// them is a no-op. Releases the backing once the last reference goes.
    pub fn close_fd(&mut self, fd: i32, pid: usize) -> Result<(), FdError> {
        if fd < 0 || fd as usize >= MAX_FDS {
            return Err(FdError::DescriptorOutOfRange);
        }
        let fd = fd as usize;
        if fd < RESERVED_FDS {
            return Ok(());
        }

        let mut owned = false;
        for entry in self.procs[pid].fd_tab.iter_mut() {
            if *entry == fd as i32 {
                *entry = -1;
                owned = true;
            }
        }
        if !owned {
            return Err(FdError::NotOwned);
        }

        self.files[fd].ref_count -= 1;
        if self.files[fd].ref_count == 0 {
            self.release(fd);
        }
        Ok(())
    }

    /// Tear down an entry whose last reference just went away. A pipe whose
    /// peer entry is still open hands its buffer over instead of dropping
    /// it, so the buffer is freed exactly once, with its last descriptor.
    fn release(&mut self, fd: usize) {
        match core::mem::replace(&mut self.files[fd].file, FileBacking::None) {
            FileBacking::Pipe(buffer) => {
                let survivor = (RESERVED_FDS..MAX_FDS).find(|&i| {
                    self.files[i].ref_count > 0
                        && matches!(self.files[i].file, FileBacking::PipePeer(owner) if owner == fd)
                });
                if let Some(peer) = survivor {
                    self.files[peer].file = FileBacking::Pipe(buffer);
                }
            }
            FileBacking::PipePeer(_) | FileBacking::None => {}
        }
    }

    /// Resolve a descriptor to its pipe buffer, following a peer entry to
    /// the owning end.
    fn pipe_of(&mut self, fd: usize) -> Option<&mut PipeBuffer> {
        if self.files[fd].ref_count == 0 {
            return None;
        }
        let owner = match self.files[fd].file {
            FileBacking::Pipe(_) => fd,
            FileBacking::PipePeer(owner) => owner,
            FileBacking::None => return None,
        };
        match &mut self.files[owner].file {
            FileBacking::Pipe(buffer) => Some(buffer),
            _ => None,
        }
    }

    /// write(fd, buf, n). Stdout drains to the UART; pipe descriptors take
    /// as many bytes as fit and report the short count.
    pub fn sys_write(&mut self, fd: i32, buf: &[u8]) -> i32 {
        if fd < 0 {
            self.console.puts("\nERR: cannot address negative fd");
            return -1;
        }
        match fd {
            0 => 0,
            1 => {
                for &byte in buf {
                    self.console.putc(byte);
                }
                buf.len() as i32
            }
            2 => {
                self.console.puts("\nwrite error");
                -1
            }
            _ => {
                let fd = fd as usize;
                if fd >= MAX_FDS {
                    self.console.puts("\nERR: fd out of bounds");
                    return -1;
                }
                if self.files[fd].flag != FileFlag::WRONLY {
                    return -1;
                }
                match self.pipe_of(fd) {
                    Some(pipe) => pipe.enqueue(buf) as i32,
                    None => -1,
                }
            }
        }
    }

    /// read(fd, buf, n). Non-blocking: an empty pipe yields a zero count
    /// and the caller is expected to yield and retry.
    pub fn sys_read(&mut self, fd: i32, buf: &mut [u8]) -> i32 {
        if fd < 0 {
            self.console.puts("\nERR: cannot address negative fd");
            return -1;
        }
        match fd {
            0 => {
                self.console.puts("\nread stdin");
                0
            }
            1 => {
                self.console.puts("\nread stdout");
                0
            }
            2 => {
                self.console.puts("\nread error");
                -1
            }
            _ => {
                let fd = fd as usize;
                if fd >= MAX_FDS {
                    self.console.puts("\nERR: fd out of bounds");
                    return -1;
                }
                if self.files[fd].flag != FileFlag::RDONLY {
                    return -1;
                }
                match self.pipe_of(fd) {
                    Some(pipe) => pipe.dequeue(buf) as i32,
                    None => -1,
                }
            }
        }
    }

    /// pipe(fds). Allocates the buffer, opens the read end then the write
    /// end, and reports both descriptors. A half-built pipe is unwound.
    pub fn sys_pipe(&mut self, fds: &mut [i32; 2]) -> i32 {
        let buffer = Box::new(PipeBuffer::new());

        let fd_read = match self.open_fd(FileBacking::Pipe(buffer), FileFlag::RDONLY) {
            Ok(fd) => fd,
            Err(_) => {
                self.console.puts("\npipe failed");
                return -1;
            }
        };

        let fd_write = match self.open_fd(FileBacking::PipePeer(fd_read as usize), FileFlag::WRONLY) {
            Ok(fd) => fd,
            Err(_) => {
                self.console.puts("\npipe failed");
                let pid = self.executing;
                let _ = self.close_fd(fd_read, pid);
                return -1;
            }
        };

        fds[0] = fd_read;
        fds[1] = fd_write;
        0
    }

    /// close(fd) on behalf of the calling process.
    pub fn sys_close(&mut self, fd: i32) -> i32 {
        match self.close_fd(fd, self.executing) {
            Ok(()) => 0,
            Err(_) => -1,
        }
    }
}
