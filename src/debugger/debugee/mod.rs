pub mod disasm;
pub mod tracee;

use crate::debugger::Error;
use nix::libc::{c_long, c_void};
use nix::sys;
use nix::unistd::Pid;
use std::mem;

/// Read debugee memory word by word with `PTRACE_PEEKDATA`.
///
/// Returns less than `read_n` bytes if the tail of requested region is unmapped,
/// an error if nothing can be read.
pub fn read_memory_by_pid(pid: Pid, addr: u64, read_n: usize) -> Result<Vec<u8>, Error> {
    let mut result = Vec::with_capacity(read_n);
    let single_read_size = mem::size_of::<c_long>() as u64;

    let mut word_addr = addr;
    while result.len() < read_n {
        match sys::ptrace::read(pid, word_addr as *mut c_void) {
            Ok(value) => {
                let reminder = read_n - result.len();
                result.extend(value.to_ne_bytes().into_iter().take(reminder));
            }
            // instruction may end right before an unmapped page
            Err(_) if !result.is_empty() => break,
            Err(e) => return Err(Error::UnreadableMemory(addr, e)),
        }
        word_addr += single_read_size;
    }

    Ok(result)
}
