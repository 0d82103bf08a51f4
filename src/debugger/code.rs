//! `si_code` values of a `SIGTRAP` siginfo.

/// Process breakpoint, also reported by x86 after single-stepping over `syscall`.
pub const TRAP_BRKPT: i32 = 0x1;
/// Process trace trap
pub const TRAP_TRACE: i32 = 0x2;
/// Sent by the kernel from somewhere (`int3` execution)
pub const SI_KERNEL: i32 = 0x80;
