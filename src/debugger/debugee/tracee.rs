use crate::debugger::code;
use crate::debugger::debugee::disasm::{Disassembler, Instruction};
use crate::debugger::debugee::read_memory_by_pid;
use crate::debugger::error::Error::{self, NoInstruction, ProcessExit, ProcessNotStarted, Ptrace, Waitpid};
use crate::debugger::step::{Control, StopReason, Thread};
use log::{debug, warn};
use nix::libc;
use nix::sys;
use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;

/// Tracee is a thread attached to debugger with ptrace.
pub struct Tracee {
    /// Tracee thread id.
    pid: Pid,
    /// Reason of the last stop.
    stop: StopReason,
    disasm: Disassembler,
}

impl Tracee {
    pub fn new(pid: Pid, disasm: Disassembler) -> Self {
        Self {
            pid,
            stop: StopReason::Event(libc::PTRACE_EVENT_STOP),
            disasm,
        }
    }

    /// Wait for change of tracee status.
    pub fn wait_one(&self) -> Result<WaitStatus, Error> {
        debug!(target: "tracer", "wait for tracee status, thread {pid}", pid = self.pid);
        let status = waitpid(self.pid, None).map_err(Waitpid)?;
        debug!(target: "tracer", "receive tracee status, thread {pid}, status: {status:?}", pid = self.pid);
        Ok(status)
    }

    /// Resume freshly installed debugee until it `exec` a program.
    /// After this tracee stopped at the program entry point.
    pub fn start(&mut self) -> Result<(), Error> {
        let mut signal = None;
        loop {
            sys::ptrace::cont(self.pid, signal.take()).map_err(Ptrace)?;

            match self.wait_one()? {
                WaitStatus::PtraceEvent(_, _, libc::PTRACE_EVENT_EXEC) => {
                    self.stop = StopReason::Event(libc::PTRACE_EVENT_EXEC);
                    return Ok(());
                }
                WaitStatus::Exited(_, code) => return Err(ProcessExit(code)),
                WaitStatus::Signaled(_, _, _) => return Err(ProcessNotStarted),
                WaitStatus::Stopped(_, sign) if sign != Signal::SIGSTOP => signal = Some(sign),
                status => {
                    debug!(target: "tracer", "skip status before exec: {status:?}");
                }
            }
        }
    }

    fn apply_new_status(&mut self, status: WaitStatus, step: bool) -> Result<StopReason, Error> {
        let reason = match status {
            WaitStatus::Exited(_, code) => StopReason::Exited(code),
            WaitStatus::Signaled(_, signal, _) => StopReason::Killed(signal),
            WaitStatus::PtraceEvent(_, _, code) => StopReason::Event(code),
            WaitStatus::Stopped(pid, Signal::SIGTRAP) => {
                let info = sys::ptrace::getsiginfo(pid).map_err(Ptrace)?;
                trap_reason(info.si_code, step)
            }
            WaitStatus::Stopped(_, signal) => StopReason::Signal(signal),
            status => {
                warn!(target: "tracer", "unexpected wait status: {status:?}");
                StopReason::Event(0)
            }
        };
        self.stop = reason;
        Ok(reason)
    }
}

/// Classify a `SIGTRAP` stop.
///
/// # Arguments
///
/// * `si_code`: code from signal info
/// * `step`: true if trap received after `PTRACE_SINGLESTEP`
fn trap_reason(si_code: i32, step: bool) -> StopReason {
    match si_code {
        code::TRAP_TRACE => StopReason::Trace,
        // x86 reports a single step over `syscall` as a breakpoint trap
        code::TRAP_BRKPT if step => StopReason::Trace,
        code::TRAP_BRKPT | code::SI_KERNEL => StopReason::Breakpoint,
        _ => StopReason::Signal(Signal::SIGTRAP),
    }
}

impl Thread for Tracee {
    fn stop_reason(&self) -> StopReason {
        self.stop
    }

    fn pc(&self) -> Result<u64, Error> {
        sys::ptrace::getregs(self.pid)
            .map(|regs| regs.rip)
            .map_err(Ptrace)
    }

    fn read_instructions(&self, addr: u64, count: usize) -> Result<Vec<Instruction>, Error> {
        let code = read_memory_by_pid(self.pid, addr, count * Disassembler::MAX_INSTRUCTION_LEN)?;
        let instructions = self.disasm.disasm(&code, addr, count)?;
        if instructions.is_empty() {
            return Err(NoInstruction(addr));
        }
        Ok(instructions)
    }
}

impl Control for Tracee {
    fn resume(&mut self, step: bool, signal: Option<Signal>) -> Result<StopReason, Error> {
        debug!(
            target: "tracer",
            "resume tracee (step: {step}) with signal {signal:?}, thread: {pid}",
            pid = self.pid,
        );

        if step {
            sys::ptrace::step(self.pid, signal)
        } else {
            sys::ptrace::cont(self.pid, signal)
        }
        .map_err(Ptrace)?;

        let status = self.wait_one()?;
        self.apply_new_status(status, step)
    }
}
