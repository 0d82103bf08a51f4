use crate::debugger::debugee::disasm::Instruction;
use crate::debugger::error::Error;
use crate::st_debug;
use nix::sys::signal::Signal;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// List of signals that dont interrupt a step session and send
/// to debugee directly on fire.
static QUIET_SIGNALS: [Signal; 6] = [
    Signal::SIGALRM,
    Signal::SIGURG,
    Signal::SIGCHLD,
    Signal::SIGIO,
    Signal::SIGVTALRM,
    Signal::SIGPROF,
];

/// Reason why a traced thread is paused (or gone).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Thread executes exactly one instruction and stopped with a trace trap.
    Trace,
    /// Thread executes a software breakpoint instruction.
    Breakpoint,
    /// Thread stopped with OS signal.
    Signal(Signal),
    /// Thread stopped at ptrace event (`PTRACE_EVENT_*` code).
    Event(i32),
    /// Whole debugee process exited with code.
    Exited(i32),
    /// Debugee process killed by a signal.
    Killed(Signal),
}

impl StopReason {
    /// Return true if there is nothing to step anymore.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StopReason::Exited(_) | StopReason::Killed(_))
    }

    /// Return true if a step session may resume the thread without reporting this stop.
    pub fn is_transient(&self) -> bool {
        match self {
            StopReason::Event(_) => true,
            StopReason::Signal(signal) => QUIET_SIGNALS.contains(signal),
            _ => false,
        }
    }
}

impl Display for StopReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Trace => f.write_str("trace"),
            StopReason::Breakpoint => f.write_str("breakpoint"),
            StopReason::Signal(signal) => write!(f, "signal {}", signal.as_str()),
            StopReason::Event(code) => write!(f, "ptrace event {code}"),
            StopReason::Exited(code) => write!(f, "exit with code {code}"),
            StopReason::Killed(signal) => write!(f, "killed by {}", signal.as_str()),
        }
    }
}

/// Stopped thread as seen by a step observer.
pub trait Thread {
    /// Return the reason of the most recent stop.
    fn stop_reason(&self) -> StopReason;

    /// Return current program counter value.
    fn pc(&self) -> Result<u64, Error>;

    /// Read and disassemble `count` instructions starting from `addr`.
    fn read_instructions(&self, addr: u64, count: usize) -> Result<Vec<Instruction>, Error>;
}

/// Thread that a step session can drive.
pub trait Control: Thread {
    /// Resume thread execution and wait for the next stop.
    ///
    /// # Arguments
    ///
    /// * `step`: execute single instruction if true, run freely otherwise
    /// * `signal`: signal injected at resume
    fn resume(&mut self, step: bool, signal: Option<Signal>) -> Result<StopReason, Error>;
}

/// Stop notification passed into [`StepObserver`] callbacks.
pub struct StepEvent<'a> {
    thread: &'a dyn Thread,
    number: u64,
}

impl<'a> StepEvent<'a> {
    pub fn new(thread: &'a dyn Thread, number: u64) -> Self {
        Self { thread, number }
    }

    /// Stopped thread.
    pub fn thread(&self) -> &'a dyn Thread {
        self.thread
    }

    /// Count of steps already explained in current session.
    pub fn number(&self) -> u64 {
        self.number
    }
}

/// Extension point of a step session, decides what happens at every stop.
pub trait StepObserver {
    /// Return true if the last stop was caused by this observer stepping.
    /// Unexplained stops are reported to session owner.
    fn explains_stop(&mut self, event: &StepEvent) -> Result<bool, Error>;

    /// Called for every explained stop. Return true to finish the session.
    fn should_stop(&mut self, event: &StepEvent) -> Result<bool, Error>;

    /// Return true for instruction single-stepping, false for free running.
    fn should_step(&self) -> bool;
}

/// How a step session ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// Debugee is gone (exit or kill).
    Finished(StopReason),
    /// Observer asks for a stop.
    Stopped,
    /// Stop not explained by the observer.
    Unexplained(StopReason),
    /// Session canceled from outside.
    Interrupted,
    /// Step limit reached.
    StepLimit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionReport {
    pub end: SessionEnd,
    /// Number of explained stops.
    pub steps: u64,
}

/// Stepping loop that drives a [`Control`] on behalf of a [`StepObserver`].
#[derive(Default)]
pub struct StepSession {
    cancel: Arc<AtomicBool>,
    max_steps: Option<u64>,
}

impl StepSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish session after `limit` explained steps.
    pub fn with_step_limit(self, limit: Option<u64>) -> Self {
        Self {
            max_steps: limit,
            ..self
        }
    }

    /// Return a flag, session will be interrupted before next resume when it is set.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Run stepping loop until debugee exits, observer asks for a stop or an unexplained
    /// stop happens.
    ///
    /// Transient stops (ptrace events and quiet signals) never finish the session, quiet signals
    /// are injected into thread at next resume.
    pub fn run<C, O>(&self, ctl: &mut C, observer: &mut O) -> Result<SessionReport, Error>
    where
        C: Control,
        O: StepObserver,
    {
        let mut steps = 0;
        let mut pending_signal = None;

        let end = loop {
            if self.cancel.load(Ordering::SeqCst) {
                break SessionEnd::Interrupted;
            }
            if self.max_steps.is_some_and(|limit| steps >= limit) {
                break SessionEnd::StepLimit;
            }

            let reason = ctl.resume(observer.should_step(), pending_signal.take())?;
            st_debug!(target: "session", "thread stopped, reason: {reason}, steps: {steps}");
            if reason.is_terminal() {
                break SessionEnd::Finished(reason);
            }

            let event = StepEvent::new(&*ctl, steps);
            if observer.explains_stop(&event)? {
                steps += 1;
                if observer.should_stop(&event)? {
                    break SessionEnd::Stopped;
                }
                continue;
            }

            if reason.is_transient() {
                if let StopReason::Signal(signal) = reason {
                    pending_signal = Some(signal);
                }
                continue;
            }

            // terminal interrupt reaches the debugee too
            if self.cancel.load(Ordering::SeqCst) {
                break SessionEnd::Interrupted;
            }
            break SessionEnd::Unexplained(reason);
        };

        st_debug!(target: "session", "step session end: {end:?}, steps: {steps}");
        Ok(SessionReport { end, steps })
    }
}
