mod code;
pub mod debugee;
mod error;
pub mod logger;
pub mod process;
pub mod step;

pub use debugee::disasm::{Disassembler, Instruction, Syntax};
pub use error::Error;
pub use logger::{InstructionLog, InstructionLogger};
pub use step::{SessionEnd, SessionReport, StepSession, StopReason};

use crate::debugger::debugee::tracee::Tracee;
use crate::debugger::process::{Child, Template};
use crate::st_info;
use std::path::Path;

/// Run a program under ptrace and log every instruction executed by its main thread.
///
/// Log file is created right before the first step and closed when the session ends,
/// the debugee is killed if still alive at that moment.
///
/// # Arguments
///
/// * `process`: program to run
/// * `log_path`: path of instruction log, existing file is truncated
/// * `syntax`: assembly syntax of log entries
/// * `session`: step session configuration
pub fn log_instructions(
    process: Child<Template>,
    log_path: &Path,
    syntax: Syntax,
    session: &StepSession,
) -> Result<SessionReport, Error> {
    let disasm = Disassembler::new(syntax)?;
    let child = process.install()?;
    let mut tracee = Tracee::new(child.pid(), disasm);
    tracee.start()?;
    st_info!(target: "session", "program {} started, pid: {}", child.program(), child.pid());

    let mut logger = InstructionLogger::new(InstructionLog::create(log_path)?);
    let report = session.run(&mut tracee, &mut logger)?;
    let entries = logger.into_log().close()?;
    st_info!(
        target: "session",
        "{entries} instructions written into {}, session end: {:?}",
        log_path.display(),
        report.end
    );

    Ok(report)
}
