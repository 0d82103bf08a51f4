use crate::debugger::error::Error;
use crate::debugger::step::{StepEvent, StepObserver, StopReason};
use crate::weak_error;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Append-only log of executed instructions, one instruction per line.
///
/// The log is flushed and closed when dropped, so no history is lost when a step
/// session ends with an error or is interrupted.
pub struct InstructionLog<W: Write> {
    writer: BufWriter<W>,
    entries: u64,
}

impl InstructionLog<File> {
    /// Create (or truncate) a log file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> InstructionLog<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            entries: 0,
        }
    }

    /// Write a log entry.
    pub fn append(&mut self, entry: &impl Display) -> Result<(), Error> {
        writeln!(self.writer, "{entry}")?;
        self.entries += 1;
        Ok(())
    }

    /// Write buffered entries into underlying writer.
    pub fn flush(&mut self) -> Result<(), Error> {
        Ok(self.writer.flush()?)
    }

    /// Return count of written entries.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Flush and close the log, unlike drop returns a flush error.
    pub fn close(mut self) -> Result<u64, Error> {
        self.flush()?;
        Ok(self.entries)
    }
}

impl<W: Write> Drop for InstructionLog<W> {
    fn drop(&mut self) {
        weak_error!(self.writer.flush(), "flush instruction log:");
    }
}

/// Step observer that single-steps a thread and logs every instruction it stops at.
pub struct InstructionLogger<W: Write> {
    log: InstructionLog<W>,
}

impl<W: Write> InstructionLogger<W> {
    pub fn new(log: InstructionLog<W>) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &InstructionLog<W> {
        &self.log
    }

    pub fn into_log(self) -> InstructionLog<W> {
        self.log
    }
}

impl<W: Write> StepObserver for InstructionLogger<W> {
    fn explains_stop(&mut self, event: &StepEvent) -> Result<bool, Error> {
        // flush at any stop, session may be torn down right after it
        self.log.flush()?;
        Ok(event.thread().stop_reason() == StopReason::Trace)
    }

    fn should_stop(&mut self, event: &StepEvent) -> Result<bool, Error> {
        let thread = event.thread();
        let pc = thread.pc()?;
        let instruction = thread
            .read_instructions(pc, 1)?
            .into_iter()
            .next()
            .ok_or(Error::NoInstruction(pc))?;
        self.log.append(&instruction)?;
        Ok(false)
    }

    fn should_step(&self) -> bool {
        true
    }
}
