use crate::debugger::error::Error;
use crate::debugger::error::Error::{Ptrace, Syscall, Waitpid};
use crate::muted_error;
use nix::sys;
use nix::sys::personality::Persona;
use nix::sys::ptrace::Options;
use nix::sys::signal::{SIGKILL, SIGSTOP};
use nix::sys::wait::{waitpid, WaitPidFlag};
use nix::unistd::{fork, ForkResult, Pid};
use std::marker::PhantomData;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::Command;

/// Process state.
pub trait State {}

/// Process running and attached with `ptrace` system call.
pub struct Installed;

impl State for Installed {}

/// Process prepare for instantiation by a `fork` call.
pub struct Template;

impl State for Template {}

/// Process attached to tracer with ptrace.
///
/// An installed process is killed when dropped.
pub struct Child<S: State> {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    pid: Option<Pid>,
    _p: PhantomData<S>,
}

impl Child<Template> {
    /// Create new process, but dont start it.
    ///
    /// # Arguments
    ///
    /// * `program`: program name
    /// * `args`: program arguments
    /// * `cwd`: working directory of a program, current directory if `None`
    pub fn new<ARGS: IntoIterator<Item = I>, I: Into<String>>(
        program: impl Into<String>,
        args: ARGS,
        cwd: Option<impl Into<PathBuf>>,
    ) -> Child<Template> {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.map(Into::into),
            pid: None,
            _p: PhantomData,
        }
    }

    /// Instantiate process by `fork()` system call with caller as a parent process.
    /// After installation child process stopped before `exec` and seized by ptrace.
    pub fn install(&self) -> Result<Child<Installed>, Error> {
        let mut debugee_cmd = Command::new(&self.program);
        let debugee_cmd = debugee_cmd.args(&self.args);

        if let Some(cwd) = self.cwd.as_deref() {
            debugee_cmd.current_dir(cwd);
        }

        unsafe {
            debugee_cmd.pre_exec(move || {
                sys::personality::set(Persona::ADDR_NO_RANDOMIZE)?;
                Ok(())
            });
        }

        match unsafe { fork() }.map_err(|e| Syscall("fork", e))? {
            ForkResult::Parent { child: pid } => {
                waitpid(pid, Some(WaitPidFlag::WSTOPPED)).map_err(Waitpid)?;
                sys::ptrace::seize(
                    pid,
                    Options::PTRACE_O_TRACEEXEC.union(Options::PTRACE_O_TRACEEXIT),
                )
                .map_err(Ptrace)?;

                Ok(Child {
                    program: self.program.clone(),
                    args: self.args.clone(),
                    cwd: self.cwd.clone(),
                    pid: Some(pid),
                    _p: PhantomData,
                })
            }
            ForkResult::Child => {
                if let Err(e) = sys::signal::raise(SIGSTOP) {
                    eprintln!("stop debugee before exec fail with: {e}");
                    std::process::exit(126);
                }
                let err = debugee_cmd.exec();
                eprintln!("run debugee fail with: {err}");
                std::process::exit(127);
            }
        }
    }
}

impl Child<Installed> {
    /// Return running process pid.
    pub fn pid(&self) -> Pid {
        self.pid.unwrap_or_else(|| unreachable!("installed process always has a pid"))
    }
}

impl<S: State> Child<S> {
    /// Return a program name.
    pub fn program(&self) -> &str {
        self.program.as_str()
    }
}

impl<S: State> Drop for Child<S> {
    fn drop(&mut self) {
        if let Some(pid) = self.pid {
            // process may be already exited and reaped
            muted_error!(sys::signal::kill(pid, SIGKILL), "kill debugee:");
            muted_error!(waitpid(pid, None), "reap debugee:");
        }
    }
}
