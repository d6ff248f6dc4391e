//! Pseudo-terminal process handle.
//!
//! Spawns the supervised command in a PTY so prompt and line-editing
//! behavior works as it would on a real terminal. The master end is used
//! for reading the child's output and injecting input lines.

use std::ffi::CString;
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use std::path::Path;

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::poll::{PollFd, PollFlags, PollTimeout};
use nix::pty::openpty;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{self, AccessFlags, ForkResult, Pid};

use tiller_types::TillerError;

/// Outcome of one bounded read attempt on the session's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// Bytes the child produced since the last read.
    Data(Vec<u8>),
    /// Nothing arrived within the timeout; the child is quietly waiting.
    Timeout,
    /// The child has exited and its output is fully drained.
    Eof,
}

/// Outcome of one non-blocking read on the master fd.
enum ReadStatus {
    Data(usize),
    WouldBlock,
    Closed,
}

/// A child process running in a pseudo-terminal.
///
/// Owns the child and the master fd for its entire lifetime; both are
/// released on drop regardless of how the session ended.
#[derive(Debug)]
pub struct PtySession {
    master: OwnedFd,
    child_pid: Pid,
}

impl PtySession {
    /// Spawn a command in a new PTY.
    ///
    /// The program is resolved against `PATH` up front so a missing
    /// executable surfaces as a spawn error in the parent rather than a
    /// bare exit code from the child.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, TillerError> {
        resolve_program(program)?;

        let pty =
            openpty(None, None).map_err(|e| TillerError::Spawn(format!("openpty failed: {e}")))?;

        // Safety: fork is unsafe but standard Unix practice for PTY management.
        // The child immediately exec's, so async-signal-safety is maintained.
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => {
                // Child: wire the slave PTY up as stdin/stdout/stderr. Errors
                // must end in _exit(), never a return -- returning would put
                // two processes on the parent's code path.
                let err = (|| -> Result<(), String> {
                    drop(pty.master);

                    unistd::setsid().map_err(|e| format!("setsid failed: {e}"))?;

                    // Set controlling terminal via ioctl TIOCSCTTY
                    unsafe {
                        if libc::ioctl(pty.slave.as_raw_fd(), libc::TIOCSCTTY as _, 0) < 0 {
                            let err = std::io::Error::last_os_error();
                            eprintln!("tiller: TIOCSCTTY failed: {err}");
                        }
                    }

                    unistd::dup2(pty.slave.as_raw_fd(), libc::STDIN_FILENO)
                        .map_err(|e| format!("dup2 stdin: {e}"))?;
                    unistd::dup2(pty.slave.as_raw_fd(), libc::STDOUT_FILENO)
                        .map_err(|e| format!("dup2 stdout: {e}"))?;
                    unistd::dup2(pty.slave.as_raw_fd(), libc::STDERR_FILENO)
                        .map_err(|e| format!("dup2 stderr: {e}"))?;

                    drop(pty.slave);

                    let c_program = CString::new(program.to_string())
                        .map_err(|e| format!("invalid program name: {e}"))?;
                    let mut c_args: Vec<CString> = vec![c_program.clone()];
                    for arg in args {
                        c_args.push(
                            CString::new(arg.as_str()).map_err(|e| format!("invalid arg: {e}"))?,
                        );
                    }

                    unistd::execvp(&c_program, &c_args).map_err(|e| format!("exec failed: {e}"))?;

                    Ok(()) // unreachable: execvp replaces the process
                })();

                if let Err(e) = err {
                    eprintln!("tiller: child setup failed: {e}");
                }
                unsafe { libc::_exit(1) };
            }
            Ok(ForkResult::Parent { child }) => {
                // Parent: close the slave, keep the master
                drop(pty.slave);

                // Set master to non-blocking
                let flags = fcntl(pty.master.as_raw_fd(), FcntlArg::F_GETFL)
                    .map_err(|e| TillerError::Spawn(format!("fcntl F_GETFL: {e}")))?;
                let flags = OFlag::from_bits_truncate(flags);
                fcntl(
                    pty.master.as_raw_fd(),
                    FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK),
                )
                .map_err(|e| TillerError::Spawn(format!("fcntl F_SETFL: {e}")))?;

                Ok(Self {
                    master: pty.master,
                    child_pid: child,
                })
            }
            Err(e) => Err(TillerError::Spawn(format!("fork failed: {e}"))),
        }
    }

    /// Read whatever output is currently available, waiting up to
    /// `timeout_ms` for some to arrive.
    ///
    /// A [`ReadEvent::Timeout`] is a normal outcome, not an error. EOF is
    /// only reported once buffered output has been drained, so no final
    /// output is lost when the child exits.
    pub fn read_available(&self, timeout_ms: u64) -> Result<ReadEvent, TillerError> {
        let mut buf = [0u8; 8192];

        if !self.poll_readable(timeout_ms)? {
            if self.is_alive() {
                return Ok(ReadEvent::Timeout);
            }
            // Child exited without waking poll; pick up any straggling
            // output before reporting EOF.
            return match self.read_master(&mut buf)? {
                ReadStatus::Data(n) => Ok(ReadEvent::Data(buf[..n].to_vec())),
                _ => Ok(ReadEvent::Eof),
            };
        }

        match self.read_master(&mut buf)? {
            ReadStatus::Data(n) => Ok(ReadEvent::Data(buf[..n].to_vec())),
            ReadStatus::Closed => Ok(ReadEvent::Eof),
            // poll claimed readable but the read would block; treat as a
            // timeout and let the next iteration retry.
            ReadStatus::WouldBlock => Ok(ReadEvent::Timeout),
        }
    }

    /// Send a line of text to the child's stdin (appends `\n`).
    ///
    /// Fails with a write error if the child has already exited.
    pub fn write_line(&self, text: &str) -> Result<(), TillerError> {
        if !self.is_alive() {
            return Err(TillerError::Write("child process has exited".into()));
        }
        let mut data = Vec::with_capacity(text.len() + 1);
        data.extend_from_slice(text.as_bytes());
        data.push(b'\n');
        self.write_all(&data)
    }

    /// Check if the child process is still alive.
    ///
    /// Uses `kill(pid, 0)` instead of `waitpid(WNOHANG)` to avoid reaping
    /// the child, which would discard the exit status before `wait()`.
    pub fn is_alive(&self) -> bool {
        signal::kill(self.child_pid, None).is_ok()
    }

    /// Wait for the child to exit and return its exit code.
    ///
    /// Returns negative values for signal termination (-signum).
    pub fn wait(&self) -> Result<i32, TillerError> {
        loop {
            match waitpid(self.child_pid, None) {
                Ok(WaitStatus::Exited(_, code)) => return Ok(code),
                Ok(WaitStatus::Signaled(_, sig, _)) => return Ok(-(sig as i32)),
                Ok(_) => continue, // Stopped, continued, etc. -- keep waiting
                Err(Errno::ECHILD) => return Ok(0), // Already reaped
                Err(e) => return Err(TillerError::Pty(format!("waitpid: {e}"))),
            }
        }
    }

    /// Best-effort SIGTERM to the child. Idempotent: calling this on a
    /// child that is already gone is a no-op.
    pub fn terminate(&self) -> Result<(), TillerError> {
        match signal::kill(self.child_pid, Signal::SIGTERM) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(TillerError::Pty(format!("kill SIGTERM: {e}"))),
        }
    }

    /// The child's process ID.
    pub fn pid(&self) -> u32 {
        u32::try_from(self.child_pid.as_raw()).unwrap_or(0)
    }

    /// Poll the master fd for readability with a timeout in milliseconds.
    fn poll_readable(&self, timeout_ms: u64) -> Result<bool, TillerError> {
        let borrowed = self.master.as_fd();
        let mut poll_fd = [PollFd::new(borrowed, PollFlags::POLLIN)];
        let timeout = u32::try_from(timeout_ms)
            .ok()
            .and_then(|ms| PollTimeout::try_from(ms).ok())
            .unwrap_or(PollTimeout::MAX);

        match nix::poll::poll(&mut poll_fd, timeout) {
            Ok(0) => Ok(false),
            Ok(_) => {
                let revents = poll_fd[0].revents().unwrap_or(PollFlags::empty());
                // POLLIN means data available; POLLHUP means child closed
                Ok(revents.contains(PollFlags::POLLIN)
                    || revents.contains(PollFlags::POLLHUP))
            }
            Err(Errno::EINTR) => Ok(false), // Interrupted, treat as timeout
            Err(e) => Err(TillerError::Pty(format!("poll: {e}"))),
        }
    }

    /// One non-blocking read from the master.
    fn read_master(&self, buf: &mut [u8]) -> Result<ReadStatus, TillerError> {
        match unistd::read(self.master.as_raw_fd(), buf) {
            Ok(0) => Ok(ReadStatus::Closed),
            Ok(n) => Ok(ReadStatus::Data(n)),
            Err(Errno::EAGAIN) => Ok(ReadStatus::WouldBlock),
            // EIO on the master means the child closed the slave (exited)
            Err(Errno::EIO) => Ok(ReadStatus::Closed),
            Err(e) => Err(TillerError::Pty(format!("pty read: {e}"))),
        }
    }

    /// Write all bytes to the master, injecting into the child's stdin.
    ///
    /// Retries on EAGAIN up to ~5 seconds. Without a limit, a child that
    /// stops reading stdin could pin the controller thread forever.
    fn write_all(&self, data: &[u8]) -> Result<(), TillerError> {
        let mut written = 0;
        let mut retries = 0u32;
        while written < data.len() {
            match unistd::write(&self.master, &data[written..]) {
                Ok(n) => {
                    written += n;
                    retries = 0;
                }
                Err(Errno::EAGAIN) => {
                    retries += 1;
                    if retries > 5000 {
                        return Err(TillerError::Write(
                            "pty buffer full after 5s of retries".into(),
                        ));
                    }
                    std::thread::sleep(std::time::Duration::from_millis(1));
                }
                Err(e) => return Err(TillerError::Write(format!("pty write: {e}"))),
            }
        }
        Ok(())
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        // Terminate the child if still alive, then reap to avoid zombies.
        // Errors are ignored -- this is destructor-time cleanup.
        if matches!(
            waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG)),
            Ok(WaitStatus::StillAlive)
        ) {
            let _ = signal::kill(self.child_pid, Signal::SIGTERM);
            std::thread::sleep(std::time::Duration::from_millis(100));
            // Reap if it exited; if not, init adopts it.
            let _ = waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG));
        }
        // OwnedFd closes the master fd automatically when dropped.
    }
}

/// Check that `program` names an executable, searching `PATH` when the
/// name has no directory component.
fn resolve_program(program: &str) -> Result<(), TillerError> {
    let is_executable = |p: &Path| unistd::access(p, AccessFlags::X_OK).is_ok();

    if program.contains('/') {
        if is_executable(Path::new(program)) {
            return Ok(());
        }
        return Err(TillerError::Spawn(format!(
            "{program}: no such executable"
        )));
    }

    if let Some(path) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&path) {
            if is_executable(&dir.join(program)) {
                return Ok(());
            }
        }
    }
    Err(TillerError::Spawn(format!("{program}: command not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(session: &PtySession) -> Vec<u8> {
        let mut output = Vec::new();
        loop {
            match session.read_available(200).expect("read failed") {
                ReadEvent::Data(chunk) => output.extend_from_slice(&chunk),
                ReadEvent::Timeout => continue,
                ReadEvent::Eof => break,
            }
        }
        output
    }

    #[test]
    fn spawn_echo_and_read_until_eof() {
        let session =
            PtySession::spawn("echo", &["hello tiller".to_string()]).expect("spawn failed");

        let output = drain(&session);
        let text = String::from_utf8_lossy(&output);
        assert!(
            text.contains("hello tiller"),
            "expected 'hello tiller' in output: {text:?}"
        );

        let code = session.wait().expect("wait failed");
        assert_eq!(code, 0);
    }

    #[test]
    fn write_line_roundtrip_through_cat() {
        let session = PtySession::spawn("cat", &[]).expect("spawn failed");

        std::thread::sleep(std::time::Duration::from_millis(50));
        session.write_line("test input").expect("write failed");
        std::thread::sleep(std::time::Duration::from_millis(100));

        let mut output = Vec::new();
        loop {
            match session.read_available(100).expect("read failed") {
                ReadEvent::Data(chunk) => output.extend_from_slice(&chunk),
                _ => break,
            }
        }

        let text = String::from_utf8_lossy(&output);
        assert!(
            text.contains("test input"),
            "expected 'test input' in output: {text:?}"
        );

        session.terminate().expect("terminate failed");
        session.wait().ok();
    }

    #[test]
    fn unknown_program_is_a_spawn_error() {
        let err = PtySession::spawn("definitely-not-a-real-program-xyz", &[]).unwrap_err();
        assert!(matches!(err, TillerError::Spawn(_)));
    }

    #[test]
    fn read_times_out_on_silent_child() {
        let session = PtySession::spawn("sleep", &["2".to_string()]).expect("spawn failed");

        let event = session.read_available(100).expect("read failed");
        assert_eq!(event, ReadEvent::Timeout);

        session.terminate().expect("terminate failed");
        session.wait().ok();
    }

    #[test]
    fn terminate_is_idempotent() {
        let session = PtySession::spawn("sleep", &["30".to_string()]).expect("spawn failed");

        session.terminate().expect("first terminate failed");
        session.terminate().expect("second terminate failed");

        let code = session.wait().expect("wait failed");
        assert_eq!(code, -(Signal::SIGTERM as i32));

        // Child is gone; terminate must still be a no-op, not an error.
        session.terminate().expect("terminate after exit failed");
        assert!(!session.is_alive());
    }

    #[test]
    fn write_to_exited_child_fails() {
        let session = PtySession::spawn("true", &[]).expect("spawn failed");
        session.wait().expect("wait failed");

        let err = session.write_line("anyone there?").unwrap_err();
        assert!(matches!(err, TillerError::Write(_)));
    }
}
