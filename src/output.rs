use std::io::Write;

/// Abstraction over user-facing output.
///
/// Status lines go to stderr so that the stdout of a workflow command (and
/// of `topo port` / `topo plan --json`) stays machine-readable.
pub trait UserOutput: Send + Sync {
    /// Informational status message (e.g., "Starting 4 service(s)...")
    fn status(&self, message: &str);

    /// Success message (e.g., "All services are accepting connections")
    fn success(&self, message: &str);

    /// Warning message
    fn warning(&self, message: &str);

    /// Error message
    fn error(&self, message: &str);

    /// Machine-readable result line, always on stdout.
    fn data(&self, line: &str);
}

/// Standard CLI output.
pub struct CliOutput;

impl UserOutput for CliOutput {
    fn status(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn success(&self, message: &str) {
        eprintln!("\x1b[32m{}\x1b[0m", message);
    }

    fn warning(&self, message: &str) {
        eprintln!("\x1b[33m{}\x1b[0m", message);
    }

    fn error(&self, message: &str) {
        eprintln!("\x1b[31m{}\x1b[0m", message);
    }

    fn data(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line).ok();
    }
}

/// Only data and errors. Used with `--quiet`.
pub struct QuietOutput;

impl UserOutput for QuietOutput {
    fn status(&self, _message: &str) {}
    fn success(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}

    fn error(&self, message: &str) {
        CliOutput.error(message);
    }

    fn data(&self, line: &str) {
        CliOutput.data(line);
    }
}
