//! Uninstaller process launching
//!
//! Uninstall commands are stored as free-form command lines (quoted or
//! unquoted executable paths, `%VAR%` references, `MsiExec.exe /X{GUID}`).
//! [`SystemLauncher`] turns such a line into a child process; the
//! [`ProcessLauncher`] trait lets callers substitute their own launcher.

use std::io;
use std::process::{Child, Command};

/// Starts processes from command lines
pub trait ProcessLauncher: Send + Sync {
    /// Handle to a started process
    type Handle: ProcessHandle;

    /// Start `command_line` as a new process without waiting for it
    fn spawn(&self, command_line: &str) -> io::Result<Self::Handle>;
}

/// A started process
pub trait ProcessHandle {
    /// Block until the process exits; the exit status is not reported
    fn wait_for_exit(&mut self) -> io::Result<()>;
}

impl ProcessHandle for Child {
    fn wait_for_exit(&mut self) -> io::Result<()> {
        let status = self.wait()?;
        tracing::debug!("Process {} exited with {status}", self.id());
        Ok(())
    }
}

/// Launches processes through the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    type Handle = Child;

    fn spawn(&self, command_line: &str) -> io::Result<Child> {
        build_command(command_line)?.spawn()
    }
}

#[cfg(windows)]
fn build_command(command_line: &str) -> io::Result<Command> {
    use std::os::windows::process::CommandExt;

    let expanded = expand_environment(command_line)?;
    let (program, args) = split_command_line(&expanded);
    if program.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "empty command line",
        ));
    }
    let mut command = Command::new(program);
    if !args.is_empty() {
        // Uninstallers parse their own argument strings (MsiExec /X{...}), pass them verbatim
        command.raw_arg(args);
    }
    Ok(command)
}

#[cfg(not(windows))]
fn build_command(command_line: &str) -> io::Result<Command> {
    if command_line.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "empty command line",
        ));
    }
    let mut command = Command::new("sh");
    command.arg("-c").arg(command_line);
    Ok(command)
}

/// Expand `%VAR%` references using the process environment
///
/// # Safety
///
/// Both calls receive a NUL-terminated UTF-16 source that outlives the call.
/// The first call passes no buffer to query the required length; the second
/// passes a buffer of exactly that length.
#[cfg(windows)]
#[expect(
    unsafe_code,
    reason = "Windows FFI for ExpandEnvironmentStringsW"
)]
fn expand_environment(command_line: &str) -> io::Result<String> {
    use windows::Win32::System::Environment::ExpandEnvironmentStringsW;
    use windows::core::PCWSTR;

    if !command_line.contains('%') {
        return Ok(command_line.to_string());
    }

    let source: Vec<u16> = command_line.encode_utf16().chain(Some(0)).collect();
    let required = unsafe { ExpandEnvironmentStringsW(PCWSTR(source.as_ptr()), None) };
    if required == 0 {
        return Err(io::Error::last_os_error());
    }

    let mut buffer = vec![0u16; required as usize];
    let written =
        unsafe { ExpandEnvironmentStringsW(PCWSTR(source.as_ptr()), Some(&mut buffer)) };
    if written == 0 {
        return Err(io::Error::last_os_error());
    }

    let end = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    Ok(String::from_utf16_lossy(&buffer[..end]))
}

/// Split a command line into the executable and its argument string
///
/// Handles the forms found in uninstall entries:
/// 1. Quoted: `"C:\Program Files\app.exe" /S` splits at the closing quote
/// 2. Unquoted with `.exe`: `C:\Program Files\app.exe /S` splits after `.exe`
/// 3. Otherwise: splits at the first whitespace
pub fn split_command_line(command_line: &str) -> (&str, &str) {
    let line = command_line.trim();

    if let Some(rest) = line.strip_prefix('"') {
        if let Some(end) = rest.find('"') {
            return (&rest[..end], rest[end + 1..].trim());
        }
    }

    // ASCII lowering keeps byte offsets aligned with the original string
    let exe_end = line
        .to_ascii_lowercase()
        .match_indices(".exe")
        .map(|(pos, _)| pos + ".exe".len())
        .find(|&end| line[end..].chars().next().is_none_or(char::is_whitespace));
    if let Some(end) = exe_end {
        return (&line[..end], line[end..].trim());
    }

    match line.find(char::is_whitespace) {
        Some(pos) => (&line[..pos], line[pos..].trim()),
        None => (line, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_quoted_path() {
        assert_eq!(
            split_command_line("\"C:\\Program Files\\App\\uninstall.exe\" /S"),
            ("C:\\Program Files\\App\\uninstall.exe", "/S")
        );
    }

    #[test]
    fn test_split_unquoted_path_with_spaces() {
        assert_eq!(
            split_command_line("C:\\Program Files (x86)\\App\\unins000.exe /SILENT"),
            ("C:\\Program Files (x86)\\App\\unins000.exe", "/SILENT")
        );
    }

    #[test]
    fn test_split_msiexec() {
        assert_eq!(
            split_command_line("MsiExec.exe /X{12345678-1234-1234-1234-123456789012}"),
            ("MsiExec.exe", "/X{12345678-1234-1234-1234-123456789012}")
        );
    }

    #[test]
    fn test_split_exe_inside_directory_name() {
        assert_eq!(
            split_command_line("C:\\tools.exe.d\\run.exe --remove"),
            ("C:\\tools.exe.d\\run.exe", "--remove")
        );
    }

    #[test]
    fn test_split_no_exe() {
        assert_eq!(split_command_line("rundll32 shell32.dll"), ("rundll32", "shell32.dll"));
        assert_eq!(split_command_line("  single  "), ("single", ""));
    }

    #[test]
    fn test_split_unterminated_quote_falls_through() {
        assert_eq!(
            split_command_line("\"C:\\App\\setup.exe /uninstall"),
            ("\"C:\\App\\setup.exe", "/uninstall")
        );
    }

    #[test]
    fn test_empty_command_line_is_rejected() {
        let err = SystemLauncher.spawn("   ").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    #[cfg(unix)]
    fn test_system_launcher_waits_for_exit() {
        let mut child = SystemLauncher.spawn("exit 3").unwrap();
        child.wait_for_exit().unwrap();
        assert!(child.try_wait().unwrap().is_some());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: a quoted program is returned without its quotes
            #[test]
            fn quoted_program_is_unquoted(
                program in "[a-zA-Z0-9_ \\\\:.()-]{1,40}",
                args in "[a-zA-Z0-9/ {}-]{0,20}"
            ) {
                let line = format!("\"{program}\" {args}");
                let (parsed_program, parsed_args) = split_command_line(&line);
                prop_assert_eq!(parsed_program, program.as_str());
                prop_assert_eq!(parsed_args, args.trim());
            }

            /// Property: splitting never panics on arbitrary input
            #[test]
            fn split_never_panics(s in "\\PC{0,64}") {
                let (program, args) = split_command_line(&s);
                prop_assert!(program.len() + args.len() <= s.len());
            }
        }
    }
}
