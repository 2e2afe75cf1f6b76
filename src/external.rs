//! Invocation of external programs (`ssh-keygen`, `tar`).
//!
//! Programs inherit the terminal so they can prompt the operator directly.
//! Failures are returned, never retried.

use crate::error::{Result, SkmError};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Run `program` with `args`, optionally inside `work_dir`.
pub fn run<S: AsRef<str>>(work_dir: Option<&Path>, program: &str, args: &[S]) -> Result<()> {
    let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
    let mut cmd = Command::new(program);
    cmd.args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    if let Some(dir) = work_dir {
        cmd.current_dir(dir);
    }

    debug!(
        program,
        args = ?args,
        work_dir = ?work_dir,
        "running external command"
    );

    let status = cmd.status().map_err(|e| SkmError::ExternalCommandError {
        program: program.to_string(),
        reason: e.to_string(),
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(SkmError::ExternalCommandError {
            program: program.to_string(),
            reason: status.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_success_in_work_dir() {
        let temp_dir = TempDir::new().unwrap();
        run(Some(temp_dir.path()), "touch", &["created"]).unwrap();

        assert!(temp_dir.path().join("created").exists());
    }

    #[test]
    fn test_run_nonzero_exit() {
        let result = run::<&str>(None, "false", &[]);
        match result {
            Err(SkmError::ExternalCommandError { program, .. }) => assert_eq!(program, "false"),
            other => panic!("Expected ExternalCommandError, got {:?}", other),
        }
    }

    #[test]
    fn test_run_missing_program() {
        let result = run::<&str>(None, "skm-definitely-not-a-program", &[]);
        assert!(matches!(result, Err(SkmError::ExternalCommandError { .. })));
    }
}
