// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child process execution
//!
//! Children are spawned with `kill_on_drop`, so dropping the future that
//! waits on one (lost lease, Ctrl-C) kills the process.

use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChildError {
    #[error("no command given")]
    Empty,
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed waiting for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' exited with {status}")]
    Failed { program: String, status: ExitStatus },
}

/// Run `argv` to completion with extra environment variables
///
/// A non-zero exit is an error so the surrounding primitive treats it as
/// failed work.
pub async fn run(argv: &[String], env: &[(&str, String)]) -> Result<(), ChildError> {
    let (program, args) = argv.split_first().ok_or(ChildError::Empty)?;

    let mut child = tokio::process::Command::new(program)
        .args(args)
        .envs(env.iter().map(|(k, v)| (*k, v.as_str())))
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ChildError::Spawn {
            program: program.clone(),
            source,
        })?;
    tracing::debug!(program = %program, pid = child.id(), "child started");

    let status = child.wait().await.map_err(|source| ChildError::Wait {
        program: program.clone(),
        source,
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(ChildError::Failed {
            program: program.clone(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn success_and_failure() {
        assert!(run(&argv(&["true"]), &[]).await.is_ok());
        assert!(matches!(
            run(&argv(&["false"]), &[]).await,
            Err(ChildError::Failed { .. })
        ));
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let err = run(&argv(&["definitely-not-a-real-binary-xyz"]), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ChildError::Spawn { .. }));
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        assert!(matches!(run(&[], &[]).await, Err(ChildError::Empty)));
    }

    #[tokio::test]
    async fn environment_is_passed() {
        let env = [("COORD_LOCK_KEY", "order:1".to_string())];
        let result = run(&argv(&["sh", "-c", "test \"$COORD_LOCK_KEY\" = order:1"]), &env).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn dropping_the_future_kills_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let script = format!("sleep 1 && touch {}", marker.display());

        let argv = argv(&["sh", "-c", &script]);
        let timed_out = tokio::time::timeout(Duration::from_millis(200), run(&argv, &[])).await;
        assert!(timed_out.is_err());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }
}
