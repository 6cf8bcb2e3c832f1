//! Local execution of mission commands.

use std::io::{BufRead, Write};
use std::process::ExitStatus;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::MissionsConfig;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("👮 Comando peligroso: '{command}': este comando no está permitido en Missions")]
    Forbidden { command: String, pattern: String },
    #[error("🔥 No se ha podido lanzar el comando ['{command}']: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("🔥 La ejecución del comando ['{command}'] ha sido incorrecta: {status}")]
    Failed {
        command: String,
        status: ExitStatus,
        output: String,
    },
}

/// Runs mission commands through the platform shell after screening them.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    dangerous_patterns: Vec<String>,
}

impl CommandExecutor {
    pub fn new(config: &MissionsConfig) -> Self {
        Self::with_patterns(config.dangerous_patterns().to_vec())
    }

    pub fn with_patterns(dangerous_patterns: Vec<String>) -> Self {
        Self { dangerous_patterns }
    }

    /// Reject a command that contains any configured dangerous pattern.
    pub fn validate_command(&self, command: &str) -> Result<(), ExecutorError> {
        match self
            .dangerous_patterns
            .iter()
            .find(|pattern| command.contains(pattern.as_str()))
        {
            Some(pattern) => {
                warn!(command, pattern = %pattern, "dangerous command rejected");
                Err(ExecutorError::Forbidden {
                    command: command.to_string(),
                    pattern: pattern.clone(),
                })
            }
            None => Ok(()),
        }
    }

    /// Run commands in order and collect each one's stdout followed by its
    /// stderr. Stops at the first command that is rejected or fails.
    pub async fn execute_commands(&self, commands: &[String]) -> Result<Vec<String>, ExecutorError> {
        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            self.validate_command(command)?;
            results.push(run_shell(command).await?);
        }
        Ok(results)
    }

    /// List the commands and ask for confirmation on `output`.
    ///
    /// `sí`, `si`, `s` or an empty line confirm; `no` or `n` decline; other
    /// answers re-ask. End of input declines.
    pub fn confirm_execution<R: BufRead, W: Write>(
        &self,
        commands: &[String],
        input: &mut R,
        output: &mut W,
    ) -> std::io::Result<bool> {
        writeln!(output, "\n👀 Se van a ejecutar los siguientes comandos:")?;
        writeln!(output, "─────────────────────────────────────────")?;
        for command in commands {
            writeln!(output, "  ▶️  {command}")?;
        }
        writeln!(output)?;

        let mut line = String::new();
        loop {
            write!(output, "¿Quieres continuar? (si/no): ")?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                debug!("confirmation input closed");
                return Ok(false);
            }
            match line.trim().to_lowercase().as_str() {
                "sí" | "si" | "s" | "" => return Ok(true),
                "no" | "n" => return Ok(false),
                _ => writeln!(
                    output,
                    "⚠️ Por favor, contesta 'sí' o 'no'. También puedes pulsar 'Enter' para confirmar."
                )?,
            }
        }
    }
}

fn shell_command(command: &str) -> tokio::process::Command {
    let mut cmd = if cfg!(windows) {
        let mut cmd = tokio::process::Command::new("cmd");
        cmd.arg("/C");
        cmd
    } else {
        let mut cmd = tokio::process::Command::new("bash");
        cmd.arg("-c");
        cmd
    };
    cmd.arg(command);
    cmd
}

async fn run_shell(command: &str) -> Result<String, ExecutorError> {
    debug!(command, "running command");
    let output = shell_command(command)
        .output()
        .await
        .map_err(|source| ExecutorError::Spawn {
            command: command.to_string(),
            source,
        })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        return Err(ExecutorError::Failed {
            command: command.to_string(),
            status: output.status,
            output: combined,
        });
    }
    Ok(combined)
}
