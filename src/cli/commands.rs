//! `missions validate` and `missions submit`.

use std::io::{BufRead, Write};

use tracing::info;

use crate::error::{MissionsError, Result};
use crate::executor::CommandExecutor;
use crate::remote::{RemoteAction, RemoteService, ValidationReport};

/// Fetch, confirm, run and grade the commands of one mission stage.
#[derive(Debug, Clone)]
pub struct MissionRunner {
    remote: RemoteService,
    executor: CommandExecutor,
}

impl MissionRunner {
    pub fn new(remote: RemoteService, executor: CommandExecutor) -> Self {
        Self { remote, executor }
    }

    /// Returns `None` when the user declined to run the commands.
    async fn run_local<R: BufRead, W: Write>(
        &self,
        id: &str,
        input: &mut R,
        out: &mut W,
    ) -> Result<Option<Vec<String>>> {
        let commands = self
            .remote
            .fetch_commands(id)
            .await
            .map_err(MissionsError::Fetch)?;
        if commands.is_empty() {
            return Err(MissionsError::MissionNotFound(id.to_string()));
        }

        if !self.executor.confirm_execution(&commands, input, out)? {
            return Ok(None);
        }
        let results = self.executor.execute_commands(&commands).await?;
        info!(id, count = results.len(), "commands executed");
        Ok(Some(results))
    }

    pub async fn validate<R: BufRead, W: Write>(
        &self,
        id: &str,
        input: &mut R,
        out: &mut W,
    ) -> Result<()> {
        let Some(results) = self.run_local(id, input, out).await? else {
            writeln!(out, "⚠️ Ejecución de los comandos cancelada.")?;
            return Ok(());
        };

        writeln!(out, "\n📋 RESULTADOS DE LA VALIDACIÓN")?;
        writeln!(out, "══════════════════════════════")?;
        writeln!(out, "\n💻 Resultado de la ejecución local:")?;
        writeln!(out, "─────────────────────────────")?;
        for result in &results {
            writeln!(out, "{}", result.trim_end())?;
        }

        let report = self
            .remote
            .send_command_result(RemoteAction::Validate, id, results)
            .await
            .map_err(MissionsError::Send)?;
        render_validation_report(out, &report)?;
        Ok(())
    }

    pub async fn submit<R: BufRead, W: Write>(
        &self,
        id: &str,
        input: &mut R,
        out: &mut W,
    ) -> Result<()> {
        let Some(results) = self.run_local(id, input, out).await? else {
            writeln!(out, "Ejecución del comando cancelada.")?;
            return Ok(());
        };

        let report = self
            .remote
            .send_command_result(RemoteAction::Submit, id, results)
            .await
            .map_err(MissionsError::Send)?;
        render_submit_summary(out, &report)?;
        Ok(())
    }
}

/// Per-command detail plus the final verdict.
pub fn render_validation_report<W: Write>(
    out: &mut W,
    report: &ValidationReport,
) -> std::io::Result<()> {
    writeln!(out, "\n📊 Detalle de comandos:")?;
    writeln!(out, "─────────────────────")?;
    for verdict in &report.commands {
        let icon = if verdict.is_correct { "✅" } else { "❌" };
        writeln!(out, "  {icon}  {}", verdict.command)?;
    }

    writeln!(out, "\n🏁 Resultado final:")?;
    writeln!(out, "────────────────")?;
    let (icon, text) = if report.is_valid {
        ("🎉", "VALIDACIÓN SUPERADA")
    } else {
        ("❌", "VALIDACIÓN NO SUPERADA")
    };
    writeln!(out, "  {icon} {text}")?;
    writeln!(
        out,
        "  ➡️ Porcentaje de acierto: {:.0}% (requerido: {:.0}%)\n",
        report.percentage_correct, report.required_correct_percentage
    )
}

pub fn render_submit_summary<W: Write>(
    out: &mut W,
    report: &ValidationReport,
) -> std::io::Result<()> {
    writeln!(out, "\nResumen de Comandos:")?;
    writeln!(out, "- Comandos:")?;
    for verdict in &report.commands {
        writeln!(
            out,
            "  - Comando: {}, Correcto: {}",
            verdict.command, verdict.is_correct
        )?;
    }
    writeln!(out, "- Validación General: {}", report.is_valid)?;
    writeln!(out, "- Porcentaje Correcto: {:.0}%", report.percentage_correct)?;
    writeln!(
        out,
        "- Porcentaje Correcto Requerido: {:.0}%\n",
        report.required_correct_percentage
    )
}
