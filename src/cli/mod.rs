//! CLI entry point for Missions.

pub mod auth;
pub mod commands;

use clap::{ArgAction, Parser, Subcommand};

/// Missions CLI (Command Line Interface)
#[derive(Parser, Debug)]
#[command(
    name = "missions",
    version = concat!("version ", env!("CARGO_PKG_VERSION")),
    about = "Missions CLI (Command Line Interface)"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Autentica la CLI con tu cuenta en Missions
    #[command(
        long_about = "Este comando inicia un proceso de autenticación basado en OAuth2 para conectar tu cuenta de Missions con la CLI"
    )]
    Login,
    /// Valida una etapa de una misión contra el servicio remoto
    Validate(MissionArgs),
    /// Envía el resultado de la validación de una etapa de una misión
    Submit(MissionArgs),
}

/// Arguments shared by `validate` and `submit`.
#[derive(Parser, Debug)]
pub struct MissionArgs {
    /// Mission stage identifier
    pub id: String,
}
