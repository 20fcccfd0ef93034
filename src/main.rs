//! Entry point for the LeetTools MCP server and launcher.
use std::process::ExitCode;

use anyhow::{Context, Error};
use clap::Parser;
use leettools_mcp::{
    cli::{build_launch_settings, execute_call, LaunchProfile, LaunchProfileArgs, ParsedCommand},
    launcher::{run_launch, LaunchLog, OutputMode, SystemHost},
    lib::{env::EnvSnapshot, process::exit_code_byte, telemetry},
    server::{
        config::ServerConfig,
        runtime::{self, RuntimeExit},
    },
    tools::leettools::{LeetTools, ToolRequest},
};

#[tokio::main]
async fn main() -> ExitCode {
    match bootstrap().await {
        Ok(code) => code,
        Err(exit) => exit.report(),
    }
}

async fn bootstrap() -> Result<ExitCode, RuntimeExit> {
    let env = EnvSnapshot::capture();
    let args = LaunchProfileArgs::parse();
    let command = args.into_command().map_err(RuntimeExit::from_error)?;

    match command {
        ParsedCommand::RunServer(profile) => {
            telemetry::init_tracing(&env).map_err(RuntimeExit::from_error)?;
            let config = load_config(&profile, &env)?;
            runtime::run_server(profile, config, env).await?;
            Ok(ExitCode::SUCCESS)
        }
        ParsedCommand::Launch { profile, output } => launch(profile, output, env).await,
        ParsedCommand::Call {
            profile,
            request,
            pretty,
        } => {
            telemetry::init_tracing(&env).map_err(RuntimeExit::from_error)?;
            let config = load_config(&profile, &env)?;
            call(&config, env, request, pretty).await
        }
    }
}

fn load_config(profile: &LaunchProfile, env: &EnvSnapshot) -> Result<ServerConfig, RuntimeExit> {
    ServerConfig::load(profile.config_override.clone(), env)
        .map_err(|err| RuntimeExit::from_error(Error::new(err)))
}

async fn launch(
    profile: LaunchProfile,
    output: Option<OutputMode>,
    env: EnvSnapshot,
) -> Result<ExitCode, RuntimeExit> {
    // Configuration is read before the launcher log exists; its own events go to stderr only.
    let config = {
        let stderr_only = tracing_subscriber::fmt()
            .with_env_filter(telemetry::default_filter(&env))
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::with_default(stderr_only, || load_config(&profile, &env))?
    };

    let log = LaunchLog::open(&config.launcher.log_file, config.launcher.log_failure);
    telemetry::init_launcher_tracing(&env, log.layer()).map_err(RuntimeExit::from_error)?;

    let current_exe = std::env::current_exe()
        .context("failed to resolve the path of this executable")
        .map_err(RuntimeExit::from_error)?;
    let settings = build_launch_settings(&config, env, &current_exe, output);

    match run_launch(&SystemHost, &settings, &log).await {
        Ok(code) => Ok(ExitCode::from(exit_code_byte(code))),
        Err(err) => Err(RuntimeExit::with_code(err.to_string(), err.exit_code())),
    }
}

async fn call(
    config: &ServerConfig,
    env: EnvSnapshot,
    request: ToolRequest,
    pretty: bool,
) -> Result<ExitCode, RuntimeExit> {
    let tools = LeetTools::new(&config.leet, env);
    match execute_call(&tools, request, pretty)
        .await
        .map_err(RuntimeExit::from_error)?
    {
        Ok(text) => {
            println!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => Err(RuntimeExit::structured(error, ExitCode::FAILURE)),
    }
}
