//! Action execution command

use crate::app;
use crate::error::{CliError, CliResult};
use crate::utils::{read_params, ColoredOutput};
use actionkit_core::ActionContext;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ExecuteArgs {
    pub action: String,
    pub params: Option<String>,
    pub params_file: Option<PathBuf>,
    pub user: String,
    pub jwt: String,
    pub lang: String,
    pub pretty: bool,
}

pub struct ExecuteCommand;

impl ExecuteCommand {
    /// Prints the result JSON on stdout; a `success: false` result is an error
    pub async fn run(config: &Path, args: ExecuteArgs) -> CliResult<()> {
        let settings = app::load_settings(config)?;
        let (service, client) = app::build_service(&settings)?;
        let params = read_params(args.params.as_deref(), args.params_file.as_deref())?;

        let context = ActionContext::new(args.user, args.jwt, args.lang);
        info!(action = %args.action, request_id = %context.request_id(), "Executing action");

        let started = Instant::now();
        let result = service.execute_action(&args.action, params, context).await;
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Action returned");

        service.drain_notifications().await;
        client.shutdown();

        let rendered = if args.pretty {
            serde_json::to_string_pretty(&result)?
        } else {
            serde_json::to_string(&result)?
        };
        println!("{}", rendered);

        match result.error {
            None => {
                eprintln!("{} {}", ColoredOutput::success("✓"), ColoredOutput::dim(&args.action));
                Ok(())
            }
            Some(error) => Err(CliError::ActionFailed(format!("{}: {}", error.code, error.message))),
        }
    }
}
