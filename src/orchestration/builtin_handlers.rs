//! # Built-in Command Handlers
//!
//! Handlers for the whitelisted commands. `WAIT`, `UI_HIGHLIGHT` and
//! `RUN_OPERATOR` are advisory and dispatched directly by the runner; `SPEAK`
//! is installed into the command registry so extensions may replace it.

use super::host::HostCapabilities;
use crate::announcement::AnnouncementWorker;
use crate::constants::commands;
use crate::error::HandlerError;
use crate::models::{HandlerArgs, HandlerResult};
use crate::registry::CommandHandler;
use serde_json::Value;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

/// Non-empty string argument, if present
fn string_arg<'a>(args: &'a HandlerArgs, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// `SPEAK`: hand text to the announcement worker without waiting for playback
pub struct SpeakHandler {
    worker: Arc<AnnouncementWorker>,
}

impl SpeakHandler {
    pub fn new(worker: Arc<AnnouncementWorker>) -> Self {
        Self { worker }
    }
}

impl CommandHandler for SpeakHandler {
    fn handle(&self, args: &HandlerArgs) -> Result<HandlerResult, HandlerError> {
        // `message` is the older spelling of `text`
        let text = string_arg(args, "text")
            .or_else(|| string_arg(args, "message"))
            .unwrap_or_default();
        let voice = string_arg(args, "voice");
        Ok(self.worker.speak(text, voice))
    }
}

/// `WAIT`: block the calling thread for `seconds`
#[derive(Debug, Clone, Copy, Default)]
pub struct WaitHandler;

impl WaitHandler {
    /// Accepts a number or numeric string; absent means zero.
    /// Non-positive and NaN values are returned as-is and treated as a no-op.
    pub fn seconds(args: &HandlerArgs) -> Result<f64, HandlerError> {
        let seconds = match args.get("seconds") {
            None | Some(Value::Null) => 0.0,
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| HandlerError::invalid_argument("seconds", "not representable as f64"))?,
            Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|e| {
                HandlerError::invalid_argument("seconds", format!("'{s}' is not a number: {e}"))
            })?,
            Some(other) => {
                return Err(HandlerError::invalid_argument(
                    "seconds",
                    format!("expected a number, got {other}"),
                ))
            }
        };

        if seconds > 0.0 && !seconds.is_finite() {
            return Err(HandlerError::invalid_argument("seconds", "must be finite"));
        }
        Ok(seconds)
    }
}

impl CommandHandler for WaitHandler {
    fn handle(&self, args: &HandlerArgs) -> Result<HandlerResult, HandlerError> {
        let seconds = Self::seconds(args)?;
        if seconds > 0.0 {
            let duration = Duration::try_from_secs_f64(seconds)
                .map_err(|e| HandlerError::invalid_argument("seconds", e.to_string()))?;
            thread::sleep(duration);
            return Ok(HandlerResult::ok().with_detail("waited_seconds", seconds));
        }
        Ok(HandlerResult::ok().with_detail("waited_seconds", 0.0))
    }
}

/// `UI_HIGHLIGHT`: advisory, forwarded to the host and the log
pub struct HighlightHandler {
    host: HostCapabilities,
}

impl CommandHandler for HighlightHandler {
    fn handle(&self, args: &HandlerArgs) -> Result<HandlerResult, HandlerError> {
        let target = string_arg(args, "target");
        info!(target_id = ?target, "UI_HIGHLIGHT requested");
        match target {
            Some(target) => {
                self.host.highlighter.highlight(target);
                Ok(HandlerResult::ok().with_detail("target", target))
            }
            None => Ok(HandlerResult::ok()),
        }
    }
}

/// `RUN_OPERATOR`: forward `operator` + `params` to the host invocation capability
pub struct RunOperatorHandler {
    host: HostCapabilities,
}

impl CommandHandler for RunOperatorHandler {
    fn handle(&self, args: &HandlerArgs) -> Result<HandlerResult, HandlerError> {
        let operator = string_arg(args, "operator").ok_or_else(|| {
            HandlerError::invalid_argument("operator", "RUN_OPERATOR requires an operator string")
        })?;

        let params = match args.get("params") {
            None | Some(Value::Null) => HandlerArgs::new(),
            Some(Value::Object(params)) => params.clone(),
            Some(other) => {
                return Err(HandlerError::invalid_argument(
                    "params",
                    format!("expected an object, got {other}"),
                ))
            }
        };

        info!(operator = %operator, "RUN_OPERATOR forwarded to host");
        self.host
            .operators
            .invoke(operator, &params)
            .map_err(|e| HandlerError::HostInvocation {
                operator: operator.to_string(),
                reason: format!("{e:#}"),
            })?;

        Ok(HandlerResult::ok().with_detail("operator", operator))
    }
}

/// The advisory built-ins, resolved before the registry
pub struct BuiltinHandlers {
    wait: WaitHandler,
    highlight: HighlightHandler,
    run_operator: RunOperatorHandler,
}

impl BuiltinHandlers {
    pub fn new(host: HostCapabilities) -> Self {
        Self {
            wait: WaitHandler,
            highlight: HighlightHandler { host: host.clone() },
            run_operator: RunOperatorHandler { host },
        }
    }

    pub fn resolve(&self, command: &str) -> Option<&dyn CommandHandler> {
        match command {
            commands::WAIT => Some(&self.wait),
            commands::UI_HIGHLIGHT => Some(&self.highlight),
            commands::RUN_OPERATOR => Some(&self.run_operator),
            _ => None,
        }
    }
}
