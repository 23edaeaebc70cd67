//! Host capability seams.
//!
//! All host mutation goes through these traits. The runner forwards requests
//! and never interprets them; authorization of operators belongs to the
//! invocation capability.

use crate::models::HandlerArgs;
use std::sync::Arc;
use tracing::info;

/// Pre-audited host capability that executes a named operator
pub trait OperatorInvoker: Send + Sync {
    fn invoke(&self, operator_id: &str, params: &HandlerArgs) -> anyhow::Result<()>;
}

/// Host capability that draws attention to a UI element
pub trait UiHighlighter: Send + Sync {
    fn highlight(&self, target_id: &str);
}

/// Host that only records requests in the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHost;

impl OperatorInvoker for LoggingHost {
    fn invoke(&self, operator_id: &str, params: &HandlerArgs) -> anyhow::Result<()> {
        info!(
            operator = %operator_id,
            params = %serde_json::Value::Object(params.clone()),
            "RUN_OPERATOR forwarded to logging host"
        );
        Ok(())
    }
}

impl UiHighlighter for LoggingHost {
    fn highlight(&self, target_id: &str) {
        info!(target_id = %target_id, "UI_HIGHLIGHT forwarded to logging host");
    }
}

/// The host capabilities available to a runner
#[derive(Clone)]
pub struct HostCapabilities {
    pub operators: Arc<dyn OperatorInvoker>,
    pub highlighter: Arc<dyn UiHighlighter>,
}

impl HostCapabilities {
    pub fn new(operators: Arc<dyn OperatorInvoker>, highlighter: Arc<dyn UiHighlighter>) -> Self {
        Self {
            operators,
            highlighter,
        }
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::new(Arc::new(LoggingHost), Arc::new(LoggingHost))
    }
}
