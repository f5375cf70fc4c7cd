//! Explanation service adapters

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;
use triage_lib::{ExplainError, Explainer, ExplainerMode, ExplainerSettings};

/// Build the explainer selected by configuration
pub fn from_settings(settings: &ExplainerSettings) -> Option<Arc<dyn Explainer>> {
    match settings.mode {
        ExplainerMode::Command => Some(Arc::new(CommandExplainer::new(
            settings.command.clone(),
            settings.args.clone(),
        ))),
        ExplainerMode::Canned => Some(Arc::new(CannedExplainer)),
        ExplainerMode::Disabled => None,
    }
}

/// Runs an assistant CLI with the prompt on stdin and returns its stdout
pub struct CommandExplainer {
    program: String,
    args: Vec<String>,
}

impl CommandExplainer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl Explainer for CommandExplainer {
    async fn explain(&self, prompt: &str) -> Result<String, ExplainError> {
        debug!(program = %self.program, prompt_len = prompt.len(), "Calling assistant");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExplainError::Unavailable(format!("{}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            // The assistant may exit before reading everything; its status decides
            if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(ExplainError::Failed(format!("failed to send prompt: {}", e)));
                }
                debug!(program = %self.program, "Assistant closed stdin early");
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExplainError::Failed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExplainError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(ExplainError::Empty);
        }
        Ok(text)
    }
}

/// Offline explainer with fixed responses for common failure signatures
pub struct CannedExplainer;

const CRASH_LOOP_RESPONSE: &str = "## Issue Analysis: CrashLoopBackOff

The container starts and exits repeatedly, and the kubelet is backing off restarts.

Likely causes:
1. Application error on startup
2. Missing configuration or environment variables
3. Memory limit too low (look for OOMKilled / exit code 137)

Next steps:
- kubectl logs <pod> -c <container> --previous
- kubectl describe pod <pod>";

const IMAGE_PULL_RESPONSE: &str = "## Issue Analysis: Image pull failure

The node cannot pull the container image.

Likely causes:
1. Wrong image name or tag
2. Private registry without imagePullSecrets
3. Registry unreachable from the node

Next steps:
- kubectl describe pod <pod>
- Verify the image reference and pull secrets";

const NO_ENDPOINTS_RESPONSE: &str = "## Issue Analysis: Service without endpoints

No ready pod matches the service selector.

Next steps:
- Compare the service selector with the pod labels
- kubectl get pods -l <selector>
- Check readiness probes on the backing pods";

const GENERIC_RESPONSE: &str = "## Issue Analysis

Inspect the resource with kubectl describe and review recent events:
- kubectl describe <kind> <name>
- kubectl get events --sort-by=.lastTimestamp";

#[async_trait]
impl Explainer for CannedExplainer {
    async fn explain(&self, prompt: &str) -> Result<String, ExplainError> {
        let response = if prompt.contains("CrashLoopBackOff") {
            CRASH_LOOP_RESPONSE
        } else if prompt.contains("ImagePullBackOff") || prompt.contains("ErrImagePull") {
            IMAGE_PULL_RESPONSE
        } else if prompt.contains("NoEndpointsAvailable") {
            NO_ENDPOINTS_RESPONSE
        } else {
            GENERIC_RESPONSE
        };
        Ok(response.to_string())
    }
}
