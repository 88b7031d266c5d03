use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{DEFAULT_LLM_TIMEOUT_SECS, LlmStatusArgs};
use crate::llm::{LlmStatus, OllamaClient, OllamaSettings};

pub async fn run(args: LlmStatusArgs) -> Result<()> {
    let client = OllamaClient::new(OllamaSettings {
        base_url: args.llm_url.clone(),
        model: args.llm_model,
        timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
    });

    info!(url = %args.llm_url, model = %client.model(), "llm status requested");
    let status = client.status().await;

    info!(
        available = status.available,
        installed = status.models.len(),
        configured_model = %status.configured_model,
        model_ready = status.model_ready,
        "llm status"
    );
    if !status.available {
        warn!(
            url = %args.llm_url,
            "text generator unreachable; general questions use the dataset overview"
        );
    } else if !status.model_ready {
        warn!(
            model = %status.configured_model,
            "configured model is not installed; pull it before querying"
        );
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &status)
            .context("failed to serialize llm status")?;
        writeln!(output)?;
    } else {
        render_text(&mut output, &status)?;
    }
    output.flush()?;
    Ok(())
}

fn render_text<W: Write>(output: &mut W, status: &LlmStatus) -> io::Result<()> {
    writeln!(output, "available: {}", status.available)?;
    writeln!(output, "configured_model: {}", status.configured_model)?;
    writeln!(output, "model_ready: {}", status.model_ready)?;
    writeln!(output, "models:")?;
    for model in &status.models {
        writeln!(output, "  - {model}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_report_lists_installed_models() {
        let status = LlmStatus::new(
            true,
            vec!["llama3.2:latest".to_string(), "mistral:7b".to_string()],
            "llama3.2",
        );
        let mut buffer = Vec::new();
        render_text(&mut buffer, &status).expect("render");

        assert_eq!(
            String::from_utf8(buffer).expect("utf8"),
            "available: true\nconfigured_model: llama3.2\nmodel_ready: true\nmodels:\n  - llama3.2:latest\n  - mistral:7b\n"
        );
    }

    #[tokio::test]
    async fn unreachable_server_reports_not_ready() {
        let client = OllamaClient::new(OllamaSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            model: "llama3.2".to_string(),
            timeout: Duration::from_secs(1),
        });
        let status = client.status().await;

        assert_eq!(status, LlmStatus::new(false, Vec::new(), "llama3.2"));
        assert!(!status.model_ready);
    }
}
