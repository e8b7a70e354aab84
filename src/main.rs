use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use lead_flow::api::HttpLeadsApi;
use lead_flow::config::FlowConfig;
use lead_flow::flow::{FlowController, FlowEvent};
use lead_flow::usage::MemoryCookieJar;
use lead_flow::validate::FieldId;
use lead_flow::view::CliView;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = FlowConfig::from_env().context("invalid LEAD_FLOW_* configuration")?;

    eprintln!("🎯 Lead Flow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: {}", config.api_base_url);
    eprintln!(
        "   Poll every {}s, usage limit {} per session\n",
        config.poll_interval.as_secs(),
        config.usage_limit
    );

    let api = Arc::new(HttpLeadsApi::new(&config).context("failed to build HTTP client")?);
    let view = Arc::new(CliView::new());
    let jar = Arc::new(MemoryCookieJar::new());
    let mut controller = FlowController::new(&config, api, view, jar);

    controller.init().await;
    if !controller.is_enabled() {
        return Ok(());
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    // Step 1 — re-prompt until a submission is accepted.
    loop {
        let email = prompt(&mut lines, "Work email").await?;
        controller.on_field_changed(FieldId::WorkEmail, email);
        controller.on_field_blurred(FieldId::WorkEmail);

        let name = prompt(&mut lines, "Company name").await?;
        controller.on_field_changed(FieldId::CompanyName, name);
        controller.on_field_blurred(FieldId::CompanyName);

        let domain = prompt(&mut lines, "Company domain").await?;
        controller.on_field_changed(FieldId::CompanyDomain, domain);
        controller.on_field_blurred(FieldId::CompanyDomain);

        match controller.submit_company().await {
            Ok(()) => break,
            Err(error) => {
                tracing::debug!(%error, "Submission attempt failed");
                eprintln!("Let's try that again.\n");
            }
        }
    }

    // The backend either asks for company context or finishes outright.
    match controller.process_next_event().await {
        Some(FlowEvent::ContextReady(_)) => {
            loop {
                edit_context(&mut controller, &mut lines).await?;
                match controller.submit_context().await {
                    Ok(()) => break,
                    Err(error) => {
                        tracing::debug!(%error, "Context rejected");
                        eprintln!("Every field needs a value.\n");
                    }
                }
            }
            let _ = controller.process_next_event().await;
        }
        Some(FlowEvent::Completed) => {}
        None => anyhow::bail!("flow ended before the job finished"),
    }

    eprintln!("\n✅ All set — your leads are on the way.");
    Ok(())
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> anyhow::Result<String> {
    eprint!("{label}: ");
    let line = lines.next_line().await?.unwrap_or_default();
    Ok(line.trim().to_string())
}

/// Offer each pre-filled context field for editing; an empty line keeps
/// the current value.
async fn edit_context(
    controller: &mut FlowController,
    lines: &mut Lines<BufReader<Stdin>>,
) -> anyhow::Result<()> {
    let prompts = [
        (FieldId::BusinessDescription, "Business description"),
        (FieldId::IcpDescription, "Ideal customer profile"),
        (FieldId::ValueProposition, "Value proposition"),
    ];
    for (field, label) in prompts {
        let current = controller.fields().get(field).to_string();
        let edited = prompt(lines, &format!("{label} [{current}]")).await?;
        if !edited.is_empty() {
            controller.on_field_changed(field, edited);
        }
        controller.on_field_blurred(field);
    }
    Ok(())
}
