mod app;
mod render;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use console::{style, Term};
use otp_flow::{AuthFlow, FlowConfig, OtpGateway, SimulatedGateway, TwilioGateway};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twilio::{TwilioOptions, TwilioService};

use crate::app::App;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GatewayKind {
    /// Fixed latency, one accepted code
    Simulated,
    /// Twilio Verify, credentials from TWILIO_* env vars
    Twilio,
}

#[derive(Debug, Parser)]
#[command(name = "otp-shell", about = "Sign in with a phone number and a one-time code")]
struct Args {
    /// Backend that sends and checks codes
    #[arg(long, value_enum, default_value_t = GatewayKind::Simulated)]
    gateway: GatewayKind,

    /// Simulated gateway latency in milliseconds
    #[arg(long)]
    latency_ms: Option<u64>,

    /// Code the simulated gateway accepts
    #[arg(long)]
    code: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,otp_flow=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let args = Args::parse();
    let mut config = FlowConfig::from_env().context("Failed to load configuration")?;
    if let Some(ms) = args.latency_ms {
        config.simulated_latency = Duration::from_millis(ms);
    }
    if let Some(code) = &args.code {
        config.simulated_code = code
            .parse()
            .context("--code must be exactly 6 digits")?;
    }

    let gateway = build_gateway(args.gateway, &config)?;
    tracing::info!(gateway = ?args.gateway, prefix = %config.country_prefix, "starting sign-in");

    let term = Term::stdout();
    let mut app = App::new(term.clone(), AuthFlow::new(&config, gateway));
    match app.run().await? {
        Some(phone) => {
            term.write_line("")?;
            term.write_line(&format!(
                "{} Signed in as {}",
                style("✓").green().bold(),
                style(phone.display_with_prefix(&config.country_prefix)).bold()
            ))?;
        }
        None => term.write_line(&style("Sign-in cancelled").dim().to_string())?,
    }

    Ok(())
}

fn build_gateway(kind: GatewayKind, config: &FlowConfig) -> Result<Arc<dyn OtpGateway>> {
    match kind {
        GatewayKind::Simulated => Ok(Arc::new(SimulatedGateway::new(
            config.simulated_latency,
            config.simulated_code.clone(),
        ))),
        GatewayKind::Twilio => {
            let twilio = config.twilio.clone().context(
                "TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_VERIFY_SERVICE_SID must be set",
            )?;
            let service = TwilioService::new(TwilioOptions {
                account_sid: twilio.account_sid,
                auth_token: twilio.auth_token,
                service_id: twilio.verify_service_sid,
            });
            Ok(Arc::new(TwilioGateway::new(
                service,
                config.country_prefix.clone(),
            )))
        }
    }
}
