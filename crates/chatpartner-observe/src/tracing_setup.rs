//! Tracing subscriber initialization with structured logging and optional
//! OpenTelemetry trace export.
//!
//! # Usage
//!
//! ```no_run
//! use chatpartner_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
//!
//! init_tracing(&TracingOptions { verbosity: 1, ..TracingOptions::default() }).unwrap();
//! // ...
//! shutdown_tracing();
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use std::sync::OnceLock;

/// Stores the OTel tracer provider so it can be shut down cleanly on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Crates whose level follows the verbosity flags; everything else stays at `warn`.
const OWN_TARGETS: &[&str] = &[
    "chatpartner",
    "chatpartner_api",
    "chatpartner_core",
    "chatpartner_infra",
];

/// How diagnostics should be emitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingOptions {
    /// Number of `-v` flags.
    pub verbosity: u8,
    /// `--quiet`: errors only.
    pub quiet: bool,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
    /// Additionally export spans to stdout via OpenTelemetry.
    pub otel_stdout: bool,
}

impl TracingOptions {
    fn level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Filter directive used when `RUST_LOG` is not set.
    pub fn default_directive(&self) -> String {
        let level = self.level();
        let mut directive = if self.quiet { "error" } else { "warn" }.to_string();
        for target in OWN_TARGETS {
            directive.push_str(&format!(",{target}={level}"));
        }
        directive
    }
}

/// Initialize the global tracing subscriber.
///
/// - Installs a `fmt` layer on stderr, text or JSON.
/// - When `otel_stdout` is set, bridges spans to OpenTelemetry with a stdout
///   exporter.
/// - `RUST_LOG` takes precedence over the verbosity flags.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set.
pub fn init_tracing(options: &TracingOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.default_directive()));

    let fmt_layer = if options.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .boxed()
    };

    if options.otel_stdout {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("chatpartner");
        let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        // Store the provider for shutdown and register it globally.
        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}

/// Flush pending traces and shut down the OpenTelemetry tracer provider.
///
/// No-op when OTel was not enabled.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}
