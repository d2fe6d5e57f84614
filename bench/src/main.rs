use std::time::Duration;

use anyhow::Context;
use bench::{AnyResult, ButtonScript, Simulation, parse_duration};
use clap::{Parser, ValueEnum};
use timer_core::{BoardRevision, EdgeReport, SharedClock, Variant, WarningPress};
use tracing_subscriber::EnvFilter;

/// Runs the power timer controller against a simulated board and a scripted button.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[arg(long, value_enum, default_value_t = VariantArg::AcTimer)]
    variant: VariantArg,
    #[arg(long, value_enum, default_value_t = RevisionArg::A)]
    revision: RevisionArg,
    /// Simulated time to run for, e.g. `90m`.
    #[arg(long, value_parser = parse_duration, default_value = "1h")]
    duration: Duration,
    /// Time since boot at which the button goes down. Can be repeated.
    #[arg(long = "press", value_parser = parse_duration)]
    presses: Vec<Duration>,
    /// How long every press holds the button down.
    #[arg(long, value_parser = parse_duration, default_value = "200ms")]
    hold: Duration,
    /// Contact chatter after every press and release.
    #[arg(long, value_parser = parse_duration, default_value = "0ms")]
    bounce: Duration,
    /// Overrides what a press does while the warning is showing.
    #[arg(long, value_enum)]
    warning_press: Option<WarningPressArg>,
    /// Overrides which confirmed button changes count as button events.
    #[arg(long, value_enum)]
    edge_report: Option<EdgeReportArg>,
    /// Also log every output write.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VariantArg {
    AcTimer,
    Intellitimer,
    IntellitimerV2,
}

impl From<VariantArg> for Variant {
    fn from(value: VariantArg) -> Self {
        match value {
            VariantArg::AcTimer => Variant::AcTimer,
            VariantArg::Intellitimer => Variant::Intellitimer,
            VariantArg::IntellitimerV2 => Variant::IntellitimerV2,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RevisionArg {
    A,
    B,
}

impl From<RevisionArg> for BoardRevision {
    fn from(value: RevisionArg) -> Self {
        match value {
            RevisionArg::A => BoardRevision::A,
            RevisionArg::B => BoardRevision::B,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WarningPressArg {
    /// Clear the warning and keep the power on.
    Reset,
    /// Turn everything off.
    Off,
}

impl From<WarningPressArg> for WarningPress {
    fn from(value: WarningPressArg) -> Self {
        match value {
            WarningPressArg::Reset => WarningPress::ResetTimer,
            WarningPressArg::Off => WarningPress::PowerOff,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EdgeReportArg {
    /// Only presses.
    Press,
    /// Presses and releases.
    Any,
}

impl From<EdgeReportArg> for EdgeReport {
    fn from(value: EdgeReportArg) -> Self {
        match value {
            EdgeReportArg::Press => EdgeReport::PressOnly,
            EdgeReportArg::Any => EdgeReport::AnyChange,
        }
    }
}

fn main() -> AnyResult<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let variant = Variant::from(args.variant);
    let mut policy = variant.policy(args.revision.into());

    if let Some(on_press) = args.warning_press {
        policy
            .power
            .warning
            .as_mut()
            .context("variant has no warning stage")?
            .on_press = on_press.into();
    }

    if let Some(report) = args.edge_report {
        policy
            .debounce
            .as_mut()
            .context("variant has no button")?
            .report = report.into();
    }

    let script = ButtonScript::new(args.presses, args.hold, args.bounce);
    if policy.pins.button.is_none() && !script.is_empty() {
        tracing::warn!("variant has no button, ignoring presses");
    }

    let clock = SharedClock::new(&policy.timebase);
    let mut simulation = Simulation::new(&policy, &clock)
        .with_context(|| format!("invalid policy for {}", <&'static str>::from(variant)))?;

    simulation.run(&script, args.duration);

    println!("{}", simulation.report());
    Ok(())
}
