//! `crashlog` - CLI for crashlogger
//!
//! This binary drives the crash recorder against recorded sensor traces,
//! classifies single samples, and manages configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use crashlogger::cli::{Cli, ClassifyCommand, Command, ConfigCommand, OutputFormat};
use crashlogger::peripherals::{
    DisplayLines, Notifier, StatusDisplay, TracingBuzzer, TracingDisplay, TracingNotifier,
};
use crashlogger::{init_logging, AccelSample, Config, Peripherals, Recorder, RetrievalServer, Trace};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match cli.command {
        Command::Config(config_cmd) => handle_config(cli.config, config_cmd),
        Command::Classify(classify_cmd) => {
            let config = Config::load_from(cli.config).context("failed to load configuration")?;
            handle_classify(&config, &classify_cmd);
            Ok(())
        }
        Command::Run(run_cmd) => {
            let config = Config::load_from(cli.config).context("failed to load configuration")?;
            let trace = Trace::load(&run_cmd.trace)?;
            handle_run(&config, trace).await
        }
        Command::Replay(replay_cmd) => {
            let config = Config::load_from(cli.config).context("failed to load configuration")?;
            let trace = Trace::load(&replay_cmd.trace)?;
            handle_replay(&config, trace, replay_cmd.format).await
        }
    }
}

fn peripherals(config: &Config, trace: Trace, stall: bool) -> Peripherals {
    let (accelerometer, positioning) = trace.into_sources();
    let notifier: Option<Box<dyn Notifier>> = if config.alert.notifications_enabled {
        Some(Box::new(TracingNotifier))
    } else {
        None
    };
    Peripherals {
        accelerometer: Box::new(accelerometer),
        positioning: Box::new(positioning),
        buzzer: Box::new(TracingBuzzer::new(config.alert.buzzer_frequency_hz, stall)),
        notifier,
        display: Box::new(TracingDisplay::default()),
    }
}

async fn handle_run(config: &Config, trace: Trace) -> anyhow::Result<()> {
    let mut recorder = Recorder::from_config(config)?;
    let ticks = trace.len();
    let mut io = peripherals(config, trace, true);
    io.display.show(&DisplayLines::boot());

    // The recorder keeps working without the listener.
    let server = if config.server.enabled {
        match RetrievalServer::bind(&config.server.bind, config.request_wait()).await {
            Ok(server) => {
                if let Ok(addr) = server.local_addr() {
                    info!(%addr, "serving crash log");
                    io.display.show(&DisplayLines::address(&addr.to_string()));
                }
                Some(server)
            }
            Err(err) => {
                warn!(%err, "retrieval disabled");
                None
            }
        }
    } else {
        None
    };

    info!(ticks, "replaying trace in real time, Ctrl-C to stop");
    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    recorder.run(&mut io, server.as_ref(), shutdown).await;

    print!("{}", recorder.report().to_text());
    Ok(())
}

async fn handle_replay(config: &Config, trace: Trace, format: OutputFormat) -> anyhow::Result<()> {
    let ticks = trace.len();
    let mut io = peripherals(config, trace, false);
    let mut recorder = Recorder::from_config(config)?;

    let elapsed = recorder.replay(&mut io, ticks).await;
    info!(
        ticks,
        elapsed_ms = elapsed.as_millis(),
        recorded = recorder.log().total_appended(),
        "replay finished"
    );

    let report = recorder.report();
    match format {
        OutputFormat::Text => print!("{}", report.to_text()),
        OutputFormat::Html => print!("{}", report.to_html()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

fn handle_classify(config: &Config, cmd: &ClassifyCommand) {
    let sample = AccelSample::new(cmd.x, cmd.y, cmd.z);
    let label = config.classifier().classify(sample);
    println!("{label}");
    println!("  pitch: {:>7.2}°", sample.pitch_deg());
    println!("  roll:  {:>7.2}°", sample.roll_deg());
    println!("  z:     {:>7.3} g", sample.z);
}

fn handle_config(path: Option<std::path::PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(path).context("failed to load configuration")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print_config(&config);
            }
        }
        ConfigCommand::Path => {
            println!(
                "{}",
                path.unwrap_or_else(Config::default_config_path).display()
            );
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn print_config(config: &Config) {
    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("[Sensor]");
    println!("  Poll interval (ms):  {}", config.sensor.poll_interval_ms);
    println!("  Scale (LSB/g):       {}", config.sensor.scale_lsb_per_g);
    println!();
    println!("[Classifier]");
    println!("  Tilt threshold (°):  {}", config.classifier.tilt_threshold_deg);
    println!("  Down threshold (g):  {}", config.classifier.down_threshold_g);
    println!();
    println!("[Detector]");
    println!("  Debounce (ms):       {}", config.detector.debounce_window_ms);
    println!("  Re-arm delay (ms):   {}", config.detector.rearm_delay_ms);
    println!();
    println!("[Log]");
    println!("  Capacity:            {}", config.log.capacity);
    println!();
    println!("[Position]");
    println!("  UTC offset (min):    {}", config.position.utc_offset_minutes);
    println!("  Precision:           {}", config.position.coordinate_precision);
    println!();
    println!("[Alert]");
    println!("  Buzzer pulse (ms):   {}", config.alert.buzzer_pulse_ms);
    println!("  Notifications:       {}", config.alert.notifications_enabled);
    println!("  Recipient:           {}", config.alert.recipient);
    println!();
    println!("[Server]");
    println!("  Enabled:             {}", config.server.enabled);
    println!("  Bind:                {}", config.server.bind);
    println!("  Request wait (ms):   {}", config.server.request_wait_ms);
}
