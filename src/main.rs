use anyhow::{bail, Context};
use plotkit::{
    init_logging, plan_plot, prepare_plot, spawn_link_monitor, spawn_reconnect_loop, Ebb,
    EbbController, PlotJob, PlotRequest, BUILD_DATE, VERSION,
};
use plotkit_communication::list_ports;
use plotkit_core::ProtocolError;
use plotkit_settings::Config;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const USAGE: &str = "usage: plotkit <file.svg> [--config <path>] [--plot]
       plotkit --ports
       plotkit --version";

/// Reconnect attempts to wait for before giving up on leaving the machine safe
const RECOVERY_ATTEMPTS: u32 = 10;

#[derive(Debug, Default)]
struct Args {
    svg: Option<PathBuf>,
    config: Option<PathBuf>,
    plot: bool,
    ports: bool,
    version: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = iter.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--plot" => args.plot = true,
            "--ports" => args.ports = true,
            "--version" | "-V" => args.version = true,
            "--help" | "-h" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other if other.starts_with('-') => bail!("unknown option {}\n{}", other, USAGE),
            other => {
                if args.svg.replace(PathBuf::from(other)).is_some() {
                    bail!("only one SVG file may be given\n{}", USAGE);
                }
            }
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    if args.version {
        println!("plotkit {} (built {})", VERSION, BUILD_DATE);
        return Ok(());
    }

    init_logging()?;

    if args.ports {
        for port in list_ports()? {
            println!(
                "{}\t{}",
                port.port_name,
                port.manufacturer.as_deref().unwrap_or("-")
            );
        }
        return Ok(());
    }

    let Some(svg_path) = args.svg else {
        bail!("{}", USAGE);
    };
    let config = Config::load_or_default(args.config.as_deref())?;
    let svg = std::fs::read_to_string(&svg_path)
        .with_context(|| format!("Failed to read {}", svg_path.display()))?;

    let prepared = prepare_plot(&PlotRequest::from_config(svg, &config))?;
    let plan = plan_plot(&prepared, &config.machine)?;
    println!(
        "{} paths, {} commands, {:.0} mm drawn, {:.0} mm travel, about {:.0} s",
        prepared.paths.len(),
        plan.len(),
        plan.pen_down_distance,
        plan.travel_distance,
        plan.duration().as_secs_f64()
    );
    if !prepared.layers.is_empty() {
        let layers: Vec<&str> = prepared.layers.iter().map(String::as_str).collect();
        println!("layers: {}", layers.join(", "));
    }

    if !args.plot {
        return Ok(());
    }

    let controller = EbbController::new(config.connection.controller_config());
    let connector = Arc::new(config.connection.connector());
    controller.connect_with(connector.as_ref()).await?;

    let connection = &config.connection;
    let mut session = vec![spawn_link_monitor(
        controller.clone(),
        connection.link_check_interval(),
    )];
    if connection.auto_reconnect {
        session.push(spawn_reconnect_loop(
            controller.clone(),
            connector.clone(),
            connection.reconnect_delay(),
        ));
    }

    let ebb = Ebb::new(controller.clone(), &config.machine);
    let outcome = PlotJob::new(&ebb).run(&plan).await;
    if matches!(outcome, Err(ProtocolError::ConnectionLost { .. })) && connection.auto_reconnect {
        recover(&ebb, connection.reconnect_delay()).await;
    }

    for task in session {
        task.abort();
    }
    controller.disconnect().await?;

    let report = outcome?;
    println!(
        "Plotted {} commands in {:.1} s",
        report.commands_sent,
        report.elapsed.as_secs_f64()
    );
    Ok(())
}

/// Wait for the board to come back after a lost connection, then lift the pen
/// and release the motors
async fn recover(ebb: &Ebb, delay: Duration) {
    let controller = ebb.controller();
    for _ in 0..RECOVERY_ATTEMPTS {
        tokio::time::sleep(delay).await;
        if !controller.is_connected() {
            continue;
        }
        tracing::info!("Board is back; leaving the machine safe");
        if let Err(e) = ebb.pen_up().await {
            tracing::warn!("Failed to raise pen: {}", e);
        }
        if let Err(e) = ebb.disable_motors().await {
            tracing::warn!("Failed to release motors: {}", e);
        }
        return;
    }
    tracing::warn!("Board did not come back; pen and motors left as they were");
}
