use logsim::*;
use clap::Parser;
use log::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Circuit definition file.
    filename: String,

    /// Number of cycles to simulate.
    #[arg(short, long, env = "LOGSIM_CYCLES", default_value_t = 10)]
    cycles: usize,

    /// Sets a switch before the run, as NAME=0 or NAME=1. May be repeated.
    #[arg(short, long = "switch", value_parser = parse_switch)]
    switches: Vec<(String, bool)>,

    /// Monitors an extra signal, as IDENTIFIER=DEVICE or IDENTIFIER=DEVICE.PORT. May be repeated.
    #[arg(short, long = "monitor", value_parser = parse_monitor)]
    monitors: Vec<(String, String)>,

    /// Prints the traces as JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Appends the log to this file instead of stderr.
    #[arg(long)]
    log: Option<String>,

    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug, args.log.as_deref())?;

    let mut circuit = match Circuit::from_file(&args.filename) {
        Ok(circuit) => circuit,
        Err(CircuitError::Invalid(diagnostics)) => {
            for diagnostic in &diagnostics {
                eprintln!("{diagnostic}");
                eprintln!();
            }
            eprintln!("Circuit has {} errors.", error_count(&diagnostics));
            std::process::exit(1);
        },
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        },
    };

    for (name, level) in &args.switches {
        if !circuit.set_switch(name, *level) {
            anyhow::bail!("No switch named {name}");
        }
    }
    for (identifier, signal) in &args.monitors {
        circuit
            .add_monitor(signal, identifier)
            .map_err(|error| anyhow::anyhow!("Can't monitor {signal} as {identifier}: {error}"))?;
    }

    let result = circuit.run(args.cycles);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&traces_json(&circuit))?);
    } else {
        for line in circuit.display_signals() {
            println!("{line}");
        }
    }

    if let Err(error) = result {
        eprintln!("Simulation stopped after {} cycles: {error}", circuit.cycles_completed());
        std::process::exit(1);
    }
    Ok(())
}

/// Diagnostics that are errors, leaving out the marker for suppressed ones.
fn error_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics.iter().filter(|diagnostic| diagnostic.code().is_some()).count()
}

fn parse_switch(arg: &str) -> Result<(String, bool), String> {
    match arg.split_once('=') {
        Some((name, "0")) => Ok((name.to_string(), false)),
        Some((name, "1")) => Ok((name.to_string(), true)),
        _ => Err(format!("expected NAME=0 or NAME=1, found {arg}")),
    }
}

fn parse_monitor(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((identifier, signal)) if !identifier.is_empty() && !signal.is_empty() => {
            Ok((identifier.to_string(), signal.to_string()))
        },
        _ => Err(format!("expected IDENTIFIER=SIGNAL, found {arg}")),
    }
}

fn traces_json(circuit: &Circuit) -> serde_json::Value {
    let mut monitors = serde_json::Map::new();
    for (identifier, _device, _port) in circuit.monitor_names() {
        let samples: Vec<serde_json::Value> = circuit
            .trace(&identifier)
            .map(|trace| {
                trace
                    .iter()
                    .map(|sample| match sample {
                        Some(signal) => serde_json::Value::from(signal.as_str()),
                        None => serde_json::Value::Null,
                    })
                    .collect()
            })
            .unwrap_or_default();
        monitors.insert(identifier, serde_json::Value::Array(samples));
    }

    serde_json::json!({
        "cycles": circuit.cycles_completed(),
        "monitors": monitors,
    })
}

fn init_logging(debug: bool, log_file: Option<&str>) -> anyhow::Result<()> {
    use chrono::{DateTime, Utc};

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            let now: DateTime<Utc> = Utc::now();
            out.finish(format_args!(
                "[{} {} {}] {}",
                now.format("%Y-%m-%dT%H:%M:%S%.fZ"),
                record.level(),
                record.target(),
                message
            ))
        });

    dispatch = match log_file {
        Some(path) => dispatch.chain(fern::log_file(path)?),
        None => dispatch.chain(std::io::stderr()),
    };

    let level = std::env::var("LEVEL").unwrap_or_default();
    dispatch = if debug || level == "DEBUG" {
        dispatch.level(log::LevelFilter::Debug)
    } else if level == "TRACE" {
        dispatch.level(log::LevelFilter::Trace)
    } else {
        dispatch.level(log::LevelFilter::Warn)
    };

    dispatch.apply()?;
    debug!("Logging initialized");
    Ok(())
}
