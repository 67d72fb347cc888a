use anyhow::Context;
use clap::{App, Arg, ArgMatches, SubCommand};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wfa_stats::analyzer::event_dump::EventDump;
use wfa_stats::{LogFile, ParserConfig, parse_log};

fn load_config(matches: &ArgMatches) -> anyhow::Result<ParserConfig> {
    let mut config = match matches.value_of("CONFIG") {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {path}"))?;
            toml::from_str::<ParserConfig>(&contents).with_context(|| format!("Failed to parse config file {path}"))?
        }
        None => ParserConfig::default(),
    };

    if let Some(name) = matches.value_of("UNNAMED") {
        config.unnamed_sentinel = name.to_owned();
    }
    if let Some(causes) = matches.values_of("INTENTIONAL") {
        config.intentional_death_causes = causes.map(str::to_owned).collect();
    }
    Ok(config)
}

fn read_log(matches: &ArgMatches) -> anyhow::Result<LogFile> {
    let path = matches.value_of("LOG").unwrap_or("games.log");
    LogFile::from_file(Path::new(path)).with_context(|| format!("Failed to read log {path}"))
}

fn run_stats(matches: &ArgMatches) -> anyhow::Result<()> {
    let config = load_config(matches)?;
    let log = read_log(matches)?;
    let output = matches.value_of("OUTPUT").unwrap_or("results.json");

    let (report, survey) = parse_log(&log, config).into_parts();
    info!(
        "{} lines, {} events, {} players ({} malformed, {} unmatched, {} unresolved)",
        survey.total_lines,
        survey.events(),
        report.players().len(),
        survey.malformed_lines,
        survey.unmatched_messages,
        survey.unresolved_references
    );

    if output == "-" {
        report.write_json(std::io::stdout().lock())?;
        println!();
    } else {
        let file = File::create(output).with_context(|| format!("Failed to create {output}"))?;
        report
            .write_json(BufWriter::new(file))
            .with_context(|| format!("Failed to write {output}"))?;
        info!("wrote {output}");
    }
    Ok(())
}

fn run_dump(matches: &ArgMatches) -> anyhow::Result<()> {
    let log = read_log(matches)?;
    let mut dump = EventDump::new(std::io::stdout().lock());
    log.analyze(&mut dump);
    Ok(())
}

fn run_survey(matches: &ArgMatches) -> anyhow::Result<()> {
    let config = load_config(matches)?;
    let log = read_log(matches)?;
    let (_, survey) = parse_log(&log, config).into_parts();
    println!("{}", serde_json::to_string_pretty(&survey)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let log_arg = Arg::with_name("LOG")
        .help("The server log to process (defaults to games.log)")
        .index(1);
    let config_args = [
        Arg::with_name("CONFIG")
            .help("TOML file with parser settings")
            .short("c")
            .long("config")
            .takes_value(true),
        Arg::with_name("UNNAMED")
            .help("Placeholder name the server gives nameless clients")
            .long("unnamed")
            .takes_value(true),
        Arg::with_name("INTENTIONAL")
            .help("Self-kill causes that do not count as deaths (repeatable)")
            .long("intentional-cause")
            .takes_value(true)
            .multiple(true)
            .number_of_values(1),
    ];

    let matches = App::new("WFA Stats")
        .about("Computes per-player statistics from WFA capture-the-flag server logs")
        .subcommand(
            SubCommand::with_name("stats")
                .about("Writes per-player statistics as JSON")
                .arg(
                    Arg::with_name("OUTPUT")
                        .help("Output JSON path, or - for stdout (defaults to results.json)")
                        .short("o")
                        .long("output")
                        .takes_value(true),
                )
                .args(&config_args)
                .arg(log_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("dump")
                .about("Prints every recognised event as a JSON line")
                .arg(log_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("survey")
                .about("Counts lines by how they were handled")
                .args(&config_args)
                .arg(log_arg),
        )
        .subcommand(
            SubCommand::with_name("default-config")
                .about("Prints a commented default configuration file"),
        )
        .get_matches();

    match matches.subcommand() {
        ("stats", Some(matches)) => run_stats(matches),
        ("dump", Some(matches)) => run_dump(matches),
        ("survey", Some(matches)) => run_survey(matches),
        ("default-config", Some(_)) => {
            print!("{}", ParserConfig::generate_default_toml());
            Ok(())
        }
        _ => {
            println!("{}", matches.usage());
            Ok(())
        }
    }
}
