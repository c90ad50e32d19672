//! `railflow` command line
//!
//! Loads a station/network dataset and runs one query against it. Results
//! are printed as text, or as JSON with `--json`. Logging goes to stderr and
//! is controlled through `RUST_LOG`.

use std::path::PathBuf;
use std::process::ExitCode;

use log::debug;
use serde::Serialize;

use railflow_core::{
    ConfigError, Dataset, DatasetError, EngineConfig, FlowEngine, FlowError, GroupKind, LinkId,
    StationDegradation,
};

const USAGE: &str = "\
usage: railflow [--config FILE] [--json] <stations.csv> <network.csv> <command> [args]

commands:
  max-flow <from> <to>          maximum flow between two stations
  min-cost <from> <to>          maximum flow at minimum cost
  incoming <station>            flow arriving from every end-of-line station
  all-pairs                     station pairs with the largest max flow
  top-groups <kind>             district, municipality or township ranking
  failure <count> <from> <to>   max flow with <count> random rails out of service
  degradation <count>           stations most affected by <count> random failures
  failure-rails <rails> <from> <to>
                                max flow with the listed rails out of service
  degradation-rails <rails>     stations most affected by the listed failures

<rails> is a comma-separated list of station pairs, e.g. \"Tunes:Faro,Faro:Olhão\"";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("Cannot encode output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    MaxFlow { from: String, to: String },
    MinCost { from: String, to: String },
    Incoming { station: String },
    AllPairs,
    TopGroups { kind: GroupKind },
    Failure { rails: RailSelection, from: String, to: String },
    Degradation { rails: RailSelection },
}

/// Rails to take out of service
#[derive(Debug, Clone, PartialEq, Eq)]
enum RailSelection {
    Random(usize),
    Named(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Options {
    config: Option<PathBuf>,
    json: bool,
    stations: PathBuf,
    network: PathBuf,
    command: Command,
}

fn usage(message: impl Into<String>) -> CliError {
    CliError::Usage(message.into())
}

fn parse_count(raw: &str) -> Result<usize, CliError> {
    raw.parse()
        .map_err(|_| usage(format!("'{}' is not a rail count", raw)))
}

/// `A:B,C:D` into station pairs
fn parse_rails(raw: &str) -> Result<RailSelection, CliError> {
    raw.split(',')
        .map(|pair| match pair.split_once(':') {
            Some((from, to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
                Ok((from.trim().to_owned(), to.trim().to_owned()))
            }
            _ => Err(usage(format!("'{}' is not a <from>:<to> rail", pair))),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(RailSelection::Named)
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options, CliError> {
    let mut config = None;
    let mut json = false;
    let mut positional = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--config" => {
                let path = args.next().ok_or_else(|| usage("--config needs a file"))?;
                config = Some(PathBuf::from(path));
            }
            "-h" | "--help" => return Err(usage("")),
            flag if flag.starts_with("--") => return Err(usage(format!("unknown option {}", flag))),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let stations = positional.next().ok_or_else(|| usage("missing stations file"))?;
    let network = positional.next().ok_or_else(|| usage("missing network file"))?;
    let name = positional.next().ok_or_else(|| usage("missing command"))?;
    let rest: Vec<String> = positional.collect();

    let command = match (name.as_str(), rest.as_slice()) {
        ("max-flow", [from, to]) => Command::MaxFlow {
            from: from.clone(),
            to: to.clone(),
        },
        ("min-cost", [from, to]) => Command::MinCost {
            from: from.clone(),
            to: to.clone(),
        },
        ("incoming", [station]) => Command::Incoming {
            station: station.clone(),
        },
        ("all-pairs", []) => Command::AllPairs,
        ("top-groups", [kind]) => Command::TopGroups { kind: kind.parse()? },
        ("failure", [count, from, to]) => Command::Failure {
            rails: RailSelection::Random(parse_count(count)?),
            from: from.clone(),
            to: to.clone(),
        },
        ("failure-rails", [rails, from, to]) => Command::Failure {
            rails: parse_rails(rails)?,
            from: from.clone(),
            to: to.clone(),
        },
        ("degradation", [count]) => Command::Degradation {
            rails: RailSelection::Random(parse_count(count)?),
        },
        ("degradation-rails", [rails]) => Command::Degradation {
            rails: parse_rails(rails)?,
        },
        (name, _) => return Err(usage(format!("bad arguments for command '{}'", name))),
    };

    Ok(Options {
        config,
        json,
        stations: PathBuf::from(stations),
        network: PathBuf::from(network),
        command,
    })
}

/// Prints `value` as JSON, or the text rendering otherwise
fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T) -> String) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text(value));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct FailureReport {
    failed: Vec<(String, String)>,
    baseline: u64,
    degraded: u64,
    reduction_percent: f64,
}

#[derive(Debug, Serialize)]
struct DegradationReport {
    failed: Vec<(String, String)>,
    stations: Vec<StationDegradation>,
}

fn select_rails(engine: &FlowEngine, selection: &RailSelection) -> Result<Vec<LinkId>, CliError> {
    match selection {
        RailSelection::Random(count) => Ok(engine.random_links(*count)),
        RailSelection::Named(pairs) => {
            let pairs: Vec<(&str, &str)> = pairs.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
            Ok(engine.resolve_links(&pairs)?)
        }
    }
}

fn failed_lines(failed: &[(String, String)]) -> Vec<String> {
    failed.iter().map(|(a, b)| format!("  failed {} - {}", a, b)).collect()
}

fn rail_names(engine: &FlowEngine, links: &[LinkId]) -> Vec<(String, String)> {
    let regular = engine.network().regular();
    links
        .iter()
        .map(|&id| {
            let link = regular.link(id);
            (
                regular.label(link.origin()).to_owned(),
                regular.label(link.destination()).to_owned(),
            )
        })
        .collect()
}

fn run(options: Options) -> Result<(), CliError> {
    let config = match &options.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let limit = config.report_limit.unwrap_or(usize::MAX);
    let dataset = Dataset::load(&options.stations, &options.network)?;
    let directory = dataset.directory;
    let mut engine = FlowEngine::new(dataset.network, config);
    debug!("Running {:?}", options.command);

    let json = options.json;
    let outcome = match options.command {
        Command::MaxFlow { from, to } => {
            let flow = engine.max_flow(&[from.as_str()], &to)?;
            emit(json, &flow, |flow| format!("Max flow {} -> {}: {}", from, to, flow))
        }
        Command::MinCost { from, to } => {
            let result = engine.min_cost_max_flow(&from, &to)?;
            emit(json, &result, |r| {
                format!("Min-cost max flow {} -> {}: flow {}, cost {}", from, to, r.flow, r.cost)
            })
        }
        Command::Incoming { station } => {
            let flow = engine.incoming_flow(&station)?;
            emit(json, &flow, |flow| format!("Incoming flow at {}: {}", station, flow))
        }
        Command::AllPairs => {
            let result = engine.all_pairs_max_flow()?;
            emit(json, &result, |r| {
                let mut lines = vec![format!("Largest max flow: {}", r.flow)];
                lines.extend(r.pairs.iter().take(limit).map(|(a, b)| format!("  {} <-> {}", a, b)));
                lines.join("\n")
            })
        }
        Command::TopGroups { kind } => {
            let mut ranking = engine.rank_groups_by_average_incoming_flow(&directory.groups(kind))?;
            ranking.truncate(limit);
            emit(json, &ranking, |ranking| {
                ranking
                    .iter()
                    .enumerate()
                    .map(|(i, row)| match row.average {
                        Some(average) => format!("{:>3}. {} ({:.2})", i + 1, row.group, average),
                        None => format!("{:>3}. {} (no data)", i + 1, row.group),
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Command::Failure { rails, from, to } => {
            let links = select_rails(&engine, &rails)?;
            let impact = engine.failure_impact(&links, &[from.as_str()], &to)?;
            let report = FailureReport {
                failed: rail_names(&engine, &links),
                baseline: impact.baseline,
                degraded: impact.degraded,
                reduction_percent: impact.reduction_percent(),
            };
            emit(json, &report, |r| {
                let mut lines = failed_lines(&r.failed);
                lines.push(format!(
                    "Max flow {} -> {}: {} before, {} after ({:.2}% lost)",
                    from, to, r.baseline, r.degraded, r.reduction_percent
                ));
                lines.join("\n")
            })
        }
        Command::Degradation { rails } => {
            let links = select_rails(&engine, &rails)?;
            let mut stations = engine.rank_stations_by_degradation(&links)?;
            stations.truncate(limit);
            let report = DegradationReport {
                failed: rail_names(&engine, &links),
                stations,
            };
            emit(json, &report, |r| {
                let mut lines = failed_lines(&r.failed);
                lines.extend(r.stations.iter().enumerate().map(|(i, row)| {
                    format!(
                        "{:>3}. {}: {} -> {} ({:.2}%)",
                        i + 1,
                        row.station,
                        row.baseline,
                        row.degraded,
                        row.reduction_percent
                    )
                }));
                lines.join("\n")
            })
        }
    };
    debug!("Solver metrics: {:?}", engine.metrics());
    outcome
}

fn main() -> ExitCode {
    env_logger::init();

    match parse_args(std::env::args().skip(1)).and_then(run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Usage(message)) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            eprintln!("{}", USAGE);
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railflow_core::{RailNetwork, ServiceTier};

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_parse_max_flow() {
        let options = parse_args(args("--json s.csv n.csv max-flow Lisboa Porto")).unwrap();

        assert!(options.json);
        assert_eq!(options.config, None);
        assert_eq!(options.stations, PathBuf::from("s.csv"));
        assert_eq!(
            options.command,
            Command::MaxFlow {
                from: "Lisboa".to_string(),
                to: "Porto".to_string()
            }
        );
    }

    #[test]
    fn test_parse_config_and_counts() {
        let options = parse_args(args("s.csv n.csv degradation 3 --config railflow.json")).unwrap();

        assert_eq!(options.config, Some(PathBuf::from("railflow.json")));
        assert_eq!(
            options.command,
            Command::Degradation {
                rails: RailSelection::Random(3)
            }
        );

        let options = parse_args(args("s.csv n.csv top-groups municipality")).unwrap();
        assert_eq!(
            options.command,
            Command::TopGroups {
                kind: GroupKind::Municipality
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(parse_args(args("s.csv n.csv")), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(args("s.csv n.csv all-pairs extra")), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(args("s.csv n.csv failure many A B")), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(args("s.csv n.csv top-groups parish")), Err(CliError::Dataset(_))));
        assert!(matches!(parse_args(args("--verbose s.csv n.csv all-pairs")), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(args("s.csv n.csv degradation-rails Faro")), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(args("s.csv n.csv degradation-rails A:B,:C")), Err(CliError::Usage(_))));
    }

    #[test]
    fn test_parse_named_rails() {
        let options = parse_args(args("s.csv n.csv failure-rails Tunes:Faro,Faro:Olhão Tunes Olhão")).unwrap();
        assert_eq!(
            options.command,
            Command::Failure {
                rails: RailSelection::Named(vec![
                    ("Tunes".to_string(), "Faro".to_string()),
                    ("Faro".to_string(), "Olhão".to_string()),
                ]),
                from: "Tunes".to_string(),
                to: "Olhão".to_string()
            }
        );

        let options = parse_args(vec![
            "s.csv".to_string(),
            "n.csv".to_string(),
            "degradation-rails".to_string(),
            "Lisboa Oriente:Entroncamento".to_string(),
        ])
        .unwrap();
        assert_eq!(
            options.command,
            Command::Degradation {
                rails: RailSelection::Named(vec![("Lisboa Oriente".to_string(), "Entroncamento".to_string())])
            }
        );
    }

    #[test]
    fn test_named_rails_resolve_against_network() {
        let mut network = RailNetwork::new();
        for station in ["Tunes", "Faro", "Olhão"] {
            network.add_station(station);
        }
        network.add_rail("Tunes", "Faro", 4, ServiceTier::Standard).unwrap();
        network.add_rail("Faro", "Olhão", 3, ServiceTier::Standard).unwrap();
        let engine = FlowEngine::new(network, EngineConfig::default());

        let selection = RailSelection::Named(vec![("Olhão".to_string(), "Faro".to_string())]);
        let links = select_rails(&engine, &selection).unwrap();
        assert_eq!(rail_names(&engine, &links), vec![("Olhão".to_string(), "Faro".to_string())]);

        let missing = RailSelection::Named(vec![("Tunes".to_string(), "Olhão".to_string())]);
        assert!(matches!(
            select_rails(&engine, &missing),
            Err(CliError::Flow(FlowError::UnknownLink(_, _)))
        ));
    }

    #[test]
    fn test_degradation_report_lists_failed_rails() {
        let report = DegradationReport {
            failed: vec![("Tunes".to_string(), "Faro".to_string())],
            stations: Vec::new(),
        };
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["failed"][0][0], "Tunes");
        assert_eq!(json["failed"][0][1], "Faro");
        assert_eq!(failed_lines(&report.failed), vec!["  failed Tunes - Faro".to_string()]);
    }
}
