use std::sync::Arc;

use crate::battle::{
    build_report, events_to_csv, result_line, simulate_bounded, RotationError, MAX_BLOCK_CHARS,
};
use crate::config::Config;
use crate::logging;
use crate::registry::{summarize, Affinity, JsonFileStore, NinjaRecord, NinjaView, Registry};
use crate::server;

const USAGE: &str = "usage: shinobi <serve|rotation|affinity|seal|unseal|show|list|summary>";
const ROTATION_USAGE: &str =
    "usage: shinobi rotation <damage>... <health> [--json | --csv]   e.g. 100 50 200 1500";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Rotation,
    Affinity,
    Seal,
    Unseal,
    Show,
    List,
    Summary,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("rotation") => Some(Command::Rotation),
        Some("affinity") => Some(Command::Affinity),
        Some("seal") => Some(Command::Seal),
        Some("unseal") => Some(Command::Unseal),
        Some("show") => Some(Command::Show),
        Some("list") => Some(Command::List),
        Some("summary") => Some(Command::Summary),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return 1;
        }
    };
    logging::init(&config.log_filter);

    match parse_command(args) {
        Some(Command::Serve) => handle_serve(&config),
        Some(Command::Rotation) => handle_rotation(args, &config),
        Some(Command::Affinity) => handle_affinity(args, &config),
        Some(Command::Seal) => handle_seal(args, &config, true),
        Some(Command::Unseal) => handle_seal(args, &config, false),
        Some(Command::Show) => handle_show(args, &config),
        Some(Command::List) => handle_list(args, &config),
        Some(Command::Summary) => handle_summary(args, &config),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

fn open_registry(config: &Config) -> Registry {
    let store = JsonFileStore::new(config.data_file.clone(), config.corrupt_state);
    Registry::new(Arc::new(store))
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

/// Positional arguments after the command name, flags removed.
fn positionals(args: &[String]) -> Vec<&str> {
    args.iter()
        .skip(2)
        .map(String::as_str)
        .filter(|arg| !arg.starts_with("--"))
        .collect()
}

fn handle_serve(config: &Config) -> i32 {
    match server::run_server(config) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_rotation(args: &[String], config: &Config) -> i32 {
    let as_json = has_flag(args, "--json");
    let as_csv = has_flag(args, "--csv");
    if as_json && as_csv {
        eprintln!("❗️ --json and --csv cannot be combined");
        eprintln!("{ROTATION_USAGE}");
        return 2;
    }

    // Negative numbers look like flags, so only known flags are removed here.
    let raw = args
        .iter()
        .skip(2)
        .filter(|arg| !matches!(arg.as_str(), "--json" | "--csv"))
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    let outcome = match simulate_bounded(&raw, config.rotation_limits()) {
        Ok(outcome) => outcome,
        Err(err @ RotationError::Input(_)) => {
            eprintln!("❗️ {err}");
            eprintln!("{ROTATION_USAGE}");
            return 2;
        }
        Err(err) => {
            eprintln!("❗️ {err}");
            return 2;
        }
    };

    if as_csv {
        // Short-circuit fights have no rows; the outcome goes to stderr so
        // stdout stays a valid CSV document.
        if outcome.events.is_empty() {
            eprintln!("{}", result_line(&outcome));
        }
        return match events_to_csv(&outcome.events) {
            Ok(csv) => {
                print!("{csv}");
                0
            }
            Err(err) => {
                eprintln!("failed to export events: {err}");
                1
            }
        };
    }

    let report = build_report(&outcome, MAX_BLOCK_CHARS);
    if as_json {
        match serde_json::to_string_pretty(&report) {
            Ok(payload) => println!("{payload}"),
            Err(err) => {
                eprintln!("failed to serialize rotation report: {err}");
                return 1;
            }
        }
    } else {
        print!("{}", report.to_text());
    }
    0
}

fn handle_affinity(args: &[String], config: &Config) -> i32 {
    let rest = positionals(args);
    let Some((name, tags)) = rest.split_first().filter(|(_, tags)| !tags.is_empty()) else {
        eprintln!("usage: shinobi affinity <name> <katon|suiton|fuuton|doton|raiton>...");
        return 2;
    };

    let mut affinities = Vec::with_capacity(tags.len());
    for tag in tags {
        match tag.parse::<Affinity>() {
            Ok(affinity) => affinities.push(affinity),
            Err(err) => {
                eprintln!("❗️ {err}");
                return 2;
            }
        }
    }
    let stored: Vec<String> = affinities.iter().map(|a| a.tag().to_string()).collect();
    let now = chrono::Utc::now().timestamp();

    match open_registry(config).upsert_affinities(name, &stored, now) {
        Ok(record) => {
            let described = affinities
                .iter()
                .map(|a| format!("{} {} ({})", a.emoji(), a.tag(), a.element()))
                .collect::<Vec<_>>()
                .join(", ");
            println!("Ninja '{}' now has affinity: {described}", record.name);
            0
        }
        Err(err) => {
            eprintln!("failed to update registry: {err}");
            1
        }
    }
}

fn handle_seal(args: &[String], config: &Config, sealed: bool) -> i32 {
    let Some(name) = positionals(args).first().copied() else {
        let command = if sealed { "seal" } else { "unseal" };
        eprintln!("usage: shinobi {command} <name>");
        return 2;
    };

    match open_registry(config).upsert_seal(name, sealed) {
        Ok(record) if record.is_sealed() => {
            println!("🔒 Ninja '{}' now has the seal debuff.", record.name);
            0
        }
        Ok(record) => {
            println!("🔓 Ninja '{}' no longer has the seal debuff.", record.name);
            0
        }
        Err(err) => {
            eprintln!("failed to update registry: {err}");
            1
        }
    }
}

fn describe(record: &NinjaRecord) -> String {
    let affinities = if record.affinities.is_empty() {
        "no affinity".to_string()
    } else {
        record.affinities.join(", ")
    };
    let seal = if record.is_sealed() { "🔒 sealed" } else { "🔓 unsealed" };
    let updated = record
        .updated_at
        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
        .map(|at| format!(", updated {}", at.to_rfc3339()))
        .unwrap_or_default();
    format!("{}: {affinities}; {seal}{updated}", record.name)
}

fn handle_show(args: &[String], config: &Config) -> i32 {
    let Some(name) = positionals(args).first().copied() else {
        eprintln!("usage: shinobi show <name> [--json]");
        return 2;
    };

    match open_registry(config).get(name) {
        Ok(Some(record)) if has_flag(args, "--json") => {
            print_json(&NinjaView::from(record))
        }
        Ok(Some(record)) => {
            println!("{}", describe(&record));
            0
        }
        Ok(None) => {
            eprintln!("ninja '{name}' is not registered");
            1
        }
        Err(err) => {
            eprintln!("failed to read registry: {err}");
            1
        }
    }
}

fn handle_list(args: &[String], config: &Config) -> i32 {
    let snapshot = match open_registry(config).all() {
        Ok(snapshot) => snapshot,
        Err(err) => {
            eprintln!("failed to read registry: {err}");
            return 1;
        }
    };

    if has_flag(args, "--json") {
        let views: Vec<NinjaView> = snapshot.records().cloned().map(NinjaView::from).collect();
        return print_json(&views);
    }
    if snapshot.is_empty() {
        println!("No ninjas have been registered yet.");
    }
    for record in snapshot.records() {
        println!("{}", describe(record));
    }
    0
}

fn handle_summary(args: &[String], config: &Config) -> i32 {
    let snapshot = match open_registry(config).all() {
        Ok(snapshot) => snapshot,
        Err(err) => {
            eprintln!("failed to read registry: {err}");
            return 1;
        }
    };
    let summary = summarize(&snapshot);
    if has_flag(args, "--json") {
        return print_json(&summary);
    }
    println!("{}", summary.to_text());
    0
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize output: {err}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_known_commands() {
        assert_eq!(parse_command(&args(&["shinobi", "rotation"])), Some(Command::Rotation));
        assert_eq!(parse_command(&args(&["shinobi", "unseal", "x"])), Some(Command::Unseal));
        assert_eq!(parse_command(&args(&["shinobi", "fight"])), None);
        assert_eq!(parse_command(&args(&["shinobi"])), None);
    }

    #[test]
    fn positionals_skip_flags() {
        let raw = args(&["shinobi", "show", "--json", "Itachi"]);
        assert_eq!(positionals(&raw), vec!["Itachi"]);
    }

    #[test]
    fn describe_includes_seal_and_affinities() {
        let mut record = NinjaRecord::named("Itachi");
        record.affinities = vec!["Katon".to_string(), "Suiton".to_string()];
        record.sealed = Some(true);
        record.updated_at = Some(0);
        assert_eq!(
            describe(&record),
            "Itachi: Katon, Suiton; 🔒 sealed, updated 1970-01-01T00:00:00+00:00"
        );
    }
}
