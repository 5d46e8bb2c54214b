//! Command line group draw.
//!
//! Usage: grouping <GROUPS> (<SEED0> <SEED1> | --phrase <PHRASE>) [--teams teams.txt] [--json]
//!
//! Reads the team file, prints the teams, the country bias of every attempt and finally the groups.

use anyhow::{Context, Result};
use bacrama_grouping::draw::{parse_group_count, DEFAULT_MAX_BIAS};
use bacrama_grouping::roster::DEFAULT_TEAM_FILE;
use bacrama_grouping::{CompetitorEntry, Draw, DrawConfig, Grouping, Roster, Seeds};
use clap::Parser;
use serde::Serialize;
use std::io::{self, Write};
use std::num::NonZero;
use std::path::PathBuf;
use tracing::{debug, info, Level};

#[derive(Parser, Debug)]
#[command(name = "grouping")]
#[command(about = "Draw ranked teams into groups, keeping teams of the same country apart")]
struct Args {
    /// Number of groups
    groups: String,

    /// First seed (decimal, 0x hexadecimal or 0 octal)
    #[arg(requires = "seed1", conflicts_with = "phrase", required_unless_present = "phrase")]
    seed0: Option<String>,

    /// Second seed
    #[arg(requires = "seed0")]
    seed1: Option<String>,

    /// Derive both seeds from a phrase instead, e.g. the name of the event
    #[arg(short, long)]
    phrase: Option<String>,

    /// Team file, one `<rank> <country> <name>` entry per line
    #[arg(short, long, default_value = DEFAULT_TEAM_FILE)]
    teams: PathBuf,

    /// Highest accepted number of same-country pairs inside the groups
    #[arg(long, default_value_t = DEFAULT_MAX_BIAS)]
    max_bias: usize,

    /// Give up after this many attempts (retry forever if omitted)
    #[arg(long)]
    max_attempts: Option<NonZero<u64>>,

    /// Print the resulting groups as JSON
    #[arg(long)]
    json: bool,

    /// Log level (written to stderr)
    #[arg(long, default_value_t = Level::WARN)]
    log_level: Level,
}

#[derive(Serialize)]
struct GroupingReport<'a> {
    seeds: Seeds,
    bias: usize,
    attempts: u64,
    groups: Vec<GroupReport<'a>>,
}

#[derive(Serialize)]
struct GroupReport<'a> {
    name: String,
    teams: Vec<&'a CompetitorEntry>,
}

impl Args {
    /// Builds the draw configuration, either from both seeds or from the phrase.
    fn config(&self) -> Result<DrawConfig> {
        let seeds = match (&self.phrase, &self.seed0, &self.seed1) {
            (Some(phrase), None, None) => Seeds::from_phrase(phrase),
            (None, Some(seed0), Some(seed1)) => Seeds::parse(seed0, seed1)?,
            _ => anyhow::bail!("either both seeds or a phrase are required"),
        };
        Ok(DrawConfig {
            number_of_groups: parse_group_count(&self.groups)?,
            seeds,
            max_bias: self.max_bias,
            max_attempts: self.max_attempts,
        })
    }
}

impl<'a> GroupingReport<'a> {
    fn new(seeds: Seeds, grouping: &Grouping<'a, CompetitorEntry>) -> Self {
        GroupingReport {
            seeds,
            bias: grouping.bias(),
            attempts: grouping.attempts(),
            groups: grouping
                .groups()
                .enumerate()
                .map(|(i, group)| GroupReport {
                    name: group_name(i),
                    teams: group.collect(),
                })
                .collect(),
        }
    }
}

fn main() {
    let result = match Args::try_parse() {
        Ok(args) => run(args),
        // --help and --version
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => Err(err.into()),
    };
    if let Err(err) = result {
        eprintln!("grouping failed: {err:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .init();

    let config = args.config()?;
    info!(?config, teams = %args.teams.display(), "starting draw");

    let mut roster = Roster::load(&args.teams)
        .with_context(|| format!("error reading teams from {}", args.teams.display()))?;

    if !args.json {
        println!(
            "seed: 0x{:08X} 0x{:08X}",
            config.seeds.first, config.seeds.second
        );
        println!("\n===== Teams ({}) ====", roster.len());
        for team in roster.entries() {
            println!("{} {} ({})", team.rank, team.name, team.country);
        }
        println!("\n==== Randomizing ====");
    }

    let draw = Draw::new(roster.entries_mut(), &config)?;
    let grouping = if args.json {
        draw.run()?
    } else {
        let mut stdout = io::stdout();
        let mut progress_failed = false;
        let grouping = draw.run_with_progress(|_, bias| {
            if let Err(err) = write!(stdout, " {bias}").and_then(|_| stdout.flush()) {
                if !progress_failed {
                    debug!(%err, "couldn't print draw progress");
                    progress_failed = true;
                }
            }
        });
        println!();
        grouping?
    };

    if args.json {
        let report = GroupingReport::new(config.seeds, &grouping);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_groups(&grouping);
    }

    Ok(())
}

fn print_groups(grouping: &Grouping<CompetitorEntry>) {
    println!("\n==== Grouping ====");
    for (i, group) in grouping.groups().enumerate() {
        println!("Group {}:", group_name(i));
        for team in group {
            println!("\t{} ({})", team.name, team.country);
        }
    }
    info!(
        bias = grouping.bias(),
        attempts = grouping.attempts(),
        "draw complete"
    );
}

fn group_name(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => (index + 1).to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use bacrama_grouping::DrawError;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("grouping").chain(args.iter().copied()))
    }

    #[test]
    fn test_numeric_seeds() {
        let config = parse(&["4", "0x10", "017"]).unwrap().config().unwrap();
        assert_eq!(config.number_of_groups.get(), 4);
        assert_eq!(config.seeds, Seeds::new(16, 15));
        assert_eq!(config.max_bias, DEFAULT_MAX_BIAS);
        assert_eq!(config.max_attempts, None);
    }

    #[test]
    fn test_phrase_seeds() {
        let args = parse(&["2", "--phrase", "RoboCup 2026", "--max-attempts", "100"]).unwrap();
        assert_eq!(args.teams, PathBuf::from(DEFAULT_TEAM_FILE));
        let config = args.config().unwrap();
        assert_eq!(config.seeds, Seeds::from_phrase("RoboCup 2026"));
        assert_eq!(config.max_attempts, NonZero::new(100));
    }

    #[test]
    fn test_seed_arguments() {
        // Seeds and phrase are exclusive
        assert!(parse(&["2", "1", "2", "--phrase", "RoboCup"]).is_err());
        // One of them is required
        assert!(parse(&["2"]).is_err());
        // Both seeds are required
        assert!(parse(&["2", "1"]).is_err());
        // Zero attempts is not a cap
        assert!(parse(&["2", "1", "2", "--max-attempts", "0"]).is_err());
    }

    #[test]
    fn test_strict_parsing() {
        let err = parse(&["0", "1", "2"]).unwrap().config().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DrawError>(),
            Some(DrawError::InvalidGroupCount(_))
        ));

        let err = parse(&["2", "1", "12abc"]).unwrap().config().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DrawError>(),
            Some(DrawError::InvalidSeed(_))
        ));
    }

    #[test]
    fn test_report() {
        let mut teams = vec![
            CompetitorEntry::new(1, "DE", "TIGERs"),
            CompetitorEntry::new(1, "CN", "ZJUNlict"),
            CompetitorEntry::new(2, "US", "CMDragons"),
            CompetitorEntry::new(2, "JP", "KIKS"),
        ];
        let grouping = bacrama_grouping::run(&mut teams, 2, 5, 6, 0).unwrap();
        let report = serde_json::to_value(GroupingReport::new(Seeds::new(5, 6), &grouping)).unwrap();

        assert_eq!(report["seeds"], serde_json::json!({"first": 5, "second": 6}));
        assert_eq!(report["bias"], 0);
        assert_eq!(report["attempts"], grouping.attempts());

        let groups = report["groups"].as_array().unwrap();
        assert_eq!(groups.len(), 2);
        for (group, name) in groups.iter().zip(["A", "B"]) {
            assert_eq!(group["name"], name);
            let teams = group["teams"].as_array().unwrap();
            assert_eq!(teams.len(), 2);
            assert_eq!(teams[0]["rank"], 1);
            assert_eq!(teams[1]["rank"], 2);
            assert!(teams[0]["country"].is_string() && teams[0]["name"].is_string());
        }
    }

    #[test]
    fn test_group_name() {
        assert_eq!(group_name(0), "A");
        assert_eq!(group_name(25), "Z");
        assert_eq!(group_name(26), "27");
    }
}
