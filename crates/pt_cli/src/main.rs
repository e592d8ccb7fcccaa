//! Petanca tournament operator CLI.
//!
//! One subcommand per operator action. Each run loads the snapshot file,
//! applies a single engine operation, and writes the snapshot back (last
//! write wins).

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use pt_core::export;
use pt_core::models::{Category, RegisteredTeam};
use pt_core::store::{StoreManager, TournamentSave};
use pt_core::tournament::Tournament;

#[derive(Parser)]
#[command(name = "pt_cli")]
#[command(about = "Operate a petanca tournament from a snapshot file", long_about = None)]
struct Cli {
    /// Snapshot file path
    #[arg(long, default_value = "tournament.save", global = true)]
    save: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a roster JSON file and start the Swiss phase
    Init {
        /// Roster JSON: an array of {name, captain, players, attended}
        #[arg(long)]
        roster: PathBuf,

        /// Shuffle seed for round 1
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },

    /// Generate the next Swiss round
    Round,

    /// Record (or correct) a match result
    Record {
        match_id: String,
        score1: String,
        score2: String,
    },

    /// Print the current standings
    Standings,

    /// Close qualification and assign Day-1 categories
    Finish,

    /// Start the reclassification round
    Reclass,

    /// Build the knockout brackets
    Brackets,

    /// Roll the Swiss phase back one round
    Rollback,

    /// Write the standings export rows as JSON
    Export {
        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Discard all tournament state
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { roster, seed } => {
            let text = std::fs::read_to_string(&roster)
                .with_context(|| format!("reading roster {}", roster.display()))?;
            let teams: Vec<RegisteredTeam> =
                serde_json::from_str(&text).context("parsing roster JSON")?;
            let tournament = Tournament::from_roster(&teams, seed)?;

            println!(
                "Tournament started: {} attended teams of {} registered",
                tournament.teams.len(),
                teams.len()
            );
            let mut save = TournamentSave::new();
            save.roster = teams;
            save.tournament = Some(tournament);
            persist(&cli.save, save)
        }

        Commands::Round => {
            let mut save = load(&cli.save)?;
            let tournament = working(&mut save)?;
            let round = tournament.generate_next_round()?;

            println!("Round {round}");
            if let Some(bye_id) = tournament.bye_team {
                let name = tournament.team(bye_id).map(|t| t.name.as_str()).unwrap_or("?");
                println!("  BYE: {name} (default win)");
            }
            for m in tournament.round_matches(round) {
                println!("  {}  {}", m.id, versus(tournament, m.team1, m.team2));
            }
            persist(&cli.save, save)
        }

        Commands::Record { match_id, score1, score2 } => {
            let score1 = parse_score(&score1)?;
            let score2 = parse_score(&score2)?;
            let mut save = load(&cli.save)?;
            let tournament = working(&mut save)?;
            tournament.record_result(&match_id, score1, score2)?;

            let m = tournament
                .match_by_id(&match_id)
                .ok_or_else(|| anyhow!("match vanished after recording"))?;
            let winner = m
                .winner
                .and_then(|id| tournament.team(id))
                .map(|t| t.name.clone())
                .unwrap_or_default();
            println!("{match_id}: {score1}-{score2}, winner {winner}");
            persist(&cli.save, save)
        }

        Commands::Standings => {
            let save = load(&cli.save)?;
            let tournament = save
                .tournament
                .as_ref()
                .ok_or_else(|| anyhow!("tournament not started; run init first"))?;
            print_standings(tournament);
            Ok(())
        }

        Commands::Finish => {
            let mut save = load(&cli.save)?;
            let tournament = working(&mut save)?;
            tournament.finish_qualification()?;
            println!("Day-1 categories assigned:");
            print_standings(tournament);
            persist(&cli.save, save)
        }

        Commands::Reclass => {
            let mut save = load(&cli.save)?;
            let tournament = working(&mut save)?;
            tournament.start_reclassification()?;
            println!("Reclassification round:");
            for m in tournament.unplayed_matches() {
                println!("  {}  {}", m.id, versus(tournament, m.team1, m.team2));
            }
            persist(&cli.save, save)
        }

        Commands::Brackets => {
            let mut save = load(&cli.save)?;
            let tournament = working(&mut save)?;
            if tournament.brackets.is_none() {
                tournament.build_knockout_brackets()?;
            }
            print_brackets(tournament);
            persist(&cli.save, save)
        }

        Commands::Rollback => {
            let mut save = load(&cli.save)?;
            let tournament = working(&mut save)?;
            tournament.rollback_round()?;
            println!("Rolled back to round {}", tournament.current_round);
            persist(&cli.save, save)
        }

        Commands::Export { out } => {
            let save = load(&cli.save)?;
            let tournament = save
                .tournament
                .as_ref()
                .ok_or_else(|| anyhow!("tournament not started; run init first"))?;
            let rows = export::standings_rows(tournament);
            let json = serde_json::to_string_pretty(&rows)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Exported {} rows to {}", rows.len(), path.display());
                }
                None => println!("{json}"),
            }
            Ok(())
        }

        Commands::Reset => {
            StoreManager::delete(&cli.save)?;
            println!("Tournament state discarded");
            Ok(())
        }
    }
}

fn load(path: &Path) -> Result<TournamentSave> {
    StoreManager::load_from_path(path)
        .with_context(|| format!("loading snapshot {}", path.display()))
}

fn persist(path: &Path, mut save: TournamentSave) -> Result<()> {
    save.update_timestamp();
    StoreManager::save_to_path(path, &save)
        .with_context(|| format!("writing snapshot {}", path.display()))
}

fn working(save: &mut TournamentSave) -> Result<&mut Tournament> {
    save.tournament
        .as_mut()
        .ok_or_else(|| anyhow!("tournament not started; run init first"))
}

/// Blank or non-numeric score text is an operator typo, refused up front.
fn parse_score(raw: &str) -> Result<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("score is blank; enter a number for both teams");
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| anyhow!("score '{trimmed}' is not a number"))
}

fn versus(tournament: &Tournament, team1: pt_core::TeamId, team2: pt_core::TeamId) -> String {
    let name = |id| {
        tournament
            .team(id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| "?".to_string())
    };
    format!("{} vs {}", name(team1), name(team2))
}

fn print_standings(tournament: &Tournament) {
    println!(
        "{:>4}  {:<24} {:<18} {:>3} {:>3} {:>4} {:>8}  {}",
        "Pos", "Team", "Captain", "W", "L", "Pts", "Coef", "Cat"
    );
    for row in export::standings_rows(tournament) {
        println!(
            "{:>4}  {:<24} {:<18} {:>3} {:>3} {:>4} {:>8}  {}",
            row.position,
            row.team,
            row.captain,
            row.wins,
            row.losses,
            row.points,
            row.coefficient,
            row.category
        );
    }
}

fn print_brackets(tournament: &Tournament) {
    for band in Category::ALL {
        let matches = tournament.bracket_matches(band);
        if matches.is_empty() {
            continue;
        }
        println!("Band {band}:");
        for m in matches {
            let score = match (m.score1, m.score2) {
                (Some(s1), Some(s2)) => format!("  {s1}-{s2}"),
                _ => String::new(),
            };
            println!("  {}  {}{}", m.id, versus(tournament, m.team1, m.team2), score);
        }
    }
}
