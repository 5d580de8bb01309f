use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Args, Parser, Subcommand};
use csv::Writer;
use std::path::{Path, PathBuf};

use skat_tournament::store::{
    PlayerRepository, ResultRepository, SeriesRepository, TableRepository,
};
use skat_tournament::xlsx;
use skat_tournament::{
    rank_rows, CsvStore, EvaluationRow, GameResult, NewPlayer, NewSeries, Player, PlayerId,
    PlayerUpdate, ResultKey, ResultUpdate, SelectionPolicy, SeriesId, SeriesUpdate, SortKey,
    Standing, Tournament,
};

#[derive(Parser)]
#[command(name = "skat")]
#[command(about = "Manage Skat tournaments: players, series, tables and results", long_about = None)]
struct Cli {
    /// Directory holding the tournament CSV files
    #[arg(short, long, env = "SKAT_DATA_DIR", default_value = "skat-data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage players
    #[command(subcommand)]
    Player(PlayerCommand),

    /// Manage game series, their rosters and tables
    #[command(subcommand)]
    Series(SeriesCommand),

    /// Manage per-player series results
    #[command(subcommand)]
    Result(ResultCommand),

    /// Evaluate results over all series
    #[command(subcommand)]
    Evaluate(EvaluateCommand),

    /// Add random players, series, tables and results for trying things out
    Demo {
        #[arg(short, long, default_value = "13")]
        players: usize,

        #[arg(short, long, default_value = "5")]
        series: usize,
    },
}

/// The series a command works on
#[derive(Args)]
struct SeriesArg {
    /// Series ID
    #[arg(short, long, env = "SKAT_SERIES")]
    series: SeriesId,
}

#[derive(Subcommand)]
enum PlayerCommand {
    /// Register a new player
    Add {
        #[arg(short, long)]
        name: String,

        /// Register the player as inactive
        #[arg(long)]
        inactive: bool,

        #[arg(short, long, default_value = "")]
        remarks: String,
    },

    /// Change fields of a player
    Update {
        id: PlayerId,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        active: Option<bool>,

        #[arg(short, long)]
        remarks: Option<String>,
    },

    /// Remove a player
    Remove {
        id: PlayerId,

        /// Also remove the player's results and roster entries and take them off 4-seat tables
        #[arg(long)]
        cascade: bool,
    },

    /// List all players
    List,
}

#[derive(Subcommand)]
enum SeriesCommand {
    /// Create a new series
    Add {
        #[arg(short, long, default_value = "")]
        name: String,

        /// Date or date and time the series is played on (default: today)
        #[arg(short, long)]
        date: Option<String>,

        #[arg(short, long, default_value = "")]
        remarks: String,
    },

    /// Change fields of a series
    Update {
        id: SeriesId,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        date: Option<String>,

        #[arg(short, long)]
        remarks: Option<String>,
    },

    /// Remove a series with its tables and results
    Remove { id: SeriesId },

    /// List all series
    List,

    /// Add players to the series roster
    AddPlayers {
        #[command(flatten)]
        series: SeriesArg,

        #[arg(required = true)]
        player_ids: Vec<PlayerId>,
    },

    /// Remove players from the series roster
    RemovePlayers {
        #[command(flatten)]
        series: SeriesArg,

        #[arg(required = true)]
        player_ids: Vec<PlayerId>,
    },

    /// Add every registered player to the series roster
    AddAll {
        #[command(flatten)]
        series: SeriesArg,
    },

    /// Empty the series roster
    ClearPlayers {
        #[command(flatten)]
        series: SeriesArg,
    },

    /// Randomly distribute players to tables, replacing existing tables
    Shuffle {
        #[command(flatten)]
        series: SeriesArg,

        /// Include a player regardless of the active flag (repeatable)
        #[arg(short, long)]
        include: Vec<PlayerId>,

        /// Use exactly these players and ignore all other options (repeatable)
        #[arg(short = 'o', long)]
        include_only: Vec<PlayerId>,

        /// Exclude a player (repeatable)
        #[arg(short, long)]
        exclude: Vec<PlayerId>,

        /// Also include inactive players
        #[arg(long)]
        inactive_also: bool,

        /// Shuffle exactly the series roster
        #[arg(long, conflicts_with_all = ["include", "include_only", "exclude", "inactive_also"])]
        roster: bool,
    },

    /// Show the tables of the series
    Tables {
        #[command(flatten)]
        series: SeriesArg,
    },

    /// Evaluate and rank the results of the series
    Evaluate {
        #[command(flatten)]
        series: SeriesArg,

        /// Column to rank by: score, points, won, won-points, lost, lost-points,
        /// table-size, opponents-lost, opponents-lost-points or player
        #[arg(long, default_value = "score")]
        sort_by: String,

        /// Rank lowest first
        #[arg(long)]
        reverse: bool,

        /// Also write the ranking to an Excel file
        #[arg(long)]
        xlsx: Option<PathBuf>,

        /// Also write the ranking to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ResultCommand {
    /// Record a player's result for a series
    Add {
        #[command(flatten)]
        series: SeriesArg,

        #[arg(short, long)]
        player: PlayerId,

        #[arg(short = 'P', long, allow_negative_numbers = true)]
        points: i64,

        #[arg(short = 'W', long)]
        won: u32,

        #[arg(short = 'L', long)]
        lost: u32,

        #[arg(short, long, default_value = "")]
        remarks: String,
    },

    /// Change a recorded result
    Update {
        #[command(flatten)]
        series: SeriesArg,

        #[arg(short, long)]
        player: PlayerId,

        #[arg(short = 'P', long, allow_negative_numbers = true)]
        points: Option<i64>,

        #[arg(short = 'W', long)]
        won: Option<u32>,

        #[arg(short = 'L', long)]
        lost: Option<u32>,

        #[arg(short, long)]
        remarks: Option<String>,
    },

    /// Remove a recorded result
    Remove {
        #[command(flatten)]
        series: SeriesArg,

        #[arg(short, long)]
        player: PlayerId,
    },

    /// List results, optionally of a single series
    List {
        #[arg(short, long)]
        series: Option<SeriesId>,
    },
}

#[derive(Subcommand)]
enum EvaluateCommand {
    /// Evaluated rows of every result in every series
    Results {
        /// Also write the rows to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Per-player totals with the per-series breakdown
    Total {
        /// Also write the totals to an Excel file
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let store = CsvStore::open(&cli.data_dir)
        .with_context(|| format!("Failed to open data directory {}", cli.data_dir.display()))?;
    let mut tournament = Tournament::new(store);

    match cli.command {
        Commands::Player(cmd) => player_command(&mut tournament, cmd)?,
        Commands::Series(cmd) => series_command(&mut tournament, cmd)?,
        Commands::Result(cmd) => result_command(&mut tournament, cmd)?,
        Commands::Evaluate(cmd) => evaluate_command(&tournament, cmd)?,
        Commands::Demo { players, series } => {
            tournament
                .populate_demo_data(players, series, &mut rand::rng())
                .context("Failed to add demo data")?;
            println!("Added {} players and {} series", players, series);
        }
    }

    Ok(())
}

fn player_command(tournament: &mut Tournament<CsvStore>, cmd: PlayerCommand) -> Result<()> {
    match cmd {
        PlayerCommand::Add { name, inactive, remarks } => {
            let player = tournament.store_mut().add_player(
                NewPlayer::new(name)
                    .with_active(!inactive)
                    .with_remarks(remarks),
            )?;
            println!("Added player {}", player);
        }
        PlayerCommand::Update { id, name, active, remarks } => {
            let player = tournament
                .store_mut()
                .update_player(id, PlayerUpdate { name, active, remarks })?;
            println!("Updated player {}", player);
        }
        PlayerCommand::Remove { id, cascade } => {
            if cascade {
                tournament.remove_player_cascade(id)?;
            } else {
                tournament.remove_player(id)?;
            }
            println!("Removed player {}", id);
        }
        PlayerCommand::List => {
            let players = tournament.store().all_players()?;
            println!("{:>4}  {:<24} {:<6}  Remarks", "ID", "Name", "Active");
            for p in &players {
                println!(
                    "{:>4}  {:<24} {:<6}  {}",
                    p.id,
                    p.name,
                    if p.active { "yes" } else { "no" },
                    p.remarks
                );
            }
            println!("{} players", players.len());
        }
    }
    Ok(())
}

fn series_command(tournament: &mut Tournament<CsvStore>, cmd: SeriesCommand) -> Result<()> {
    match cmd {
        SeriesCommand::Add { name, date, remarks } => {
            let date = match date {
                Some(s) => parse_date(&s)?,
                None => chrono::Local::now().naive_local(),
            };
            let series = tournament
                .store_mut()
                .add_series(NewSeries::new(name, date).with_remarks(remarks))?;
            println!("Added series {} ({} on {})", series.id, series.name, series.date);
        }
        SeriesCommand::Update { id, name, date, remarks } => {
            let date = date.as_deref().map(parse_date).transpose()?;
            let series = tournament
                .store_mut()
                .update_series(id, SeriesUpdate { name, date, remarks })?;
            println!("Updated series {} ({} on {})", series.id, series.name, series.date);
        }
        SeriesCommand::Remove { id } => {
            tournament.remove_series(id)?;
            println!("Removed series {} with its tables and results", id);
        }
        SeriesCommand::List => {
            let all = tournament.store().all_series()?;
            println!("{:>4}  {:<20} {:<20} {:>7}  Remarks", "ID", "Name", "Date", "Players");
            for s in &all {
                println!(
                    "{:>4}  {:<20} {:<20} {:>7}  {}",
                    s.id,
                    s.name,
                    s.date.format("%Y-%m-%d %H:%M").to_string(),
                    s.player_ids.len(),
                    s.remarks
                );
            }
        }
        SeriesCommand::AddPlayers { series, player_ids } => {
            for &id in &player_ids {
                tournament.store().get_player(id)?;
            }
            let series = tournament
                .store_mut()
                .add_players_to_series(series.series, &player_ids)?;
            println!("Series {} roster: {:?}", series.id, series.player_ids);
        }
        SeriesCommand::RemovePlayers { series, player_ids } => {
            let series = tournament
                .store_mut()
                .remove_players_from_series(series.series, &player_ids)?;
            println!("Series {} roster: {:?}", series.id, series.player_ids);
        }
        SeriesCommand::AddAll { series } => {
            let series = tournament.add_all_players_to_series(series.series)?;
            println!("Series {} roster: {:?}", series.id, series.player_ids);
        }
        SeriesCommand::ClearPlayers { series } => {
            tournament.store_mut().clear_series_players(series.series)?;
            println!("Cleared roster of series {}", series.series);
        }
        SeriesCommand::Shuffle {
            series,
            include,
            include_only,
            exclude,
            inactive_also,
            roster,
        } => {
            let id = series.series;
            let previous = tournament.store().tables_for_series(id)?;
            if !previous.is_empty() {
                println!("Replacing {} existing tables of series {}", previous.len(), id);
            }

            let mut rng = rand::rng();
            if roster {
                tournament.shuffle_series_roster(id, &mut rng)?;
            } else {
                let policy = SelectionPolicy {
                    active_only: !inactive_also,
                    include: include.into_iter().collect(),
                    include_only: include_only.into_iter().collect(),
                    exclude: exclude.into_iter().collect(),
                };
                tournament.shuffle_tables(id, &policy, &mut rng)?;
            }
            print_tables(tournament, id)?;
        }
        SeriesCommand::Tables { series } => {
            print_tables(tournament, series.series)?;
        }
        SeriesCommand::Evaluate {
            series,
            sort_by,
            reverse,
            xlsx,
            csv,
        } => {
            let key: SortKey = sort_by.parse()?;
            let rows = tournament.evaluate_series(series.series)?;
            let standings = rank_rows(&rows, key, reverse);
            let players = tournament.store().all_players()?;

            println!("Series {}", series.series);
            print_standings(&standings, &players);

            if let Some(path) = xlsx {
                let title = format!("Series {}", series.series);
                xlsx::write_evaluation_to_xlsx(&standings, &players, &title, &path)
                    .context("Failed to write Excel file")?;
                println!("Wrote {}", path.display());
            }
            if let Some(path) = csv {
                let rows: Vec<EvaluationRow> = standings.into_iter().map(|s| s.row).collect();
                write_rows_csv(&rows, &players, &path)?;
                println!("Wrote {}", path.display());
            }
        }
    }
    Ok(())
}

fn result_command(tournament: &mut Tournament<CsvStore>, cmd: ResultCommand) -> Result<()> {
    match cmd {
        ResultCommand::Add {
            series,
            player,
            points,
            won,
            lost,
            remarks,
        } => {
            tournament.store().get_series(series.series)?;
            tournament.store().get_player(player)?;
            let result = tournament.store_mut().add_result(
                GameResult::new(series.series, player, points, won, lost).with_remarks(remarks),
            )?;
            println!("Added result {}", result.key());
        }
        ResultCommand::Update {
            series,
            player,
            points,
            won,
            lost,
            remarks,
        } => {
            let result = tournament.store_mut().update_result(
                ResultKey::new(series.series, player),
                ResultUpdate {
                    points,
                    won,
                    lost,
                    remarks,
                },
            )?;
            println!("Updated result {}", result.key());
        }
        ResultCommand::Remove { series, player } => {
            let key = ResultKey::new(series.series, player);
            tournament.store_mut().remove_result(key)?;
            println!("Removed result {}", key);
        }
        ResultCommand::List { series } => {
            let results = match series {
                Some(id) => tournament.store().results_for_series(id)?,
                None => tournament.store().all_results()?,
            };
            println!(
                "{:>6} {:>6} {:>8} {:>4} {:>4}  Remarks",
                "Series", "Player", "Points", "Won", "Lost"
            );
            for r in &results {
                println!(
                    "{:>6} {:>6} {:>8} {:>4} {:>4}  {}",
                    r.series_id, r.player_id, r.points, r.won, r.lost, r.remarks
                );
            }
        }
    }
    Ok(())
}

fn evaluate_command(tournament: &Tournament<CsvStore>, cmd: EvaluateCommand) -> Result<()> {
    let players = tournament.store().all_players()?;

    match cmd {
        EvaluateCommand::Results { csv } => {
            let rows = tournament.evaluate_results()?;
            let mut current = None;
            for row in &rows {
                if current != Some(row.series_id) {
                    println!();
                    println!("Series {}", row.series_id);
                    print_row_header();
                    current = Some(row.series_id);
                }
                print_row(row, &players);
            }
            if let Some(path) = csv {
                write_rows_csv(&rows, &players, &path)?;
                println!("Wrote {}", path.display());
            }
        }
        EvaluateCommand::Total { xlsx } => {
            let totals = tournament.evaluate_total()?;

            for &series_id in &totals.series_ids {
                println!();
                println!("Series {}", series_id);
                print_row_header();
                for row in totals.rows.iter().filter_map(|t| t.per_series.get(&series_id)) {
                    print_row(row, &players);
                }
            }

            println!();
            println!("Total");
            println!(
                "{:<24} {:>7} {:>4} {:>5} {:>7}",
                "Player", "Points", "Won", "Lost", "Score"
            );
            for t in &totals.rows {
                println!(
                    "{:<24} {:>7} {:>4} {:>5} {:>7}",
                    player_label(&players, t.player_id),
                    t.total.points,
                    t.total.won,
                    t.total.lost,
                    t.total.score
                );
            }

            if let Some(path) = xlsx {
                xlsx::write_totals_to_xlsx(&totals, &players, &path)
                    .context("Failed to write Excel file")?;
                println!("Wrote {}", path.display());
            }
        }
    }
    Ok(())
}

/// Accepts `2024-02-04`, `2024-02-04 19:30`, `2024-02-04 19:30:00` and `2024-02-04T19:30:00`
fn parse_date(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date: {}", s))?;
    Ok(date.and_time(NaiveTime::MIN))
}

fn player_label(players: &[Player], id: PlayerId) -> String {
    match players.iter().find(|p| p.id == id) {
        Some(p) => p.to_string(),
        None => format!("<unknown player> ({})", id),
    }
}

fn print_tables(tournament: &Tournament<CsvStore>, series_id: SeriesId) -> Result<()> {
    let tables = tournament.store().tables_for_series(series_id)?;
    let players = tournament.store().all_players()?;

    println!("Series {}: {} tables", series_id, tables.len());
    for table in &tables {
        let seated: Vec<String> = table
            .player_ids()
            .iter()
            .map(|&id| player_label(&players, id))
            .collect();
        println!("  Table {}: {}", table.table_id, seated.join(", "));
    }
    Ok(())
}

fn print_row_header() {
    println!(
        "{:<24} {:>7} {:>4} {:>7} {:>5} {:>8} {:>5} {:>8} {:>9} {:>7}",
        "Player", "Points", "Won", "WonPts", "Lost", "LostPts", "Table", "OppLost", "OppLostPts",
        "Score"
    );
}

fn print_row(row: &EvaluationRow, players: &[Player]) {
    println!(
        "{:<24} {:>7} {:>4} {:>7} {:>5} {:>8} {:>5} {:>8} {:>9} {:>7}",
        player_label(players, row.player_id),
        row.points,
        row.won,
        row.won_points,
        row.lost,
        row.lost_points,
        row.table_size,
        row.opponents_lost,
        row.opponents_lost_points,
        row.score
    );
}

fn print_standings(standings: &[Standing], players: &[Player]) {
    print!("{:>4}  ", "Pos");
    print_row_header();
    for s in standings {
        print!("{:>4}  ", s.position);
        print_row(&s.row, players);
    }
}

fn write_rows_csv(rows: &[EvaluationRow], players: &[Player], path: &Path) -> Result<()> {
    let mut writer = Writer::from_path(path).context("Failed to create output CSV")?;
    writer.write_record([
        "series_id",
        "player_id",
        "player",
        "points",
        "won",
        "won_points",
        "lost",
        "lost_points",
        "table_size",
        "opponents_lost",
        "opponents_lost_points",
        "score",
        "remarks",
    ])?;

    for row in rows {
        let name = players
            .iter()
            .find(|p| p.id == row.player_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        writer.write_record([
            row.series_id.to_string(),
            row.player_id.to_string(),
            name,
            row.points.to_string(),
            row.won.to_string(),
            row.won_points.to_string(),
            row.lost.to_string(),
            row.lost_points.to_string(),
            row.table_size.to_string(),
            row.opponents_lost.to_string(),
            row.opponents_lost_points.to_string(),
            row.score.to_string(),
            row.remarks.clone(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
