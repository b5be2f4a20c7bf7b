// Roster Sync - command-line front end
//
//   roster-sync init
//   roster-sync load-lookups lookups.json
//   roster-sync import tn_export.xlsx [--source tn-soccer] [--season F24] [--dry-run]
//   roster-sync missing [--season F24] [--out filtered_new_records.xlsx]
//   roster-sync teams [--season F24]
//   roster-sync roster --team 30 --division 20 [--season F24]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};

use roster_sync::{
    import_file, write_affinity_csv, write_affinity_xlsx, AffinityContext, Gateway,
    ImportOptions, ImportOutcome, LookupTables, RosterConfig, Season, SourceKind, SqliteGateway,
};

#[derive(Parser)]
#[command(name = "roster-sync")]
#[command(about = "Reconcile TN Soccer and MTSA registration exports with the players database", long_about = None)]
struct Cli {
    /// Players database (overrides the configured path)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,

    /// Load leagues, seasons, divisions and teams from a JSON file
    LoadLookups { file: PathBuf },

    /// Import a TN Soccer or MTSA export (.xlsx, .xls, .ods or .csv)
    Import {
        file: PathBuf,

        /// tn-soccer or mtsa (detected from the headers when omitted)
        #[arg(short, long)]
        source: Option<SourceKind>,

        /// TN Soccer season code (defaults to the current season)
        #[arg(long)]
        season: Option<String>,

        /// Show what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Export players registered with MTSA but missing from TN Soccer
    Missing {
        #[arg(long)]
        season: Option<String>,

        /// .xlsx or .csv (defaults to the configured file name)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List teams and divisions with registrations in a season
    Teams {
        #[arg(long)]
        season: Option<String>,
    },

    /// List the roster of one team in one division
    Roster {
        #[arg(long)]
        team: i64,

        #[arg(long)]
        division: i64,

        #[arg(long)]
        season: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = RosterConfig::load().context("Failed to load configuration")?;
    let db_path = cli.database.unwrap_or_else(|| config.database_path.clone());

    let mut gateway = SqliteGateway::open(&db_path, &config.actor)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    match cli.command {
        Commands::Init => {
            println!("✓ Database ready at {}", db_path.display());
        }
        Commands::LoadLookups { file } => run_load_lookups(&mut gateway, &file)?,
        Commands::Import {
            file,
            source,
            season,
            dry_run,
        } => {
            let options = ImportOptions {
                source,
                season: config.season_selector(season.as_deref()),
                dry_run,
                tn_min_populated_cells: config.tn_min_populated_cells,
                mtsa_min_populated_cells: config.mtsa_min_populated_cells,
            };
            run_import(&mut gateway, &file, &options)?;
        }
        Commands::Missing { season, out } => {
            let out = out.unwrap_or_else(|| PathBuf::from(&config.export_file_name));
            run_missing(&gateway, &config, season.as_deref(), &out)?;
        }
        Commands::Teams { season } => {
            let season = resolve_season(&gateway, &config, season.as_deref())?;
            let teams = gateway.get_team_divisions(season.id)?;

            println!("📋 {} ({} team/division pairs)", season.name, teams.len());
            for t in &teams {
                println!(
                    "  [{:>4}/{:>4}] {:<24} {:<24} {:>3} players",
                    t.team_id, t.division_id, t.division_name, t.team_name, t.players
                );
            }
        }
        Commands::Roster {
            team,
            division,
            season,
        } => {
            let season = resolve_season(&gateway, &config, season.as_deref())?;
            let roster = gateway.get_roster(season.id, team, division)?;

            println!("📋 {} roster: {} players", season.name, roster.len());
            for entry in &roster {
                println!(
                    "  {:<32} age {:<6} TN# {}",
                    entry.full_name,
                    entry.age.as_deref().unwrap_or("-"),
                    entry.player_id.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}

fn run_load_lookups(gateway: &mut SqliteGateway, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let lookups: LookupTables = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse lookup tables in {}", file.display()))?;

    let loaded = gateway.load_lookups(&lookups)?;
    println!(
        "✓ Loaded {} rows ({} leagues, {} seasons, {} divisions, {} teams)",
        loaded,
        lookups.leagues.len(),
        lookups.seasons.len(),
        lookups.divisions.len(),
        lookups.teams.len()
    );
    Ok(())
}

fn run_import(gateway: &mut SqliteGateway, file: &Path, options: &ImportOptions) -> Result<()> {
    println!("📂 Importing {}...", file.display());

    let mut snapshot = gateway.read_snapshot()?;
    let report = import_file(file, options, &mut snapshot, gateway)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    println!(
        "✓ {} sheet '{}': header at line {}, {} rows read, {} rejected",
        report.source, report.sheet_name, report.header_row, report.rows_parsed, report.rows_rejected
    );

    match &report.outcome {
        ImportOutcome::Planned(plan) => {
            println!("🔍 {}", plan.summary());
            for (player, changes) in &plan.updated_fields {
                let fields: Vec<String> =
                    changes.fields().iter().map(|f| format!("{:?}", f)).collect();
                println!("  ✎ {}: {}", player, fields.join(", "));
            }
            for reason in &plan.duplicate_reasons {
                println!("  ⚠️  {}", reason);
            }
        }
        ImportOutcome::Applied(summary) => {
            println!("✓ Players created: {}", summary.players_created);
            println!("✓ Players updated: {}", summary.players_updated);
            println!("✓ Memberships created: {}", summary.memberships_created);
            println!(
                "✓ Skipped: {} ({} unresolved lookups, {} existing memberships)",
                summary.skipped.total(),
                summary.skipped.lookup_unresolved(),
                summary.skipped.duplicate
            );
            for failure in &summary.failures {
                eprintln!(
                    "❌ Batch '{}' ({} records) failed: {}",
                    failure.batch, failure.records, failure.error
                );
            }
            if !summary.is_clean() {
                bail!("{} batch(es) failed", summary.failures.len());
            }
        }
    }

    Ok(())
}

fn run_missing(
    gateway: &SqliteGateway,
    config: &RosterConfig,
    season: Option<&str>,
    out: &Path,
) -> Result<()> {
    let snapshot = gateway.read_snapshot()?;
    let season = snapshot
        .resolve_season(&config.season_selector(season))
        .cloned()
        .context("Season not found")?;

    let missing = gateway.get_missing_players(season.id)?;
    let context = AffinityContext::for_season(&snapshot, &season);

    let is_csv = out
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        let file =
            File::create(out).with_context(|| format!("Failed to create {}", out.display()))?;
        write_affinity_csv(file, &context, &missing)?;
    } else {
        write_affinity_xlsx(out, &context, &missing)?;
    }

    println!(
        "✓ {} players missing from TN Soccer for {} → {}",
        missing.len(),
        season.name,
        out.display()
    );
    Ok(())
}

fn resolve_season(
    gateway: &SqliteGateway,
    config: &RosterConfig,
    code: Option<&str>,
) -> Result<Season> {
    let selector = config.season_selector(code);
    gateway
        .read_snapshot()?
        .resolve_season(&selector)
        .cloned()
        .with_context(|| format!("Season {:?} not found", selector))
}
