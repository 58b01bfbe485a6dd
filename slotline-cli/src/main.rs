use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use slotline_core::{
    BulkScheduleRequest, BulkScheduler, CandidateStore, GroupReassignRequest, GroupReassigner,
    MonotonicAllocator, Stage, StageStatus, StageUpdate, group_view, list_groups, update_stage,
};
use slotline_ingest::{import_roster, parse_roster_csv};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

mod config;
mod state;

use config::{load_config, parse_rest_day};
use state::JsonFileStore;

#[derive(Parser, Debug)]
#[command(
    name = "slotline",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SLOTLINE_BUILD_SHA"), ")"),
    about = "Batch and time-slot scheduling for a three-stage candidate pipeline"
)]
struct Cli {
    /// Print results as JSON instead of text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default ~/.slotline/config.toml
    Init,

    /// Import candidates from a roster CSV
    Import {
        #[arg(long)]
        csv: PathBuf,
    },

    /// List candidates (optionally one group)
    List {
        #[arg(long)]
        group: Option<u32>,
    },

    /// Partition candidates into batches and schedule their stages
    Schedule {
        /// Comma-separated candidate emails
        #[arg(long, value_delimiter = ',')]
        emails: Vec<String>,

        /// Schedule every candidate without a group
        #[arg(long, default_value_t = false, conflicts_with = "emails")]
        ungrouped: bool,

        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start_date: NaiveDate,

        #[arg(long)]
        batch_size: Option<usize>,

        /// Daily start "HH:MM"
        #[arg(long)]
        start_time: Option<String>,

        /// Daily end "HH:MM"
        #[arg(long)]
        end_time: Option<String>,

        /// Minutes per stage
        #[arg(long)]
        stage_duration: Option<u32>,

        /// Weekday to skip, or "none"
        #[arg(long)]
        rest_day: Option<String>,

        /// Fixed shuffle seed
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Move candidates into an existing, fully scheduled group
    Reassign {
        #[arg(long, value_delimiter = ',', required = true)]
        emails: Vec<String>,

        #[arg(long)]
        group: u32,

        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Show a group's members and stage times
    ShowGroup { group: u32 },

    /// Set one stage's status/time/remarks for a candidate
    UpdateStage {
        #[arg(long)]
        id: String,

        #[arg(long, value_enum)]
        stage: StageArg,

        #[arg(long, value_enum)]
        status: StatusArg,

        /// RFC3339 date-time
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        #[arg(long)]
        remarks: Option<String>,

        /// Comma-separated domains to add
        #[arg(long, value_delimiter = ',')]
        domains: Vec<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum StageArg {
    Screening,
    Gd,
    Interview,
}

impl From<StageArg> for Stage {
    fn from(s: StageArg) -> Self {
        match s {
            StageArg::Screening => Stage::Screening,
            StageArg::Gd => Stage::GroupDiscussion,
            StageArg::Interview => Stage::Interview,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum StatusArg {
    NotStarted,
    Pending,
    Scheduled,
    InProgress,
    Completed,
    Selected,
    Rejected,
}

impl From<StatusArg> for StageStatus {
    fn from(s: StatusArg) -> Self {
        match s {
            StatusArg::NotStarted => StageStatus::NotStarted,
            StatusArg::Pending => StageStatus::Pending,
            StatusArg::Scheduled => StageStatus::Scheduled,
            StatusArg::InProgress => StageStatus::InProgress,
            StatusArg::Completed => StageStatus::Completed,
            StatusArg::Selected => StageStatus::Selected,
            StatusArg::Rejected => StageStatus::Rejected,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.json;

    match cli.command {
        Command::Init => {
            let (path, written) = config::init_config()?;
            if written {
                println!("Wrote {}", path.display());
            } else {
                println!("Config already exists: {}", path.display());
            }
        }

        Command::Import { csv } => {
            if !csv.exists() {
                bail!("CSV not found: {}", csv.display());
            }
            let rows = parse_roster_csv(&csv)?;
            let store = JsonFileStore::open_default()?;
            let summary = import_roster(&store, rows)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Imported {} candidates into {}", summary.imported.len(), store.path().display());
                for s in &summary.skipped {
                    println!("- skipped row {} ({}): {}", s.row, s.email, s.reason);
                }
            }
        }

        Command::List { group } => {
            let store = JsonFileStore::open_default()?;
            let mut all = store.find_all()?;
            if let Some(g) = group {
                all.retain(|c| c.group_number == Some(g));
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else {
                for c in &all {
                    let group = c.group_number.map(|g| g.to_string()).unwrap_or_else(|| "-".to_string());
                    println!(
                        "{} | {} | {} | group {} | {:?}/{:?}/{:?}",
                        c.id, c.name, c.email, group, c.screening.status, c.group_discussion.status, c.interview.status
                    );
                }
                println!("\n{} candidates", all.len());
            }
        }

        Command::Schedule {
            emails,
            ungrouped,
            start_date,
            batch_size,
            start_time,
            end_time,
            stage_duration,
            rest_day,
            seed,
            timeout_secs,
        } => {
            let cfg = load_config()?;
            let sched = &cfg.schedule;
            let store = JsonFileStore::open_default()?;

            let emails = if ungrouped {
                store
                    .find_all()?
                    .into_iter()
                    .filter(|c| c.group_number.is_none())
                    .map(|c| c.email)
                    .collect()
            } else {
                emails
            };
            if emails.is_empty() {
                bail!("no candidates given (pass --emails or --ungrouped)");
            }

            let request = BulkScheduleRequest {
                emails,
                batch_size: batch_size.unwrap_or(sched.batch_size),
                start_date,
                start_time: start_time.unwrap_or_else(|| sched.start_time.clone()),
                end_time: end_time.unwrap_or_else(|| sched.end_time.clone()),
                stage_duration: stage_duration.unwrap_or(sched.stage_duration_minutes),
            };
            let timezone = sched.timezone()?;
            let rest_day = match rest_day {
                Some(s) => parse_rest_day(&s)?,
                None => sched.rest_day()?,
            };
            let seed = seed.or(cfg.engine.seed);
            let deadline = deadline_from(timeout_secs.or(cfg.engine.timeout_secs));

            let response = tokio::task::spawn_blocking(move || {
                let allocator = MonotonicAllocator::seeded_from(&store)?;
                let mut scheduler = BulkScheduler::new(&store, &allocator);
                if let Some(seed) = seed {
                    scheduler = scheduler.with_seed(seed);
                }
                if let Some(d) = deadline {
                    scheduler = scheduler.with_deadline(d);
                }
                let response = scheduler.schedule_request(&request, timezone, rest_day)?;
                anyhow::Ok(response)
            })
            .await
            .context("scheduler task panicked")??;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!(
                    "Scheduled {} candidates in {} batches\n",
                    response.total_scheduled, response.total_batches
                );
                for b in &response.batches {
                    println!(
                        "Batch {} | group {} | {} | {} / {} / {} | {}",
                        b.batch_number,
                        b.group_number,
                        b.date,
                        b.stage1,
                        b.stage2,
                        b.stage3,
                        b.members.join(", ")
                    );
                }
                print_failed(response.failed.iter().map(|f| (&f.email, &f.reason)));
            }
        }

        Command::Reassign {
            emails,
            group,
            timeout_secs,
        } => {
            let cfg = load_config()?;
            let store = JsonFileStore::open_default()?;
            let deadline = deadline_from(timeout_secs.or(cfg.engine.timeout_secs));
            let request = GroupReassignRequest {
                emails,
                target_group_number: group,
            };

            let response = tokio::task::spawn_blocking(move || {
                let mut reassigner = GroupReassigner::new(&store);
                if let Some(d) = deadline {
                    reassigner = reassigner.with_deadline(d);
                }
                anyhow::Ok(reassigner.reassign_request(&request)?)
            })
            .await
            .context("reassign task panicked")??;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                let t = response.scheduling_times;
                println!(
                    "Moved {} candidates into group {} ({} / {} / {})",
                    response.updated.len(),
                    response.target_group_number,
                    t.stage1.to_rfc3339(),
                    t.stage2.to_rfc3339(),
                    t.stage3.to_rfc3339()
                );
                print_failed(response.failed.iter().map(|f| (&f.email, &f.reason)));
            }
        }

        Command::ShowGroup { group } => {
            let store = JsonFileStore::open_default()?;
            let Some(view) = group_view(&store, group)? else {
                bail!("group {group} has no members");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("Group {} ({} members)", view.group_number, view.members.len());
                match view.times {
                    Some(t) => println!(
                        "Stages: {} / {} / {}",
                        t.stage1.to_rfc3339(),
                        t.stage2.to_rfc3339(),
                        t.stage3.to_rfc3339()
                    ),
                    None => println!("Stages: incomplete"),
                }
                for m in &view.members {
                    println!("- {m}");
                }
                let total = list_groups(&store)?.len();
                println!("\n{total} groups in store");
            }
        }

        Command::UpdateStage {
            id,
            stage,
            status,
            at,
            remarks,
            domains,
        } => {
            let store = JsonFileStore::open_default()?;
            let update = StageUpdate {
                status: status.into(),
                scheduled_at: at,
                remarks,
                domains: if domains.is_empty() { None } else { Some(domains) },
            };
            let candidate = update_stage(&store, &id, stage.into(), update)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&candidate)?);
            } else {
                println!("Updated {} ({})", candidate.id, candidate.email);
            }
        }
    }

    Ok(())
}

fn deadline_from(timeout_secs: Option<u64>) -> Option<Instant> {
    timeout_secs.map(|s| Instant::now() + Duration::from_secs(s))
}

fn print_failed<'a>(failed: impl Iterator<Item = (&'a String, &'a String)>) {
    let failed: Vec<_> = failed.collect();
    if failed.is_empty() {
        return;
    }
    println!("\nFailed ({}):", failed.len());
    for (email, reason) in failed {
        println!("- {email}: {reason}");
    }
}
