//! Subcommand implementations.

use std::{
  fmt::Write as _,
  io::{self, Read},
  path::Path,
};

use anyhow::{Context, Result};
use canopy_core::{
  action::{ActionType, ClimateAction},
  hazard::{self, HazardIndicatorRow, ScoredRow},
  ranking,
  resilience::{self, ResilienceAnswers},
  store::ObjectStore,
};
use canopy_ranking::{RankingCoordinator, RankingRepository, RankingSnapshot};
use clap::Subcommand;

/// Operations on a stored ranking.
#[derive(Subcommand, Debug)]
pub enum RankingCommand {
  /// Print the stored ranking for a city.
  Show {
    #[arg(long)]
    city:        String,
    #[arg(long = "type", value_name = "mitigation|adaptation")]
    action_type: ActionType,
  },
  /// Give an upstream action list its first ranking and store it.
  Seed {
    #[arg(long)]
    city:        String,
    #[arg(long = "type", value_name = "mitigation|adaptation")]
    action_type: ActionType,
    /// JSON array of actions; `-` reads stdin.
    #[arg(short, long, value_name = "FILE")]
    input:       std::path::PathBuf,
  },
  /// Move one action and save the new order.
  Move {
    #[arg(long)]
    city:        String,
    #[arg(long = "type", value_name = "mitigation|adaptation")]
    action_type: ActionType,
    /// Current 0-based position of the action.
    #[arg(long)]
    from:        usize,
    /// Target 0-based position.
    #[arg(long)]
    to:          usize,
  },
}

fn read_input(path: &Path) -> Result<String> {
  if path == Path::new("-") {
    let mut buf = String::new();
    io::stdin()
      .read_to_string(&mut buf)
      .context("reading stdin")?;
    return Ok(buf);
  }
  std::fs::read_to_string(path)
    .with_context(|| format!("reading input file {}", path.display()))
}

// ─── Scoring ─────────────────────────────────────────────────────────────────

pub fn score(input: &Path, table: bool) -> Result<()> {
  let rows: Vec<HazardIndicatorRow> =
    serde_json::from_str(&read_input(input)?).context("parsing hazard rows")?;
  let scored = hazard::score_hazard_rows(&rows);

  let incomplete = scored.iter().filter(|r| !r.is_complete()).count();
  if incomplete > 0 {
    tracing::warn!(incomplete, total = scored.len(), "rows with missing indicators");
  }

  if table {
    print!("{}", render_scored_table(&scored));
  } else {
    println!("{}", serde_json::to_string_pretty(&scored)?);
  }
  Ok(())
}

fn fmt_score(value: Option<f64>) -> String {
  match value {
    Some(v) if v.is_finite() => format!("{v:.3}"),
    _ => "n/a".to_owned(),
  }
}

fn render_scored_table(rows: &[ScoredRow]) -> String {
  let mut out = format!(
    "{:<20} {:<6} {:<24} {:<16} {:>13} {:>7}  {}\n",
    "city", "year", "sector", "hazard", "vulnerability", "risk", "level"
  );
  for r in rows {
    let level = r
      .risk_level
      .map_or_else(|| "n/a".to_owned(), |l| l.to_string());
    let _ = writeln!(
      out,
      "{:<20} {:<6} {:<24} {:<16} {:>13} {:>7}  {}",
      r.row.city,
      r.row.year,
      r.row.sector,
      r.row.hazard,
      fmt_score(r.vulnerability_score),
      fmt_score(r.risk_score),
      level,
    );
  }
  out
}

pub fn resilience(input: &Path) -> Result<()> {
  let answers: ResilienceAnswers = serde_json::from_str(&read_input(input)?)
    .context("parsing questionnaire answers")?;
  let assessment = resilience::assess_resilience(&answers)?;
  println!("{}", serde_json::to_string_pretty(&assessment)?);
  Ok(())
}

// ─── Rankings ────────────────────────────────────────────────────────────────

pub async fn run_ranking<S: ObjectStore>(
  repository: RankingRepository<S>,
  command: RankingCommand,
) -> Result<()> {
  match command {
    RankingCommand::Show { city, action_type } => {
      let coordinator = RankingCoordinator::new(repository);
      let snapshot = coordinator
        .select(&city, action_type)
        .await
        .with_context(|| format!("loading {action_type} ranking for {city}"))?;
      print!("{}", render_ranking(&snapshot));
    }
    RankingCommand::Seed { city, action_type, input } => {
      let actions: Vec<ClimateAction> = serde_json::from_str(&read_input(&input)?)
        .context("parsing climate actions")?;
      let actions = ranking::normalize(actions);
      repository
        .commit_ranking(&city, action_type, &actions)
        .await
        .with_context(|| format!("storing {action_type} ranking for {city}"))?;
      tracing::info!(%city, %action_type, actions = actions.len(), "seeded ranking");
    }
    RankingCommand::Move { city, action_type, from, to } => {
      let coordinator = RankingCoordinator::new(repository);
      coordinator
        .select(&city, action_type)
        .await
        .with_context(|| format!("loading {action_type} ranking for {city}"))?;
      coordinator.begin_reorder()?;
      coordinator.move_action(from, to)?;
      let snapshot = coordinator
        .save()
        .await
        .with_context(|| format!("saving {action_type} ranking for {city}"))?;
      print!("{}", render_ranking(&snapshot));
    }
  }
  Ok(())
}

fn render_ranking(snapshot: &RankingSnapshot) -> String {
  let mut out = format!(
    "{}: {} ({} actions)\n",
    snapshot.city,
    snapshot.action_type,
    snapshot.actions.len()
  );
  for action in snapshot.actions.iter() {
    let priority = action
      .priority()
      .map_or_else(|| "-".to_owned(), |p| p.to_string());
    let _ = writeln!(
      out,
      "{priority:>4}  {:<16} {}",
      action.action_id(),
      action.action_name()
    );
  }
  out
}
