//! Occupational stress CLI
//!
//! Command-line front end for training, prediction and data exploration.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::analysis::{DataAnalyzer, DataSource, CORRELATION_FIELDS};
use crate::config::PipelineConfig;
use crate::export::ArtifactStore;
use crate::features::{FeatureField, RawInput, LABEL_COLUMN};
use crate::inference::{ModelContext, PredictionReport, RiskBand};
use crate::preprocessing::DatasetLoader;
use crate::training::Trainer;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn warn(s: &str) -> ColoredString   { s.truecolor(240, 190, 90) }
fn alert(s: &str) -> ColoredString  { s.truecolor(240, 100, 100) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn band_colored(band: RiskBand) -> ColoredString {
    match band {
        RiskBand::Low => ok(band.label()),
        RiskBand::Medium => warn(band.label()),
        RiskBand::High => alert(band.label()),
    }
}

fn bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "occustress")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Occupational stress risk prediction")]
#[command(long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Select hyperparameters, train the classifier and save the artifacts
    Train {
        /// Labeled survey table (CSV, JSON, or Parquet)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Directory for the classifier and scaler artifacts
        #[arg(short, long)]
        model_dir: Option<PathBuf>,

        /// Fix every random seed for a reproducible run
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Predict the stress risk of one respondent
    Predict {
        /// JSON object with the answers
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        answers: AnswerArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the model's feature importances
    Importance {
        /// Number of features to show
        #[arg(short, long, default_value = "12")]
        top: usize,
    },

    /// Explore a survey table
    Analyze {
        /// Survey table; the demo dataset is used when it cannot be read
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Column to group by
        #[arg(short, long, default_value = "income")]
        group_by: String,

        /// Feature summarized per group
        #[arg(short, long, default_value = "weekly_hours")]
        metric: String,
    },

    /// Inspect a dataset and the artifact status
    Info {
        /// Survey table
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

/// Answers given as flags; they override values read with `--input`
#[derive(Args, Debug, Default, Clone)]
pub struct AnswerArgs {
    #[arg(long)]
    pub age: Option<String>,
    #[arg(long)]
    pub work_years: Option<String>,
    #[arg(long)]
    pub position_years: Option<String>,
    #[arg(long)]
    pub weekly_hours: Option<String>,
    #[arg(long)]
    pub daily_overtime: Option<String>,
    #[arg(long)]
    pub life_satisfaction: Option<String>,
    /// Grade 0-3 or a label such as "moderate"
    #[arg(long)]
    pub fatigue_level: Option<String>,
    /// "low", "medium" or "high"
    #[arg(long)]
    pub income: Option<String>,
    #[arg(long)]
    pub alcohol: Option<String>,
    #[arg(long)]
    pub low_exercise: Option<String>,
    #[arg(long)]
    pub smoking: Option<String>,
    #[arg(long)]
    pub marital_status: Option<String>,
    #[arg(long)]
    pub education: Option<String>,
}

impl AnswerArgs {
    /// Merge the flags into `raw`, overriding existing keys
    pub fn apply(&self, raw: &mut RawInput) {
        let given = [
            (FeatureField::Age.name(), &self.age),
            (FeatureField::WorkYears.name(), &self.work_years),
            (FeatureField::PositionYears.name(), &self.position_years),
            (FeatureField::WeeklyHours.name(), &self.weekly_hours),
            (FeatureField::DailyOvertime.name(), &self.daily_overtime),
            (FeatureField::LifeSatisfaction.name(), &self.life_satisfaction),
            (FeatureField::FatigueLevel.name(), &self.fatigue_level),
            (FeatureField::Income.name(), &self.income),
            (FeatureField::Alcohol.name(), &self.alcohol),
            (FeatureField::LowExercise.name(), &self.low_exercise),
            (FeatureField::Smoking.name(), &self.smoking),
            (FeatureField::MaritalStatus.name(), &self.marital_status),
            ("education", &self.education),
        ];
        for (key, value) in given {
            if let Some(value) = value {
                raw.insert(key, value.clone());
            }
        }
    }
}

/// Configuration from `--config`, or the defaults
pub fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading configuration {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

// ─── Train ─────────────────────────────────────────────────────────────────────

pub fn cmd_train(
    mut config: PipelineConfig,
    data: Option<PathBuf>,
    model_dir: Option<PathBuf>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    if let Some(data) = data {
        config = config.with_data_path(data);
    }
    if let Some(dir) = model_dir {
        config = config.with_model_dir(dir);
    }
    if let Some(seed) = seed {
        config.training = config.training.with_seed(seed);
    }
    config.validate()?;

    section("Training");
    println!("  {}", kv("Data      ", &config.data_path.display().to_string()));
    println!("  {}", kv("Artifacts ", &config.model_dir.display().to_string()));
    println!("  {}", kv("Candidates", &config.training.selection.grid.len().to_string()));
    println!("  {}", kv("Repeats   ", &config.training.selection.n_repeats.to_string()));
    println!();

    let store = ArtifactStore::from_config(&config);
    let trainer = Trainer::new(config.training.clone());

    step_run("Preparing, selecting and fitting");
    let start = Instant::now();
    let run = trainer.train_and_save(&config.data_path, &store)?;
    step_done(&format!("{:.1}s", start.elapsed().as_secs_f64()));

    let prep = &run.preparation;
    section("Data");
    println!("  {}", kv("Rows loaded ", &prep.rows_loaded.to_string()));
    let labels_filled = prep.imputed.get(LABEL_COLUMN).copied().unwrap_or(0);
    println!("  {}", kv("Labels imputed", &labels_filled.to_string()));
    println!("  {}", kv("Oversampled ", &format!("{} ({})", prep.oversampled, prep.sampler)));
    println!("  {}", kv("Classes     ", &format!("{:?} → {:?}", prep.class_counts_before, prep.class_counts_after)));

    let meta = run.classifier.metadata();
    section("Selection");
    println!("  {:<44} {:>10}", muted("Candidate"), muted("Mean F1"));
    println!("  {}", dim(&"─".repeat(56)));
    for candidate in &meta.candidate_scores {
        let marker = if candidate.params == *run.classifier.params() { ok("●") } else { dim("○") };
        println!("  {} {:<42} {:>10.4}", marker, candidate.params.to_string(), candidate.mean_score);
    }

    if let Some(metrics) = run.test_metrics() {
        section("Hold-out evaluation");
        for line in metrics.report().lines() {
            println!("  {}", line);
        }
    }

    println!();
    step_ok(&format!("Saved {}", store.model_path().display()));
    step_ok(&format!("Saved {}", store.scaler_path().display()));
    println!();
    Ok(())
}

// ─── Predict ───────────────────────────────────────────────────────────────────

pub fn cmd_predict(
    config: PipelineConfig,
    input: Option<&Path>,
    answers: &AnswerArgs,
    json: bool,
) -> anyhow::Result<()> {
    let mut raw = match input {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            RawInput::from_json(&text)?
        }
        None => RawInput::new(),
    };
    answers.apply(&mut raw);

    let mut context = ModelContext::new(config);
    let report = context.predict(&raw)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &PredictionReport) {
    let result = &report.result;

    println!();
    line_box_top();
    line_box_center(&format!("{}", "Stress Risk Assessment".white().bold()));
    line_box_sep();
    line_box(&kv("Risk band  ", &band_colored(result.risk_band).to_string()));
    line_box(&kv("Probability", &format!("{:.1}%  {}", result.probability * 100.0, bar(result.probability, 20))));
    line_box(&kv("Confidence ", &format!("{:.1}%", result.confidence * 100.0)));
    line_box(&kv("Prediction ", if result.prediction == 1 { "stressed" } else { "not stressed" }));
    line_box_bottom();

    section("Top features");
    for entry in &report.top_features {
        println!("  {:<20} {} {:.3}", entry.feature, accent(&bar(entry.importance, 24)), entry.importance);
    }

    section("Recommendations");
    for advice in &report.recommendations {
        println!("  {} {}", accent("•"), advice);
    }
    println!();
}

// ─── Importance ────────────────────────────────────────────────────────────────

pub fn cmd_importance(config: PipelineConfig, top: usize) -> anyhow::Result<()> {
    let mut context = ModelContext::new(config);
    let ranked = context.feature_importance()?;

    section("Feature importance");
    let max = ranked.first().map(|(_, w)| *w).unwrap_or(0.0);
    for (i, (feature, weight)) in ranked.iter().take(top).enumerate() {
        let scaled = if max > 0.0 { weight / max } else { 0.0 };
        println!(
            "  {:>2}. {:<20} {} {:.4}",
            i + 1,
            feature,
            accent(&bar(scaled, 24)),
            weight
        );
    }

    if let Some(model) = context.model() {
        let meta = model.classifier.metadata();
        println!();
        println!("  {}", kv("Parameters", &model.classifier.params().to_string()));
        println!("  {}", kv("Trained   ", &meta.trained_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()));
    }
    println!();
    Ok(())
}

// ─── Analyze ───────────────────────────────────────────────────────────────────

pub fn cmd_analyze(
    config: PipelineConfig,
    data: Option<PathBuf>,
    group_by: &str,
    metric: &str,
) -> anyhow::Result<()> {
    let metric = FeatureField::from_name(metric)
        .with_context(|| format!("unknown metric feature '{}'", metric))?;
    let path = data.unwrap_or(config.data_path);
    let (analyzer, source) = DataAnalyzer::from_path_or_demo(&path)?;

    section("Overview");
    match source {
        DataSource::File(file) => println!("  {}", kv("Source      ", &file)),
        DataSource::Demo => println!("  {}", kv("Source      ", &warn("demo dataset").to_string())),
    }
    let overview = analyzer.overview()?;
    let fmt_opt = |v: Option<f64>| v.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string());
    println!("  {}", kv("Samples     ", &overview.n_samples.to_string()));
    println!("  {}", kv("Stress rate ", &format!("{:.1}%", overview.stress_rate * 100.0)));
    println!("  {}", kv("Mean age    ", &fmt_opt(overview.mean_age)));
    println!("  {}", kv("Mean hours  ", &fmt_opt(overview.mean_weekly_hours)));
    println!("  {}", kv("Mean fatigue", &fmt_opt(overview.mean_fatigue)));

    section(&format!("Distribution of {}", metric));
    let dist = analyzer.distribution(metric, 10)?;
    let peak = dist.histogram.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    for bin in &dist.histogram {
        println!(
            "  {:>9.2} – {:<9.2} {} {}",
            bin.lower,
            bin.upper,
            accent(&bar(bin.count as f64 / peak as f64, 24)),
            bin.count
        );
    }
    let s = dist.summary;
    println!(
        "  {}",
        dim(&format!(
            "min {:.2}  q1 {:.2}  median {:.2}  q3 {:.2}  max {:.2}  missing {}",
            s.min, s.q1, s.median, s.q3, s.max, dist.missing
        ))
    );

    section(&format!("{} by {}", metric, group_by));
    println!("  {:<16} {:>10} {:>10} {:>8} {:>12}", muted("Group"), muted("Mean"), muted("Std"), muted("Count"), muted("Stress rate"));
    let stats = analyzer.group_stats(group_by, metric)?;
    let rates = analyzer.stress_rate_by(group_by)?;
    for stat in &stats {
        let rate = rates
            .iter()
            .find(|r| r.group == stat.group)
            .map(|r| format!("{:.1}%", r.stress_rate * 100.0))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<16} {:>10.2} {:>10} {:>8} {:>12}",
            stat.group,
            stat.mean,
            fmt_opt(stat.std),
            stat.count,
            rate
        );
    }

    section("Correlation");
    let corr = analyzer.correlation(&CORRELATION_FIELDS)?;
    print!("  {:<18}", "");
    for field in &corr.fields {
        print!(" {:>8}", abbreviate(field.name()));
    }
    println!();
    for (i, row_field) in corr.fields.iter().enumerate() {
        print!("  {:<18}", row_field.name());
        for j in 0..corr.fields.len() {
            let v = corr.values[[i, j]];
            if v.is_nan() {
                print!(" {:>8}", dim("-"));
            } else {
                print!(" {:>8.2}", v);
            }
        }
        println!();
    }

    section("Insights");
    let insights = analyzer.insights()?;
    if insights.is_empty() {
        println!("  {}", dim("nothing notable"));
    }
    for insight in insights {
        println!("  {} {}", warn("!"), insight);
    }
    println!();
    Ok(())
}

fn abbreviate(name: &str) -> String {
    name.chars().take(8).collect()
}

// ─── Info ──────────────────────────────────────────────────────────────────────

pub fn cmd_info(config: PipelineConfig, data: Option<PathBuf>) -> anyhow::Result<()> {
    let path = data.unwrap_or_else(|| config.data_path.clone());

    section("Data Info");
    let df = DatasetLoader::new().load_frame(&path)?;

    println!("  {:<12} {}", muted("File"), path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    println!("  {:<24} {:<12} {:>6} {:>10}", muted("Column"), muted("Type"), muted("Nulls"), muted("Feature"));
    println!("  {}", dim(&"─".repeat(56)));

    for col in df.get_columns() {
        let feature = FeatureField::from_name(col.name().as_str())
            .map(|f| f.name().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<24} {:<12} {:>6} {:>10}",
            col.name().as_str(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count(),
            feature
        );
    }

    section("Artifacts");
    let store = ArtifactStore::from_config(&config);
    for artifact in [store.model_path(), store.scaler_path()] {
        let status = if artifact.exists() { ok("present") } else { warn("missing") };
        println!("  {:<44} {}", artifact.display(), status);
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_input() {
        let mut raw = RawInput::new().with("age", 30).with("income", "low");
        let answers = AnswerArgs {
            age: Some("45".to_string()),
            education: Some("master".to_string()),
            ..Default::default()
        };
        answers.apply(&mut raw);
        assert_eq!(raw.get("age"), Some(&serde_json::Value::from("45")));
        assert_eq!(raw.get("income"), Some(&serde_json::Value::from("low")));
        assert!(raw.get("education").is_some());
        assert!(raw.get("smoking").is_none());
    }

    #[test]
    fn test_cli_parses_predict_flags() {
        let cli = Cli::try_parse_from([
            "occustress", "--config", "pipeline.json", "predict", "--age", "41", "--json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("pipeline.json")));
        match cli.command {
            Some(Commands::Predict { answers, json, input }) => {
                assert_eq!(answers.age.as_deref(), Some("41"));
                assert!(json);
                assert!(input.is_none());
            }
            _ => panic!("expected predict"),
        }
    }

    #[test]
    fn test_bar_width() {
        assert_eq!(strip_ansi(&bar(0.5, 10)).chars().count(), 10);
        assert_eq!(bar(2.0, 4), "████");
        assert_eq!(bar(-1.0, 4), "░░░░");
    }

    #[test]
    fn test_missing_config_file_fails() {
        assert!(load_config(Some(Path::new("/nonexistent/pipeline.json"))).is_err());
        assert!(load_config(None).is_ok());
    }
}
