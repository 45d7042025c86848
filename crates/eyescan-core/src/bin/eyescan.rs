//! Command-line front-end: fill in the questionnaire with flags, point at an
//! image, get the report.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use eyescan_core::config::{self, AppConfig};
use eyescan_core::resolver;
use eyescan_core::{
    FormInput, MedicalHistory, RiskFactor, Screening, ScreeningProfile, Symptom, UploadedImage,
};

#[derive(Parser)]
#[command(name = "eyescan", about = "Eye disease screening from a photo and a questionnaire")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen one eye image
    Analyze(AnalyzeArgs),
    /// List the diseases a profile can report
    Diseases {
        /// Built-in profile name or path to a profile file
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    age: u32,
    #[arg(long)]
    gender: String,
    #[arg(long)]
    location: String,
    /// Symptom key, repeatable (e.g. blurry_vision)
    #[arg(long = "symptom")]
    symptoms: Vec<String>,
    /// Risk factor key, repeatable (e.g. sugar, none)
    #[arg(long = "factor")]
    factors: Vec<String>,
    #[arg(long, default_value = "")]
    other_symptoms: String,
    #[arg(long)]
    medications: Option<String>,
    #[arg(long)]
    previous_eye_condition: Option<String>,
    #[arg(long)]
    family_eye_history: Option<String>,
    /// Illness not covered by --factor
    #[arg(long)]
    other_illness: Option<String>,
    /// yes or no
    #[arg(long, value_parser = BoolishValueParser::new())]
    wears_corrective_lenses: Option<bool>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    previous_eye_surgery: Option<bool>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    frequent_eye_strain: Option<bool>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    uses_screens: Option<bool>,
    #[arg(long)]
    screen_hours_per_day: Option<u32>,
    #[arg(long, value_parser = BoolishValueParser::new())]
    smokes_or_drinks: Option<bool>,
    /// Dust, chemical or bright light exposure at work
    #[arg(long, value_parser = BoolishValueParser::new())]
    work_exposure: Option<bool>,
    /// Eye photo (JPEG or PNG)
    #[arg(long)]
    image: PathBuf,
    /// Declared media type; guessed from the file extension when omitted
    #[arg(long)]
    media_type: Option<String>,
    /// Built-in profile name or path to a profile file
    #[arg(long)]
    profile: Option<String>,
    /// Directory to save Eye_Disease_Report.pdf in
    #[arg(long)]
    pdf_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Analyze(args) => analyze(args),
        Commands::Diseases { profile } => list_diseases(profile),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn analyze(args: AnalyzeArgs) -> Result<ExitCode> {
    let mut app_config = AppConfig::from_env().context("failed to read configuration")?;
    if let Some(profile) = &args.profile {
        app_config.profile = profile.clone();
    }
    let screening = Screening::from_config(&app_config).context("failed to start screening")?;

    let input = form_input(&args)?;
    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("failed to read image {}", args.image.display()))?;
    let media_type = args.media_type.unwrap_or_else(|| {
        mime_guess::from_path(&args.image)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string()
    });
    let upload = UploadedImage::new(bytes, media_type);

    let outcome = screening.run(input, Some(&upload));
    println!("{}", outcome.markdown);

    if let Some(dir) = args.pdf_dir {
        if outcome.report.is_some() {
            let path = screening
                .export_pdf(&outcome, &dir)
                .context("failed to save the PDF report")?;
            println!("\nReport saved to {}", path.display());
        }
    }

    if outcome.diagnosis.is_failure() {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn form_input(args: &AnalyzeArgs) -> Result<FormInput> {
    Ok(FormInput {
        name: args.name.clone(),
        age: args.age,
        gender: args.gender.clone(),
        location: args.location.clone(),
        symptoms: parse_symptoms(&args.symptoms)?,
        other_symptoms: args.other_symptoms.clone(),
        risk_factors: parse_factors(&args.factors)?,
        history: MedicalHistory {
            medications: args.medications.clone(),
            previous_eye_condition: args.previous_eye_condition.clone(),
            family_eye_history: args.family_eye_history.clone(),
            other_illness: args.other_illness.clone(),
            wears_corrective_lenses: args.wears_corrective_lenses,
            previous_eye_surgery: args.previous_eye_surgery,
            frequent_eye_strain: args.frequent_eye_strain,
            uses_screens: args.uses_screens,
            screen_hours_per_day: args.screen_hours_per_day,
            smokes_or_drinks: args.smokes_or_drinks,
            work_exposure: args.work_exposure,
        },
    })
}

fn list_diseases(profile: Option<String>) -> Result<ExitCode> {
    let name = profile
        .or_else(|| std::env::var(config::PROFILE_VAR).ok())
        .unwrap_or_else(|| config::DEFAULT_PROFILE.to_string());
    let profile = ScreeningProfile::resolve(&name)
        .with_context(|| format!("failed to load profile {}", name))?;

    println!("Profile: {}", profile.name);
    for entry in profile.diseases.entries() {
        println!("\n{} ({})", entry.display_name(), entry.key);
        println!("  Symptoms: {}", entry.symptoms.join("; "));
        println!("  Precautions: {}", entry.precautions.join("; "));
    }
    for rule in &profile.overrides {
        let forced = resolver::forces_disease(&rule.outcome).unwrap_or("healthy");
        println!("\nOverride: {} -> {}", rule.factor.label(), forced);
    }
    Ok(ExitCode::SUCCESS)
}

fn parse_symptoms(keys: &[String]) -> Result<Vec<Symptom>> {
    keys.iter()
        .map(|key| match Symptom::from_key(key) {
            Some(symptom) => Ok(symptom),
            None => {
                let known: Vec<&str> = Symptom::ALL.iter().map(|s| s.key()).collect();
                bail!("unknown symptom '{}' (expected one of: {})", key, known.join(", "))
            }
        })
        .collect()
}

fn parse_factors(keys: &[String]) -> Result<Vec<RiskFactor>> {
    keys.iter()
        .map(|key| match RiskFactor::from_key(key) {
            Some(factor) => Ok(factor),
            None => {
                let known: Vec<&str> = RiskFactor::ALL.iter().map(|f| f.key()).collect();
                bail!("unknown factor '{}' (expected one of: {})", key, known.join(", "))
            }
        })
        .collect()
}
