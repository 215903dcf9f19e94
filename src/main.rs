use anyhow::Context;
use chrono::Utc;
use charity_cyber_risk::adapters::report::answer_template_csv;
use charity_cyber_risk::config::{Command, ReportFormat};
use charity_cyber_risk::core::{QuestionnaireSource, Storage};
use charity_cyber_risk::utils::{logger, validation::Validate};
use charity_cyber_risk::{
    AssessmentReport, CliConfig, FileQuestionnaire, LocalStorage, QuestionBank, RiskError, ScoringEngine,
    TomlConfig,
};
use clap::Parser;
use std::io::Write;

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        tracing::error!("Suggestion: {}", e.recovery_suggestion());
        eprintln!("{}", e.user_friendly_message());
        std::process::exit(1);
    }

    let Err(err) = run(&config) else {
        return Ok(());
    };

    let Some(e) = err.downcast_ref::<RiskError>() else {
        return Err(err);
    };

    tracing::error!(
        "Assessment failed: {:#} (Category: {:?}, Severity: {:?})",
        err,
        e.category(),
        e.severity()
    );
    eprintln!("{}", e.user_friendly_message());
    eprintln!("Suggestion: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    std::process::exit(e.severity().exit_code());
}

fn run(config: &CliConfig) -> anyhow::Result<()> {
    let storage = LocalStorage::new(".".to_string());
    let source = FileQuestionnaire::new(storage.clone());

    match &config.command {
        Command::Questions { questions } => {
            let bank = load_bank(&source, questions.as_deref())?;
            let template = answer_template_csv(&bank)?;
            std::io::stdout()
                .write_all(template.as_bytes())
                .context("writing answer template to stdout")?;
        }
        Command::Assess {
            answers,
            questions,
            config: config_path,
            format,
            output,
            top,
        } => {
            let settings = match config_path {
                Some(path) => {
                    tracing::info!("Loading scoring configuration from {}", path);
                    TomlConfig::from_file(path).with_context(|| format!("loading configuration {}", path))?
                }
                None => TomlConfig::default(),
            };
            settings.validate()?;

            let configured = settings.questions_path().map(|p| p.to_string_lossy().into_owned());
            let questions = questions.as_deref().or(configured.as_deref());
            let bank = load_bank(&source, questions)?;
            let engine = ScoringEngine::new(bank, settings.scoring_config())?;

            let answers = source
                .load_answers(answers)
                .with_context(|| format!("loading answers from {}", answers))?;

            let result = engine.compute_assessment(&answers, Utc::now())?;
            let improvements = engine.prioritise_improvements(&answers, *top)?;
            tracing::info!(
                "Overall risk {} ({:.1}), worst domain {}",
                result.overall_band,
                result.overall_risk,
                result.worst_domain
            );

            let report = AssessmentReport::new(settings.organisation().map(str::to_string), result, improvements);
            let rendered = match format {
                ReportFormat::Text => report.to_text(),
                ReportFormat::Json => report.to_json()?,
                ReportFormat::Csv => report.to_csv()?,
                ReportFormat::Kv => report.to_key_values(),
            };

            match output {
                Some(path) => {
                    storage.write_file(path, rendered.as_bytes())?;
                    tracing::info!("Report saved to {}", path);
                }
                None => std::io::stdout()
                    .write_all(rendered.as_bytes())
                    .context("writing report to stdout")?,
            }
        }
    }

    Ok(())
}

fn load_bank<Q: QuestionnaireSource>(source: &Q, path: Option<&str>) -> anyhow::Result<QuestionBank> {
    let bank = match path {
        Some(path) => {
            let questions = source
                .load_questions(path)
                .with_context(|| format!("loading question bank {}", path))?;
            QuestionBank::new(questions)?
        }
        None => {
            tracing::debug!("Using the built-in charity question bank");
            QuestionBank::charity_default()
        }
    };
    Ok(bank)
}
