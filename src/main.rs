use anyhow::Context;
use clap::Parser;
use emw_convertor::adapters::spreadsheet;
use emw_convertor::config::EtlConfig;
use emw_convertor::utils::error::{EtlError, ErrorSeverity};
use emw_convertor::utils::{logger, validation, validation::Validate};
use emw_convertor::{pipeline_run, Cli, Command, HistoryStore, KnowledgeBase, ProcessArgs};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 載入 TOML 配置，檔案不存在時使用預設值
    let config_exists = Path::new(&cli.config).exists();
    let mut config = if config_exists {
        match EtlConfig::from_file(&cli.config) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        }
    } else {
        EtlConfig::default()
    };

    // 應用命令列覆蓋設定
    if let Command::Process(args) = &cli.command {
        args.apply_to(&mut config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    logger::init_cli_logger(&config.logging, cli.verbose)
        .context("failed to initialize logging")?;

    tracing::info!("🚀 Starting {}", config.pipeline.name);
    if config_exists {
        tracing::info!("📁 Configuration loaded from: {}", cli.config);
    } else {
        tracing::warn!("Config file '{}' not found, using defaults", cli.config);
    }
    if cli.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    match &cli.command {
        Command::Process(args) => process(&config, args).await,
        Command::Stats => show_stats(&config),
        Command::ResetStats => reset_stats(&config),
    }
}

async fn process(config: &EtlConfig, args: &ProcessArgs) -> anyhow::Result<()> {
    let files = match input_files(config, args) {
        Ok(files) => files,
        Err(e) => fail(&e),
    };
    if files.is_empty() {
        tracing::warn!("No valid input files found in {}", config.input.directory);
        println!("⚠️ No valid input files found");
        return Ok(());
    }

    display_config_summary(config, &files);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        println!("🔍 Dry run: {} file(s) would be processed", files.len());
        return Ok(());
    }

    if args.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let knowledge = match KnowledgeBase::from_files(&config.schema.grades_path, &config.schema.coatings_path) {
        Ok(knowledge) => Arc::new(knowledge),
        Err(e) => fail(&e),
    };
    let history = HistoryStore::new(&config.history.path);

    // 逐一處理檔案，記錄最嚴重的錯誤
    let mut worst: Option<ErrorSeverity> = None;
    for file in &files {
        match pipeline_run(config.clone(), knowledge.clone(), file, args.monitor).await {
            Ok(outcome) => {
                let summary = &outcome.summary;
                match &outcome.output_path {
                    Some(path) => {
                        tracing::info!("✅ {} processed successfully!", file);
                        println!("✅ {} -> {}", file, path);
                    }
                    None => println!("⚠️ {}: no output written", file),
                }
                println!(
                    "   {} row(s), {} yellow, {} red ({:.1}% highlighted)",
                    summary.rows_processed,
                    summary.yellow_rows,
                    summary.red_rows,
                    summary.highlighted_percent
                );
                for error in &outcome.errors {
                    println!("   ⚠️ {}", error);
                }

                // 更新處理歷史
                if config.history.enabled {
                    let name = Path::new(file)
                        .file_name()
                        .map(|name| name.to_string_lossy().to_string())
                        .unwrap_or_else(|| file.clone());
                    if let Err(e) = history.save_process_results(
                        &name,
                        &config.pipeline.supplier,
                        &outcome.table,
                        outcome.status,
                    ) {
                        tracing::error!("Error saving process results: {}", e);
                    }
                }
            }
            Err(e) => {
                // 記錄詳細錯誤信息
                tracing::error!(
                    "❌ Processing {} failed: {} (Category: {:?}, Severity: {:?})",
                    file,
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                eprintln!("❌ {}: {}", file, e.user_friendly_message());
                eprintln!("💡 {}", e.recovery_suggestion());
                worst = worst.max(Some(e.severity()));
            }
        }
    }

    logger::flush_file_logs();
    // 根據最嚴重的錯誤決定退出碼
    if let Some(severity) = worst {
        let code = exit_code(severity);
        if code > 0 {
            std::process::exit(code);
        }
    }
    Ok(())
}

fn input_files(config: &EtlConfig, args: &ProcessArgs) -> emw_convertor::Result<Vec<String>> {
    let accepted = &config.input.valid_file_extensions;
    if args.files.is_empty() {
        let paths = spreadsheet::generate_path_list(Path::new(&config.input.directory), accepted)?;
        return Ok(paths
            .iter()
            .map(|path| path.to_string_lossy().to_string())
            .collect());
    }

    let extensions: Vec<&str> = accepted.keys().map(String::as_str).collect();
    validation::validate_file_extensions("files", &args.files, &extensions)?;
    Ok(args.files.clone())
}

fn show_stats(config: &EtlConfig) -> anyhow::Result<()> {
    let stats = HistoryStore::new(&config.history.path)
        .get_dashboard_stats()
        .context("failed to read processing history")?;

    println!("📊 Processing history ({})", config.history.path);
    println!("  Files processed: {}", stats.total_files);
    println!("  Rows processed: {}", stats.total_rows);
    println!("  Unique suppliers: {}", stats.unique_suppliers);
    for (label, counts) in &stats.frequencies {
        let mut top: Vec<(&String, &usize)> = counts.iter().collect();
        top.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let shown: Vec<String> = top
            .iter()
            .take(10)
            .map(|(value, count)| format!("{} ({})", value, count))
            .collect();
        println!("  {}: {}", label, shown.join(", "));
    }
    for record in &stats.history {
        println!(
            "  - {} | {} | {} | {} row(s)",
            record.upload_date, record.supplier, record.filename, record.rows_processed
        );
    }
    Ok(())
}

fn reset_stats(config: &EtlConfig) -> anyhow::Result<()> {
    HistoryStore::new(&config.history.path)
        .reset_database()
        .context("failed to reset processing history")?;
    println!("🗑️ Processing history reset");
    Ok(())
}

fn display_config_summary(config: &EtlConfig, files: &[String]) {
    println!("📋 Configuration Summary:");
    println!("  Pipeline: {}", config.pipeline.name);
    println!("  Supplier: {}", config.pipeline.supplier);
    println!(
        "  Grade column: {}",
        config.columns.grades.as_deref().unwrap_or("-")
    );
    println!(
        "  Dimension column: {}",
        config.columns.dimensions.as_deref().unwrap_or("-")
    );
    println!("  Output: {}", config.load.output_path);
    println!("  Formats: {}", config.load.output_formats.join(", "));
    println!("  Files: {}", files.len());
    for file in files {
        println!("    - {}", file);
    }
    println!();
}

fn fail(e: &EtlError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    logger::flush_file_logs();
    std::process::exit(exit_code(e.severity()).max(1))
}

// 根據錯誤嚴重程度決定退出碼
fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
