mod args;

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use args::{AddTemplateArgs, Cli, Command, ProcessArgs};
use icon_number_scan::annotation::AnnotationReader;
use icon_number_scan::config::AppConfig;
use icon_number_scan::detector::{IconRecognizer, Observation, ProcessedImage};
use icon_number_scan::error::{EngineError, EngineResult};
use icon_number_scan::identity::{IdentityMetadata, IdentityResolver};
use icon_number_scan::imaging;
use icon_number_scan::ocr::{OcrBackend, TextRecognizer};
use icon_number_scan::storage::JsonStore;
use icon_number_scan::template_library::TemplateLibrary;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn run(cli: Cli) -> EngineResult<()> {
    let config = AppConfig::load(&cli.config)?;
    log::debug!("Configuration: {config:?}");

    match cli.command {
        Command::Process(args) => process(&config, args),
        Command::AddTemplate(args) => add_template(&config, args),
        Command::List => list_templates(&config),
        Command::Stats => stats(&config),
        Command::Recent { limit } => recent(&config, limit),
    }
}

fn process(config: &AppConfig, args: ProcessArgs) -> EngineResult<()> {
    let mut store = JsonStore::open(&config.database.path)?;

    // OCR availability is checked once, before any image is touched
    let backend = OcrBackend::from_config(&config.ocr)?;
    println!("🔤 OCR engine: {}", backend.name());
    let reader = AnnotationReader::new(Box::new(backend), config.ocr.preprocess);
    let identities = IdentityResolver::from_identities(store.identities().to_vec());
    let recognizer = Arc::new(IconRecognizer::from_config(config, reader, identities)?);
    println!(
        "🧩 {} template(s) loaded from {:?}",
        recognizer.detector().library().len(),
        config.matching.template_dir
    );

    let rt = tokio::runtime::Runtime::new().map_err(|source| EngineError::Runtime { source })?;
    let results: Vec<(PathBuf, EngineResult<ProcessedImage>)> = rt.block_on(async {
        let handles: Vec<_> = args
            .images
            .iter()
            .cloned()
            .map(|path| {
                let recognizer = Arc::clone(&recognizer);
                let task_path = path.clone();
                (
                    path,
                    tokio::task::spawn_blocking(move || recognizer.process_path(&task_path)),
                )
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (path, handle) in handles {
            let result = handle.await.map_err(EngineError::from).and_then(|r| r);
            results.push((path, result));
        }
        results
    });

    store.replace_identities(recognizer.identities().snapshot());

    let save_viz = config.processing.save_visualizations && !args.no_viz;
    let mut stored = 0usize;
    let mut failed = 0usize;
    let mut unstored = 0usize;
    for (path, result) in results {
        println!("\n🖼️ {}", path.display());
        let processed = match result {
            Ok(processed) => processed,
            Err(e) => {
                println!("  ❌ {e}");
                failed += 1;
                continue;
            }
        };

        println!("  🔍 Found {} icon(s)", processed.observations.len());
        for observation in &processed.observations {
            let detection = &observation.detection;
            let status = if observation.created { "new" } else { "known" };
            println!(
                "  • {} [{status} identity #{}]",
                detection.describe(),
                observation.identity_id
            );
            match &observation.annotation {
                Some(a) => println!(
                    "    📝 '{}' (number: {})",
                    a.text,
                    a.primary_number()
                        .map_or_else(|| "-".to_string(), |n| n.to_string())
                ),
                None => println!("    📝 No text/numbers detected near icon"),
            }
        }

        let (added, rejected) =
            record_observations(&mut store, &processed.observations, &path);
        stored += added;
        unstored += rejected;

        if save_viz && !processed.observations.is_empty() {
            let detections = processed.detections();
            match imaging::save_visualization(
                &processed.image,
                &detections,
                &path,
                &config.processing.visualization_dir,
            ) {
                Ok(out) => println!("  🎨 Visualisation saved to {}", out.display()),
                Err(e) => log::warn!("⚠️ {e}"),
            }
        }
    }

    store.flush()?;
    println!("\n✅ Stored {stored} detection(s) in {:?}", store.path());
    if unstored > 0 {
        println!("⚠️ {unstored} detection(s) could not be stored");
    }
    if failed > 0 {
        println!("⚠️ {failed} image(s) could not be processed");
    }
    Ok(())
}

/// Add one record per observation. A rejected record is logged and counted
/// so the rest of the run still reaches the store. Returns (stored, rejected).
fn record_observations(
    store: &mut JsonStore,
    observations: &[Observation],
    source: &Path,
) -> (usize, usize) {
    let mut stored = 0;
    let mut rejected = 0;
    for observation in observations {
        match store.add_record(observation.to_record(Some(source))) {
            Ok(id) => {
                log::debug!("Stored record #{id}");
                stored += 1;
            }
            Err(e) => {
                log::error!(
                    "❌ Failed to store detection of '{}': {e}",
                    observation.detection.marker_name
                );
                rejected += 1;
            }
        }
    }
    (stored, rejected)
}

fn add_template(config: &AppConfig, args: AddTemplateArgs) -> EngineResult<()> {
    println!("➕ Adding template: {} (category: {})", args.name, args.category);
    let image = imaging::load(&args.image)?;
    let mut library = TemplateLibrary::load(&config.matching.template_dir)?;
    let template = library.add(&image, &args.name, &args.category)?;

    let mut store = JsonStore::open(&config.database.path)?;
    let resolver = IdentityResolver::from_identities(store.identities().to_vec());
    let (id, created) = resolver.resolve(
        &template.fingerprint,
        IdentityMetadata::for_template(template, config.matching.confidence_threshold),
    );
    println!("  💾 Saved to {}", template.path.display());
    store.replace_identities(resolver.snapshot());
    store.flush()?;

    println!("✅ Template registered (identity #{id}, created: {created})");
    Ok(())
}

fn list_templates(config: &AppConfig) -> EngineResult<()> {
    let library = TemplateLibrary::load(&config.matching.template_dir)?;
    if library.is_empty() {
        println!("No templates found in {:?}", library.root());
        return Ok(());
    }

    println!("🧩 {} template(s) in {:?}", library.len(), library.root());
    for (category, templates) in library.grouped() {
        println!("\n{category}:");
        for template in templates {
            println!(
                "  - {} ({}x{}, {})",
                template.name, template.width, template.height, template.fingerprint
            );
        }
    }
    Ok(())
}

fn stats(config: &AppConfig) -> EngineResult<()> {
    let store = JsonStore::open(&config.database.path)?;
    let stats = store.statistics();

    println!("📊 Database statistics ({:?})", store.path());
    println!("  Icons:      {}", stats.total_identities);
    println!("  Detections: {}", stats.total_detections);
    println!("  Categories: {}", stats.categories);
    for (category, count) in &stats.identities_per_category {
        println!("    {category}: {count}");
    }
    Ok(())
}

fn recent(config: &AppConfig, limit: usize) -> EngineResult<()> {
    let store = JsonStore::open(&config.database.path)?;
    let records = store.recent_records(limit);
    if records.is_empty() {
        println!("No detections recorded yet");
        return Ok(());
    }

    println!("🕒 {} most recent detection(s)", records.len());
    for record in records {
        let name = store
            .identity(record.identity_id)
            .map_or("unknown", |i| i.name.as_str());
        let number = record
            .detected_number
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        let source = record
            .source_image
            .as_deref()
            .map_or_else(|| "-".to_string(), |p: &Path| p.display().to_string());
        println!(
            "  #{} {} {name} number={number} at ({},{}) {:.0}% from {source}",
            record.id,
            record.timestamp.date(),
            record.bbox.x,
            record.bbox.y,
            record.confidence * 100.0
        );
    }
    Ok(())
}
