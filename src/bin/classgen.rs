use clap::Parser;
use openehr_classgen::{ClassGenerator, GeneratorConfig, OperationalTemplate, OptimizerSetting};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "classgen")]
#[command(about = "Compile an openEHR operational template into a class model")]
#[command(version)]
struct Cli {
    /// Operational template in JSON form
    template: PathBuf,
    /// Package used to qualify generated names
    #[arg(short, long)]
    package: Option<String>,
    /// Inline singleton composites (none, sections, all)
    #[arg(long)]
    optimizer: Option<OptimizerSetting>,
    /// Generator configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Write the class model here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::from_path(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(package) = cli.package {
        config = config.with_package_name(package);
    }
    if let Some(optimizer) = cli.optimizer {
        config = config.with_optimizer_setting(optimizer);
    }

    let template = OperationalTemplate::from_path(&cli.template)?;
    let result = ClassGenerator::new(config).generate(&template)?;

    if result.has_warnings() {
        eprintln!("{} warning(s):", result.warnings.len());
        for warning in &result.warnings {
            eprintln!("  {warning}");
        }
    }
    eprintln!(
        "{}: {} entities, {} choices, {} variants, {} enums ({} reused classes, {} closed cycles)",
        result.template_id,
        result.stats.entities,
        result.stats.choices,
        result.stats.variants,
        result.stats.enums,
        result.stats.reused_classes,
        result.stats.closed_cycles
    );

    let json = result.to_json(cli.pretty)?;
    match cli.output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}
