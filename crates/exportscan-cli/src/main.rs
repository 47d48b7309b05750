//! exportscan - Report exported Android components from aapt manifest dumps
//!
//! This tool reads the text printed by `aapt dump xmltree <apk>
//! AndroidManifest.xml` (or runs aapt itself) and reports which activities,
//! services, receivers and providers other applications can reach.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use exportscan_core::manifest::ComponentRef;
use exportscan_core::{
    extract_component_export_info, DumpSource, Error as CoreError, ExtractionOutcome,
    FileDumpSource, LinkStats, ManifestMetadata, ManifestParser, StaticDump,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// File extensions treated as saved dumps in directory mode
const DUMP_EXTENSIONS: [&str; 2] = ["txt", "xmltree"];

/// Report exported Android components from aapt manifest dumps
#[derive(Parser, Debug)]
#[command(name = "exportscan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Metadata JSON providing the target SDK and known component names
    #[arg(short, long)]
    metadata: Option<PathBuf>,

    /// Target SDK version (overrides the metadata document)
    #[arg(short, long)]
    target_sdk: Option<u32>,

    /// aapt executable used with --apk
    #[arg(long, env = "AAPT", default_value = "aapt")]
    aapt: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Only report components that are exported
    #[arg(long)]
    exported_only: bool,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Saved `aapt dump xmltree` output
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Directory of saved dumps (*.txt, *.xmltree) to process
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// APK to dump with aapt
    #[arg(short, long)]
    apk: Option<PathBuf>,
}

/// Output format for the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One line per component
    Text,
    /// The metadata document as JSON
    Json,
}

/// Runs `aapt dump xmltree <apk> AndroidManifest.xml`
struct AaptDumpSource {
    aapt: PathBuf,
    apk: PathBuf,
}

impl AaptDumpSource {
    fn new(aapt: impl Into<PathBuf>, apk: impl Into<PathBuf>) -> Self {
        Self {
            aapt: aapt.into(),
            apk: apk.into(),
        }
    }
}

impl DumpSource for AaptDumpSource {
    fn dump(&self) -> exportscan_core::Result<String> {
        debug!(
            "Running {} dump xmltree {} AndroidManifest.xml",
            self.aapt.display(),
            self.apk.display()
        );

        let output = Command::new(&self.aapt)
            .args(["dump", "xmltree"])
            .arg(&self.apk)
            .arg("AndroidManifest.xml")
            .output()
            .map_err(|e| CoreError::dump_unavailable(self.describe(), e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::dump_unavailable(
                self.describe(),
                format!("{} ({})", output.status, stderr.trim()),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn describe(&self) -> String {
        format!("aapt ({})", self.apk.display())
    }
}

/// Tracks processed dumps for deduplication
#[derive(Default)]
struct DumpRegistry {
    /// Maps content hash -> (first source path, its result)
    seen: HashMap<String, (PathBuf, ManifestMetadata)>,
    /// Statistics
    stats: RegistryStats,
}

#[derive(Default)]
struct RegistryStats {
    total_found: usize,
    duplicates_skipped: usize,
    parsed: usize,
    failed: usize,
}

impl DumpRegistry {
    fn new() -> Self {
        Self::default()
    }

    /// Compute a short hash of the content (first 8 chars of blake3)
    fn content_hash(content: &str) -> String {
        let hash = blake3::hash(content.as_bytes());
        hash.to_hex()[..8].to_string()
    }

    /// Returns the earlier source and result for identical content
    fn lookup(&self, content_hash: &str) -> Option<&(PathBuf, ManifestMetadata)> {
        self.seen.get(content_hash)
    }

    /// Record the result for a content hash, keeping the first source
    fn register(&mut self, content_hash: &str, source: &Path, metadata: &ManifestMetadata) {
        self.seen
            .entry(content_hash.to_string())
            .or_insert_with(|| (source.to_path_buf(), metadata.clone()));
    }

    fn print_summary(&self) {
        info!(
            "Summary: {} found, {} duplicates skipped, {} parsed, {} failed",
            self.stats.total_found,
            self.stats.duplicates_skipped,
            self.stats.parsed,
            self.stats.failed
        );
    }
}

/// One processed input and its resolved metadata
struct Report {
    source: PathBuf,
    duplicate_of: Option<PathBuf>,
    metadata: ManifestMetadata,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Dispatch based on input mode
    let output = if let Some(ref dump) = cli.input.dump {
        process_dump_file(&cli, dump)?
    } else if let Some(ref apk) = cli.input.apk {
        process_apk(&cli, apk)?
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, directory)?
    } else {
        bail!("One of --dump, --apk or --directory must be specified")
    };

    write_output(cli.output.as_deref(), &output)
}

/// Builds the starting metadata document from --metadata and --target-sdk
fn base_metadata(cli: &Cli) -> Result<ManifestMetadata> {
    let mut metadata = match cli.metadata {
        Some(ref path) => ManifestMetadata::from_file(path)
            .with_context(|| format!("Failed to load metadata: {}", path.display()))?,
        None => ManifestMetadata::default(),
    };

    if let Some(target_sdk) = cli.target_sdk {
        metadata.uses_target_sdk_version = target_sdk.to_string();
    }
    if metadata.uses_target_sdk_version.is_empty() {
        warn!("No target SDK given, assuming 0");
    }

    Ok(metadata)
}

/// Process a single saved dump
fn process_dump_file(cli: &Cli, file: &Path) -> Result<String> {
    if !file.exists() {
        bail!("Dump file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Dump path is not a file: {}", file.display());
    }

    let mut metadata = base_metadata(cli)?;
    let outcome = extract_component_export_info(
        &FileDumpSource::new(file),
        &mut metadata,
        &ManifestParser::new(),
    );
    if let ExtractionOutcome::FailClosed { reason } = outcome {
        bail!("Failed to read dump {}: {}", file.display(), reason);
    }

    render(
        cli,
        &[Report {
            source: file.to_path_buf(),
            duplicate_of: None,
            metadata,
        }],
    )
}

/// Dump an APK with aapt and process the result
fn process_apk(cli: &Cli, apk: &Path) -> Result<String> {
    if !apk.is_file() {
        bail!("APK does not exist: {}", apk.display());
    }

    let mut metadata = base_metadata(cli)?;
    let source = AaptDumpSource::new(&cli.aapt, apk);
    let outcome = extract_component_export_info(&source, &mut metadata, &ManifestParser::new());
    if let ExtractionOutcome::FailClosed { reason } = outcome {
        warn!(
            "aapt failed for {}, reporting every known component as not exported: {}",
            apk.display(),
            reason
        );
    }

    render(
        cli,
        &[Report {
            source: apk.to_path_buf(),
            duplicate_of: None,
            metadata,
        }],
    )
}

/// Process a directory of saved dumps recursively
fn process_directory(cli: &Cli, directory: &Path) -> Result<String> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let base = base_metadata(cli)?;
    let parser = ManifestParser::new();
    let mut registry = DumpRegistry::new();
    let mut reports = Vec::new();

    // Walk in a stable order so reports are reproducible
    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        // Skip directories
        if !path.is_file() {
            continue;
        }

        // Skip hidden files
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            continue;
        }

        if !is_dump_file(path) {
            trace!("Skipping non-dump file: {}", path.display());
            continue;
        }

        debug!("Processing dump: {}", path.display());
        match process_entry(path, &base, &parser, &mut registry) {
            Ok(report) => reports.push(report),
            Err(e) => {
                // Log error but continue with other files
                warn!("Error processing {}: {}", path.display(), e);
                registry.stats.failed += 1;
            }
        }
    }

    info!("Processed {} dumps", reports.len());
    registry.print_summary();

    render(cli, &reports)
}

/// Returns true if the path has one of the saved-dump extensions
fn is_dump_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| DUMP_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Parse one dump of a directory walk, reusing the result of identical content
fn process_entry(
    path: &Path,
    base: &ManifestMetadata,
    parser: &ManifestParser,
    registry: &mut DumpRegistry,
) -> Result<Report> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dump: {}", path.display()))?;
    registry.stats.total_found += 1;

    let content_hash = DumpRegistry::content_hash(&text);
    if let Some((first, metadata)) = registry.lookup(&content_hash) {
        info!(
            "{} is identical to {} (hash: {})",
            path.display(),
            first.display(),
            content_hash
        );
        let report = Report {
            source: path.to_path_buf(),
            duplicate_of: Some(first.clone()),
            metadata: metadata.clone(),
        };
        registry.stats.duplicates_skipped += 1;
        return Ok(report);
    }

    let mut metadata = base.clone();
    extract_component_export_info(&StaticDump::new(text), &mut metadata, parser);
    registry.register(&content_hash, path, &metadata);
    registry.stats.parsed += 1;

    Ok(Report {
        source: path.to_path_buf(),
        duplicate_of: None,
        metadata,
    })
}

/// Drops every component that is not exported
fn retain_exported(metadata: &mut ManifestMetadata) {
    metadata.activities.retain(|c| c.exported);
    metadata.services.retain(|c| c.exported);
    metadata.broadcast_receivers.retain(|c| c.exported);
    metadata.content_providers.retain(|p| p.exported);
}

/// Render reports in the requested format
fn render(cli: &Cli, reports: &[Report]) -> Result<String> {
    let single = reports.len() == 1 && cli.input.directory.is_none();
    let documents = reports.iter().map(|report| {
        let mut metadata = report.metadata.clone();
        if cli.exported_only {
            retain_exported(&mut metadata);
        }
        (report, metadata)
    });

    match cli.format {
        OutputFormat::Json => {
            if single {
                let (_, metadata) = documents
                    .into_iter()
                    .next()
                    .context("No report to render")?;
                return Ok(metadata.to_json_pretty()?);
            }

            let mut map = Map::new();
            for (report, metadata) in documents {
                let value = serde_json::to_value(&metadata)
                    .context("Failed to serialize metadata")?;
                map.insert(report.source.display().to_string(), value);
            }
            Ok(serde_json::to_string_pretty(&Value::Object(map))
                .context("Failed to serialize report")?)
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for (report, metadata) in documents {
                if !single {
                    match report.duplicate_of {
                        Some(ref first) => out.push_str(&format!(
                            "# {} (duplicate of {})\n",
                            report.source.display(),
                            first.display()
                        )),
                        None => out.push_str(&format!("# {}\n", report.source.display())),
                    }
                }
                out.push_str(&render_text(&metadata));
            }
            Ok(out)
        }
    }
}

/// One line per component, then link totals
fn render_text(metadata: &ManifestMetadata) -> String {
    let components = metadata.components();
    let mut out = String::new();

    for component in components.iter() {
        let detail = match component {
            ComponentRef::Filtered(_, info) => {
                format!("filters={}", info.intent_filters.len())
            }
            ComponentRef::Provider(info) => {
                format!("authorities={}", info.authorities.join(";"))
            }
        };
        out.push_str(&format!(
            "{} {} exported={} {}\n",
            component.kind(),
            component.name(),
            component.exported(),
            detail
        ));
    }

    let links = LinkStats::collect(&components);
    out.push_str(&format!(
        "deep links: {}, app links: {}\n",
        links.deep_link_count(),
        links.app_link_count()
    ));
    out
}

/// Write the report to a file, or to stdout
fn write_output(path: Option<&Path>, output: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
            fs::write(path, output).map_err(|e| CoreError::file_write(path, e))?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", output),
    }
    Ok(())
}
