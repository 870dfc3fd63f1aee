use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::config::Config;
use crate::diagnostics::DiagnosticSink;
use crate::geocode::{GeocodeResolver, Geocoder, GoogleGeocoder};
use crate::metadata::{self, Extracted, MediaKind};
use crate::pattern::resolve_pattern;
use crate::placement::{self, PlacementResult, Transfer};

/// Counters for one run.
///
/// # Example
///
/// ```rust
/// use photo_mover::pipeline::RunSummary;
/// use photo_mover::placement::PlacementResult;
///
/// let mut summary = RunSummary::default();
/// summary.record(PlacementResult::Copied);
/// summary.record(PlacementResult::Duplicate);
/// assert_eq!(summary.placed(), 1);
/// assert_eq!(summary.duplicates, 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub moved: usize,
    pub copied: usize,
    pub duplicates: usize,
    pub invalid: usize,
    pub skipped: usize,
}

impl RunSummary {
    /// Fold one placement outcome into the counters.
    pub fn record(&mut self, result: PlacementResult) {
        match result {
            PlacementResult::Moved => self.moved += 1,
            PlacementResult::Copied => self.copied += 1,
            PlacementResult::Duplicate => self.duplicates += 1,
            PlacementResult::Invalid => self.invalid += 1,
        }
    }

    /// Files that reached their destination, moved or copied.
    pub fn placed(&self) -> usize {
        self.moved + self.copied
    }

    pub fn total(&self) -> usize {
        self.placed() + self.duplicates + self.invalid + self.skipped
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} moved, {} copied, {} duplicate(s), {} invalid, {} skipped",
            self.moved, self.copied, self.duplicates, self.invalid, self.skipped
        )
    }
}

/// Collect every regular file and symbolic link below `root`, in a stable order.
///
/// Directories are traversed but never returned. Links are not followed; they are
/// returned so a run can report them as skipped. Entries that cannot be read are logged
/// and left out. Collecting up front means files placed inside `root` during the run are
/// not picked up again.
pub fn collect_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() || entry.path_is_symlink() => {
                files.push(entry.into_path())
            }
            Ok(_) => {}
            Err(e) => log::warn!("Skipping unreadable entry: {e}"),
        }
    }

    files
}

/// Classify and extract one file without placing it.
///
/// Returns `Ok(None)` for content that is neither an image nor a video.
pub fn inspect(path: &Path, config: &Config) -> Result<Option<Extracted>> {
    if path.is_symlink() {
        return Ok(None);
    }
    match MediaKind::probe(path)? {
        Some(kind) => metadata::extract(path, kind, config).map(Some),
        None => Ok(None),
    }
}

/// Build the reverse geocoder described by `config`, if geocoding is enabled.
pub fn build_geocoder(config: &Config) -> Option<Arc<dyn Geocoder>> {
    if !config.geocoding.enabled() {
        return None;
    }
    Some(Arc::new(GoogleGeocoder::new(
        config.geocoding.api_key.clone(),
        config.geocoding.endpoint.clone(),
        config.geocoding.language.clone(),
    )))
}

/// Organizes a source tree into a destination tree.
///
/// Each call to [`Organizer::run`] is independent: the geocode cache and counters are
/// created at the start of the run and dropped at its end.
///
/// # Example
///
/// ```rust,no_run
/// use photo_mover::config::Config;
/// use photo_mover::pipeline::Organizer;
/// use std::path::Path;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::load(None)?;
/// let mut organizer = Organizer::new(config);
/// let summary = organizer.run(Path::new("./inbox"), Path::new("./library")).await?;
/// println!("{summary}");
/// # Ok(())
/// # }
/// ```
pub struct Organizer {
    config: Config,
    geocoder: Option<Arc<dyn Geocoder>>,
    sink: DiagnosticSink,
}

impl Organizer {
    /// Create an organizer with the geocoder and diagnostic sink described by `config`.
    pub fn new(config: Config) -> Self {
        let geocoder = build_geocoder(&config);
        let sink = DiagnosticSink::from_config(config.output.debug_file.as_deref());
        Self {
            config,
            geocoder,
            sink,
        }
    }

    /// Use `geocoder` for location lookups instead of the configured one.
    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn with_sink(mut self, sink: DiagnosticSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Organize every file below `source` into `destination`.
    ///
    /// Fails only if `source` does not exist or `destination` cannot be created. Every
    /// other failure is confined to the file it happened on and counted as invalid.
    pub async fn run(&mut self, source: &Path, destination: &Path) -> Result<RunSummary> {
        self.config.validate()?;
        if !source.exists() {
            bail!("Source path does not exist: {}", source.display());
        }
        std::fs::create_dir_all(destination).with_context(|| {
            format!("Failed to create destination {}", destination.display())
        })?;

        let transfer = Transfer::from_move_flag(self.config.move_files);
        let mut resolver = self
            .geocoder
            .clone()
            .map(|g| GeocodeResolver::new(g, self.config.geocoding.precision));
        let mut summary = RunSummary::default();

        let files = collect_files(source);
        log::info!(
            "Found {} file(s) in {} ({:?} mode)",
            files.len(),
            source.display(),
            transfer
        );
        if resolver.is_none() {
            log::debug!("No geocoding API key configured; locations stay empty");
        }

        for (i, path) in files.iter().enumerate() {
            log::info!("[{}/{}] {}", i + 1, files.len(), path.display());
            self.sink.line(&format!("Processing {}", path.display()));

            match self
                .process_file(path, destination, transfer, resolver.as_mut())
                .await
            {
                Ok(Some(result)) => {
                    log::info!("  {result:?}");
                    self.sink.line(&format!("{}: {result:?}", path.display()));
                    summary.record(result);
                }
                Ok(None) => {
                    log::info!("  Skipped");
                    self.sink.line(&format!("{}: skipped", path.display()));
                    summary.skipped += 1;
                }
                Err(e) => {
                    log::error!("  Failed: {e:#}");
                    self.sink.line(&format!("{}: invalid ({e:#})", path.display()));
                    summary.invalid += 1;
                }
            }
        }

        if let Some(resolver) = &resolver {
            log::debug!(
                "Geocoding: {} request(s), {} cached cell(s)",
                resolver.lookups(),
                resolver.cached()
            );
        }
        self.sink.flush();

        Ok(summary)
    }

    /// Extract, geocode, resolve and place one file.
    ///
    /// `Ok(None)` means the file was skipped as unrecognized.
    async fn process_file(
        &mut self,
        path: &Path,
        destination: &Path,
        transfer: Transfer,
        resolver: Option<&mut GeocodeResolver>,
    ) -> Result<Option<PlacementResult>> {
        if path.is_symlink() {
            log::info!("  symbolic link, not followed");
            return Ok(None);
        }
        let Some(kind) = MediaKind::probe(path)? else {
            log::info!("  not an image or video");
            return Ok(None);
        };

        let Extracted {
            mut fields,
            coordinate,
            ..
        } = metadata::extract(path, kind, &self.config)?;

        if let (Some(resolver), Some(coordinate)) = (resolver, coordinate) {
            let location = resolver
                .resolve(coordinate, &mut self.sink)
                .await
                .context("Reverse geocoding failed")?;
            log::debug!("  location '{location}'");
            fields = fields.with_location(location);
        }

        let relative = resolve_pattern(&self.config.pattern, &fields);
        log::debug!("  destination {relative}");

        Ok(Some(placement::place(path, destination, &relative, transfer)))
    }
}
