use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Append-only line sink for diagnostic output.
///
/// Receives per-file trace lines and one `"{lat}, {lng}, {place}"` line per geocode
/// resolution. When no path is configured every write is discarded. Write failures are
/// logged and otherwise ignored; the sink never fails a run.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    writer: Option<BufWriter<File>>,
}

impl DiagnosticSink {
    /// A sink that discards everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Open `path` for appending, creating it if needed.
    ///
    /// If the file cannot be opened a warning is logged and the sink is disabled.
    pub fn open(path: &Path) -> Self {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Self {
                writer: Some(BufWriter::new(file)),
            },
            Err(e) => {
                log::warn!(
                    "Cannot open debug file {}: {e}. Diagnostics disabled.",
                    path.display()
                );
                Self::disabled()
            }
        }
    }

    /// Build from an optional configured path.
    pub fn from_config(path: Option<&str>) -> Self {
        match path {
            Some(p) if !p.trim().is_empty() => Self::open(Path::new(p)),
            _ => Self::disabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Append one line.
    pub fn line(&mut self, message: &str) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writeln!(writer, "{message}") {
                log::debug!("Diagnostic write failed: {e}");
            }
        }
    }

    /// Record a geocode resolution.
    pub fn geocode(&mut self, latitude: f64, longitude: f64, place: &str) {
        self.line(&format!("{latitude}, {longitude}, {place}"));
    }

    pub fn flush(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.flush() {
                log::debug!("Diagnostic flush failed: {e}");
            }
        }
    }
}

impl Drop for DiagnosticSink {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn disabled_sink_discards() {
        let mut sink = DiagnosticSink::disabled();
        assert!(!sink.is_enabled());
        sink.line("ignored");
        sink.geocode(1.0, 2.0, "nowhere");
    }

    #[test]
    fn blank_path_disables() {
        assert!(!DiagnosticSink::from_config(None).is_enabled());
        assert!(!DiagnosticSink::from_config(Some("  ")).is_enabled());
    }

    #[test]
    fn lines_are_appended() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("debug.txt");
        fs::write(&path, "existing\n").unwrap();

        {
            let mut sink = DiagnosticSink::open(&path);
            assert!(sink.is_enabled());
            sink.line("processing a.jpg");
            sink.geocode(52.37, 4.89, "Amsterdam");
        }

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "existing\nprocessing a.jpg\n52.37, 4.89, Amsterdam\n");
    }

    #[test]
    fn unopenable_path_disables() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("debug.txt");
        let sink = DiagnosticSink::open(&path);
        assert!(!sink.is_enabled());
    }
}
