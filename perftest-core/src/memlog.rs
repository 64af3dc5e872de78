//! Memory checkpoints
//!
//! `MemLog` records the process footprint at labelled points, which helps
//! locate where a memory check's peak comes from.

use crate::allocator::live_bytes;
use crate::format::pp;
use crate::sampler::BYTES_PER_MB;

/// One labelled checkpoint
#[derive(Debug, Clone, PartialEq)]
pub struct MemLogEntry {
    /// Checkpoint label
    pub label: String,
    /// Resident set size in MB, where the platform exposes it
    pub rss_mb: Option<f64>,
    /// Live heap in MB (0 unless `TrackingAllocator` is installed)
    pub heap_mb: f64,
}

/// Ordered list of memory checkpoints
#[derive(Debug, Clone, Default)]
pub struct MemLog {
    entries: Vec<MemLogEntry>,
}

impl MemLog {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current footprint under `label`
    pub fn record(&mut self, label: impl Into<String>) -> &MemLogEntry {
        self.entries.push(MemLogEntry {
            label: label.into(),
            rss_mb: resident_set_mb(),
            heap_mb: live_bytes() as f64 / BYTES_PER_MB,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Recorded checkpoints, oldest first
    pub fn entries(&self) -> &[MemLogEntry] {
        &self.entries
    }

    /// Drop all checkpoints
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Render as an aligned table
    pub fn render(&self, digits: usize) -> String {
        let width = self
            .entries
            .iter()
            .map(|e| e.label.len())
            .max()
            .unwrap_or(5)
            .max(5);

        let mut output = format!("{:<width$}  {:>12}  {:>12}\n", "label", "rss (MB)", "heap (MB)");
        for entry in &self.entries {
            let rss = entry
                .rss_mb
                .map(|v| pp(v, digits))
                .unwrap_or_else(|| "-".to_string());
            output.push_str(&format!(
                "{:<width$}  {:>12}  {:>12}\n",
                entry.label,
                rss,
                pp(entry.heap_mb, digits)
            ));
        }
        output
    }
}

/// Current resident set size of this process in MB
#[cfg(target_os = "linux")]
pub fn resident_set_mb() -> Option<f64> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    // SAFETY: sysconf has no preconditions; it only reads a system constant.
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size <= 0 {
        return None;
    }
    Some((resident_pages * page_size as u64) as f64 / BYTES_PER_MB)
}

/// Current resident set size of this process in MB
#[cfg(not(target_os = "linux"))]
pub fn resident_set_mb() -> Option<f64> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_order() {
        let mut log = MemLog::new();
        log.record("start");
        log.record("after load");

        let labels: Vec<_> = log.entries().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["start", "after load"]);

        log.clear();
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_render_has_row_per_entry() {
        let mut log = MemLog::new();
        log.record("a");
        log.record("b");
        let table = log.render(3);
        assert_eq!(table.lines().count(), 3);
        assert!(table.starts_with("label"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_rss_available_on_linux() {
        let rss = resident_set_mb().unwrap();
        assert!(rss > 0.0);
    }
}
