/// Counters for one cycle, returned to the caller when the run completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Distinct links considered after dedupe and the link budget
    pub links_found: usize,
    pub already_seen: usize,
    pub visited: usize,
    pub incomplete: usize,
    pub undesirable: usize,
    pub notified: usize,
    pub delivery_failures: usize,
    pub link_errors: usize,
    pub store_errors: usize,
}

/// What happened to a single visited link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Notified,
    Incomplete,
    Undesirable,
    DeliveryFailed,
}

/// Mutable state threaded through one run.
#[derive(Debug, Default)]
pub struct RunContext {
    pub preamble_sent: bool,
    pub summary: RunSummary,
}

impl RunContext {
    pub fn record(&mut self, outcome: LinkOutcome) {
        match outcome {
            LinkOutcome::Notified => self.summary.notified += 1,
            LinkOutcome::Incomplete => self.summary.incomplete += 1,
            LinkOutcome::Undesirable => self.summary.undesirable += 1,
            LinkOutcome::DeliveryFailed => self.summary.delivery_failures += 1,
        }
    }

    pub fn cap_reached(&self, max_matches: usize) -> bool {
        self.summary.notified >= max_matches
    }
}
