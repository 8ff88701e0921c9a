use std::collections::VecDeque;

use footfall_core::Vec3;
use serde::Serialize;

/// Things a foot absorbed instead of failing. Each is also logged through `tracing`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Diagnostic {
    /// Setup found no ground under the foot or the body.
    SetupMissedGround { at: Vec3 },
    /// Every target tier failed; the foot keeps its previous target.
    NoFootholdFound { around: Vec3 },
    /// A swing was re-targeted onto the top of a barrier.
    BarrierSpliced { hit: Vec3, top: Vec3 },
    /// A barrier was hit and no foothold on or around it verified.
    BarrierUnresolved { hit: Vec3 },
    /// Planting failed its ground check.
    GroundLost { at: Vec3 },
    /// The corrective search moved the target.
    Corrected { from: Vec3, to: Vec3 },
    /// The foot gave up and hangs until a ground check succeeds again.
    Unsupported { at: Vec3 },
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct DiagnosticEntry {
    pub tick: u64,
    #[serde(flatten)]
    pub diagnostic: Diagnostic,
}

/// Bounded per-foot event ring. The oldest entries fall off once full.
#[derive(Clone, Debug)]
pub struct DiagnosticLedger {
    cap: usize,
    entries: VecDeque<DiagnosticEntry>,
}

impl Default for DiagnosticLedger {
    fn default() -> Self { Self::new(64) }
}

impl DiagnosticLedger {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self { cap, entries: VecDeque::with_capacity(cap) }
    }

    pub fn push(&mut self, tick: u64, diagnostic: Diagnostic) {
        if self.entries.len() == self.cap { self.entries.pop_front(); }
        self.entries.push_back(DiagnosticEntry { tick, diagnostic });
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticEntry> { self.entries.iter() }
    pub fn latest(&self) -> Option<&DiagnosticEntry> { self.entries.back() }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn capacity(&self) -> usize { self.cap }
    pub fn clear(&mut self) { self.entries.clear(); }

    pub fn count(&self, pred: impl Fn(&Diagnostic) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.diagnostic)).count()
    }

    /// One JSON object per line, oldest first.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for e in &self.entries {
            out.push_str(&serde_json::to_string(e)?);
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_drops_oldest() {
        let mut l = DiagnosticLedger::new(2);
        l.push(1, Diagnostic::GroundLost { at: Vec3::ZERO });
        l.push(2, Diagnostic::Unsupported { at: Vec3::ZERO });
        l.push(3, Diagnostic::NoFootholdFound { around: Vec3::X });
        assert_eq!(l.len(), 2);
        assert_eq!(l.iter().next().map(|e| e.tick), Some(2));
        assert_eq!(l.count(|d| matches!(d, Diagnostic::NoFootholdFound { .. })), 1);
    }

    #[test]
    fn jsonl_tags_kind() {
        let mut l = DiagnosticLedger::default();
        l.push(7, Diagnostic::Unsupported { at: Vec3::ZERO });
        let s = l.to_jsonl().unwrap();
        assert_eq!(s.lines().count(), 1);
        assert!(s.contains("\"kind\":\"Unsupported\""));
        assert!(s.contains("\"tick\":7"));
    }
}
