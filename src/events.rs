//! Event table: `[sample, 0, class_code]` rows in onset order.
use crate::labels::LabeledPosition;

/// One row of the event table (MNE's `events` array layout).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    /// Onset sample index.
    pub sample: usize,
    /// Always 0.
    pub reserved: i32,
    /// `0` or `1`.
    pub class_code: u8,
}

/// One event per aligned trial, in stored order (never grouped by class).
pub fn build_events(aligned: &[LabeledPosition]) -> Vec<EventRecord> {
    aligned
        .iter()
        .map(|a| EventRecord { sample: a.position, reserved: 0, class_code: a.class_code })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_and_count_preserved() {
        let aligned = [
            LabeledPosition { position: 10, class_code: 1 },
            LabeledPosition { position: 20, class_code: 0 },
            LabeledPosition { position: 30, class_code: 1 },
        ];
        let events = build_events(&aligned);
        assert_eq!(events.len(), aligned.len());
        let samples: Vec<usize> = events.iter().map(|e| e.sample).collect();
        assert_eq!(samples, vec![10, 20, 30]);
        assert!(events.iter().all(|e| e.reserved == 0));
        assert_eq!(events[1].class_code, 0);
    }
}
