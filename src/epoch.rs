//! Event-locked epoching.
//!
//! Cuts one fixed-length window out of the continuous [C, T] signal per
//! selected event, stacking them into [E, C, n_samples]. The window for an
//! event at sample `s` covers `s + round(tmin·fs)` through
//! `s + round(tmax·fs)` inclusive. Every window is checked against the
//! recording before any data is copied, so a single out-of-range event fails
//! the whole extraction.
use ndarray::{s, Array1, Array3, ArrayView2, ArrayView3};

use crate::config::EpochWindow;
use crate::error::{bail, Result};
use crate::events::EventRecord;
use crate::normalize::baseline_correct_inplace;
use crate::recording::ContinuousRecording;

/// Stacked trials with their labels and provenance.
#[derive(Debug, Clone)]
pub struct Epochs {
    data: Array3<f64>,
    targets: Vec<u8>,
    events: Vec<EventRecord>,
    ch_names: Vec<String>,
    sfreq: u32,
    tmin: f64,
}

impl Epochs {
    /// Trials as [E, C, n_samples].
    pub fn get_data(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    pub fn into_data(self) -> Array3<f64> {
        self.data
    }

    /// Class code of each trial, in event order.
    pub fn targets(&self) -> &[u8] {
        &self.targets
    }

    /// The events that produced each trial.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    pub fn sfreq(&self) -> u32 {
        self.sfreq
    }

    pub fn tmin(&self) -> f64 {
        self.tmin
    }

    pub fn n_epochs(&self) -> usize {
        self.data.dim().0
    }

    pub fn n_times(&self) -> usize {
        self.data.dim().2
    }

    /// Time of each sample relative to onset, in seconds.
    pub fn times(&self) -> Array1<f64> {
        let first = (self.tmin * self.sfreq as f64).round();
        Array1::from_shape_fn(self.n_times(), |i| (first + i as f64) / self.sfreq as f64)
    }
}

/// Extract one epoch per event whose class code appears in `event_id`.
///
/// # Errors
///
/// * [`Error::Config`](crate::Error::Config) for an invalid window, an empty
///   `event_id`, or a mapped code that no event carries.
/// * [`Error::Bounds`](crate::Error::Bounds) if any selected window leaves
///   the recording. No epochs are returned in that case.
pub fn extract_epochs(
    recording: &ContinuousRecording,
    events: &[EventRecord],
    event_id: &[(String, u8)],
    window: &EpochWindow,
) -> Result<Epochs> {
    window.validate()?;
    if event_id.is_empty() {
        bail!(Config, "event_id is empty; no events to epoch");
    }
    for (name, code) in event_id {
        if !events.iter().any(|e| e.class_code == *code) {
            bail!(Config, "no events found for '{name}' (code {code})");
        }
    }

    let selected: Vec<EventRecord> = events
        .iter()
        .filter(|e| event_id.iter().any(|(_, code)| *code == e.class_code))
        .copied()
        .collect();
    let dropped = events.len() - selected.len();
    if dropped > 0 {
        log::debug!("{dropped} events have codes outside event_id and are skipped");
    }

    let sfreq = recording.sfreq();
    let offset = window.start_offset(sfreq);
    let n_samples = window.n_samples(sfreq);

    let views: Vec<ArrayView2<'_, f64>> = selected
        .iter()
        .map(|e| {
            match i64::try_from(e.sample).ok().and_then(|p| p.checked_add(offset)) {
                Some(start) => recording.window(start, n_samples),
                None => bail!(Bounds, "event at sample {} cannot be offset by {offset}", e.sample),
            }
        })
        .collect::<Result<_>>()?;

    let mut data = Array3::<f64>::zeros((views.len(), recording.n_channels(), n_samples));
    for (i, v) in views.iter().enumerate() {
        data.slice_mut(s![i, .., ..]).assign(v);
    }
    if window.baseline {
        baseline_correct_inplace(&mut data);
    }

    log::info!(
        "extracted {} epochs × {} ch × {} samples ({}–{} s)",
        data.dim().0,
        data.dim().1,
        n_samples,
        window.tmin,
        window.tmax
    );

    Ok(Epochs {
        data,
        targets: selected.iter().map(|e| e.class_code).collect(),
        events: selected,
        ch_names: recording.ch_names().to_vec(),
        sfreq,
        tmin: window.tmin,
    })
}
