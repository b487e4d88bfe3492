//! Trial label alignment.
//!
//! `mrk.y` (label per candidate trial, `NaN` = discard) and `mrk.pos`
//! (onset sample per candidate trial) are read into one sequence of
//! [`Marker`] pairs. The validity mask is computed from the labels and
//! applied to that single sequence, so a label can never be separated from
//! its position.
use crate::error::{bail, Result};
use crate::mat::{MatArray, StructArray};

/// One candidate trial as stored: onset sample + raw label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub position: usize,
    /// `1.0`, `2.0`, or `NaN` for "discard this trial".
    pub label: f64,
}

/// A surviving trial: onset sample + class code (`label − 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabeledPosition {
    pub position: usize,
    pub class_code: u8,
}

/// Read `mrk.y` and `mrk.pos` as paired markers.
///
/// # Errors
///
/// [`Error::Parse`](crate::Error::Parse) if either field is missing, is not a
/// numeric vector, the two lengths differ, or a position is not a
/// non-negative integer.
pub fn raw_markers(mrk: &StructArray) -> Result<Vec<Marker>> {
    let labels = numeric_vector(mrk, "y")?;
    let positions = numeric_vector(mrk, "pos")?;
    if labels.len() != positions.len() {
        bail!(
            Parse,
            "mrk.y has {} entries but mrk.pos has {}",
            labels.len(),
            positions.len()
        );
    }

    let mut markers = Vec::with_capacity(labels.len());
    for (i, (&label, &pos)) in labels.iter().zip(&positions).enumerate() {
        if !pos.is_finite() || pos < 0.0 || pos.fract() != 0.0 {
            bail!(Parse, "mrk.pos({}) = {pos} is not a sample index", i + 1);
        }
        markers.push(Marker { position: pos as usize, label });
    }
    Ok(markers)
}

fn numeric_vector(mrk: &StructArray, field: &str) -> Result<Vec<f64>> {
    match mrk.field(field) {
        Some(MatArray::Numeric(a)) => match a.to_vec1() {
            Some(v) => Ok(v),
            None => bail!(Parse, "mrk.{field} must be a vector, got dimensions {:?}", a.dims),
        },
        Some(other) => bail!(Parse, "mrk.{field} must be numeric, found {}", other.class_name()),
        None => bail!(Parse, "mrk has no '{field}' field"),
    }
}

/// `true` where the label is not `NaN`.
pub fn validity_mask(markers: &[Marker]) -> Vec<bool> {
    markers.iter().map(|m| !m.label.is_nan()).collect()
}

/// Keep the markers whose mask entry is `true`, preserving order.
pub fn apply_mask(markers: &[Marker], mask: &[bool]) -> Result<Vec<Marker>> {
    if mask.len() != markers.len() {
        bail!(
            Shape,
            "mask has {} entries for {} markers",
            mask.len(),
            markers.len()
        );
    }
    Ok(markers
        .iter()
        .zip(mask)
        .filter(|&(_, &keep)| keep)
        .map(|(m, _)| *m)
        .collect())
}

/// Convert surviving labels `{1, 2}` to class codes `{0, 1}`.
///
/// Every label is checked before any is converted.
///
/// # Errors
///
/// [`Error::Label`](crate::Error::Label) for any label other than exactly
/// `1` or `2` (including a `NaN` that was not masked out).
pub fn convert_labels(markers: &[Marker]) -> Result<Vec<LabeledPosition>> {
    if let Some((i, m)) = markers
        .iter()
        .enumerate()
        .find(|(_, m)| !is_class_label(m.label))
    {
        bail!(
            Label,
            "trial {i} (sample {}) has label {}; expected 1 or 2",
            m.position,
            m.label
        );
    }
    Ok(markers
        .iter()
        .map(|m| LabeledPosition {
            position: m.position,
            class_code: (m.label as u8) - 1,
        })
        .collect())
}

fn is_class_label(label: f64) -> bool {
    label == 1.0 || label == 2.0
}

/// Mask out `NaN` labels and convert the rest, in one pass over the pairs.
///
/// # Errors
///
/// [`Error::Label`](crate::Error::Label) naming the stored `mrk.y` entry of
/// the first unmasked label other than `1` or `2`.
pub fn align_labels(markers: &[Marker]) -> Result<Vec<LabeledPosition>> {
    let mask = validity_mask(markers);
    if let Some((i, m)) = markers
        .iter()
        .enumerate()
        .zip(&mask)
        .filter(|&(_, &keep)| keep)
        .map(|(pair, _)| pair)
        .find(|(_, m)| !is_class_label(m.label))
    {
        bail!(
            Label,
            "mrk.y({}) = {} at sample {}; expected 1 or 2",
            i + 1,
            m.label,
            m.position
        );
    }
    let kept = apply_mask(markers, &mask)?;
    let dropped = markers.len() - kept.len();
    if dropped > 0 {
        log::warn!(
            "discarding {dropped} of {} trials with unlabeled (NaN) markers",
            markers.len()
        );
    }
    let aligned = convert_labels(&kept)?;
    log::debug!("{} labeled trials", aligned.len());
    Ok(aligned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat::NumericArray;
    use crate::Error;

    fn mrk(y: Vec<f64>, pos: Vec<f64>) -> StructArray {
        StructArray::scalar(vec![
            ("pos", MatArray::Numeric(NumericArray::row(pos))),
            ("y", MatArray::Numeric(NumericArray::row(y))),
        ])
    }

    #[test]
    fn mask_keeps_labels_with_their_positions() {
        let markers = raw_markers(&mrk(
            vec![1.0, f64::NAN, 2.0, f64::NAN, 1.0],
            vec![100.0, 200.0, 300.0, 400.0, 500.0],
        ))
        .unwrap();
        let aligned = align_labels(&markers).unwrap();
        let got: Vec<(usize, u8)> = aligned.iter().map(|a| (a.position, a.class_code)).collect();
        assert_eq!(got, vec![(100, 0), (300, 1), (500, 0)]);
    }

    #[test]
    fn surviving_count_equals_true_mask_entries() {
        let y: Vec<f64> = (0..50)
            .map(|i| if i % 7 == 3 { f64::NAN } else { (i % 2 + 1) as f64 })
            .collect();
        let pos: Vec<f64> = (0..50).map(|i| (i * 10) as f64).collect();
        let markers = raw_markers(&mrk(y, pos)).unwrap();
        let mask = validity_mask(&markers);
        let aligned = align_labels(&markers).unwrap();
        assert_eq!(aligned.len(), mask.iter().filter(|&&m| m).count());
        assert!(aligned.iter().all(|a| a.class_code <= 1));
    }

    #[test]
    fn label_three_is_rejected() {
        let markers = raw_markers(&mrk(vec![1.0, 3.0], vec![0.0, 10.0])).unwrap();
        assert!(matches!(align_labels(&markers), Err(Error::Label(_))));
    }

    #[test]
    fn label_error_names_the_stored_entry() {
        let markers = raw_markers(&mrk(
            vec![f64::NAN, f64::NAN, 1.0, 3.0],
            vec![0.0, 10.0, 20.0, 30.0],
        ))
        .unwrap();
        match align_labels(&markers) {
            Err(Error::Label(msg)) => {
                assert!(msg.contains("mrk.y(4)"), "{msg}");
                assert!(msg.contains("sample 30"), "{msg}");
            }
            other => panic!("expected a label error, got {other:?}"),
        }
    }

    #[test]
    fn fractional_label_is_rejected() {
        let markers = raw_markers(&mrk(vec![1.5], vec![0.0])).unwrap();
        assert!(matches!(convert_labels(&markers), Err(Error::Label(_))));
    }

    #[test]
    fn unequal_lengths_are_parse_errors() {
        assert!(matches!(raw_markers(&mrk(vec![1.0, 2.0], vec![0.0])), Err(Error::Parse(_))));
    }

    #[test]
    fn negative_position_is_parse_error() {
        assert!(matches!(raw_markers(&mrk(vec![1.0], vec![-4.0])), Err(Error::Parse(_))));
    }

    #[test]
    fn mask_length_must_match() {
        let markers = [Marker { position: 0, label: 1.0 }];
        assert!(matches!(apply_mask(&markers, &[true, false]), Err(Error::Shape(_))));
    }
}
