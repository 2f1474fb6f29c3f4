//! Corner sequence generation.

use serde::Serialize;
use tracing::{debug, warn};

use crate::corners::CornerChords;
use crate::model::ContinuationModel;
use crate::seed::build_seed;
use crate::sequence::NoteSequence;
use crate::SEQ_LENGTH;

/// The four corner melodies, in the same order as [`CornerChords`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CornerSet {
    pub symbols: [String; 4],
    pub sequences: [NoteSequence; 4],
}

/// Placeholder for a corner the model could not fill.
///
/// # Example
/// ```
/// use chordspace::generation::silent_corner;
///
/// let silent = silent_corner(120.0);
/// assert!(silent.is_empty());
/// assert_eq!(silent.total_time, 4.0);
/// assert_eq!(silent.qpm(), Some(120.0));
/// ```
pub fn silent_corner(tempo: f64) -> NoteSequence {
    NoteSequence::empty((SEQ_LENGTH as f64 / 4.0) * (60.0 / tempo), tempo)
}

/// Continue the seed of `chord_symbol` into a full corner melody.
///
/// Never fails: an error or an empty answer from the model yields
/// [`silent_corner`].
pub async fn generate_corner(model: &dyn ContinuationModel, chord_symbol: &str, tempo: f64) -> NoteSequence {
    let seed = build_seed(chord_symbol, tempo);
    let conditioning = [chord_symbol.to_string()];

    match model
        .continue_sequence(&seed, SEQ_LENGTH, tempo / 60.0, &conditioning)
        .await
    {
        Ok(Some(mut sequence)) => {
            sequence.set_tempo(tempo);
            debug!(chord = chord_symbol, notes = sequence.notes.len(), "corner generated");
            sequence
        }
        Ok(None) => {
            warn!(chord = chord_symbol, "continuation returned nothing, using silent corner");
            silent_corner(tempo)
        }
        Err(e) => {
            warn!(chord = chord_symbol, error = %e, "continuation failed, using silent corner");
            silent_corner(tempo)
        }
    }
}

/// Generate all four corners concurrently.
pub async fn generate_corners(model: &dyn ContinuationModel, chords: &CornerChords, tempo: f64) -> CornerSet {
    let symbols = chords.symbols();
    let (a, b, c, d) = tokio::join!(
        generate_corner(model, &symbols[0], tempo),
        generate_corner(model, &symbols[1], tempo),
        generate_corner(model, &symbols[2], tempo),
        generate_corner(model, &symbols[3], tempo),
    );
    CornerSet {
        symbols,
        sequences: [a, b, c, d],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpaceError;
    use crate::model::BoxFuture;
    use crate::offline::ChordToneWalker;

    struct Failing;

    impl ContinuationModel for Failing {
        fn initialize(&self) -> BoxFuture<'_, Result<(), SpaceError>> {
            Box::pin(async { Ok(()) })
        }

        fn continue_sequence<'a>(
            &'a self,
            _seed: &'a NoteSequence,
            _steps: u32,
            _steps_per_second: f64,
            chord_conditioning: &'a [String],
        ) -> BoxFuture<'a, Result<Option<NoteSequence>, SpaceError>> {
            Box::pin(async move {
                Err(SpaceError::Continuation {
                    chord: chord_conditioning[0].clone(),
                    message: "model offline".to_string(),
                })
            })
        }
    }

    #[tokio::test]
    async fn test_failure_gives_silent_corner() {
        let seq = generate_corner(&Failing, "CM", 90.0).await;
        assert!(seq.is_empty());
        assert!((seq.total_time - 8.0 * 60.0 / 90.0).abs() < 1e-12);
        assert_eq!(seq.qpm(), Some(90.0));
    }

    #[tokio::test]
    async fn test_success_is_stamped_with_tempo() {
        let seq = generate_corner(&ChordToneWalker::new(), "Gm7", 75.0).await;
        assert!(!seq.is_empty());
        assert_eq!(seq.tempos.len(), 1);
        assert_eq!(seq.qpm(), Some(75.0));
    }

    #[tokio::test]
    async fn test_corner_order_is_kept() {
        use crate::chord::{ChordQuality, PitchClass};
        use crate::corners::{resolve_corners, SideSelection};

        let chords = resolve_corners(
            &SideSelection::new(PitchClass::new(0).unwrap(), ChordQuality::Major),
            &SideSelection::new(PitchClass::new(7).unwrap(), ChordQuality::Minor7th),
        );
        let set = generate_corners(&ChordToneWalker::new(), &chords, 90.0).await;
        assert_eq!(set.symbols, ["CM", "CM", "Gm7", "Gm7"].map(String::from));
        for (i, seq) in set.sequences.iter().enumerate() {
            let expected: &[u8] = if i < 2 { &[0, 4, 7] } else { &[7, 10, 2, 5] };
            assert!(seq.notes.iter().all(|n| expected.contains(&(n.pitch % 12))));
        }
    }
}
