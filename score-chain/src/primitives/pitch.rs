//! Pitch as a fractional midi note.
//!
//! There is no enharmonic spelling here: `61.0` is both C# and Db.
//! Names are only produced for dumps and error messages.

pub type Pitch = f64;

const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Human readable name in `<octave><pitch class>[cents]` form.
///
/// # Example
/// ```
/// # use score_chain::primitives::pitch::midi_to_name;
/// assert_eq!(midi_to_name(60.0), "4C");
/// assert_eq!(midi_to_name(61.25), "4C#+25");
/// assert_eq!(midi_to_name(57.0), "3A");
/// ```
pub fn midi_to_name(midi: Pitch) -> String {
    let rounded = midi.round();
    let cents = ((midi - rounded) * 100.0).round() as i32;
    let midi_int = rounded as i32;
    let octave = midi_int.div_euclid(12) - 1;
    let class = PITCH_CLASSES[midi_int.rem_euclid(12) as usize];
    match cents {
        0 => format!("{octave}{class}"),
        c if c > 0 => format!("{octave}{class}+{c}"),
        c => format!("{octave}{class}{c}"),
    }
}

/// Pitch equality with tolerance, for values that went through float math.
pub fn pitches_close(a: Pitch, b: Pitch, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}
