//! Main "ruler" of the score: measures, their meters and tempi.
//!
//! Chains never depend on it for stacking. It is used to split events
//! at barlines and to convert beats to seconds for synthesis.
use fraction::Fraction;
use serde::{Deserialize, Serialize};

use crate::error::{ChainError, ChainResult};

use super::{position::Location, to_f64, zero, Time};

/// Conversion between beats, score locations and seconds.
pub trait ScoreStruct {
    /// Seconds from the score start at `beat`.
    fn beat_to_time(&self, beat: Time) -> f64;
    /// Absolute beat of a location.
    fn as_beat(&self, location: Location) -> Time;
    /// Beat offsets of the barlines of measures `start..stop`.
    fn measure_offsets(&self, start: usize, stop: usize) -> Vec<Time>;
    /// Measure index and offset within it of `beat`.
    fn beat_to_location(&self, beat: Time) -> (usize, Time);
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}
impl TimeSignature {
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
    /// Length of a measure in quarter-note beats.
    pub fn quarters(&self) -> Time {
        Fraction::new(
            u64::from(self.numerator) * 4,
            u64::from(self.denominator),
        )
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MeasureInfo {
    /// 0-based
    pub index: usize,
    pub time_signature: TimeSignature,
    /// Quarter notes per minute.
    pub quarter_tempo: f64,
    pub length: Time,
}
impl MeasureInfo {
    pub fn new(
        index: usize,
        time_signature: TimeSignature,
        quarter_tempo: f64,
    ) -> Self {
        Self {
            index,
            time_signature,
            quarter_tempo,
            length: time_signature.quarters(),
        }
    }
}

/// Sequence of measures from beat 0. The last measure is repeated
/// endlessly.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TimeMap {
    measures: Vec<MeasureInfo>,
}
impl TimeMap {
    /// Build from (time signature, quarter tempo) per measure.
    pub fn new(
        measures: impl IntoIterator<Item = (TimeSignature, f64)>,
    ) -> ChainResult<Self> {
        let mut infos = Vec::new();
        for (index, (time_signature, tempo)) in measures.into_iter().enumerate()
        {
            if time_signature.numerator == 0
                || time_signature.denominator == 0
                || tempo.is_nan()
                || tempo <= 0.0
            {
                return Err(ChainError::InvalidArgument(format!(
                    "bad measure {index}: {}/{} at tempo {tempo}",
                    time_signature.numerator, time_signature.denominator
                )));
            }
            infos.push(MeasureInfo::new(index, time_signature, tempo));
        }
        if infos.is_empty() {
            return Err(ChainError::InvalidArgument(
                "can not build TimeMap without measures".to_string(),
            ));
        }
        Ok(Self { measures: infos })
    }
    /// One measure signature and tempo for the whole score.
    pub fn uniform(
        time_signature: TimeSignature,
        quarter_tempo: f64,
    ) -> ChainResult<Self> {
        Self::new([(time_signature, quarter_tempo)])
    }
    pub fn get(&self) -> &[MeasureInfo] {
        &self.measures
    }
    fn last(&self) -> &MeasureInfo {
        &self.measures[self.measures.len() - 1]
    }
    /// Info of any measure, including the endless tail.
    pub fn measure_info(&self, index: usize) -> MeasureInfo {
        match self.measures.get(index) {
            Some(info) => info.clone(),
            None => MeasureInfo {
                index,
                ..self.last().clone()
            },
        }
    }
    /// Beat of the barline opening measure `index`.
    pub fn measure_start(&self, index: usize) -> Time {
        let defined = index.min(self.measures.len());
        let mut start = self.measures[..defined]
            .iter()
            .fold(zero(), |acc, info| acc + info.length);
        if index > defined {
            start += self.last().length
                * Fraction::new((index - defined) as u64, 1u64);
        }
        start
    }
}
impl ScoreStruct for TimeMap {
    fn beat_to_time(&self, beat: Time) -> f64 {
        let mut seconds = 0.0;
        let mut start = zero();
        for (idx, info) in self.measures.iter().enumerate() {
            let end = start + info.length;
            let seconds_per_beat = 60.0 / info.quarter_tempo;
            if beat < end || idx + 1 == self.measures.len() {
                return seconds + to_f64(beat - start) * seconds_per_beat;
            }
            seconds += to_f64(info.length) * seconds_per_beat;
            start = end;
        }
        seconds
    }
    fn as_beat(&self, location: Location) -> Time {
        match location {
            Location::Beat(beat) => beat,
            Location::Measure { index, offset } => {
                self.measure_start(index) + offset
            }
        }
    }
    fn measure_offsets(&self, start: usize, stop: usize) -> Vec<Time> {
        (start..stop).map(|idx| self.measure_start(idx)).collect()
    }
    fn beat_to_location(&self, beat: Time) -> (usize, Time) {
        if beat < zero() {
            return (0, beat);
        }
        let mut start = zero();
        for info in self.measures.iter() {
            if beat < start + info.length {
                return (info.index, beat - start);
            }
            start += info.length;
        }
        let length = self.last().length;
        let rest = beat - start;
        let count = (rest / length).floor();
        let full = count.numer().copied().unwrap_or_default() as usize;
        (self.measures.len() + full, rest - length * count)
    }
}

#[cfg(test)]
mod tests {
    use crate::primitives::{beats, position::Location};

    use super::{MeasureInfo, ScoreStruct, TimeMap, TimeSignature};

    fn time_map_1() -> TimeMap {
        let ts = [(4, 4), (4, 4), (4, 4), (7, 8), (9, 8), (4, 4)];
        TimeMap::new(
            ts.into_iter()
                .map(|(num, den)| (TimeSignature::new(num, den), 60.0)),
        )
        .unwrap()
    }

    #[test]
    fn contents() {
        let time_map = time_map_1();
        assert_eq!(time_map.get().len(), 6);
        assert_eq!(
            time_map.measure_info(3),
            MeasureInfo {
                index: 3,
                time_signature: TimeSignature::new(7, 8),
                quarter_tempo: 60.0,
                length: beats(7, 2),
            }
        );
        assert_eq!(time_map.measure_info(9).index, 9);
        assert_eq!(time_map.measure_info(9).length, beats(4, 1));
        assert!(TimeMap::new(Vec::new()).is_err());
        assert!(TimeMap::new(vec![(TimeSignature::new(4, 4), 0.0)]).is_err());
    }

    #[test]
    fn uniform() {
        let time_map = TimeMap::uniform(TimeSignature::new(3, 4), 90.0).unwrap();
        assert_eq!(time_map.get().len(), 1);
        assert_eq!(time_map.measure_start(2), beats(6, 1));
        assert!(TimeMap::uniform(TimeSignature::new(0, 4), 60.0).is_err());
        assert!(TimeMap::uniform(TimeSignature::new(4, 0), 60.0).is_err());
        assert!(TimeMap::uniform(TimeSignature::new(4, 4), 0.0).is_err());
        assert!(TimeMap::uniform(TimeSignature::new(4, 4), f64::NAN).is_err());
    }

    #[test]
    fn measure_position() {
        let time_map = time_map_1();
        assert_eq!(time_map.measure_start(0), beats(0, 1));
        assert_eq!(time_map.measure_start(3), beats(12, 1));
        assert_eq!(time_map.measure_start(4), beats(31, 2));
        assert_eq!(time_map.measure_start(5), beats(20, 1));
        assert_eq!(time_map.measure_start(8), beats(32, 1));
        assert_eq!(
            time_map.measure_offsets(3, 6),
            vec![beats(12, 1), beats(31, 2), beats(20, 1)]
        );
        assert!(time_map.measure_offsets(2, 2).is_empty());
    }

    #[test]
    fn converter() {
        let time_map = time_map_1();
        let location = Location::Measure {
            index: 4,
            offset: beats(3, 2),
        };
        assert_eq!(time_map.as_beat(location), beats(17, 1));
        assert_eq!(time_map.beat_to_location(beats(17, 1)), (4, beats(3, 2)));
        assert_eq!(time_map.beat_to_location(beats(30, 1)), (7, beats(2, 1)));
        assert_eq!(time_map.beat_to_location(beats(24, 1)), (6, beats(0, 1)));
    }

    #[test]
    fn seconds() {
        let time_map = TimeMap::new(vec![
            (TimeSignature::new(4, 4), 60.0),
            (TimeSignature::new(4, 4), 120.0),
        ])
        .unwrap();
        assert_eq!(time_map.beat_to_time(beats(2, 1)), 2.0);
        assert_eq!(time_map.beat_to_time(beats(6, 1)), 5.0);
        assert_eq!(time_map.beat_to_time(beats(10, 1)), 7.0);
    }
}
