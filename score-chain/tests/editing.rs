use itertools::Itertools;
use score_chain::{
    dom::{PartGroup, Voice},
    error::ChainError,
    primitives::{
        beats, zero, Chain, Event, Item, Location, ScoreStruct, Time, TimeMap,
        TimeSignature,
    },
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn spans(chain: &Chain) -> Vec<(Time, Time)> {
    chain
        .events_with_offset()
        .unwrap()
        .into_iter()
        .map(|(ev, offset)| (offset, ev.dur().unwrap()))
        .collect()
}

#[test]
fn split_at_barlines() {
    init();
    let score = TimeMap::uniform(TimeSignature::new(3, 4), 60.0).unwrap();
    let mut chain = Chain::new(vec![
        Item::from(Event::note(60.0, beats(2, 1))),
        Chain::new(vec![Event::note(62.0, beats(4, 1))]).into(),
        Event::note(64.0, beats(1, 1)).into(),
    ]);
    let dur = chain.dur().unwrap();
    chain.split_events_at_measures(&score, 0, None).unwrap();
    assert_eq!(chain.dur().unwrap(), dur);
    assert_eq!(
        spans(&chain),
        vec![
            (zero(), beats(2, 1)),
            (beats(2, 1), beats(1, 1)),
            (beats(3, 1), beats(3, 1)),
            (beats(6, 1), beats(1, 1)),
        ]
    );
    let ties: Vec<_> = chain.recurse().map(|ev| ev.tied).collect();
    assert_eq!(ties, vec![false, true, false, false]);
    // nothing crosses a barline anymore
    for (offset, dur) in spans(&chain) {
        let (measure, _) = score.beat_to_location(offset);
        let end = score.as_beat(Location::Measure {
            index: measure + 1,
            offset: zero(),
        });
        assert!(offset + dur <= end);
    }
}

#[test]
fn split_at_single_offset() {
    init();
    let mut chain = Chain::new(vec![
        Event::note(60.0, beats(2, 1)),
        Event::note(62.0, beats(2, 1)),
    ]);
    let head = chain.split_at(beats(3, 1), false).unwrap().cloned();
    assert_eq!(head.map(|ev| ev.pitches()), Some(vec![62.0]));
    assert_eq!(chain.len(), 3);
    assert!(chain.recurse().all(|ev| !ev.tied));
    assert!(matches!(
        chain.split_events_at_offsets(&[], true),
        Err(ChainError::InvalidArgument(_))
    ));
}

#[test]
fn crop_and_query() {
    init();
    let chain = Chain::new(vec![
        Item::from(Event::note(60.0, beats(2, 1))),
        Chain::new(vec![
            Event::note(62.0, beats(1, 1)),
            Event::note(64.0, beats(1, 1)),
        ])
        .into(),
        Event::note(65.0, beats(2, 1)).into(),
    ]);
    let cropped = chain.cropped(beats(1, 1), beats(5, 1)).unwrap().unwrap();
    assert_eq!(cropped.abs_offset(), beats(1, 1));
    assert_eq!(cropped.dur().unwrap(), beats(4, 1));
    let pitches: Vec<_> = cropped.recurse().flat_map(|ev| ev.pitches()).collect();
    assert_eq!(pitches, vec![60.0, 62.0, 64.0, 65.0]);
    assert!(chain.cropped(beats(9, 1), beats(10, 1)).unwrap().is_none());

    let inside = chain
        .events_between(beats(2, 1), beats(4, 1), false)
        .unwrap();
    assert_eq!(inside.len(), 2);
    let touching = chain
        .events_between(beats(1, 1), beats(5, 1), true)
        .unwrap();
    assert_eq!(touching.len(), 4);
    let at = chain.event_at(beats(3, 1), None).unwrap();
    assert_eq!(at.map(|ev| ev.pitches()), Some(vec![64.0]));
    // 62 still sounds right before 3
    let before = chain.event_at(beats(23, 8), None).unwrap();
    assert_eq!(before.map(|ev| ev.pitches()), Some(vec![62.0]));
    let wide = chain.event_at(beats(3, 2), Some(beats(1, 1))).unwrap();
    assert_eq!(wide.map(|ev| ev.pitches()), Some(vec![60.0]));
}

#[test]
fn cycle_fills_duration() {
    init();
    let chain = Chain::new(vec![
        Event::note(60.0, beats(1, 1)),
        Event::note(62.0, beats(3, 2)),
    ]);
    let cycled = chain.cycle(beats(4, 1), true).unwrap();
    assert_eq!(cycled.dur().unwrap(), beats(4, 1));
    let pitches: Vec<_> = cycled.recurse().flat_map(|ev| ev.pitches()).collect();
    assert_eq!(pitches, vec![60.0, 62.0, 60.0, 62.0]);
    assert_eq!(cycled.last_event().unwrap().dur().unwrap(), beats(1, 2));

    let uncropped = chain.cycle(beats(4, 1), false).unwrap();
    assert_eq!(uncropped.dur().unwrap(), beats(5, 1));
    assert!(Chain::new(Vec::<Event>::new()).cycle(beats(1, 1), true).is_err());
}

#[test]
fn voice_workflow() {
    init();
    let chain = Chain::new(vec![
        Event::note(60.0, beats(1, 1)).with_tie(true),
        Event::note(60.0, beats(1, 1)),
        Event::note(62.0, beats(2, 1)).with_offset(beats(3, 1)),
    ])
    .with_offset(beats(2, 1))
    .with_label("oboe");
    let mut voice = chain.as_voice(true).unwrap();
    assert_eq!(voice.name, "oboe");
    assert_eq!(voice.abs_offset(), zero());
    assert_eq!(voice.first_offset().unwrap(), Some(beats(2, 1)));

    voice.merge_tied_events().unwrap();
    assert_eq!(voice.len(), 2);
    // eats the leading silence, the rest is clamped
    voice.time_shift_in_place(beats(-3, 1)).unwrap();
    assert_eq!(voice.abs_offset(), zero());
    assert_eq!(voice.dur().unwrap(), beats(5, 1));

    voice.fill_gaps(false).unwrap();
    assert_eq!(
        spans(&voice),
        vec![
            (zero(), beats(2, 1)),
            (beats(2, 1), beats(1, 1)),
            (beats(3, 1), beats(2, 1)),
        ]
    );

    voice.set_config("show.cents", false).unwrap();
    assert!(voice.set_config("show.cents", "no").is_err());
    assert_eq!(voice.config().len(), 1);

    let mut voices = vec![voice, Voice::new(vec![Event::rest(beats(1, 1))], "bassoon")];
    let group = PartGroup::make_group(&mut voices, "winds", "ww", true);
    assert!(voices
        .iter()
        .map(|voice| voice.group().map(|g| g.group_id.clone()))
        .all_equal());
    drop(group);
    assert!(voices[0].group().is_none());
}
