use promptdaw::error::TimelineError;
use promptdaw::grid::GridSnap;
use promptdaw::input::{InteractionController, Modifiers, Pointer};
use promptdaw::model::{ClipBuilder, TrackBuilder, TrackId};
use promptdaw::store::TimelineStore;
use promptdaw::time_utils::{
    beats_to_pixels, musical_time_to_seconds, pixels_to_beats, seconds_to_musical_time,
};
use promptdaw::view::TimelineView;

fn store_with_tracks(n: usize) -> (TimelineStore, Vec<TrackId>) {
    let mut store = TimelineStore::new();
    let tracks = (0..n)
        .map(|_| store.add_track(TrackBuilder::default()).unwrap())
        .collect();
    (store, tracks)
}

#[test]
fn pixel_round_trip_holds_across_zoom_levels() {
    for zoom in [0.1, 0.25, 1.0, 1.7, 3.3, 5.0] {
        for i in 0..200 {
            let beat = i as f64 * 0.731;
            let px = beats_to_pixels(beat, 100.0, zoom);
            assert!((pixels_to_beats(px, 100.0, zoom) - beat).abs() < 1e-9);
        }
    }
}

#[test]
fn musical_time_round_trip_within_half_a_tick() {
    let tpb = 960;
    for tempo in [20.0, 87.5, 120.0, 300.0] {
        for numerator in [3, 4, 7] {
            for i in 0..300 {
                let seconds = i as f64 * 0.0173;
                let t = seconds_to_musical_time(seconds, tempo, numerator, tpb);
                assert!(t.bars >= 1 && t.beats >= 1 && t.beats <= numerator);
                assert!(t.ticks < tpb);

                let back = musical_time_to_seconds(t, tempo, numerator, tpb);
                let half_tick = 60.0 / tempo / tpb as f64 / 2.0;
                assert!((back - seconds).abs() <= half_tick + 1e-12);
            }
        }
    }
}

#[test]
fn snapping_is_idempotent() {
    for grid_size in [0.125, 0.25, 1.0, 3.0] {
        let grid = GridSnap::new(grid_size);
        for i in -50..50 {
            let x = i as f64 * 0.29;
            assert_eq!(grid.snap(grid.snap(x)), grid.snap(x));
        }
    }
}

#[test]
fn sibling_positions_stay_dense() {
    let (mut store, tracks) = store_with_tracks(6);
    store.remove_track(tracks[2]).unwrap();
    store.move_track(tracks[5], 1).unwrap();
    store.remove_track(tracks[0]).unwrap();
    store.add_track(TrackBuilder::default()).unwrap();
    store.move_track(tracks[1], 10).unwrap();

    let group = store.create_group("G").unwrap();
    store.add_to_group(tracks[3], group).unwrap();
    store.add_to_group(tracks[4], group).unwrap();
    store.move_track(tracks[4], 0).unwrap();
    store.remove_from_group(tracks[3]).unwrap();

    store.check_invariants().unwrap();
    for parent in [None, Some(group)] {
        let ids = store.siblings(parent);
        let positions: Vec<_> = ids
            .iter()
            .map(|id| store.track(*id).unwrap().position)
            .collect();
        assert_eq!(positions, (0..ids.len()).collect::<Vec<_>>());
    }
}

#[test]
fn track_and_clip_links_stay_consistent() {
    let (mut store, tracks) = store_with_tracks(3);
    let a = store.add_clip(ClipBuilder::new(tracks[0])).unwrap();
    let b = store.add_clip(ClipBuilder::new(tracks[0]).at(4.0)).unwrap();
    let c = store.add_clip(ClipBuilder::new(tracks[1])).unwrap();
    store.move_clip(a, 2.0, Some(tracks[2])).unwrap();
    store.move_clip(c, 1.0, Some(tracks[0])).unwrap();
    store.remove_clip(b).unwrap();
    store.split_clip(c, 2.0).unwrap();
    store.check_invariants().unwrap();

    for clip in store.clips() {
        let owner = store.track(clip.track_id).unwrap();
        assert_eq!(owner.clips.iter().filter(|id| **id == clip.id).count(), 1);
    }
    assert!(store.track(tracks[1]).unwrap().clips.is_empty());
}

#[test]
fn split_produces_two_adjacent_clips() {
    let (mut store, tracks) = store_with_tracks(1);
    let clip = store
        .add_clip(ClipBuilder::new(tracks[0]).with_duration(8.0).with_content("riff"))
        .unwrap();

    for bad in [0.0, 8.0, -1.0, 9.0] {
        assert_eq!(
            store.split_clip(clip, bad),
            Err(TimelineError::SplitOutOfRange { clip_id: clip, at: bad })
        );
    }
    assert_eq!(store.clip(clip).unwrap().duration, 8.0);

    let second = store.split_clip(clip, 3.0).unwrap();
    let first = store.clip(clip).unwrap();
    let second = store.clip(second).unwrap();
    assert_eq!((first.start_time, first.duration), (0.0, 3.0));
    assert_eq!((second.start_time, second.duration), (3.0, 5.0));
    assert_eq!(second.content, "riff");
    assert_eq!(second.track_id, tracks[0]);
}

#[test]
fn dragging_moves_clip_between_tracks() {
    let (mut store, tracks) = store_with_tracks(3);
    let clip = store.add_clip(ClipBuilder::new(tracks[0]).at(1.0)).unwrap();
    let view = TimelineView::default();
    let ctl = InteractionController::default();

    let session = ctl
        .begin_drag(&mut store, clip, Pointer::new(200.0, 40.0), Modifiers::NONE)
        .unwrap();
    session
        .on_move(&mut store, &view, Pointer::new(200.0, 130.0))
        .unwrap();
    session.on_end();

    assert_eq!(store.clip(clip).unwrap().track_id, tracks[1]);
    assert!(!store.track(tracks[0]).unwrap().clips.contains(&clip));
    assert!(store.track(tracks[1]).unwrap().clips.contains(&clip));
    assert_eq!(store.clip(clip).unwrap().start_time, 1.0);
}

#[test]
fn dragging_upward_moves_to_previous_track() {
    let (mut store, tracks) = store_with_tracks(3);
    let clip = store.add_clip(ClipBuilder::new(tracks[2])).unwrap();
    let view = TimelineView::default();
    let ctl = InteractionController::default();

    let session = ctl
        .begin_drag(&mut store, clip, Pointer::new(0.0, 200.0), Modifiers::NONE)
        .unwrap();
    session
        .on_move(&mut store, &view, Pointer::new(0.0, 170.0))
        .unwrap();
    assert_eq!(store.clip(clip).unwrap().track_id, tracks[1]);
}

#[test]
fn zoom_keeps_anchor_fixed() {
    let mut view = TimelineView::new(10.0, 1);
    assert_eq!(view.content_width(), 1000.0);

    view.zoom_at(1.0, 500.0, 0.0);
    assert_eq!(view.zoom(), 2.0);
    assert_eq!(view.content_width(), 2000.0);
    assert_eq!(view.horizontal_scroll(), 500.0);
    // Content fraction under the anchor is still one half.
    assert_eq!((500.0 + view.horizontal_scroll()) / view.content_width(), 0.5);
}

#[test]
fn selection_kinds_are_exclusive() {
    let (mut store, tracks) = store_with_tracks(2);
    let a = store.add_clip(ClipBuilder::new(tracks[0])).unwrap();
    let b = store.add_clip(ClipBuilder::new(tracks[1])).unwrap();
    store.select_clip(a, false).unwrap();
    store.select_clip(b, true).unwrap();

    store.select_track(tracks[0], false).unwrap();
    assert!(store.selection().clips().is_empty());
    assert_eq!(store.selection().tracks(), &[tracks[0]]);

    store.select_clip(a, false).unwrap();
    assert!(store.selection().tracks().is_empty());
}

#[test]
fn deleting_entities_prunes_selection() {
    let (mut store, tracks) = store_with_tracks(2);
    let a = store.add_clip(ClipBuilder::new(tracks[0])).unwrap();
    let b = store.add_clip(ClipBuilder::new(tracks[1])).unwrap();
    store.select_clip(a, true).unwrap();
    store.select_clip(b, true).unwrap();
    store.remove_track(tracks[0]).unwrap();
    assert_eq!(store.selection().clips(), &[b]);

    store.select_track(tracks[1], false).unwrap();
    store.remove_track(tracks[1]).unwrap();
    assert!(store.selection().is_empty());
    store.check_invariants().unwrap();
}

#[test]
fn tempo_is_clamped_by_the_store() {
    let mut store = TimelineStore::new();
    store.set_tempo(1000.0);
    assert_eq!(store.transport().tempo(), 300.0);
    store.set_tempo(1.0);
    assert_eq!(store.transport().tempo(), 20.0);
}
