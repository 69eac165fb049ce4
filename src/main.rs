use promptdaw::config::Config;
use promptdaw::input::{Modifiers, Pointer};
use promptdaw::model::{ClipBuilder, TrackBuilder, TrackType};
use promptdaw::session::TimelineSession;
use promptdaw::time_utils::format_playhead;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    log::info!("Starting PromptDAW...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("Falling back to default config: {}", e);
        Config::default()
    });

    log::debug!("Config path: {:?}", Config::path());
    let mut session = TimelineSession::new(config)?;
    if !session.midi.is_available() {
        log::info!("MIDI output disabled");
    }

    let group = session.store.create_group("Band")?;
    let keys = session
        .store
        .add_track(TrackBuilder::new(TrackType::Midi).with_name("Keys").in_group(group))?;
    let pads = session
        .store
        .add_track(TrackBuilder::new(TrackType::Midi).with_name("Pads").in_group(group))?;

    let intro = session.store.add_clip(
        ClipBuilder::new(keys)
            .with_duration(8.0)
            .with_content("Soft piano intro in C minor"),
    )?;
    let verse = session.store.split_clip(intro, 4.0)?;
    session.store.add_dependency(verse, intro)?;
    let swell = session.store.add_clip(
        ClipBuilder::new(pads)
            .at(4.0)
            .with_content("Warm string pad swelling under the verse"),
    )?;
    session.store.add_dependency(swell, intro)?;

    // Drag the verse one lane down and two beats right.
    let view = session.view.clone();
    let drag = session.interactions.begin_at(
        &mut session.store,
        &view,
        verse,
        Pointer::new(600.0, 40.0),
        0.0,
        Modifiers::NONE,
    )?;
    drag.on_move(&mut session.store, &view, Pointer::new(800.0, 130.0))?;
    drag.on_end();

    session.process_clip(intro, 0.0)?;
    session.store.play();
    session.tick(0.0);
    for frame in 1..=150 {
        let done = session.tick(frame as f64 * 1000.0 / 60.0);
        for clip_id in done {
            log::info!("Clip {} finished processing", clip_id);
        }
    }
    session.stop();

    for event in session.drain_events() {
        log::debug!("{:?}", event);
    }

    for id in session.store.display_order() {
        if let Some(track) = session.store.track(id) {
            println!("{} ({} clips)", track.name, track.clips.len());
            for clip in session.store.clips_on_track(id) {
                println!(
                    "  [{:>5.2} .. {:>5.2}] {:?} {}",
                    clip.start_time,
                    clip.end_time(),
                    clip.status,
                    clip.content
                );
            }
        }
    }
    let transport = session.store.transport();
    println!(
        "Playhead {}",
        format_playhead(transport.playhead(), transport.time_signature().numerator)
    );

    Ok(())
}
