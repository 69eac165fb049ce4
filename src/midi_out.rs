use anyhow::Result;

/// Status bytes. Channel messages are OR-ed with the channel in the low nibble.
pub mod status {
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;
    pub const PITCH_BEND: u8 = 0xE0;
}

/// Controller numbers
pub mod controllers {
    pub const ALL_SOUND_OFF: u8 = 120;
    pub const ALL_NOTES_OFF: u8 = 123;
}

pub const PITCH_BEND_CENTER: u16 = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    /// 14-bit value, 8192 is center.
    PitchBend { channel: u8, value: u16 },
}

impl MidiMessage {
    /// Wire bytes with the channel masked to 4 bits and data to 7 bits.
    pub fn to_bytes(self) -> Vec<u8> {
        match self {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => vec![status::NOTE_ON | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => vec![status::NOTE_OFF | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => vec![
                status::CONTROL_CHANGE | (channel & 0x0F),
                controller & 0x7F,
                value & 0x7F,
            ],
            MidiMessage::ProgramChange { channel, program } => {
                vec![status::PROGRAM_CHANGE | (channel & 0x0F), program & 0x7F]
            }
            MidiMessage::PitchBend { channel, value } => vec![
                status::PITCH_BEND | (channel & 0x0F),
                (value & 0x7F) as u8,
                ((value >> 7) & 0x7F) as u8,
            ],
        }
    }
}

/// An open output port.
pub trait MidiSink {
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Platform MIDI access: lists output ports and opens them by name.
pub trait MidiBackend {
    fn output_ports(&self) -> Result<Vec<String>>;
    fn connect(&mut self, port_name: &str) -> Result<Box<dyn MidiSink>>;
}

#[cfg(feature = "midi-device")]
pub use device::MidirBackend;

#[cfg(feature = "midi-device")]
mod device {
    use anyhow::{Result, anyhow};
    use midir::{MidiOutput, MidiOutputConnection};

    use super::{MidiBackend, MidiSink};
    use crate::constants::{MIDI_CLIENT_NAME, MIDI_CONNECTION_NAME};

    pub struct MidirBackend;

    impl MidirBackend {
        pub fn new() -> Result<Self> {
            // Probe once so a missing MIDI subsystem shows up at init time.
            MidiOutput::new(MIDI_CLIENT_NAME).map_err(|e| anyhow!("{}", e))?;
            Ok(Self)
        }
    }

    impl MidiBackend for MidirBackend {
        fn output_ports(&self) -> Result<Vec<String>> {
            let midi_out = MidiOutput::new(MIDI_CLIENT_NAME).map_err(|e| anyhow!("{}", e))?;
            let ports = midi_out.ports();
            Ok(ports
                .iter()
                .filter_map(|port| midi_out.port_name(port).ok())
                .collect())
        }

        fn connect(&mut self, port_name: &str) -> Result<Box<dyn MidiSink>> {
            let midi_out = MidiOutput::new(MIDI_CLIENT_NAME).map_err(|e| anyhow!("{}", e))?;
            let port = midi_out
                .ports()
                .into_iter()
                .find(|p| midi_out.port_name(p).ok().as_deref() == Some(port_name))
                .ok_or_else(|| anyhow!("MIDI Port not found: {}", port_name))?;
            let conn = midi_out
                .connect(&port, MIDI_CONNECTION_NAME)
                .map_err(|e| anyhow!("{}", e))?;
            Ok(Box::new(MidirSink { conn }))
        }
    }

    struct MidirSink {
        conn: MidiOutputConnection,
    }

    impl MidiSink for MidirSink {
        fn send(&mut self, bytes: &[u8]) -> Result<()> {
            self.conn.send(bytes).map_err(|e| anyhow!("{}", e))
        }
    }
}

/// Best-effort MIDI output. Every send reports success as a bool and never panics.
#[derive(Default)]
pub struct MidiService {
    backend: Option<Box<dyn MidiBackend>>,
    outputs: Vec<String>,
    selected: Option<(String, Box<dyn MidiSink>)>,
    initialized: bool,
    last_error: Option<String>,
}

impl MidiService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(backend: Box<dyn MidiBackend>) -> Self {
        Self {
            backend: Some(backend),
            ..Default::default()
        }
    }

    /// Acquire platform MIDI access and pick the first output if any.
    /// Failure is kept in `last_error`.
    pub fn initialize(&mut self) -> bool {
        if self.initialized {
            return true;
        }
        if self.backend.is_none() {
            match Self::platform_backend() {
                Ok(backend) => self.backend = Some(backend),
                Err(e) => {
                    log::warn!("MIDI initialization error: {}", e);
                    self.last_error = Some(e.to_string());
                    return false;
                }
            }
        }
        self.initialized = true;
        self.last_error = None;
        self.refresh_devices();
        true
    }

    #[cfg(feature = "midi-device")]
    fn platform_backend() -> Result<Box<dyn MidiBackend>> {
        Ok(Box::new(MidirBackend::new()?))
    }

    #[cfg(not(feature = "midi-device"))]
    fn platform_backend() -> Result<Box<dyn MidiBackend>> {
        Err(anyhow::anyhow!("MIDI backend unavailable in this build"))
    }

    /// Re-list outputs. Drops the selection if its port vanished, then
    /// falls back to the first available output.
    pub fn refresh_devices(&mut self) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        match backend.output_ports() {
            Ok(ports) => self.outputs = ports,
            Err(e) => {
                log::warn!("Failed to list MIDI outputs: {}", e);
                self.last_error = Some(e.to_string());
                self.outputs.clear();
            }
        }

        if let Some((name, _)) = &self.selected
            && !self.outputs.contains(name)
        {
            log::info!("MIDI output '{}' disconnected", name);
            self.selected = None;
        }
        if self.selected.is_none()
            && let Some(first) = self.outputs.first().cloned()
        {
            self.select_output_device(&first);
        }
    }

    pub fn select_output_device(&mut self, name: &str) -> bool {
        if !self.outputs.iter().any(|o| o == name) {
            return false;
        }
        let Some(backend) = self.backend.as_mut() else {
            return false;
        };
        match backend.connect(name) {
            Ok(sink) => {
                log::info!("Selected MIDI output '{}'", name);
                self.selected = Some((name.to_string(), sink));
                true
            }
            Err(e) => {
                log::warn!("Could not open MIDI output '{}': {}", name, e);
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    pub fn output_devices(&self) -> &[String] {
        &self.outputs
    }

    pub fn selected_output(&self) -> Option<&str> {
        self.selected.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_available(&self) -> bool {
        self.initialized && self.backend.is_some()
    }

    pub fn has_output_devices(&self) -> bool {
        !self.outputs.is_empty()
    }

    pub fn send(&mut self, message: MidiMessage) -> bool {
        let Some((name, sink)) = self.selected.as_mut() else {
            return false;
        };
        match sink.send(&message.to_bytes()) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Error sending {:?} to '{}': {}", message, name, e);
                false
            }
        }
    }

    pub fn send_note_on(&mut self, note: u8, velocity: u8, channel: u8) -> bool {
        self.send(MidiMessage::NoteOn {
            channel,
            note,
            velocity,
        })
    }

    pub fn send_note_off(&mut self, note: u8, velocity: u8, channel: u8) -> bool {
        self.send(MidiMessage::NoteOff {
            channel,
            note,
            velocity,
        })
    }

    pub fn send_control_change(&mut self, controller: u8, value: u8, channel: u8) -> bool {
        self.send(MidiMessage::ControlChange {
            channel,
            controller,
            value,
        })
    }

    pub fn send_program_change(&mut self, program: u8, channel: u8) -> bool {
        self.send(MidiMessage::ProgramChange { channel, program })
    }

    pub fn send_pitch_bend(&mut self, value: u16, channel: u8) -> bool {
        self.send(MidiMessage::PitchBend { channel, value })
    }

    /// All-notes-off on one channel, or on all 16 when `channel` is `None`.
    pub fn send_all_notes_off(&mut self, channel: Option<u8>) -> bool {
        match channel {
            Some(ch) => self.send_control_change(controllers::ALL_NOTES_OFF, 0, ch),
            None => (0..16).fold(true, |ok, ch| {
                self.send_control_change(controllers::ALL_NOTES_OFF, 0, ch) && ok
            }),
        }
    }

    /// All notes and all sound off on every channel.
    pub fn panic(&mut self) -> bool {
        let notes = self.send_all_notes_off(None);
        (0..16).fold(notes, |ok, ch| {
            self.send_control_change(controllers::ALL_SOUND_OFF, 0, ch) && ok
        })
    }
}
