// The track file format: camelCase JSON, round-trippable, with every
// settings field falling back to its documented default when absent.
// Frequencies are written for readability but never trusted on import;
// the generator's table is the authority.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sequence::NoteLength;
use crate::synth::settings::{FilterKind, Rolloff, WaveType};
use crate::synth::{SynthBackend, TrackSettings};

use super::project::{DEFAULT_COLOR, DEFAULT_TITLE, Track};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackFile {
    #[serde(default = "default_title")]
    title: String,
    #[serde(default = "default_color")]
    color: String,
    #[serde(default)]
    volume: f32,
    #[serde(default = "default_octaves")]
    number_of_octaves: u32,
    // structurally required; a file without lanes is not a track
    tones: Vec<ToneFile>,
    #[serde(default)]
    track_settings: TrackSettingsFile,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToneFile {
    name: String,
    frequency: f32,
    // [step, code] pairs; codes are parsed strictly on import
    unit_blocks: Vec<(u32, String)>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackSettingsFile {
    #[serde(default)]
    wave_type: WaveType,
    #[serde(default)]
    detune: f32,
    #[serde(default)]
    volume: f32,
    #[serde(default = "default_attack")]
    attack: f32,
    #[serde(default = "default_decay")]
    decay: f32,
    #[serde(default = "default_sustain")]
    sustain: f32,
    #[serde(default = "default_release")]
    release: f32,
    #[serde(default)]
    filter_type: Option<FilterKind>,
    #[serde(default = "default_cutoff")]
    cutoff_frequency: f32,
    #[serde(default = "default_q")]
    q: f32,
    #[serde(default)]
    rolloff: Rolloff,
    #[serde(default)]
    reverb_amount: Option<f32>,
    #[serde(default)]
    delay_time: Option<f32>,
    #[serde(default)]
    is_mute: bool,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_octaves() -> u32 {
    crate::shared::DEFAULT_OCTAVES
}

fn default_attack() -> f32 {
    0.005
}

fn default_decay() -> f32 {
    0.1
}

fn default_sustain() -> f32 {
    0.3
}

fn default_release() -> f32 {
    1.0
}

fn default_cutoff() -> f32 {
    1000.0
}

fn default_q() -> f32 {
    1.0
}

impl Default for TrackSettingsFile {
    fn default() -> Self {
        settings_to_file(&TrackSettings::default())
    }
}

fn settings_to_file(settings: &TrackSettings) -> TrackSettingsFile {
    TrackSettingsFile {
        wave_type: settings.wave(),
        detune: settings.detune(),
        volume: settings.volume(),
        attack: settings.attack(),
        decay: settings.decay(),
        sustain: settings.sustain(),
        release: settings.release(),
        filter_type: settings.filter(),
        cutoff_frequency: settings.cutoff(),
        q: settings.q(),
        rolloff: settings.rolloff(),
        reverb_amount: settings.reverb_amount(),
        delay_time: settings.delay_time(),
        is_mute: settings.is_mute(),
    }
}

// everything goes through the setters so file values get the same clamping
// the settings UI does
fn settings_from_file(file: &TrackSettingsFile) -> TrackSettings {
    let mut settings = TrackSettings::default();
    settings.set_wave(file.wave_type);
    settings.set_detune(file.detune);
    settings.set_volume(file.volume);
    settings.set_attack(file.attack);
    settings.set_decay(file.decay);
    settings.set_sustain(file.sustain);
    settings.set_release(file.release);
    settings.set_filter(file.filter_type);
    settings.set_cutoff(file.cutoff_frequency);
    settings.set_q(file.q);
    settings.set_rolloff(file.rolloff);
    settings.set_reverb_amount(file.reverb_amount);
    settings.set_delay_time(file.delay_time);
    settings.set_mute(file.is_mute);
    settings
}

/// Serializes a track to the pretty-printed JSON the export button writes.
pub fn export_json(track: &Track) -> String {
    let file = TrackFile {
        title: track.title().to_string(),
        color: track.color().to_string(),
        volume: track.volume(),
        number_of_octaves: track.number_of_octaves(),
        tones: track
            .tones()
            .iter()
            .map(|tone| ToneFile {
                name: tone.name().to_string(),
                frequency: tone.frequency(),
                unit_blocks: tone
                    .notes()
                    .map(|(step, length)| (step, length.code().to_string()))
                    .collect(),
            })
            .collect(),
        track_settings: settings_to_file(track.settings()),
    };
    serde_json::to_string_pretty(&file).expect("track file serialization is infallible")
}

/// Rebuilds a track from exported JSON.
///
/// The lanes come from the generator for the stored octave count, then the
/// file's notes are painted onto them; a failed import never produces a
/// half-restored track, the caller keeps whatever it had.
pub fn import_json(json: &str, backend: Box<dyn SynthBackend>) -> Result<Track> {
    let file: TrackFile =
        serde_json::from_str(json).map_err(|e| Error::MalformedProject(e.to_string()))?;

    let mut track = Track::new(&file.title, &file.color, backend);
    track.set_volume(file.volume);
    track.set_number_of_octaves(file.number_of_octaves);
    *track.settings_mut() = settings_from_file(&file.track_settings);

    for tone_file in &file.tones {
        let row = track.row_of(&tone_file.name).ok_or_else(|| {
            Error::MalformedProject(format!("unknown tone name `{}`", tone_file.name))
        })?;
        for (step, code) in &tone_file.unit_blocks {
            let length = NoteLength::parse(code)?;
            track.insert_note(row, *step, length);
        }
    }
    Ok(track)
}

/// Saves a track next to wherever the caller wants it, creating parents.
pub fn save_track(path: &Path, track: &Track) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, export_json(track))?;
    Ok(())
}

pub fn load_track(path: &Path, backend: Box<dyn SynthBackend>) -> anyhow::Result<Track> {
    let data = std::fs::read_to_string(path)?;
    Ok(import_json(&data, backend)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::SharedVirtualBackend;

    fn backend() -> Box<dyn SynthBackend> {
        Box::new(SharedVirtualBackend::new())
    }

    fn sample_track() -> Track {
        let mut track = Track::new("Bleeps", "#00FF00", backend());
        track.set_volume(-6.0);
        let row = track.row_of("C4").unwrap();
        track.insert_note(row, 0, NoteLength::Quarter);
        track.insert_note(row, 10, NoteLength::Whole);
        let row = track.row_of("A#3").unwrap();
        track.insert_note(row, 4, NoteLength::Sixteenth);
        track.settings_mut().set_filter(Some(FilterKind::Highpass));
        track.settings_mut().set_cutoff(800.0);
        track.settings_mut().set_reverb_amount(Some(0.3));
        track.settings_mut().set_mute(true);
        track
    }

    fn note_triples(track: &Track) -> Vec<(usize, u32, NoteLength)> {
        track
            .tones()
            .iter()
            .enumerate()
            .flat_map(|(row, tone)| tone.notes().map(move |(step, len)| (row, step, len)))
            .collect()
    }

    #[test]
    fn test_round_trip_reproduces_notes_and_settings() {
        let original = sample_track();
        let json = export_json(&original);
        let restored = import_json(&json, backend()).unwrap();

        assert_eq!(note_triples(&restored), note_triples(&original));
        assert_eq!(restored.settings(), original.settings());
        assert_eq!(restored.title(), "Bleeps");
        assert_eq!(restored.color(), "#00FF00");
        assert_eq!(restored.volume(), -6.0);
        assert_eq!(restored.number_of_octaves(), 5);
    }

    #[test]
    fn test_frequencies_come_from_the_table_not_the_file() {
        let original = sample_track();
        let json = export_json(&original).replace("440", "9999");
        let restored = import_json(&json, backend()).unwrap();
        let row = restored.row_of("A4").unwrap();
        assert_eq!(restored.tones()[row].frequency(), 440.0);
    }

    #[test]
    fn test_export_uses_the_original_field_names() {
        let json = export_json(&sample_track());
        for field in [
            "\"unitBlocks\"",
            "\"waveType\"",
            "\"numberOfOctaves\"",
            "\"cutoffFrequency\"",
            "\"reverbAmount\"",
            "\"delayTime\"",
            "\"isMute\"",
            "\"trackSettings\"",
        ] {
            assert!(json.contains(field), "missing {field} in export");
        }
    }

    #[test]
    fn test_missing_settings_fields_fall_back_to_defaults() {
        let json = r#"{
            "title": "Sparse",
            "tones": [],
            "trackSettings": { "waveType": "square" }
        }"#;
        let track = import_json(json, backend()).unwrap();
        assert_eq!(track.settings().wave(), WaveType::Square);
        assert_eq!(track.settings().attack(), 0.005);
        assert_eq!(track.settings().sustain(), 0.3);
        assert_eq!(track.settings().filter(), None);
        assert_eq!(track.settings().rolloff(), Rolloff::Db12);
        assert_eq!(track.color(), "#FFFFFF");
        assert_eq!(track.number_of_octaves(), 5);
    }

    #[test]
    fn test_missing_tones_is_fatal() {
        let json = r#"{ "title": "No lanes" }"#;
        assert!(matches!(
            import_json(json, backend()),
            Err(Error::MalformedProject(_))
        ));
    }

    #[test]
    fn test_unknown_duration_code_is_surfaced() {
        let json = r#"{
            "tones": [
                { "name": "C4", "frequency": 261.63, "unitBlocks": [[0, "7n"]] }
            ]
        }"#;
        assert!(matches!(
            import_json(json, backend()),
            Err(Error::UnknownNoteLength(code)) if code == "7n"
        ));
    }

    #[test]
    fn test_unknown_tone_name_is_malformed() {
        let json = r#"{
            "tones": [
                { "name": "Z9", "frequency": 1.0, "unitBlocks": [] }
            ]
        }"#;
        assert!(matches!(
            import_json(json, backend()),
            Err(Error::MalformedProject(_))
        ));
    }

    #[test]
    fn test_import_clamps_out_of_range_values() {
        let json = r#"{
            "volume": 500,
            "numberOfOctaves": 42,
            "tones": [],
            "trackSettings": { "detune": -9000, "sustain": 7 }
        }"#;
        let track = import_json(json, backend()).unwrap();
        assert_eq!(track.volume(), 32.0);
        assert_eq!(track.number_of_octaves(), 5);
        assert_eq!(track.settings().detune(), -1200.0);
        assert_eq!(track.settings().sustain(), 1.0);
    }
}
