//! Sound playback with an explicit session lifecycle.
//!
//! The audio session is a resource with `init`/`shutdown` instead of a
//! process-wide context: platforms gate audio output on a user gesture, so
//! the session stays closed until the first pointer or key input and every
//! play request before that resolves to a typed error instead of silently
//! touching a half-born device.

use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SoundError {
    #[error("audio session is not initialised")]
    SessionNotInitialized,
    #[error("sound bank is not loaded")]
    BankNotLoaded,
    #[error("unknown sound '{0}'")]
    UnknownSound(String),
}

/// Named sound descriptor list, loaded from `*.bank.json`.
#[derive(Asset, TypePath, Debug, Clone, Deserialize)]
pub struct SoundBank {
    pub sounds: Vec<SoundBankEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SoundBankEntry {
    pub name: String,
    pub path: String,
}

/// Explicit audio lifecycle. Closed until a user gesture arrives.
#[derive(Resource, Default)]
pub struct AudioSession {
    initialized: bool,
}

impl AudioSession {
    pub fn init(&mut self) {
        if !self.initialized {
            self.initialized = true;
            info!("audio session initialised");
        }
    }

    pub fn shutdown(&mut self) {
        self.initialized = false;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn ensure_ready(&self) -> Result<(), SoundError> {
        if self.initialized {
            Ok(())
        } else {
            Err(SoundError::SessionNotInitialized)
        }
    }
}

/// Resolves sound names to decoded audio handles.
#[derive(Resource, Default)]
pub struct SoundLibrary {
    bank: Option<Handle<SoundBank>>,
    handles: HashMap<String, Handle<AudioSource>>,
    loaded: bool,
}

impl SoundLibrary {
    pub fn set_bank(&mut self, bank: Handle<SoundBank>) {
        self.bank = Some(bank);
        self.handles.clear();
        self.loaded = false;
    }

    pub fn resolve(&self, name: &str) -> Result<Handle<AudioSource>, SoundError> {
        if !self.loaded {
            return Err(SoundError::BankNotLoaded);
        }
        self.handles
            .get(name)
            .cloned()
            .ok_or_else(|| SoundError::UnknownSound(name.to_string()))
    }
}

/// Request playback of a named sound from the library.
#[derive(Event)]
pub struct PlaySound {
    pub name: String,
}

pub struct SoundPlayerPlugin;

impl Plugin for SoundPlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(JsonAssetPlugin::<SoundBank>::new(&["bank.json"]))
            .init_resource::<AudioSession>()
            .init_resource::<SoundLibrary>()
            .add_event::<PlaySound>()
            .add_systems(
                Update,
                (init_session_on_gesture, resolve_bank_sounds, play_requested_sounds),
            );
    }
}

// The first pointer or key input counts as the gesture that opens the
// session.
fn init_session_on_gesture(
    mut session: ResMut<AudioSession>,
    mouse: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
) {
    if session.is_initialized() {
        return;
    }
    if mouse.get_just_pressed().next().is_some() || keyboard.get_just_pressed().next().is_some() {
        session.init();
    }
}

// Once the bank asset decodes, queue loads for every entry it names.
fn resolve_bank_sounds(
    mut library: ResMut<SoundLibrary>,
    banks: Res<Assets<SoundBank>>,
    asset_server: Res<AssetServer>,
) {
    if library.loaded {
        return;
    }
    let Some(bank) = library.bank.as_ref().and_then(|handle| banks.get(handle)) else {
        return;
    };
    let handles: HashMap<String, Handle<AudioSource>> = bank
        .sounds
        .iter()
        .map(|entry| (entry.name.clone(), asset_server.load(entry.path.clone())))
        .collect();
    info!("sound bank resolved: {} sounds", handles.len());
    library.handles = handles;
    library.loaded = true;
}

fn play_requested_sounds(
    mut commands: Commands,
    mut events: EventReader<PlaySound>,
    session: Res<AudioSession>,
    library: Res<SoundLibrary>,
) {
    for event in events.read() {
        let playback = session
            .ensure_ready()
            .and_then(|_| library.resolve(&event.name));
        match playback {
            Ok(source) => {
                commands.spawn((AudioPlayer(source), PlaybackSettings::DESPAWN));
            }
            Err(err) => {
                warn!("cannot play '{}': {err}", event.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_gates_playback() {
        let mut session = AudioSession::default();
        assert_eq!(session.ensure_ready(), Err(SoundError::SessionNotInitialized));
        session.init();
        assert_eq!(session.ensure_ready(), Ok(()));
        session.shutdown();
        assert_eq!(session.ensure_ready(), Err(SoundError::SessionNotInitialized));
    }

    #[test]
    fn bank_descriptor_deserializes() {
        let bank: SoundBank = serde_json::from_str(
            r#"{ "sounds": [{ "name": "select", "path": "audio/select.wav" }] }"#,
        )
        .unwrap();
        assert_eq!(bank.sounds.len(), 1);
        assert_eq!(bank.sounds[0].name, "select");
    }

    #[test]
    fn resolve_reports_missing_bank_and_unknown_names() {
        let mut library = SoundLibrary::default();
        assert_eq!(library.resolve("click"), Err(SoundError::BankNotLoaded));

        library.loaded = true;
        library
            .handles
            .insert("click".to_string(), Handle::default());
        assert!(library.resolve("click").is_ok());
        assert_eq!(
            library.resolve("boom"),
            Err(SoundError::UnknownSound("boom".to_string()))
        );
    }
}
