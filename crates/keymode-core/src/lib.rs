// Keymode Core Library
// Mode-driven keymap tables, user modifiers and keyboard pointer movement

pub mod chord;
pub mod clipboard;
pub mod engine;
pub mod host;
pub mod key;
pub mod keymap;
pub mod macro_typer;
pub mod mode;
pub mod modifier;
pub mod movement;
pub mod profile;
pub mod window;

#[cfg(feature = "settings")]
pub mod settings;

pub use chord::{parse_chord, parse_output_chord, ChordParseError, ChordSpec, Edge, OutputChord};
pub use engine::{BindingResolver, Dispatch, EngineError, KeyEdge, KeyEvent, KeymapEngine, KeymapId};
pub use host::{Host, HostCommand, HostCtx, MonitorEdge};
pub use key::Key;
pub use keymap::{Activation, Binding, WindowKeymap};
pub use mode::{Mode, ModeContext};
pub use modifier::{Modifier, ModifierSet};
pub use movement::{MovementConfig, MovementController, MovementState};
pub use profile::{install, Profile, ProfileConfig, ProfileError};
pub use window::{WindowCondition, WindowInfo, WindowProvider};

#[cfg(feature = "settings")]
pub use settings::{Settings, SettingsError};
