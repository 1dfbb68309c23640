// Keymode Keymap Engine
// Reference binding resolver: registers tables, tracks held modifiers and
// dispatches key events to the active bindings

use std::collections::HashMap;
use std::fmt;

use crate::chord::{ChordParseError, ChordSpec, Edge};
use crate::host::{Host, HostCtx};
use crate::keymap::{Binding, WindowKeymap};
use crate::modifier::{Modifier, ModifierSet};
use crate::window::WindowInfo;
use crate::Key;

/// Errors from engine setup
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("{0} is not a user modifier")]
    NotUserModifier(Modifier),

    #[error("key {0} is already a modifier key")]
    ModifierKey(Key),

    #[error("no key is assigned to user modifier {0}")]
    UnassignedUserModifier(Modifier),

    #[error(transparent)]
    Parse(#[from] ChordParseError),
}

/// Direction of a raw key event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEdge {
    Down,
    Up,
}

/// A raw key event as delivered by the host hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub edge: KeyEdge,
}

impl KeyEvent {
    pub fn down(key: Key) -> Self {
        Self {
            key,
            edge: KeyEdge::Down,
        }
    }

    pub fn up(key: Key) -> Self {
        Self {
            key,
            edge: KeyEdge::Up,
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.edge {
            KeyEdge::Down => write!(f, "D-{}", self.key),
            KeyEdge::Up => write!(f, "U-{}", self.key),
        }
    }
}

/// What happened to a dispatched event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A binding ran
    Fired,
    /// The event was eaten without running anything
    Suppressed,
    /// No binding; the host should deliver the event unchanged
    PassThrough,
}

/// Identifier of a registered keymap table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeymapId(pub usize);

/// The capability the profile registers its tables against
pub trait BindingResolver {
    /// Register a table; it takes part in resolution from the next
    /// `update_keymap` on
    fn define_window_keymap(&mut self, keymap: WindowKeymap) -> KeymapId;

    /// Turn `key` into the user modifier `modifier`
    fn define_modifier(&mut self, key: Key, modifier: Modifier) -> Result<(), EngineError>;

    /// Re-evaluate every activation predicate
    fn update_keymap(&mut self);

    /// Find the binding for a concrete stroke.
    ///
    /// `stroke.modifiers` holds the modifiers actually down (sided and user).
    fn resolve(&self, stroke: &ChordSpec) -> Option<&Binding>;
}

#[derive(Debug, Clone, Copy)]
struct Pressed {
    /// Modifiers held when the key went down
    modifiers: ModifierSet,
    /// Swallow the matching key-up
    consumed: bool,
}

/// Keymap engine with later-registered tables taking precedence
pub struct KeymapEngine {
    host: Host,
    keymaps: Vec<WindowKeymap>,
    active: Vec<KeymapId>,
    user_keys: HashMap<Key, Modifier>,
    held: ModifierSet,
    pressed: HashMap<Key, Pressed>,
    one_shot: Option<(Key, ModifierSet)>,
}

impl fmt::Debug for KeymapEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeymapEngine")
            .field("keymaps", &self.keymaps.len())
            .field("active", &self.active)
            .field("held", &self.held)
            .finish_non_exhaustive()
    }
}

impl KeymapEngine {
    pub fn new(host: Host) -> Self {
        Self {
            host,
            keymaps: Vec::new(),
            active: Vec::new(),
            user_keys: HashMap::new(),
            held: ModifierSet::new(),
            pressed: HashMap::new(),
            one_shot: None,
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn keymap(&self, id: KeymapId) -> Option<&WindowKeymap> {
        self.keymaps.get(id.0)
    }

    /// All registered tables in registration order
    pub fn keymaps(&self) -> impl Iterator<Item = (KeymapId, &WindowKeymap)> {
        self.keymaps.iter().enumerate().map(|(i, k)| (KeymapId(i), k))
    }

    /// Active table ids as of the last `update_keymap`
    pub fn active_keymaps(&self) -> &[KeymapId] {
        &self.active
    }

    pub fn is_active(&self, id: KeymapId) -> bool {
        self.active.contains(&id)
    }

    /// Modifiers currently held (sided and user)
    pub fn held_modifiers(&self) -> ModifierSet {
        self.held
    }

    /// Key assigned to a user modifier
    pub fn user_modifier_key(&self, modifier: Modifier) -> Option<Key> {
        self.user_keys
            .iter()
            .find(|(_, m)| **m == modifier)
            .map(|(k, _)| *k)
    }

    fn modifier_for(&self, key: Key) -> Option<Modifier> {
        self.user_keys
            .get(&key)
            .copied()
            .or_else(|| Modifier::from_key(key))
    }

    fn has_one_shot(&self, key: Key, held: ModifierSet) -> bool {
        let stroke = ChordSpec {
            edge: Edge::Press,
            one_shot: true,
            modifiers: held,
            key,
        };
        self.resolve(&stroke).is_some()
    }

    fn lookup(&self, key: Key, edge: Edge, one_shot: bool, held: ModifierSet) -> Option<Binding> {
        let stroke = ChordSpec {
            edge,
            one_shot,
            modifiers: held,
            key,
        };
        self.resolve(&stroke).cloned()
    }

    /// Feed one raw key event through the active tables
    pub fn dispatch(&mut self, event: KeyEvent) -> Dispatch {
        log::trace!("dispatch {} held={}", event, self.held);
        match event.edge {
            KeyEdge::Down => self.key_down(event.key),
            KeyEdge::Up => self.key_up(event.key),
        }
    }

    fn key_down(&mut self, key: Key) -> Dispatch {
        if let Some(modifier) = self.modifier_for(key) {
            // Auto-repeat of a held modifier keeps the one-shot candidate
            if !self.held.contains(modifier) {
                self.one_shot = Some((key, self.held));
                self.held.insert(modifier);
            }
            return if modifier.is_user() {
                Dispatch::Suppressed
            } else {
                Dispatch::PassThrough
            };
        }

        let held = self.held;
        let repeat = self.pressed.get(&key).copied();
        if repeat.is_none() {
            self.one_shot = Some((key, held));
        }

        let found = self
            .lookup(key, Edge::Press, false, held)
            .map(|b| (b, true))
            .or_else(|| self.lookup(key, Edge::Down, false, held).map(|b| (b, false)));

        if let Some((binding, consumed)) = found {
            self.one_shot = None;
            self.pressed.insert(
                key,
                Pressed {
                    modifiers: repeat.map_or(held, |p| p.modifiers),
                    consumed,
                },
            );
            self.perform(&binding);
            return Dispatch::Fired;
        }

        if let Some(pressed) = repeat {
            return if pressed.consumed {
                Dispatch::Suppressed
            } else {
                Dispatch::PassThrough
            };
        }

        // A key with a one-shot binding is held back until release
        let consumed = self.has_one_shot(key, held);
        self.pressed.insert(
            key,
            Pressed {
                modifiers: held,
                consumed,
            },
        );
        if consumed {
            Dispatch::Suppressed
        } else {
            Dispatch::PassThrough
        }
    }

    fn key_up(&mut self, key: Key) -> Dispatch {
        let mut fired = false;
        if let Some((candidate, before)) = self.one_shot {
            if candidate == key {
                self.one_shot = None;
                if let Some(binding) = self.lookup(key, Edge::Press, true, before) {
                    self.perform(&binding);
                    fired = true;
                }
            }
        }

        if let Some(modifier) = self.modifier_for(key) {
            self.held.remove(modifier);
            return if fired {
                Dispatch::Fired
            } else if modifier.is_user() {
                Dispatch::Suppressed
            } else {
                Dispatch::PassThrough
            };
        }

        let pressed = self.pressed.remove(&key);
        if fired {
            return Dispatch::Fired;
        }
        if pressed.map_or(false, |p| p.consumed) {
            return Dispatch::Suppressed;
        }

        // Match the release against the modifiers held at press time
        let held = pressed.map_or(self.held, |p| p.modifiers);
        match self.lookup(key, Edge::Up, false, held) {
            Some(binding) => {
                self.perform(&binding);
                Dispatch::Fired
            }
            None => Dispatch::PassThrough,
        }
    }

    fn perform(&mut self, binding: &Binding) {
        match binding {
            Binding::Chord(chord) => self.host.input.send_chord(chord),
            Binding::Sequence(chords) => {
                for chord in chords {
                    self.host.input.send_chord(chord);
                }
            }
            Binding::Command(command) => self.host.commands.run_command(*command),
            Binding::Callback(callback) => {
                let requested = {
                    let mut ctx = HostCtx::new(&self.host);
                    callback(&mut ctx);
                    ctx.update_requested()
                };
                if requested {
                    self.update_keymap();
                }
            }
        }
    }

    /// Raw events that type `chord` on a keyboard, modifiers included.
    ///
    /// Generic modifiers use the left key. User modifiers need a key
    /// assigned through `define_modifier`.
    pub fn chord_events(&self, chord: &ChordSpec) -> Result<Vec<KeyEvent>, EngineError> {
        let mut modifier_keys = Vec::with_capacity(chord.modifiers.len());
        for modifier in chord.modifiers.iter() {
            let key = if modifier.is_user() {
                self.user_modifier_key(modifier)
                    .ok_or(EngineError::UnassignedUserModifier(modifier))?
            } else {
                modifier
                    .key()
                    .ok_or(EngineError::UnassignedUserModifier(modifier))?
            };
            modifier_keys.push(key);
        }

        let mut events: Vec<KeyEvent> = modifier_keys.iter().map(|k| KeyEvent::down(*k)).collect();
        match chord.edge {
            Edge::Press => {
                events.push(KeyEvent::down(chord.key));
                events.push(KeyEvent::up(chord.key));
            }
            Edge::Down => events.push(KeyEvent::down(chord.key)),
            Edge::Up => events.push(KeyEvent::up(chord.key)),
        }
        events.extend(modifier_keys.iter().rev().map(|k| KeyEvent::up(*k)));
        Ok(events)
    }

    /// Parse a chord spec and dispatch the events that type it
    pub fn type_chord(&mut self, spec: &str) -> Result<Vec<Dispatch>, EngineError> {
        let chord: ChordSpec = spec.parse()?;
        let events = self.chord_events(&chord)?;
        Ok(events.into_iter().map(|e| self.dispatch(e)).collect())
    }

    fn current_window(&self) -> WindowInfo {
        match self.host.windows.foreground_window() {
            Ok(window) => window,
            Err(e) => {
                log::debug!("foreground window unavailable: {}", e);
                WindowInfo::default()
            }
        }
    }
}

impl BindingResolver for KeymapEngine {
    fn define_window_keymap(&mut self, keymap: WindowKeymap) -> KeymapId {
        let id = KeymapId(self.keymaps.len());
        log::debug!(
            "defined keymap '{}' ({} bindings) as #{}",
            keymap.name(),
            keymap.len(),
            id.0
        );
        self.keymaps.push(keymap);
        id
    }

    fn define_modifier(&mut self, key: Key, modifier: Modifier) -> Result<(), EngineError> {
        if !modifier.is_user() {
            return Err(EngineError::NotUserModifier(modifier));
        }
        if Modifier::from_key(key).is_some() {
            return Err(EngineError::ModifierKey(key));
        }
        // One key per user modifier
        self.user_keys.retain(|_, m| *m != modifier);
        self.user_keys.insert(key, modifier);
        log::debug!("key {} is now {}", key, modifier);
        Ok(())
    }

    fn update_keymap(&mut self) {
        let window = self.current_window();
        self.active = self
            .keymaps
            .iter()
            .enumerate()
            .filter(|(_, keymap)| keymap.is_active(&window))
            .map(|(i, _)| KeymapId(i))
            .collect();

        if log::log_enabled!(log::Level::Debug) {
            let names: Vec<&str> = self
                .active
                .iter()
                .filter_map(|id| self.keymaps.get(id.0))
                .map(|k| k.name())
                .collect();
            log::debug!("active keymaps: [{}]", names.join(", "));
        }
    }

    fn resolve(&self, stroke: &ChordSpec) -> Option<&Binding> {
        self.active
            .iter()
            .rev()
            .filter_map(|id| self.keymaps.get(id.0))
            .find_map(|keymap| {
                keymap.iter().find_map(|(chord, binding)| {
                    let matched = chord.key == stroke.key
                        && chord.edge == stroke.edge
                        && chord.one_shot == stroke.one_shot
                        && chord.modifiers.matches_held(stroke.modifiers);
                    matched.then_some(binding)
                })
            })
    }
}
