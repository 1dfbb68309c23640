// Keymode Paced Typer
// Types a fixed key sequence with a pause between keys
//
// Pacing from the injecting context is unreliable on real hosts: typed in
// place, real key events interleave with the synthetic ones; deferred, the
// host sees key-up timestamps out of order. Both forms are kept as they are.

use std::sync::Arc;
use std::time::Duration;

use crate::chord::OutputChord;
use crate::host::{InputSink, Scheduler};
use crate::key::ascii_to_key;
use crate::modifier::{Modifier, ModifierSet};
use crate::movement::{Pacer, ThreadSleep};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MacroError {
    #[error("cannot type character {0:?}")]
    UnsupportedChar(char),
}

/// A key sequence typed with a fixed delay between keys
#[derive(Debug, Clone, PartialEq)]
pub struct PacedTyper {
    keys: Vec<OutputChord>,
    delay: Duration,
}

impl PacedTyper {
    pub fn new(keys: Vec<OutputChord>, delay: Duration) -> Self {
        Self { keys, delay }
    }

    /// Sequence typing `text`; uppercase letters are shifted
    pub fn from_text(text: &str, delay: Duration) -> Result<Self, MacroError> {
        let keys = text
            .chars()
            .map(|c| {
                let key = ascii_to_key(c).ok_or(MacroError::UnsupportedChar(c))?;
                let modifiers = if c.is_ascii_uppercase() {
                    ModifierSet::new().with(Modifier::Shift)
                } else {
                    ModifierSet::new()
                };
                Ok(OutputChord::new(modifiers, key))
            })
            .collect::<Result<Vec<_>, MacroError>>()?;
        Ok(Self::new(keys, delay))
    }

    pub fn keys(&self) -> &[OutputChord] {
        &self.keys
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Type the sequence in place, sleeping between keys
    pub fn type_blocking(&self, sink: &dyn InputSink) {
        self.type_paced(sink, &mut ThreadSleep);
    }

    pub fn type_paced(&self, sink: &dyn InputSink, pacer: &mut dyn Pacer) {
        for (i, chord) in self.keys.iter().enumerate() {
            if i > 0 {
                pacer.pause(self.delay);
            }
            sink.send_chord(chord);
        }
    }

    /// Hand the whole sequence to the host scheduler and return at once
    pub fn type_deferred(&self, scheduler: &dyn Scheduler, sink: Arc<dyn InputSink>) {
        log::warn!(
            "typing {} keys with {:?} pacing; the host may report timestamp inversion",
            self.keys.len(),
            self.delay
        );
        let typer = self.clone();
        scheduler.delayed_call(
            Box::new(move || typer.type_blocking(sink.as_ref())),
            Duration::ZERO,
        );
    }
}
