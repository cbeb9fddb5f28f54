//! Typed-out reveal of a chosen reply.

use std::iter::FusedIterator;

pub const DEFAULT_CHARS_PER_FRAME: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealEvent {
    /// `shown` characters are now visible.
    Frame { shown: usize },
    /// Emitted exactly once, after the last frame.
    Done,
}

/// Progressive reveal of one reply, a few characters per frame.
///
/// Iterating yields frames until the whole text is visible, then a single
/// [`RevealEvent::Done`], then nothing. A finished reveal cannot be rewound.
#[derive(Debug, Clone)]
pub struct Reveal {
    text: String,
    total_chars: usize,
    shown_chars: usize,
    chars_per_frame: usize,
    done: bool,
}

impl Reveal {
    pub fn new(text: impl Into<String>, chars_per_frame: usize) -> Self {
        let text = text.into();
        let total_chars = text.chars().count();
        Self {
            text,
            total_chars,
            shown_chars: 0,
            chars_per_frame: chars_per_frame.max(1),
            done: false,
        }
    }

    /// The prefix revealed so far. Never splits a character.
    pub fn visible(&self) -> &str {
        let end = self
            .text
            .char_indices()
            .nth(self.shown_chars)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len());
        &self.text[..end]
    }
}

impl Iterator for Reveal {
    type Item = RevealEvent;

    fn next(&mut self) -> Option<RevealEvent> {
        if self.done {
            return None;
        }
        if self.shown_chars < self.total_chars {
            self.shown_chars = (self.shown_chars + self.chars_per_frame).min(self.total_chars);
            return Some(RevealEvent::Frame {
                shown: self.shown_chars,
            });
        }
        self.done = true;
        Some(RevealEvent::Done)
    }
}

impl FusedIterator for Reveal {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_then_single_done() {
        let events: Vec<RevealEvent> = Reveal::new("Quack!", 2).collect();
        assert_eq!(
            events,
            vec![
                RevealEvent::Frame { shown: 2 },
                RevealEvent::Frame { shown: 4 },
                RevealEvent::Frame { shown: 6 },
                RevealEvent::Done,
            ]
        );
    }

    #[test]
    fn test_visible_prefix_tracks_frames() {
        let mut reveal = Reveal::new("Quack quack!", 5);
        assert_eq!(reveal.visible(), "");
        reveal.next();
        assert_eq!(reveal.visible(), "Quack");
        reveal.next();
        assert_eq!(reveal.visible(), "Quack quac");
        reveal.next();
        assert_eq!(reveal.visible(), "Quack quack!");
        assert_eq!(reveal.next(), Some(RevealEvent::Done));
        assert_eq!(reveal.visible(), "Quack quack!");
        assert_eq!(reveal.next(), None);
    }

    #[test]
    fn test_multibyte_text_is_not_split() {
        let mut reveal = Reveal::new("¿Cuá?", 1);
        reveal.next();
        reveal.next();
        assert_eq!(reveal.visible(), "¿C");
        reveal.next();
        reveal.next();
        assert_eq!(reveal.visible(), "¿Cuá");
    }

    #[test]
    fn test_exhausted_reveal_stays_exhausted() {
        let mut reveal = Reveal::new("Q", 3);
        assert_eq!(reveal.next(), Some(RevealEvent::Frame { shown: 1 }));
        assert_eq!(reveal.next(), Some(RevealEvent::Done));
        assert_eq!(reveal.next(), None);
        assert_eq!(reveal.next(), None);
        assert_eq!(reveal.visible(), "Q");
    }

    #[test]
    fn test_zero_speed_is_clamped() {
        let frames = Reveal::new("abc", 0).count();
        // three single-character frames plus Done
        assert_eq!(frames, 4);
    }
}
