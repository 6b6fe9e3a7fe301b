//! Effect Sink
//!
//! Abilities narrate themselves through fire-and-forget requests: dust at
//! a teleport origin, a flash on impact, a floating damage number. The
//! engine never waits on any of these; it pushes requests into this queue
//! and the hosting presentation layer drains them whenever it likes.
//!
//! Headless runs simply let the queue accumulate (tests inspect it) or
//! drain it to nowhere.

use bevy::prelude::*;

use super::grid::Cell;

/// Visual effect vocabulary. Deliberately small and descriptive; the
/// host maps these to whatever particles it owns.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VisualKind {
    DustPuff,
    Flash,
    SlashArc,
    ImpactSpark,
    WarmupPulse,
    MuzzleFlash,
    FireGlow,
    TransformBurst,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SoundKind {
    Teleport,
    SlashHit,
    GunShot,
    BladeWhoosh,
    BurstImpact,
    TransformRoar,
}

/// One queued presentation request.
#[derive(Clone, Debug)]
pub enum EffectRequest {
    Visual {
        kind: VisualKind,
        cell: Cell,
        scale: f32,
    },
    Sound {
        kind: SoundKind,
        cell: Cell,
    },
    FloatingText {
        target: Entity,
        text: String,
    },
}

/// Queue of pending presentation requests.
#[derive(Resource, Default)]
pub struct EffectSink {
    requests: Vec<EffectRequest>,
}

impl EffectSink {
    pub fn request_visual(&mut self, kind: VisualKind, cell: Cell, scale: f32) {
        self.requests.push(EffectRequest::Visual { kind, cell, scale });
    }

    pub fn request_sound(&mut self, kind: SoundKind, cell: Cell) {
        self.requests.push(EffectRequest::Sound { kind, cell });
    }

    pub fn request_floating_text(&mut self, target: Entity, text: impl Into<String>) {
        self.requests.push(EffectRequest::FloatingText {
            target,
            text: text.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn pending(&self) -> &[EffectRequest] {
        &self.requests
    }

    /// Hand the queued requests to the host, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<EffectRequest> {
        std::mem::take(&mut self.requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_accumulate_in_order() {
        let mut sink = EffectSink::default();
        sink.request_visual(VisualKind::DustPuff, Cell::new(1, 1), 1.5);
        sink.request_sound(SoundKind::Teleport, Cell::new(1, 1));
        sink.request_floating_text(Entity::from_raw(1), "12");

        assert_eq!(sink.len(), 3);
        assert!(matches!(sink.pending()[0], EffectRequest::Visual { .. }));
        assert!(matches!(sink.pending()[2], EffectRequest::FloatingText { .. }));
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut sink = EffectSink::default();
        sink.request_sound(SoundKind::GunShot, Cell::new(0, 0));
        let drained = sink.drain();
        assert_eq!(drained.len(), 1);
        assert!(sink.is_empty());
    }
}
