//! Combat event log
//!
//! Append-only record of everything the renderer floats over the playfield:
//! damage numbers, status text, reward pickups. The simulation appends
//! during the frame; the renderer reads events out of the snapshot, marks
//! them displayed, and the end-of-frame sweep prunes entries older than the
//! display window.

use serde::{Deserialize, Serialize};

use crate::game::constants::combat;
use crate::util::vec2::Vec2;

/// What a combat event represents on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatEventKind {
    /// Direct or splash damage dealt
    Damage,
    /// Critical damage (emphasized display)
    Critical,
    /// Health restored
    Heal,
    /// Slow applied
    Freeze,
    /// Damage-over-time tick
    Burn,
    /// Chained effect jump
    Chain,
    /// Instant-kill threshold triggered
    Execute,
    /// Experience gained
    Xp,
    /// Currency credited
    Currency,
    /// Attack missed
    Miss,
    /// Shield absorbed the hit
    Shield,
    /// Target immune, no effect applied
    Immune,
}

/// One renderable combat event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatEvent {
    pub kind: CombatEventKind,
    /// Magnitude shown next to the kind (damage dealt, currency credited).
    /// Zero for kinds that are pure status text.
    pub amount: f32,
    /// World position the text floats up from
    pub position: Vec2,
    /// Simulation time the event occurred
    pub timestamp: f64,
    /// Set once the renderer has picked the event up
    pub displayed: bool,
}

/// Append-only event log with window-based pruning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatLog {
    events: Vec<CombatEvent>,
    /// Seconds an event survives before pruning
    display_window: f64,
}

impl CombatLog {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(64),
            display_window: combat::EVENT_DISPLAY_WINDOW,
        }
    }

    pub fn push(&mut self, kind: CombatEventKind, amount: f32, position: Vec2, now: f64) {
        self.events.push(CombatEvent {
            kind,
            amount,
            position,
            timestamp: now,
            displayed: false,
        });
    }

    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    /// Renderer acknowledgment: flags every pending event as picked up
    pub fn mark_all_displayed(&mut self) {
        for event in &mut self.events {
            event.displayed = true;
        }
    }

    /// Drop events older than the display window
    pub fn prune(&mut self, now: f64) {
        let window = self.display_window;
        self.events.retain(|e| now - e.timestamp <= window);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for CombatLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_appends_undisplayed() {
        let mut log = CombatLog::new();
        log.push(CombatEventKind::Damage, 12.0, Vec2::new(1.0, 2.0), 10.0);
        assert_eq!(log.len(), 1);
        let event = log.events()[0];
        assert_eq!(event.kind, CombatEventKind::Damage);
        assert_eq!(event.amount, 12.0);
        assert!(!event.displayed);
    }

    #[test]
    fn test_mark_all_displayed() {
        let mut log = CombatLog::new();
        log.push(CombatEventKind::Currency, 5.0, Vec2::ZERO, 1.0);
        log.push(CombatEventKind::Immune, 0.0, Vec2::ZERO, 1.0);
        log.mark_all_displayed();
        assert!(log.events().iter().all(|e| e.displayed));
    }

    #[test]
    fn test_prune_drops_only_expired() {
        let mut log = CombatLog::new();
        log.push(CombatEventKind::Damage, 1.0, Vec2::ZERO, 0.0);
        log.push(CombatEventKind::Damage, 2.0, Vec2::ZERO, 5.0);
        log.prune(5.0 + combat::EVENT_DISPLAY_WINDOW / 2.0);
        assert_eq!(log.len(), 1);
        assert_eq!(log.events()[0].amount, 2.0);
    }

    #[test]
    fn test_prune_keeps_event_at_window_edge() {
        let mut log = CombatLog::new();
        log.push(CombatEventKind::Freeze, 0.0, Vec2::ZERO, 0.0);
        log.prune(combat::EVENT_DISPLAY_WINDOW);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&CombatEventKind::Immune).unwrap();
        assert_eq!(json, "\"immune\"");
        let back: CombatEventKind = serde_json::from_str("\"currency\"").unwrap();
        assert_eq!(back, CombatEventKind::Currency);
    }
}
