//! Rooms and their derived habitability state.
//!
//! A room's `workable` flag is never set directly: it is recomputed from the
//! other flags on every state update. The Entrance pins several flags so it
//! can always be walked through and worked in.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Permanent room identifier. Never reused, never renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomId(pub u32);

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "room#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomKind {
    Entrance,
    Quarters,
    DiningHall,
    Bathroom,
    Laboratory,
    Generator,
    GuardPost,
    Workshop,
    Kitchen,
    Infirmary,
    Storage,
    Garden,
}

impl RoomKind {
    pub fn label(&self) -> &'static str {
        match self {
            RoomKind::Entrance => "Entrance",
            RoomKind::Quarters => "Quarters",
            RoomKind::DiningHall => "Dining Hall",
            RoomKind::Bathroom => "Bathroom",
            RoomKind::Laboratory => "Laboratory",
            RoomKind::Generator => "Generator",
            RoomKind::GuardPost => "Guard Post",
            RoomKind::Workshop => "Workshop",
            RoomKind::Kitchen => "Kitchen",
            RoomKind::Infirmary => "Infirmary",
            RoomKind::Storage => "Storage",
            RoomKind::Garden => "Garden",
        }
    }

    /// Rooms agents sleep in.
    pub fn is_sleeping_room(&self) -> bool {
        matches!(self, RoomKind::Quarters)
    }

    /// Rooms that feed the power grid.
    pub fn produces_power(&self) -> bool {
        matches!(self, RoomKind::Generator)
    }
}

/// Externally settable room flags. `workable` is derived and has no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomFlag {
    Accessible,
    Destructible,
    Powered,
    Lit,
    OnFire,
    Flooded,
    Dangerous,
}

/// Event tags a room can carry. Each tag drives one hazard flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoomEvent {
    Fire,
    Flood,
    Infestation,
}

impl RoomEvent {
    pub fn flag(&self) -> RoomFlag {
        match self {
            RoomEvent::Fire => RoomFlag::OnFire,
            RoomEvent::Flood => RoomFlag::Flooded,
            RoomEvent::Infestation => RoomFlag::Dangerous,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomFlags {
    pub accessible: bool,
    pub destructible: bool,
    pub powered: bool,
    pub lit: bool,
    pub on_fire: bool,
    pub flooded: bool,
    pub dangerous: bool,
    pub workable: bool,
}

impl RoomFlags {
    pub fn get(&self, flag: RoomFlag) -> bool {
        match flag {
            RoomFlag::Accessible => self.accessible,
            RoomFlag::Destructible => self.destructible,
            RoomFlag::Powered => self.powered,
            RoomFlag::Lit => self.lit,
            RoomFlag::OnFire => self.on_fire,
            RoomFlag::Flooded => self.flooded,
            RoomFlag::Dangerous => self.dangerous,
        }
    }

    pub fn set(&mut self, flag: RoomFlag, value: bool) {
        let slot = match flag {
            RoomFlag::Accessible => &mut self.accessible,
            RoomFlag::Destructible => &mut self.destructible,
            RoomFlag::Powered => &mut self.powered,
            RoomFlag::Lit => &mut self.lit,
            RoomFlag::OnFire => &mut self.on_fire,
            RoomFlag::Flooded => &mut self.flooded,
            RoomFlag::Dangerous => &mut self.dangerous,
        };
        *slot = value;
    }

    /// Free of hazards: an agent may sleep or linger here.
    pub fn habitable(&self) -> bool {
        self.accessible && !self.on_fire && !self.flooded && !self.dangerous
    }

    fn derive_workable(&self) -> bool {
        self.habitable() && self.powered && self.lit
    }
}

/// Before/after flags of a room whose state actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomChange {
    pub room: RoomId,
    pub before: RoomFlags,
    pub after: RoomFlags,
}

/// A built room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub kind: RoomKind,
    pub name: String,
    pub rect: Rect,
    flags: RoomFlags,
    events: BTreeSet<RoomEvent>,
}

impl Room {
    /// New room in its default state: accessible, unpowered, dark.
    pub fn new(id: RoomId, kind: RoomKind, name: impl Into<String>, rect: Rect) -> Self {
        let mut room = Self {
            id,
            kind,
            name: name.into(),
            rect,
            flags: RoomFlags {
                accessible: true,
                destructible: true,
                ..RoomFlags::default()
            },
            events: BTreeSet::new(),
        };
        room.settle();
        room
    }

    pub fn flags(&self) -> &RoomFlags {
        &self.flags
    }

    pub fn is_workable(&self) -> bool {
        self.flags.workable
    }

    pub fn is_entrance(&self) -> bool {
        self.kind == RoomKind::Entrance
    }

    pub fn events(&self) -> impl Iterator<Item = &RoomEvent> {
        self.events.iter()
    }

    pub fn has_event(&self, event: RoomEvent) -> bool {
        self.events.contains(&event)
    }

    /// The only path through which flags change. Re-applies pinned flags,
    /// recomputes `workable`, and reports the change if anything moved.
    pub fn update(&mut self, f: impl FnOnce(&mut RoomFlags)) -> Option<RoomChange> {
        let before = self.flags;
        f(&mut self.flags);
        self.settle();
        (before != self.flags).then_some(RoomChange {
            room: self.id,
            before,
            after: self.flags,
        })
    }

    /// Attach an event tag. Callers must reject the Entrance beforehand.
    pub(crate) fn add_event(&mut self, event: RoomEvent) -> Option<RoomChange> {
        self.events.insert(event);
        self.update(|flags| flags.set(event.flag(), true))
    }

    pub(crate) fn remove_event(&mut self, event: RoomEvent) -> Option<RoomChange> {
        if !self.events.remove(&event) {
            return None;
        }
        self.update(|flags| flags.set(event.flag(), false))
    }

    fn settle(&mut self) {
        if self.is_entrance() {
            self.flags.accessible = true;
            self.flags.destructible = false;
            self.flags.workable = true;
        } else {
            self.flags.workable = self.flags.derive_workable();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(kind: RoomKind) -> Room {
        Room::new(RoomId(1), kind, kind.label(), Rect::new(0.0, 0.0, 100.0, 50.0))
    }

    #[test]
    fn test_new_room_is_not_workable_until_powered() {
        let mut r = room(RoomKind::Workshop);
        assert!(!r.is_workable());
        let change = r.update(|f| {
            f.powered = true;
            f.lit = true;
        });
        assert!(change.is_some());
        assert!(r.is_workable());
    }

    #[test]
    fn test_hazards_block_work() {
        let mut r = room(RoomKind::Workshop);
        r.update(|f| {
            f.powered = true;
            f.lit = true;
        });
        for flag in [RoomFlag::OnFire, RoomFlag::Flooded, RoomFlag::Dangerous] {
            r.update(|f| f.set(flag, true));
            assert!(!r.is_workable(), "{flag:?} should block work");
            r.update(|f| f.set(flag, false));
            assert!(r.is_workable());
        }
        r.update(|f| f.accessible = false);
        assert!(!r.is_workable());
    }

    #[test]
    fn test_entrance_pins() {
        let mut r = room(RoomKind::Entrance);
        assert!(r.is_workable());
        r.update(|f| {
            f.accessible = false;
            f.destructible = true;
            f.on_fire = true;
        });
        assert!(r.flags().accessible);
        assert!(!r.flags().destructible);
        assert!(r.is_workable());
    }

    #[test]
    fn test_unchanged_update_reports_nothing() {
        let mut r = room(RoomKind::Quarters);
        assert!(r.update(|f| f.accessible = true).is_none());
    }

    #[test]
    fn test_event_tags_drive_flags() {
        let mut r = room(RoomKind::Kitchen);
        assert!(r.add_event(RoomEvent::Fire).is_some());
        assert!(r.flags().on_fire);
        assert!(r.has_event(RoomEvent::Fire));
        assert!(r.remove_event(RoomEvent::Fire).is_some());
        assert!(!r.flags().on_fire);
        assert!(r.remove_event(RoomEvent::Fire).is_none());
    }
}
