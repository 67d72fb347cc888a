use std::collections::HashMap;

use tracing::debug;

use crate::types::Slot;

use super::player::Player;

/// Index of a player in the registry, stable for the whole parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(usize);

/// Owns every player seen in a log and resolves slots, names and addresses
/// to them.
///
/// Slots only mean something within one match and are dropped on
/// `reset_slots`. Names and addresses are kept for the whole log so a
/// reconnecting client lands on the same player.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: Vec<Player>,
    by_slot: HashMap<Slot, PlayerId>,
    by_name: HashMap<String, PlayerId>,
    by_address: HashMap<String, PlayerId>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Players in creation order.
    pub fn players(&self) -> &[Player] {
        self.players.as_ref()
    }

    pub(crate) fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.0)
    }

    pub fn id_by_slot(&self, slot: Slot) -> Option<PlayerId> {
        self.by_slot.get(&slot).copied()
    }

    pub fn id_by_name(&self, name: &str) -> Option<PlayerId> {
        self.by_name.get(name).copied()
    }

    pub fn id_by_address(&self, address: &str) -> Option<PlayerId> {
        self.by_address.get(address).copied()
    }

    pub fn by_slot(&self, slot: Slot) -> Option<&Player> {
        self.id_by_slot(slot).and_then(|id| self.get(id))
    }

    pub fn by_name(&self, name: &str) -> Option<&Player> {
        self.id_by_name(name).and_then(|id| self.get(id))
    }

    pub(crate) fn by_slot_mut(&mut self, slot: Slot) -> Option<&mut Player> {
        let id = self.id_by_slot(slot)?;
        self.players.get_mut(id.0)
    }

    pub(crate) fn by_name_mut(&mut self, name: &str) -> Option<&mut Player> {
        let id = self.id_by_name(name)?;
        self.players.get_mut(id.0)
    }

    /// Resolve the player behind a new connection, creating one if neither
    /// the name nor the address is known. A real name takes precedence over
    /// the address; the unnamed sentinel never matches by name.
    pub(crate) fn connect(
        &mut self,
        slot: Slot,
        name: &str,
        address: &str,
        unnamed_sentinel: &str,
    ) -> PlayerId {
        let known_name = if name != unnamed_sentinel {
            self.id_by_name(name)
        } else {
            None
        };

        let id = match known_name.or_else(|| self.id_by_address(address)) {
            Some(id) => {
                debug!("slot {slot} ({name}, {address}) resolved to known player {}", id.0);
                id
            }
            None => {
                let id = PlayerId(self.players.len());
                debug!("slot {slot} ({name}, {address}) is new player {}", id.0);
                self.players.push(Player::new(name, address));
                id
            }
        };

        let player = &mut self.players[id.0];
        player.set_address(address);
        player.rename(name);

        self.by_address.insert(address.to_owned(), id);
        self.by_slot.insert(slot, id);
        self.by_name.insert(name.to_owned(), id);
        id
    }

    /// Rename the player in `slot`, keeping the name index in step.
    pub(crate) fn rename_slot(&mut self, slot: Slot, name: &str) -> Option<PlayerId> {
        let id = self.id_by_slot(slot)?;
        let player = &mut self.players[id.0];
        if player.name() != name {
            debug!("slot {slot} renamed from {} to {name}", player.name());
            player.rename(name);
            self.by_name.insert(name.to_owned(), id);
        }
        Some(id)
    }

    pub(crate) fn release_slot(&mut self, slot: Slot) -> Option<PlayerId> {
        self.by_slot.remove(&slot)
    }

    pub(crate) fn reset_slots(&mut self) {
        self.by_slot.clear();
    }
}
