use std::collections::HashMap;

use rand::Rng;
use uuid::Uuid;

use chuck_common::config::GameConfig;
use chuck_common::room_code::RoomCode;

use crate::room::Room;

/// Which room each connection is in.
#[derive(Default)]
pub struct PlayerRegistry {
    rooms: HashMap<Uuid, RoomCode>,
}

impl PlayerRegistry {
    pub fn register(&mut self, player_id: Uuid, code: RoomCode) {
        self.rooms.insert(player_id, code);
    }

    pub fn lookup_room(&self, player_id: Uuid) -> Option<&RoomCode> {
        self.rooms.get(&player_id)
    }

    pub fn unregister(&mut self, player_id: Uuid) -> Option<RoomCode> {
        self.rooms.remove(&player_id)
    }
}

/// Live rooms by code.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
}

impl RoomRegistry {
    /// Open a room for `host_id` under a code no live room uses.
    pub fn create_room(
        &mut self,
        host_id: Uuid,
        host_name: &str,
        config: GameConfig,
        rng: &mut impl Rng,
    ) -> RoomCode {
        let code = RoomCode::generate_unique(rng, |c| self.rooms.contains_key(c));
        self.rooms
            .insert(code.clone(), Room::new(code.clone(), host_id, host_name, config));
        code
    }

    pub fn get_room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn get_room_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    /// Drop a room and cancel its pending timer.
    pub fn destroy_room(&mut self, code: &RoomCode) -> Option<Room> {
        let mut room = self.rooms.remove(code)?;
        room.cancel_timer();
        Some(room)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }
}

#[derive(Default)]
pub struct Lobby {
    pub rooms: RoomRegistry,
    pub players: PlayerRegistry,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the room a player is in.
    pub fn room_of_mut(&mut self, player_id: Uuid) -> Option<&mut Room> {
        let code = self.players.lookup_room(player_id)?;
        self.rooms.rooms.get_mut(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_player_registry_lifecycle() {
        let mut players = PlayerRegistry::default();
        let id = Uuid::new_v4();
        let code = RoomCode::parse("ABCDE").unwrap();

        assert!(players.lookup_room(id).is_none());
        players.register(id, code.clone());
        assert_eq!(players.lookup_room(id), Some(&code));
        assert_eq!(players.unregister(id), Some(code));
        assert!(players.lookup_room(id).is_none());
        assert!(players.unregister(id).is_none());
    }

    #[test]
    fn test_create_and_destroy_room() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        let mut rooms = RoomRegistry::default();
        let host = Uuid::new_v4();

        let code = rooms.create_room(host, "Alice", GameConfig::default(), &mut rng);
        let room = rooms.get_room(&code).unwrap();
        assert!(room.is_host(host));
        assert_eq!(room.code, code);

        assert!(rooms.destroy_room(&code).is_some());
        assert!(rooms.get_room(&code).is_none());
        assert!(rooms.destroy_room(&code).is_none());
        assert_eq!(rooms.len(), 0);
    }

    #[test]
    fn test_room_codes_do_not_collide() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        let mut rooms = RoomRegistry::default();
        for _ in 0..300 {
            rooms.create_room(Uuid::new_v4(), "Host", GameConfig::default(), &mut rng);
        }
        assert_eq!(rooms.len(), 300);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        let mut rooms = RoomRegistry::default();
        let code = rooms.create_room(Uuid::new_v4(), "Host", GameConfig::default(), &mut rng);
        let lower = RoomCode::parse(&code.as_str().to_lowercase()).unwrap();
        assert!(rooms.get_room(&lower).is_some());
    }

    #[test]
    fn test_room_of_follows_player_registry() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        let mut lobby = Lobby::new();
        let host = Uuid::new_v4();
        let code = lobby
            .rooms
            .create_room(host, "Host", GameConfig::default(), &mut rng);
        assert!(lobby.room_of_mut(host).is_none());

        lobby.players.register(host, code.clone());
        assert_eq!(lobby.room_of_mut(host).map(|r| r.code.clone()), Some(code));
    }
}
