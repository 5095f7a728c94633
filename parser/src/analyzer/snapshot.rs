use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use crate::Rc;
use crate::error::{ErrorKind, ReplayResult};
use crate::hltreplay::{Event, Frame, Replay};
use crate::types::{Dropoff, MapCell, PlayerId, Position, Ship, ShipId, StructureId};

use super::identity::PlayerIdentity;

/// A fully-materialized halite field for one turn.
///
/// Each snapshot exclusively owns its cell arena; patching the next turn
/// never touches an already-emitted snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapSnapshot {
    width: usize,
    height: usize,
    /// Halite per coordinate, indexed x * height + y.
    cells: Vec<u32>,
}

impl MapSnapshot {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Halite at a position. Coordinates wrap: the grid is a torus.
    pub fn halite_at(&self, position: Position) -> u32 {
        let x = position.x.rem_euclid(self.width as i32) as usize;
        let y = position.y.rem_euclid(self.height as i32) as usize;
        self.cells[x * self.height + y]
    }

    pub fn cell(&self, position: Position) -> MapCell {
        MapCell {
            position,
            halite: self.halite_at(position),
        }
    }
}

/// Everything one player could observe at one turn, before actions are
/// joined in.
#[derive(Debug, Clone, Serialize)]
pub struct TurnState {
    pub map: MapSnapshot,
    pub own_ships: HashMap<ShipId, Ship>,
    /// All opponents' ships merged into one roster. Ship ids are unique
    /// across players within a match, and each ship still carries its owner.
    pub other_ships: HashMap<ShipId, Ship>,
    pub own_dropoffs: Rc<[Dropoff]>,
    pub other_dropoffs: Rc<[Dropoff]>,
}

/// Sequential state machine that turns the replay's per-turn deltas back
/// into full snapshots.
///
/// The replay stores only changes: sparse cell overwrites, wholesale ship
/// rosters, and construction events. [`Reconstructor::advance`] applies one
/// frame on top of the running state and emits that turn's materialized
/// view. Turn t depends on turn t-1, so a match is reconstructed in a
/// single pass.
#[derive(Debug)]
pub struct Reconstructor {
    width: usize,
    height: usize,
    cells: Vec<u32>,
    player_id: PlayerId,
    own_dropoffs: Rc<[Dropoff]>,
    other_dropoffs: Rc<[Dropoff]>,
    turn: usize,
}

impl Reconstructor {
    /// Seeds the state machine with the initial production map and the
    /// resolved shipyard roster.
    pub fn new(replay: &Replay, identity: &PlayerIdentity) -> Self {
        let map = &replay.production_map;
        let mut cells = Vec::with_capacity(map.width * map.height);
        for column in &map.grid {
            cells.extend(column.iter().map(|c| c.energy));
        }

        Reconstructor {
            width: map.width,
            height: map.height,
            cells,
            player_id: identity.player_id,
            own_dropoffs: Rc::from(vec![identity.shipyard]),
            other_dropoffs: Rc::from(identity.opponent_shipyards.clone()),
            turn: 0,
        }
    }

    /// Applies one frame and returns that turn's snapshot.
    pub fn advance(&mut self, frame: &Frame) -> ReplayResult<TurnState> {
        self.patch_cells(frame)?;
        let (own_ships, other_ships) = self.ship_rosters(frame);
        self.append_dropoffs(frame);

        let state = TurnState {
            map: MapSnapshot {
                width: self.width,
                height: self.height,
                cells: self.cells.clone(),
            },
            own_ships,
            other_ships,
            own_dropoffs: self.own_dropoffs.clone(),
            other_dropoffs: self.other_dropoffs.clone(),
        };

        trace!(
            turn = self.turn,
            own_ships = state.own_ships.len(),
            other_ships = state.other_ships.len(),
            "reconstructed turn"
        );
        self.turn += 1;
        Ok(state)
    }

    fn patch_cells(&mut self, frame: &Frame) -> ReplayResult<()> {
        for update in &frame.cells {
            let in_grid = (0..self.width as i32).contains(&update.x)
                && (0..self.height as i32).contains(&update.y);
            if !in_grid {
                return Err(ErrorKind::DimensionMismatch {
                    turn: self.turn,
                    position: Position::new(update.x, update.y),
                    width: self.width,
                    height: self.height,
                });
            }
            self.cells[update.x as usize * self.height + update.y as usize] = update.production;
        }
        Ok(())
    }

    /// Rosters are replaced wholesale every turn: a ship the frame does not
    /// list is gone (or not yet spawned), not carried over.
    fn ship_rosters(&self, frame: &Frame) -> (HashMap<ShipId, Ship>, HashMap<ShipId, Ship>) {
        let mut own = HashMap::new();
        let mut other = HashMap::new();
        for (&owner, ships) in &frame.entities {
            let roster = if owner == self.player_id {
                &mut own
            } else {
                &mut other
            };
            for (&id, entity) in ships {
                roster.insert(
                    id,
                    Ship {
                        owner,
                        id,
                        position: Position::new(entity.x, entity.y),
                        halite: entity.energy,
                    },
                );
            }
        }
        (own, other)
    }

    /// Dropoffs are append-only. Turns without construction events keep
    /// sharing the previous turn's allocation.
    fn append_dropoffs(&mut self, frame: &Frame) {
        let mut new_own = Vec::new();
        let mut new_other = Vec::new();
        for event in &frame.events {
            if let Event::Construct { owner_id, location } = event {
                let dropoff = Dropoff {
                    owner: *owner_id,
                    id: StructureId::SENTINEL,
                    position: *location,
                };
                if *owner_id == self.player_id {
                    new_own.push(dropoff);
                } else {
                    new_other.push(dropoff);
                }
            }
        }

        if !new_own.is_empty() {
            self.own_dropoffs = self
                .own_dropoffs
                .iter()
                .copied()
                .chain(new_own)
                .collect::<Vec<_>>()
                .into();
        }
        if !new_other.is_empty() {
            self.other_dropoffs = self
                .other_dropoffs
                .iter()
                .copied()
                .chain(new_other)
                .collect::<Vec<_>>()
                .into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::identity::resolve_player;
    use serde_json::json;

    fn replay_with_frames(frames: serde_json::Value) -> Replay {
        let turns = frames.as_array().map(|f| f.len()).unwrap_or(0);
        let doc = json!({
            "players": [
                {"player_id": 0, "name": "Alpha v1", "factory_location": {"x": 0, "y": 0}},
                {"player_id": 1, "name": "Beta v1", "factory_location": {"x": 1, "y": 1}}
            ],
            "production_map": {
                "width": 2,
                "height": 2,
                "grid": [
                    [{"energy": 0}, {"energy": 0}],
                    [{"energy": 0}, {"energy": 0}]
                ]
            },
            "full_frames": frames,
            "game_statistics": {
                "number_turns": turns,
                "player_statistics": [
                    {"player_id": 0, "rank": 1},
                    {"player_id": 1, "rank": 2}
                ]
            }
        });
        Replay::from_json(doc.to_string().as_bytes()).unwrap()
    }

    fn reconstruct_all(replay: &Replay) -> Vec<TurnState> {
        let identity = resolve_player(replay, "Alpha").unwrap();
        let mut rec = Reconstructor::new(replay, &identity);
        replay
            .full_frames
            .iter()
            .map(|f| rec.advance(f).unwrap())
            .collect()
    }

    #[test]
    fn single_cell_update_leaves_the_rest_untouched() {
        let replay =
            replay_with_frames(json!([{"cells": [{"x": 1, "y": 1, "production": 50}]}]));
        let turns = reconstruct_all(&replay);
        let map = &turns[0].map;
        assert_eq!(map.halite_at(Position::new(1, 1)), 50);
        assert_eq!(map.halite_at(Position::new(0, 0)), 0);
        assert_eq!(map.halite_at(Position::new(0, 1)), 0);
        assert_eq!(map.halite_at(Position::new(1, 0)), 0);
    }

    #[test]
    fn unmentioned_cells_keep_their_previous_value() {
        let replay = replay_with_frames(json!([
            {"cells": [{"x": 0, "y": 1, "production": 7}, {"x": 1, "y": 0, "production": 9}]},
            {"cells": [{"x": 1, "y": 0, "production": 3}]},
            {}
        ]));
        let turns = reconstruct_all(&replay);
        // Turn 1 re-patches one cell; the other survives from turn 0.
        assert_eq!(turns[1].map.halite_at(Position::new(0, 1)), 7);
        assert_eq!(turns[1].map.halite_at(Position::new(1, 0)), 3);
        // An empty frame changes nothing.
        assert_eq!(turns[2].map, turns[1].map);
        // Earlier snapshots are not retroactively modified.
        assert_eq!(turns[0].map.halite_at(Position::new(1, 0)), 9);
    }

    #[test]
    fn snapshot_dimensions_are_stable() {
        let replay = replay_with_frames(json!([{}, {}, {}]));
        for turn in reconstruct_all(&replay) {
            assert_eq!(turn.map.width(), 2);
            assert_eq!(turn.map.height(), 2);
        }
    }

    #[test]
    fn out_of_grid_update_fails_the_file() {
        let replay =
            replay_with_frames(json!([{}, {"cells": [{"x": 2, "y": 0, "production": 1}]}]));
        let identity = resolve_player(&replay, "Alpha").unwrap();
        let mut rec = Reconstructor::new(&replay, &identity);
        rec.advance(&replay.full_frames[0]).unwrap();
        let err = rec.advance(&replay.full_frames[1]).unwrap_err();
        assert!(matches!(
            err,
            ErrorKind::DimensionMismatch {
                turn: 1,
                position: Position { x: 2, y: 0 },
                width: 2,
                height: 2,
            }
        ));
    }

    #[test]
    fn toroidal_accessor_wraps_coordinates() {
        let replay =
            replay_with_frames(json!([{"cells": [{"x": 1, "y": 1, "production": 50}]}]));
        let turns = reconstruct_all(&replay);
        assert_eq!(turns[0].map.halite_at(Position::new(-1, -1)), 50);
        assert_eq!(turns[0].map.halite_at(Position::new(3, 3)), 50);
    }

    #[test]
    fn ship_rosters_are_replaced_wholesale() {
        let replay = replay_with_frames(json!([
            {"entities": {
                "0": {"3": {"x": 0, "y": 0, "energy": 10}},
                "1": {"4": {"x": 1, "y": 1, "energy": 20}}
            }},
            {"entities": {
                "1": {"4": {"x": 1, "y": 0, "energy": 25}}
            }},
            {}
        ]));
        let turns = reconstruct_all(&replay);

        assert_eq!(turns[0].own_ships.len(), 1);
        let own = &turns[0].own_ships[&ShipId(3)];
        assert_eq!(own.owner, PlayerId(0));
        assert_eq!(own.halite, 10);
        assert_eq!(turns[0].other_ships[&ShipId(4)].owner, PlayerId(1));

        // Player 0 reported no ships on turn 1: empty roster, not carryover.
        assert!(turns[1].own_ships.is_empty());
        assert_eq!(turns[1].other_ships[&ShipId(4)].position, Position::new(1, 0));

        // No entity table at all on turn 2.
        assert!(turns[2].own_ships.is_empty());
        assert!(turns[2].other_ships.is_empty());
    }

    #[test]
    fn opponent_ships_from_all_players_are_merged() {
        let doc = json!({
            "players": [
                {"player_id": 0, "name": "Alpha v1", "factory_location": {"x": 0, "y": 0}},
                {"player_id": 1, "name": "Beta v1", "factory_location": {"x": 1, "y": 0}},
                {"player_id": 2, "name": "Gamma v1", "factory_location": {"x": 0, "y": 1}}
            ],
            "production_map": {
                "width": 2,
                "height": 2,
                "grid": [
                    [{"energy": 0}, {"energy": 0}],
                    [{"energy": 0}, {"energy": 0}]
                ]
            },
            "full_frames": [
                {"entities": {
                    "1": {"10": {"x": 1, "y": 0, "energy": 0}},
                    "2": {"11": {"x": 0, "y": 1, "energy": 0}}
                }}
            ],
            "game_statistics": {
                "number_turns": 1,
                "player_statistics": [
                    {"player_id": 0, "rank": 1},
                    {"player_id": 1, "rank": 2},
                    {"player_id": 2, "rank": 3}
                ]
            }
        });
        let replay = Replay::from_json(doc.to_string().as_bytes()).unwrap();
        let turns = reconstruct_all(&replay);
        assert_eq!(turns[0].other_ships.len(), 2);
        assert_eq!(turns[0].other_ships[&ShipId(10)].owner, PlayerId(1));
        assert_eq!(turns[0].other_ships[&ShipId(11)].owner, PlayerId(2));
    }

    #[test]
    fn initial_dropoff_rosters_come_from_the_shipyards() {
        let replay = replay_with_frames(json!([{}]));
        let turns = reconstruct_all(&replay);
        assert_eq!(turns[0].own_dropoffs.len(), 1);
        assert_eq!(turns[0].own_dropoffs[0].position, Position::new(0, 0));
        assert_eq!(turns[0].own_dropoffs[0].id, StructureId::SENTINEL);
        assert_eq!(turns[0].other_dropoffs.len(), 1);
        assert_eq!(turns[0].other_dropoffs[0].owner, PlayerId(1));
    }

    #[test]
    fn construction_grows_the_roster_from_that_turn_onward() {
        let replay = replay_with_frames(json!([
            {}, {}, {},
            {"events": [{"type": "construct", "owner_id": 0, "location": {"x": 1, "y": 0}}]},
            {}
        ]));
        let turns = reconstruct_all(&replay);

        for turn in &turns[..3] {
            assert_eq!(turn.own_dropoffs.len(), 1);
        }
        for turn in &turns[3..] {
            assert_eq!(turn.own_dropoffs.len(), 2);
            assert_eq!(turn.own_dropoffs[1].position, Position::new(1, 0));
            assert_eq!(turn.own_dropoffs[1].owner, PlayerId(0));
        }
        // Opponent roster is untouched by an own-construct event.
        for turn in &turns {
            assert_eq!(turn.other_dropoffs.len(), 1);
        }
    }

    #[test]
    fn opponent_construction_lands_in_the_other_roster() {
        let replay = replay_with_frames(json!([
            {"events": [
                {"type": "construct", "owner_id": 1, "location": {"x": 0, "y": 1}},
                {"type": "spawn", "owner_id": 0, "location": {"x": 0, "y": 0}}
            ]}
        ]));
        let turns = reconstruct_all(&replay);
        assert_eq!(turns[0].own_dropoffs.len(), 1);
        assert_eq!(turns[0].other_dropoffs.len(), 2);
        assert_eq!(turns[0].other_dropoffs[1].owner, PlayerId(1));
        assert_eq!(turns[0].other_dropoffs[1].position, Position::new(0, 1));
    }

    #[test]
    fn unchanged_rosters_share_the_previous_turn_allocation() {
        let replay = replay_with_frames(json!([{}, {}]));
        let turns = reconstruct_all(&replay);
        assert!(Rc::ptr_eq(&turns[0].own_dropoffs, &turns[1].own_dropoffs));
        assert!(Rc::ptr_eq(&turns[0].other_dropoffs, &turns[1].other_dropoffs));
    }
}
