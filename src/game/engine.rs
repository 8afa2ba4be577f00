//! The parts of the engine that quickplay needs to call into.
//!
//! The host implements these traits over the real engine objects. Every write quickplay makes to
//! engine state goes through one of these methods.

use std::fmt;

/// An asset ID as stored in the game's packages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AssetId(pub u32);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// The run-time index of an area within the current world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AreaIndex(pub u32);

/// An inventory item type. Item types are numbered from zero up to `PlayerState::item_count`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ItemKind(pub u32);

/// The engine's static data for an item type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemInfo {
    /// Maximum capacity.
    pub max: u32,

    /// Whether the item is kept in the player's inventory between sessions. Items that don't
    /// persist are things like temporary pickups.
    pub persists: bool,
}

/// States of the top-level client flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowState {
    Unspecified,

    /// Engine initialisation has finished and the main menu is about to be shown.
    PreFrontEnd,
    FrontEnd,
    Game,
    GameExit,
}

/// Phases of world initialisation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitPhase {
    LoadWorld,
    LoadFirstArea,
    Done,
}

/// The top-level flow of the game, from boot through the menus and into gameplay.
pub trait MainFlow {
    fn game_state(&self) -> FlowState;

    /// Moves straight to `state`.
    fn set_game_state(&mut self, state: FlowState);

    /// The engine's own step from the current state to the next.
    fn advance_game_state(&mut self);
}

/// The global game state shared between worlds.
pub trait GameState {
    fn set_current_world_id(&mut self, world: AssetId);

    /// Sets the area that the current world will load into.
    fn set_desired_area_asset_id(&mut self, area: AssetId);

    /// Replaces the active layer bits of an area in the current world.
    fn set_area_layer_bits(&mut self, area: AreaIndex, bits: u64);
}

/// The player's inventory.
pub trait PlayerState {
    fn item_count(&self) -> u32;

    fn item_info(&self, item: ItemKind) -> ItemInfo;

    /// Resets an item's capacity.
    fn reinitialize_power_up(&mut self, item: ItemKind, capacity: u32);

    /// Gives the player `amount` of an item.
    fn incr_pick_up(&mut self, item: ItemKind, amount: u32);
}

/// Owns the state of the world being played.
pub trait StateManager {
    /// Begins initialising a world for gameplay.
    fn initialize_state(&mut self, world: AssetId, area: AreaIndex, area_asset: AssetId);

    fn init_phase(&self) -> InitPhase;

    /// Moves the player. `reset_camera` snaps the camera to the new position.
    fn teleport_player(&mut self, transform: &crate::config::Transform4f, reset_camera: bool);

    fn player_state(&mut self) -> &mut dyn PlayerState;

    /// Resolves an area asset ID to its index in the current world.
    fn area_index(&self, area: AssetId) -> Option<AreaIndex>;
}

/// An area of a world that can be streamed in.
pub trait GameArea<M: ?Sized> {
    fn start_stream_in(&mut self, state_manager: &mut M);
}
