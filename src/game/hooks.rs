//! The three overrides that make quickplay work.
//!
//! Each override is called in place of an engine function. On most calls it just runs the original
//! function, but the first time its conditions are met it changes what happens, and after that it
//! never does anything but forward again. Returning to the main menu and starting another game
//! does not rearm anything.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    config::{FeatureFlags, QuickplayParams},
    hook::{Dispatch, Latch},
};

use super::engine::{
    AreaIndex, AssetId, FlowState, GameArea, GameState, InitPhase, ItemKind, MainFlow,
    PlayerState, StateManager,
};

/// Which item types the give-all-items feature fills.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryGrant {
    /// Every item type.
    All,

    /// Only item types that persist in the inventory.
    PersistentOnly,
}

/// Skips the main menu by jumping from the end of engine initialisation straight into the game.
pub struct BootOverride {
    params: Arc<QuickplayParams>,
    latch: Latch,
}

impl BootOverride {
    pub fn new(params: Arc<QuickplayParams>) -> BootOverride {
        BootOverride {
            params,
            latch: Latch::new(),
        }
    }

    pub fn has_fired(&self) -> bool {
        self.latch.has_fired()
    }

    /// Replaces `CMainFlow::AdvanceGameState`.
    pub fn advance_game_state<F, G>(&self, flow: &mut F, game_state: &mut G) -> Dispatch
    where
        F: MainFlow + ?Sized,
        G: GameState + ?Sized,
    {
        // PreFrontEnd is the moment initialisation finishes and the game heads for the main menu.
        // The latch stops this happening again if the player quits back out to the menu.
        if self.params.feature_flags.contains(FeatureFlags::JUMP_TO_AREA)
            && flow.game_state() == FlowState::PreFrontEnd
            && self.latch.try_fire()
        {
            log::info!(
                "Booting into world {} area {}",
                self.params.boot_world_id,
                self.params.boot_area_id
            );

            game_state.set_current_world_id(self.params.boot_world_id);
            game_state.set_desired_area_asset_id(self.params.boot_area_id);
            flow.set_game_state(FlowState::Game);

            return Dispatch::Overridden;
        }

        flow.advance_game_state();
        Dispatch::Forwarded
    }
}

/// Applies the spawn transform and inventory once the first world has finished initialising.
pub struct WorldInitOverride {
    params: Arc<QuickplayParams>,
    grant: InventoryGrant,
    latch: Latch,
}

impl WorldInitOverride {
    pub fn new(params: Arc<QuickplayParams>, grant: InventoryGrant) -> WorldInitOverride {
        WorldInitOverride {
            params,
            grant,
            latch: Latch::new(),
        }
    }

    pub fn has_fired(&self) -> bool {
        self.latch.has_fired()
    }

    /// Replaces `CStateManager::InitializeState`. The original always runs first.
    pub fn initialize_state<M>(
        &self,
        state_manager: &mut M,
        world: AssetId,
        area: AreaIndex,
        area_asset: AssetId,
    ) -> Dispatch
    where
        M: StateManager + ?Sized,
    {
        state_manager.initialize_state(world, area, area_asset);

        if state_manager.init_phase() != InitPhase::Done || !self.latch.try_fire() {
            return Dispatch::Forwarded;
        }

        let flags = self.params.feature_flags;
        let mut dispatch = Dispatch::Forwarded;

        if flags.wants_spawn_override() {
            log::info!(
                "Teleporting player to {:?}",
                self.params.spawn_transform.translation()
            );

            state_manager.teleport_player(&self.params.spawn_transform, true);
            dispatch = Dispatch::Overridden;
        }

        if flags.contains(FeatureFlags::GIVE_ALL_ITEMS) {
            let granted = give_all_items(state_manager.player_state(), self.grant);
            log::info!("Filled {granted} inventory items");
            dispatch = Dispatch::Overridden;
        }

        dispatch
    }
}

/// Fills every item covered by `grant` to its maximum. Returns the number of item types filled.
fn give_all_items(player: &mut dyn PlayerState, grant: InventoryGrant) -> usize {
    let mut granted = 0;

    for item in (0..player.item_count()).map(ItemKind) {
        let info = player.item_info(item);

        if grant == InventoryGrant::PersistentOnly && !info.persists {
            continue;
        }

        // Capacity and quantity are separate in the engine, so raise the capacity before picking
        // up enough to fill it.
        player.reinitialize_power_up(item, info.max);
        player.incr_pick_up(item, info.max);
        granted += 1;
    }

    granted
}

/// Sets the boot area's layer flags before it streams in for the first time.
pub struct StreamInOverride {
    params: Arc<QuickplayParams>,
    latch: Latch,
}

impl StreamInOverride {
    pub fn new(params: Arc<QuickplayParams>) -> StreamInOverride {
        StreamInOverride {
            params,
            latch: Latch::new(),
        }
    }

    pub fn has_fired(&self) -> bool {
        self.latch.has_fired()
    }

    /// Replaces `CGameArea::StartStreamIn`. The original always runs afterwards.
    pub fn start_stream_in<A, M, G>(
        &self,
        area: &mut A,
        state_manager: &mut M,
        game_state: &mut G,
    ) -> Dispatch
    where
        A: GameArea<M> + ?Sized,
        M: StateManager + ?Sized,
        G: GameState + ?Sized,
    {
        let mut dispatch = Dispatch::Forwarded;

        if self.params.feature_flags.contains(FeatureFlags::JUMP_TO_AREA) && self.latch.try_fire()
        {
            match state_manager.area_index(self.params.boot_area_id) {
                Some(index) => {
                    log::info!(
                        "Setting layer flags of area {} to {:#018x}",
                        self.params.boot_area_id,
                        self.params.boot_area_layer_flags
                    );

                    game_state.set_area_layer_bits(index, self.params.boot_area_layer_flags);
                    dispatch = Dispatch::Overridden;
                }

                None => log::warn!(
                    "Area {} is not in the current world; leaving its layers alone",
                    self.params.boot_area_id
                ),
            }
        }

        area.start_stream_in(state_manager);
        dispatch
    }
}
