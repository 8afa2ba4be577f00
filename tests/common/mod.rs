#![allow(dead_code)]

use std::collections::HashMap;

use quickplay::{
    config::{format::MAGIC, FeatureFlags, QuickplayParams, Revision, Transform4f},
    game::engine::{
        AreaIndex, AssetId, FlowState, GameArea, GameState, InitPhase, ItemInfo, ItemKind,
        MainFlow, PlayerState, StateManager,
    },
};

pub fn params(flags: FeatureFlags) -> QuickplayParams {
    QuickplayParams {
        magic: MAGIC,
        version: Revision::CURRENT.version(),
        feature_flags: flags,
        boot_world_id: AssetId(7),
        boot_area_id: AssetId(3),
        boot_area_layer_flags: 0b0110,
        spawn_transform: Transform4f::from_translation(-12.5, 40.0, 3.25),
    }
}

/// A main flow that walks the usual boot sequence when advanced.
#[derive(Debug)]
pub struct Flow {
    pub state: FlowState,
    pub advances: usize,
    pub forced: Vec<FlowState>,
}

impl Flow {
    pub fn at(state: FlowState) -> Flow {
        Flow {
            state,
            advances: 0,
            forced: vec![],
        }
    }
}

impl MainFlow for Flow {
    fn game_state(&self) -> FlowState {
        self.state
    }

    fn set_game_state(&mut self, state: FlowState) {
        self.forced.push(state);
        self.state = state;
    }

    fn advance_game_state(&mut self) {
        self.advances += 1;
        self.state = match self.state {
            FlowState::Unspecified => FlowState::PreFrontEnd,
            FlowState::PreFrontEnd => FlowState::FrontEnd,
            FlowState::FrontEnd => FlowState::Game,
            FlowState::Game => FlowState::GameExit,
            FlowState::GameExit => FlowState::PreFrontEnd,
        };
    }
}

#[derive(Debug, Default)]
pub struct Globals {
    pub current_world: Option<AssetId>,
    pub desired_area: Option<AssetId>,
    pub layer_bits: HashMap<AreaIndex, u64>,
    pub writes: usize,
}

impl GameState for Globals {
    fn set_current_world_id(&mut self, world: AssetId) {
        self.current_world = Some(world);
        self.writes += 1;
    }

    fn set_desired_area_asset_id(&mut self, area: AssetId) {
        self.desired_area = Some(area);
        self.writes += 1;
    }

    fn set_area_layer_bits(&mut self, area: AreaIndex, bits: u64) {
        self.layer_bits.insert(area, bits);
        self.writes += 1;
    }
}

#[derive(Debug)]
pub struct Player {
    pub table: Vec<ItemInfo>,
    pub capacity: Vec<u32>,
    pub amount: Vec<u32>,
}

impl Player {
    /// Four item types; the third doesn't persist.
    pub fn new() -> Player {
        let table = vec![
            ItemInfo {
                max: 1,
                persists: true,
            },
            ItemInfo {
                max: 250,
                persists: true,
            },
            ItemInfo {
                max: 99,
                persists: false,
            },
            ItemInfo {
                max: 14,
                persists: true,
            },
        ];

        let count = table.len();

        Player {
            table,
            capacity: vec![0; count],
            amount: vec![0; count],
        }
    }
}

impl PlayerState for Player {
    fn item_count(&self) -> u32 {
        self.table.len() as u32
    }

    fn item_info(&self, item: ItemKind) -> ItemInfo {
        self.table[item.0 as usize]
    }

    fn reinitialize_power_up(&mut self, item: ItemKind, capacity: u32) {
        self.capacity[item.0 as usize] = capacity;
        self.amount[item.0 as usize] = 0;
    }

    fn incr_pick_up(&mut self, item: ItemKind, amount: u32) {
        let index = item.0 as usize;
        self.amount[index] = (self.amount[index] + amount).min(self.capacity[index]);
    }
}

/// A state manager whose initialisation finishes after a set number of calls.
#[derive(Debug)]
pub struct Manager {
    pub phase: InitPhase,
    pub calls_until_done: usize,
    pub init_calls: Vec<(AssetId, AreaIndex, AssetId)>,
    pub teleports: Vec<(Transform4f, bool)>,
    pub areas: HashMap<AssetId, AreaIndex>,
    pub player: Player,
}

impl Manager {
    pub fn new(calls_until_done: usize) -> Manager {
        Manager {
            phase: InitPhase::LoadWorld,
            calls_until_done,
            init_calls: vec![],
            teleports: vec![],
            areas: HashMap::from([(AssetId(3), AreaIndex(11)), (AssetId(4), AreaIndex(12))]),
            player: Player::new(),
        }
    }
}

impl StateManager for Manager {
    fn initialize_state(&mut self, world: AssetId, area: AreaIndex, area_asset: AssetId) {
        self.init_calls.push((world, area, area_asset));

        self.phase = if self.init_calls.len() >= self.calls_until_done {
            InitPhase::Done
        } else {
            InitPhase::LoadFirstArea
        };
    }

    fn init_phase(&self) -> InitPhase {
        self.phase
    }

    fn teleport_player(&mut self, transform: &Transform4f, reset_camera: bool) {
        self.teleports.push((*transform, reset_camera));
    }

    fn player_state(&mut self) -> &mut dyn PlayerState {
        &mut self.player
    }

    fn area_index(&self, area: AssetId) -> Option<AreaIndex> {
        self.areas.get(&area).copied()
    }
}

#[derive(Debug, Default)]
pub struct Area {
    pub stream_ins: usize,
}

impl GameArea<Manager> for Area {
    fn start_stream_in(&mut self, _state_manager: &mut Manager) {
        self.stream_ins += 1;
    }
}
