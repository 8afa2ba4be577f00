//! Quickplay boots a debug build of the game straight into an area chosen in the editor.
//!
//! When the module is loaded, it reads the parameters the editor wrote to the disc. The host then
//! routes three engine functions through the overrides in `game::hooks`, which skip the main
//! menu, move the player to the chosen spawn point, fill the inventory and set the boot area's
//! layers. Each override does its work once and then behaves exactly like the original function.

use std::{path::Path, sync::Arc};

use once_cell::sync::OnceCell;

pub mod config;
pub mod game;
pub mod hook;
pub mod logging;
pub mod meta;

use config::{disc::Disc, QuickplayParams};
use game::hooks::{BootOverride, StreamInOverride, WorldInitOverride};
use hook::HookSite;
use meta::settings::Options;

/// The loaded parameters together with the overrides that act on them.
pub struct Quickplay {
    params: Arc<QuickplayParams>,
    sites: Vec<HookSite>,
    boot: BootOverride,
    world_init: WorldInitOverride,
    stream_in: Option<StreamInOverride>,
}

impl Quickplay {
    /// Creates the overrides for `params`. The stream-in override only exists for revisions that
    /// carry layer flags.
    pub fn new(params: QuickplayParams, options: &Options) -> Quickplay {
        let params = Arc::new(params);
        let revision = options.revision;

        Quickplay {
            sites: HookSite::for_revision(revision).collect(),
            boot: BootOverride::new(params.clone()),
            world_init: WorldInitOverride::new(params.clone(), options.inventory_grant()),
            stream_in: revision
                .has_layer_flags()
                .then(|| StreamInOverride::new(params.clone())),
            params,
        }
    }

    /// Loads the parameters from `disc` and creates the overrides for them.
    pub fn load(disc: &impl Disc, options: &Options) -> Quickplay {
        Quickplay::new(config::load_params(disc, options), options)
    }

    pub fn params(&self) -> &QuickplayParams {
        &self.params
    }

    /// Returns `true` if any feature was enabled by the editor.
    pub fn is_active(&self) -> bool {
        self.params.is_active()
    }

    pub fn boot(&self) -> &BootOverride {
        &self.boot
    }

    pub fn world_init(&self) -> &WorldInitOverride {
        &self.world_init
    }

    pub fn stream_in(&self) -> Option<&StreamInOverride> {
        self.stream_in.as_ref()
    }

    /// The engine functions the host needs to patch.
    pub fn installed_sites(&self) -> &[HookSite] {
        &self.sites
    }
}

static QUICKPLAY: OnceCell<Quickplay> = OnceCell::new();

/// Module entry point. Loads settings from `settings_path` if given, sets up logging, then loads
/// the quickplay parameters from `disc`. Later calls return the instance created by the first.
pub fn init(disc: &impl Disc, settings_path: Option<&Path>) -> &'static Quickplay {
    QUICKPLAY.get_or_init(|| {
        let loaded = settings_path.map(Options::load_from_file).transpose();

        let options = match &loaded {
            Ok(Some(Some(options))) => options.clone(),
            _ => Options::default(),
        };

        // Logging can't be set up before we know where to log to, so settings problems are only
        // reported afterwards.
        if let Err(err) = logging::init(&options) {
            eprintln!("Quickplay logging unavailable: {err:?}");
        }

        log::info!("Quickplay module loaded");
        log::info!("Package version is {}", env!("CARGO_PKG_VERSION"));

        match loaded {
            Ok(Some(Some(_))) => log::info!("Loaded settings."),
            Ok(_) => log::info!("No settings file found. Defaults will be used."),
            Err(err) => log::error!("Error loading settings: {err:?}. Defaults will be used."),
        }

        log::debug!("Options: {options:#?}");

        let quickplay = Quickplay::load(disc, &options);

        for site in quickplay.installed_sites() {
            log::debug!("Hook site: {}", site.symbol());
        }

        quickplay
    })
}

/// Returns the instance created by `init`, if it has been called.
pub fn global() -> Option<&'static Quickplay> {
    QUICKPLAY.get()
}
