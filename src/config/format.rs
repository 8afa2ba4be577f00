//! The binary layout of the `dbgconfig` record.
//!
//! The record has no length prefixes and no tags: both the editor and this module know the field
//! list for each revision, and both use the console's big-endian byte order. Offsets are in bytes.
//!
//! ```text
//!   field                  V1     V2
//!   magic        u32        0      0
//!   version      u32        4      4
//!   feature flags u32       8      8
//!   boot world   u32       12     12
//!   boot area    u32       16     16
//!   (padding)    u32        -     20
//!   layer flags  u64        -     24
//!   transform    12 x f32  20     32
//!   total                  68     80
//! ```
//!
//! Disc reads happen in 32-byte units, so the buffer a record is read into is always rounded up
//! to a multiple of 32. Nothing after the record is ever looked at.

use std::{fmt, io::Read};

use bitflags::bitflags;
use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;

use crate::game::{engine::AssetId, hooks::InventoryGrant};

/// Value of the first field of every valid record.
pub const MAGIC: u32 = 0x00BADB01;

/// Disc reads must target 32-byte aligned memory and are made in 32-byte units.
pub const READ_ALIGNMENT: usize = 32;

/// Byte order shared with the editor.
pub type WireOrder = BigEndian;

/// Rounds `len` up to the next multiple of `READ_ALIGNMENT`.
pub const fn round_up_32(len: usize) -> usize {
    (len + READ_ALIGNMENT - 1) & !(READ_ALIGNMENT - 1)
}

bitflags! {
    /// Which quickplay features the editor asked for.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FeatureFlags: u32 {
        /// On boot, load the area given by the boot world and area IDs.
        const JUMP_TO_AREA = 0x0000_0001;

        /// Put the player at the spawn transform. Only used alongside `JUMP_TO_AREA`.
        const SET_SPAWN_POSITION = 0x0000_0002;

        /// Fill the player's inventory on spawn.
        const GIVE_ALL_ITEMS = 0x0000_0004;
    }
}

impl FeatureFlags {
    /// Returns `true` if the spawn transform should be applied. Without a redirected boot the
    /// transform has no meaningful area to apply to, so both flags are required.
    pub fn wants_spawn_override(self) -> bool {
        self.contains(FeatureFlags::JUMP_TO_AREA | FeatureFlags::SET_SPAWN_POSITION)
    }
}

impl fmt::Display for FeatureFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }

        let names = self.iter_names().map(|(name, _)| name.to_lowercase()).join(", ");
        let unknown = self.bits() & !FeatureFlags::all().bits();

        if unknown == 0 {
            f.write_str(&names)
        } else if names.is_empty() {
            write!(f, "unknown bits {unknown:#x}")
        } else {
            write!(f, "{names}, unknown bits {unknown:#x}")
        }
    }
}

/// A revision of the record layout. The version field of a record must match the loader's
/// revision exactly.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
pub enum Revision {
    /// Boot location and spawn transform only.
    V1,

    /// Adds the boot area's layer flags, aligned to 64 bits.
    #[default]
    V2,
}

impl Revision {
    /// The revision the editor currently writes.
    pub const CURRENT: Revision = Revision::V2;

    /// The number stored in the record's version field.
    pub fn version(self) -> u32 {
        match self {
            Revision::V1 => 1,
            Revision::V2 => 2,
        }
    }

    /// Finds the revision with the given version number.
    pub fn from_version(version: u32) -> Option<Revision> {
        Revision::iter().find(|revision| revision.version() == version)
    }

    /// Returns `true` if records of this revision carry area layer flags.
    pub fn has_layer_flags(self) -> bool {
        matches!(self, Revision::V2)
    }

    fn layout(self) -> Layout {
        match self {
            Revision::V1 => Layout {
                layer_flags: None,
                transform: 20,
            },

            Revision::V2 => Layout {
                layer_flags: Some(24),
                transform: 32,
            },
        }
    }

    /// Size of the record in bytes, excluding read padding.
    pub fn record_size(self) -> usize {
        self.layout().transform + Transform4f::SIZE
    }

    /// Size of the record rounded up to the disc's read unit.
    pub fn buffer_size(self) -> usize {
        round_up_32(self.record_size())
    }

    /// Which inventory kinds the give-all-items feature covers by default.
    pub fn default_inventory_grant(self) -> InventoryGrant {
        match self {
            Revision::V1 => InventoryGrant::All,
            Revision::V2 => InventoryGrant::PersistentOnly,
        }
    }
}

/// Offsets of the fields that move between revisions.
struct Layout {
    layer_flags: Option<usize>,
    transform: usize,
}

/// A rigid transform stored as a row-major 3x4 matrix. The first three columns hold the basis and
/// the last column holds the translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform4f {
    pub rows: [[f32; 4]; 3],
}

impl Transform4f {
    /// Encoded size in bytes.
    pub const SIZE: usize = 12 * 4;

    pub const IDENTITY: Transform4f = Transform4f {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
    };

    /// Creates an unrotated transform at the given position.
    pub fn from_translation(x: f32, y: f32, z: f32) -> Transform4f {
        let mut transform = Transform4f::IDENTITY;
        transform.rows[0][3] = x;
        transform.rows[1][3] = y;
        transform.rows[2][3] = z;
        transform
    }

    pub fn translation(&self) -> [f32; 3] {
        [self.rows[0][3], self.rows[1][3], self.rows[2][3]]
    }

    fn read(reader: &mut impl Read) -> std::io::Result<Transform4f> {
        let mut rows = [[0.0; 4]; 3];

        for value in rows.iter_mut().flatten() {
            *value = reader.read_f32::<WireOrder>()?;
        }

        Ok(Transform4f { rows })
    }

    fn write(&self, buf: &mut [u8]) {
        for (i, value) in self.rows.iter().flatten().enumerate() {
            WireOrder::write_f32(&mut buf[i * 4..], *value);
        }
    }
}

impl Default for Transform4f {
    fn default() -> Self {
        Transform4f { rows: [[0.0; 4]; 3] }
    }
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("record needs {needed} bytes but only {actual} are available")]
    TooShort { needed: usize, actual: usize },

    #[error("failed to read record field")]
    Io(#[from] std::io::Error),
}

/// The parameters the editor chose for this boot.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct QuickplayParams {
    pub magic: u32,
    pub version: u32,
    pub feature_flags: FeatureFlags,
    pub boot_world_id: AssetId,
    pub boot_area_id: AssetId,

    /// Always zero for revisions without layer flags.
    pub boot_area_layer_flags: u64,
    pub spawn_transform: Transform4f,
}

impl QuickplayParams {
    /// Parameters with every feature turned off.
    pub fn disabled() -> QuickplayParams {
        QuickplayParams::default()
    }

    /// Returns `true` if any feature is enabled.
    pub fn is_active(&self) -> bool {
        !self.feature_flags.is_empty()
    }

    /// Decodes a record from the start of `bytes`. Bytes past the end of the record are ignored.
    /// No field is checked here; the loader is responsible for checking the magic and version.
    pub fn decode(bytes: &[u8], revision: Revision) -> Result<QuickplayParams, FormatError> {
        let needed = revision.record_size();

        if bytes.len() < needed {
            return Err(FormatError::TooShort {
                needed,
                actual: bytes.len(),
            });
        }

        let mut reader = &bytes[..needed];

        let magic = reader.read_u32::<WireOrder>()?;
        let version = reader.read_u32::<WireOrder>()?;
        let feature_flags = FeatureFlags::from_bits_retain(reader.read_u32::<WireOrder>()?);
        let boot_world_id = AssetId(reader.read_u32::<WireOrder>()?);
        let boot_area_id = AssetId(reader.read_u32::<WireOrder>()?);

        let boot_area_layer_flags = if revision.has_layer_flags() {
            // Skip the padding that aligns the layer flags to 64 bits.
            reader.read_u32::<WireOrder>()?;
            reader.read_u64::<WireOrder>()?
        } else {
            0
        };

        let spawn_transform = Transform4f::read(&mut reader)?;

        Ok(QuickplayParams {
            magic,
            version,
            feature_flags,
            boot_world_id,
            boot_area_id,
            boot_area_layer_flags,
            spawn_transform,
        })
    }

    /// Encodes the record exactly as the editor writes it. Padding is zeroed, and layer flags are
    /// dropped for revisions that have no room for them.
    pub fn encode(&self, revision: Revision) -> Vec<u8> {
        let layout = revision.layout();
        let mut buf = vec![0u8; revision.record_size()];

        WireOrder::write_u32(&mut buf[0..], self.magic);
        WireOrder::write_u32(&mut buf[4..], self.version);
        WireOrder::write_u32(&mut buf[8..], self.feature_flags.bits());
        WireOrder::write_u32(&mut buf[12..], self.boot_world_id.0);
        WireOrder::write_u32(&mut buf[16..], self.boot_area_id.0);

        if let Some(offset) = layout.layer_flags {
            WireOrder::write_u64(&mut buf[offset..], self.boot_area_layer_flags);
        }

        self.spawn_transform.write(&mut buf[layout.transform..]);
        buf
    }
}
