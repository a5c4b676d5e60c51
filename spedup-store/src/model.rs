//! Furnace domain types shared by the repository and the geometry resolver.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::geometry::LabelDisplay;

/// Block-aligned position of a furnace. One furnace per location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockLocation {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockLocation {
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

impl fmt::Display for BlockLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {}, {})", self.world, self.x, self.y, self.z)
    }
}

/// Cardinal orientation of a furnace block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Facing {
    North,
    East,
    South,
    West,
}

impl Facing {
    pub const ALL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    /// Stored column text
    pub fn as_str(self) -> &'static str {
        match self {
            Facing::North => "NORTH",
            Facing::East => "EAST",
            Facing::South => "SOUTH",
            Facing::West => "WEST",
        }
    }

    /// Unit vector pointing out of the furnace's front face
    pub fn direction(self) -> [f64; 3] {
        match self {
            Facing::North => [0.0, 0.0, -1.0],
            Facing::East => [1.0, 0.0, 0.0],
            Facing::South => [0.0, 0.0, 1.0],
            Facing::West => [-1.0, 0.0, 0.0],
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Facing {
    type Err = StoreError;

    /// Case-sensitive: `"north"` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Facing::ALL
            .into_iter()
            .find(|facing| facing.as_str() == s)
            .ok_or_else(|| StoreError::unknown_variant("facing", s))
    }
}

/// Block material of an upgradeable furnace.
///
/// The three furnace kinds are named; any other host material key made of
/// `A-Z`, `0-9` and `_` is kept as [`Material::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Material {
    Furnace,
    BlastFurnace,
    Smoker,
    /// Upper-cased key of a material with no named variant
    Other(String),
}

impl Material {
    pub const KNOWN: [Material; 3] = [Material::Furnace, Material::BlastFurnace, Material::Smoker];

    pub fn as_str(&self) -> &str {
        match self {
            Material::Furnace => "FURNACE",
            Material::BlastFurnace => "BLAST_FURNACE",
            Material::Smoker => "SMOKER",
            Material::Other(key) => key,
        }
    }

    /// Lookup used on stored `type` text: the text is upper-cased first, then
    /// matched exactly.
    pub fn from_stored(s: &str) -> Result<Self, StoreError> {
        s.to_uppercase().parse()
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Material {
    type Err = StoreError;

    /// Case-sensitive. Empty keys and keys outside `[A-Z0-9_]` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(known) = Material::KNOWN.into_iter().find(|material| material.as_str() == s) {
            return Ok(known);
        }

        let well_formed = !s.is_empty()
            && s.bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_');
        if well_formed {
            Ok(Material::Other(s.to_string()))
        } else {
            Err(StoreError::unknown_variant("material", s))
        }
    }
}

impl TryFrom<String> for Material {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Material> for String {
    fn from(material: Material) -> Self {
        match material {
            Material::Other(key) => key,
            named => named.as_str().to_string(),
        }
    }
}

/// What the host hands the store when a furnace is placed or upgraded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FurnaceRecord {
    pub material: Material,
    pub level: u32,
    pub location: BlockLocation,
    pub facing: Facing,
}

impl FurnaceRecord {
    pub fn new(material: Material, level: u32, location: BlockLocation, facing: Facing) -> Self {
        Self {
            material,
            level,
            location,
            facing,
        }
    }
}

/// Fully hydrated furnace, ready for the host to spawn its label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomFurnace {
    pub material: Material,
    pub level: u32,
    pub location: BlockLocation,
    pub facing: Facing,
    /// False when the host does not currently know the stored world name
    pub world_loaded: bool,
    pub label: LabelDisplay,
}

impl CustomFurnace {
    /// Persisted part of the furnace
    pub fn record(&self) -> FurnaceRecord {
        FurnaceRecord::new(self.material.clone(), self.level, self.location.clone(), self.facing)
    }
}
