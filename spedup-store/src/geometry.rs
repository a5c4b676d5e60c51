//! Label geometry for hydrated furnaces.
//!
//! The label floats just in front of the furnace's front face. Its anchor is the
//! block corner shifted to the block centre (raised to 0.3) and pushed out along
//! the facing direction. North and west faces use 0.51 instead of 0.50 so the
//! text clears the furnace model on those sides.

use std::ops::{Add, Mul};

use serde::Serialize;

use crate::model::{BlockLocation, CustomFurnace, Facing, Material};

/// Offset from the block corner to where the label column starts
pub const CENTERING_OFFSET: Vec3 = Vec3::new(0.5, 0.3, 0.5);

/// Visual size passed to the host text display
pub const LABEL_SIZE: u32 = 10;

/// Host colour code prefix for aqua text
const LABEL_COLOR: &str = "§b";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, factor: f64) -> Vec3 {
        Vec3::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

/// How the host orients the text display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Billboard {
    Fixed,
}

/// Secondary text entity showing a furnace's level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelDisplay {
    pub text: String,
    pub position: Vec3,
    pub size: u32,
    pub yaw: f32,
    pub roll: f32,
    pub billboard: Billboard,
}

impl LabelDisplay {
    /// Text with the host colour code, as spawned in game
    pub fn formatted_text(&self) -> String {
        format!("{LABEL_COLOR}{}", self.text)
    }
}

/// Yaw in degrees and offset scale for each facing
pub fn facing_transform(facing: Facing) -> (f32, f64) {
    match facing {
        Facing::North => (180.0, 0.51),
        Facing::East => (-90.0, 0.5),
        Facing::South => (0.0, 0.5),
        Facing::West => (90.0, 0.51),
    }
}

/// Where the label for a furnace at `location` facing `facing` is anchored
pub fn label_anchor(location: &BlockLocation, facing: Facing) -> Vec3 {
    let (_, scale) = facing_transform(facing);
    let [dx, dy, dz] = facing.direction();
    let block = Vec3::new(location.x as f64, location.y as f64, location.z as f64);
    let direction = Vec3::new(dx, dy, dz);

    block + CENTERING_OFFSET + direction * scale
}

/// Rebuild the runtime furnace from its stored parts.
///
/// `world_loaded` is left `true`; the repository clears it when the world lookup
/// does not know the stored world.
pub fn resolve(location: BlockLocation, level: u32, material: Material, facing: Facing) -> CustomFurnace {
    let (yaw, _) = facing_transform(facing);
    let label = LabelDisplay {
        text: format!("Level {level}"),
        position: label_anchor(&location, facing),
        size: LABEL_SIZE,
        yaw,
        roll: 0.0,
        billboard: Billboard::Fixed,
    };

    CustomFurnace {
        material,
        level,
        location,
        facing,
        world_loaded: true,
        label,
    }
}
