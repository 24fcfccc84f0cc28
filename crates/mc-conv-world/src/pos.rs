//! Block and chunk coordinates, and the horizontal/full direction sets.

use std::fmt;
use std::ops::{Add, Neg, Sub};

/// A coordinate on the horizontal plane (chunk or region coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Pos2i {
    pub x: i32,
    pub z: i32,
}

impl Pos2i {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Rotate 90° clockwise when viewed from above (north → east).
    pub fn rotated_right(self) -> Self {
        Self::new(-self.z, self.x)
    }

    /// Rotate 90° counter-clockwise when viewed from above (north → west).
    pub fn rotated_left(self) -> Self {
        Self::new(self.z, -self.x)
    }

    /// Region containing this chunk (32×32 chunks per region).
    pub fn region(self) -> Self {
        Self::new(self.x.div_euclid(32), self.z.div_euclid(32))
    }

    /// Chunk containing the block column `(bx, bz)`.
    pub fn chunk_of_block(bx: i32, bz: i32) -> Self {
        Self::new(bx.div_euclid(16), bz.div_euclid(16))
    }

    /// Chebyshev distance, used for "windows overlap" checks.
    pub fn chebyshev(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }
}

impl Add for Pos2i {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl Sub for Pos2i {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.z - rhs.z)
    }
}

impl Neg for Pos2i {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.z)
    }
}

impl fmt::Display for Pos2i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// A block coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Pos3i {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Pos3i {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn up(self) -> Self {
        self.offset(0, 1, 0)
    }

    pub fn down(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// Neighbor one step toward `facing`.
    pub fn facing(self, facing: Facing6) -> Self {
        self + facing.vec()
    }

    pub fn horizontal(self, facing: Facing4) -> Self {
        let d = facing.vec();
        self.offset(d.x, 0, d.z)
    }

    /// Chunk containing this block.
    pub fn chunk(self) -> Pos2i {
        Pos2i::chunk_of_block(self.x, self.z)
    }

    pub fn to_int_array(self) -> Vec<i32> {
        vec![self.x, self.y, self.z]
    }

    pub fn from_int_array(values: &[i32]) -> Option<Self> {
        match values {
            [x, y, z] => Some(Self::new(*x, *y, *z)),
            _ => None,
        }
    }
}

impl Add for Pos3i {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Pos3i {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for Pos3i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

/// Horizontal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facing4 {
    North,
    East,
    South,
    West,
}

impl Facing4 {
    pub const ALL: [Facing4; 4] = [Facing4::North, Facing4::East, Facing4::South, Facing4::West];

    /// Unit vector on the horizontal plane (north is -z).
    pub fn vec(self) -> Pos2i {
        match self {
            Facing4::North => Pos2i::new(0, -1),
            Facing4::East => Pos2i::new(1, 0),
            Facing4::South => Pos2i::new(0, 1),
            Facing4::West => Pos2i::new(-1, 0),
        }
    }

    pub fn from_vec(v: Pos2i) -> Option<Self> {
        match (v.x, v.z) {
            (0, -1) => Some(Facing4::North),
            (1, 0) => Some(Facing4::East),
            (0, 1) => Some(Facing4::South),
            (-1, 0) => Some(Facing4::West),
            _ => None,
        }
    }

    pub fn clockwise(self) -> Self {
        match self {
            Facing4::North => Facing4::East,
            Facing4::East => Facing4::South,
            Facing4::South => Facing4::West,
            Facing4::West => Facing4::North,
        }
    }

    pub fn counter_clockwise(self) -> Self {
        match self {
            Facing4::North => Facing4::West,
            Facing4::West => Facing4::South,
            Facing4::South => Facing4::East,
            Facing4::East => Facing4::North,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Facing4::North => Facing4::South,
            Facing4::East => Facing4::West,
            Facing4::South => Facing4::North,
            Facing4::West => Facing4::East,
        }
    }

    /// `true` for east/west.
    pub fn is_x_axis(self) -> bool {
        matches!(self, Facing4::East | Facing4::West)
    }

    pub fn name(self) -> &'static str {
        match self {
            Facing4::North => "north",
            Facing4::East => "east",
            Facing4::South => "south",
            Facing4::West => "west",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "north" => Some(Facing4::North),
            "east" => Some(Facing4::East),
            "south" => Some(Facing4::South),
            "west" => Some(Facing4::West),
            _ => None,
        }
    }
}

/// Any of the six axis-aligned directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facing6 {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Facing6 {
    pub const ALL: [Facing6; 6] = [
        Facing6::Down,
        Facing6::Up,
        Facing6::North,
        Facing6::South,
        Facing6::West,
        Facing6::East,
    ];

    pub fn vec(self) -> Pos3i {
        match self {
            Facing6::Down => Pos3i::new(0, -1, 0),
            Facing6::Up => Pos3i::new(0, 1, 0),
            Facing6::North => Pos3i::new(0, 0, -1),
            Facing6::South => Pos3i::new(0, 0, 1),
            Facing6::West => Pos3i::new(-1, 0, 0),
            Facing6::East => Pos3i::new(1, 0, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Facing6::Down => Facing6::Up,
            Facing6::Up => Facing6::Down,
            Facing6::North => Facing6::South,
            Facing6::South => Facing6::North,
            Facing6::West => Facing6::East,
            Facing6::East => Facing6::West,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Facing6::Down => "down",
            Facing6::Up => "up",
            Facing6::North => "north",
            Facing6::South => "south",
            Facing6::West => "west",
            Facing6::East => "east",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "down" => Some(Facing6::Down),
            "up" => Some(Facing6::Up),
            "north" => Some(Facing6::North),
            "south" => Some(Facing6::South),
            "west" => Some(Facing6::West),
            "east" => Some(Facing6::East),
            _ => None,
        }
    }

    /// Java's 3D data value order: down, up, north, south, west, east.
    pub fn from_java_3d_data(value: i32) -> Option<Self> {
        Self::ALL.get(usize::try_from(value).ok()?).copied()
    }

    pub fn to_java_3d_data(self) -> i32 {
        self as i32
    }

    pub fn horizontal(self) -> Option<Facing4> {
        match self {
            Facing6::North => Some(Facing4::North),
            Facing6::South => Some(Facing4::South),
            Facing6::West => Some(Facing4::West),
            Facing6::East => Some(Facing4::East),
            _ => None,
        }
    }
}

impl From<Facing4> for Facing6 {
    fn from(f: Facing4) -> Self {
        match f {
            Facing4::North => Facing6::North,
            Facing4::East => Facing6::East,
            Facing4::South => Facing6::South,
            Facing4::West => Facing6::West,
        }
    }
}
