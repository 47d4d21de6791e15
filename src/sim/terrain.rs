use crate::config::{Material, TerrainParam};

/// An axis-aligned rectangle of one material, centred at (x, y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainPatch {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub material: Material,
}

impl TerrainPatch {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        (px - self.x).abs() <= self.width / 2.0 && (py - self.y).abs() <= self.height / 2.0
    }

    /// (left, top, right, bottom) in world coordinates.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        (self.x - hw, self.y - hh, self.x + hw, self.y + hh)
    }
}

impl From<&TerrainParam> for TerrainPatch {
    fn from(p: &TerrainParam) -> Self {
        let TerrainParam(x, y, width, height, material) = *p;
        Self { x, y, width, height, material }
    }
}

/// Layered terrain. Later patches sit on top of earlier ones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Terrain {
    patches: Vec<TerrainPatch>,
}

impl Terrain {
    /// Material under points covered by no patch.
    pub const BACKGROUND: Material = Material::Grass;

    pub fn from_params(params: &[TerrainParam]) -> Self {
        Self { patches: params.iter().map(TerrainPatch::from).collect() }
    }

    pub fn patches(&self) -> &[TerrainPatch] { &self.patches }

    pub fn material_at(&self, x: f32, y: f32) -> Material {
        self.patches
            .iter()
            .rev()
            .find(|p| p.contains(x, y))
            .map_or(Self::BACKGROUND, |p| p.material)
    }
}
