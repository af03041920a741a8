// Light fixture state: a lamp that is either lit or sparking, never both.

use std::f32::consts::PI;

use glam::Vec3;

use crate::domain::entity::Interactable;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl LinearColor {
    pub const RED: Self = Self {
        r: 1.0,
        g: 0.0,
        b: 0.0,
    };

    /// Hue wheel colour for a lamp, based on the horizontal bearing from
    /// `target` to `lamp`.
    pub fn from_bearing(lamp: Vec3, target: Vec3) -> Self {
        let rel = (lamp - target).normalize_or_zero();
        let angle = rel.x.atan2(rel.y) + PI;
        Self {
            r: angle.cos() / 2.0 + 0.5,
            g: (angle + 2.0 * PI / 3.0).cos() / 2.0 + 0.5,
            b: (angle - 2.0 * PI / 3.0).cos() / 2.0 + 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightFixture {
    is_lit: bool,
    sparks_visible: bool,
    pub color: LinearColor,
}

impl Default for LightFixture {
    fn default() -> Self {
        Self {
            is_lit: true,
            sparks_visible: false,
            color: LinearColor::RED,
        }
    }
}

impl LightFixture {
    pub fn is_lit(&self) -> bool {
        self.is_lit
    }

    pub fn sparks_visible(&self) -> bool {
        self.sparks_visible
    }

    pub fn set_state(&mut self, lit: bool) {
        self.is_lit = lit;
        self.sparks_visible = !lit;
    }

    pub fn toggle(&mut self) -> bool {
        self.set_state(!self.is_lit);
        self.is_lit
    }
}

impl Interactable for LightFixture {
    fn use_entity(&mut self) -> bool {
        self.toggle()
    }
}
