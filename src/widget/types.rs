use crate::placement::PanelPose;
use bevy_ecs::prelude::*;
use glam::{Vec2, Vec4};
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Panel,
    TitleBar,
    ButtonContainer,
    Button,
    InputRow,
    InputField,
    StatusLabel,
}

impl WidgetKind {
    pub fn label(self) -> &'static str {
        match self {
            WidgetKind::Panel => "Panel",
            WidgetKind::TitleBar => "TitleBar",
            WidgetKind::ButtonContainer => "ButtonContainer",
            WidgetKind::Button => "Button",
            WidgetKind::InputRow => "InputRow",
            WidgetKind::InputField => "InputField",
            WidgetKind::StatusLabel => "StatusLabel",
        }
    }

    pub fn is_interactive(self) -> bool {
        matches!(self, WidgetKind::Button | WidgetKind::InputField)
    }
}

#[derive(Component, Clone, Debug)]
pub struct WidgetNode {
    pub kind: WidgetKind,
    pub name: String,
}

#[derive(Component, Clone, Copy, Debug)]
pub struct Parent(pub Entity);

#[derive(Component, Default, Debug)]
pub struct Children(pub SmallVec<[Entity; 8]>);

/// Anchor rule relative to the parent box. Anchors are fractions of the parent size,
/// offsets are added to the anchored corners in panel units (Y up).
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub anchor_min: Vec2,
    pub anchor_max: Vec2,
    pub offset_min: Vec2,
    pub offset_max: Vec2,
}

impl Bounds {
    pub const FULL: Bounds = Bounds {
        anchor_min: Vec2::ZERO,
        anchor_max: Vec2::ONE,
        offset_min: Vec2::ZERO,
        offset_max: Vec2::ZERO,
    };

    pub fn new(anchor_min: Vec2, anchor_max: Vec2, offset_min: Vec2, offset_max: Vec2) -> Self {
        Self { anchor_min, anchor_max, offset_min, offset_max }
    }

    /// Stretches across the parent with the given insets.
    pub fn inset(offset_min: Vec2, offset_max: Vec2) -> Self {
        Self { offset_min, offset_max, ..Self::FULL }
    }
}

/// Explicit size. On stack children a zero width is the stretch sentinel.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct SizeSpec {
    pub width: f32,
    pub height: f32,
}

impl SizeSpec {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn stretched(height: f32) -> Self {
        Self { width: 0.0, height }
    }

    pub fn is_stretch(&self) -> bool {
        self.width == 0.0
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Vertical stack rule carried by a container.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct StackLayout {
    pub spacing: f32,
}

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Style {
    pub fill: Option<Vec4>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    MiddleLeft,
    MiddleCenter,
}

#[derive(Component, Clone, Debug, PartialEq)]
pub struct Label {
    pub text: String,
    pub font_size: f32,
    pub weight: FontWeight,
    pub color: Vec4,
    pub align: TextAlign,
}

impl Label {
    pub fn new(text: impl Into<String>, font_size: f32) -> Self {
        Self {
            text: text.into(),
            font_size,
            weight: FontWeight::Regular,
            color: Vec4::ONE,
            align: TextAlign::MiddleCenter,
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = FontWeight::Bold;
        self
    }

    pub fn aligned(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn colored(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }
}

/// Greyed-out hint shown while an input field is empty.
#[derive(Component, Clone, Debug, PartialEq)]
pub struct Placeholder(pub String);

/// Root transform of the panel in world space.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct PanelTransform {
    pub scale: f32,
    pub pose: Option<PanelPose>,
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Visible(pub bool);
