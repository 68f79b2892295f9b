//! Property-panel notifications.
//!
//! The session queues one update per selection change or attribute write;
//! the host drains the queue and refreshes its controls.

use crate::config::StageView;
use serde::Serialize;
use tc_core::id::NodeId;
use tc_core::model::*;
use tc_core::{Color, FilterPreset};

/// Right-hand sidebar panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SidebarTab {
    StyleProps,
    AnimProps,
    FilterProps,
    TextProps,
    CanvasProps,
}

impl SidebarTab {
    pub fn as_str(self) -> &'static str {
        match self {
            SidebarTab::StyleProps => "style-props",
            SidebarTab::AnimProps => "anim-props",
            SidebarTab::FilterProps => "filter-props",
            SidebarTab::TextProps => "text-props",
            SidebarTab::CanvasProps => "canvas-props",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextControls {
    pub font_family: String,
    pub font_size: f32,
    pub fill: Color,
    pub bold: bool,
    pub italic: bool,
    pub align: TextAlign,
}

/// Everything the panel shows for a selected node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperties {
    pub id: NodeId,
    pub class_name: &'static str,
    pub tabs: Vec<SidebarTab>,
    pub default_tab: SidebarTab,
    pub opacity: f32,
    pub shadow_enabled: bool,
    pub shadow_color: Option<Color>,
    pub shadow_blur: f32,
    pub shadow_offset_x: f32,
    pub shadow_offset_y: f32,
    pub animation: AnimationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset_filter: Option<FilterPreset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextControls>,
}

impl NodeProperties {
    pub fn of(node: &SceneNode) -> Self {
        let mut tabs = vec![SidebarTab::StyleProps, SidebarTab::AnimProps];
        let mut default_tab = SidebarTab::StyleProps;
        let mut preset_filter = None;
        let mut text = None;

        match &node.kind {
            NodeKind::Image(image) => {
                tabs.push(SidebarTab::FilterProps);
                default_tab = SidebarTab::FilterProps;
                preset_filter = Some(image.preset);
            }
            NodeKind::Text(t) => {
                tabs.push(SidebarTab::TextProps);
                text = Some(TextControls {
                    font_family: t.font_family.clone(),
                    font_size: t.font_size,
                    fill: t.fill.unwrap_or(Color::WHITE),
                    bold: t.font_style.bold,
                    italic: t.font_style.italic,
                    align: t.align,
                });
            }
            _ => {}
        }

        Self {
            id: node.id,
            class_name: node.class_name(),
            tabs,
            default_tab,
            opacity: node.opacity,
            shadow_enabled: node.shadow.enabled,
            shadow_color: node.shadow.color,
            shadow_blur: node.shadow.blur,
            shadow_offset_x: node.shadow.offset_x,
            shadow_offset_y: node.shadow.offset_y,
            animation: node.animation,
            preset_filter,
            text,
        }
    }
}

/// Document-level properties shown when nothing is selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentProperties {
    pub stage: StageView,
    pub node_count: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl DocumentProperties {
    pub fn default_tab(&self) -> SidebarTab {
        SidebarTab::CanvasProps
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "properties", rename_all = "camelCase")]
pub enum SidebarUpdate {
    Node(NodeProperties),
    Document(DocumentProperties),
}
