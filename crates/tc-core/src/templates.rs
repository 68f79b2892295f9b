//! The fixed template library.
//!
//! Each template is a layer document on the 300×550 artboard, in the same
//! schema as a snapshot. Nodes declared `listening: false` are structural
//! backdrops; every other node becomes editable when instantiated.

use crate::error::{CoreError, CoreResult};
use crate::model::SceneNode;
use crate::snapshot::{self, Snapshot};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    Carousel,
    VideoAd,
    EventPromo,
    ProductAnnouncement,
    QuoteGraphic,
}

impl TemplateId {
    pub const ALL: [TemplateId; 5] = [
        TemplateId::Carousel,
        TemplateId::VideoAd,
        TemplateId::EventPromo,
        TemplateId::ProductAnnouncement,
        TemplateId::QuoteGraphic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateId::Carousel => "carousel_template",
            TemplateId::VideoAd => "video_ad_template",
            TemplateId::EventPromo => "event_promo_template",
            TemplateId::ProductAnnouncement => "product_announcement_template",
            TemplateId::QuoteGraphic => "quote_graphic_template",
        }
    }

    /// Human-readable name for the template picker.
    pub fn label(self) -> &'static str {
        match self {
            TemplateId::Carousel => "Instagram Carousel",
            TemplateId::VideoAd => "Short Video Ad",
            TemplateId::EventPromo => "Event Promo",
            TemplateId::ProductAnnouncement => "Product Announcement",
            TemplateId::QuoteGraphic => "Quote Graphic",
        }
    }

    pub fn json(self) -> &'static str {
        match self {
            TemplateId::Carousel => CAROUSEL,
            TemplateId::VideoAd => VIDEO_AD,
            TemplateId::EventPromo => EVENT_PROMO,
            TemplateId::ProductAnnouncement => PRODUCT_ANNOUNCEMENT,
            TemplateId::QuoteGraphic => QUOTE_GRAPHIC,
        }
    }

    /// Parse the template document into a snapshot.
    pub fn snapshot(self) -> CoreResult<Snapshot> {
        Snapshot::from_json(self.json())
    }

    /// Fresh nodes for the template, with editability derived from
    /// `listening`.
    pub fn instantiate(self) -> CoreResult<Vec<SceneNode>> {
        let mut nodes = snapshot::restore(&self.snapshot()?)?;
        for node in &mut nodes {
            node.editable = node.listening;
        }
        log::debug!("instantiated {} ({} nodes)", self, nodes.len());
        Ok(nodes)
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateId {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::UnknownTemplate(s.to_string()))
    }
}

// ─── Layouts ─────────────────────────────────────────────────────────────

const CAROUSEL: &str = r##"{
  "className": "Layer",
  "children": [
    { "className": "Rect", "id": "bg-rect", "width": 300, "height": 550, "fill": "#F5F5F5", "listening": false },
    { "className": "Text", "id": "headline-text", "text": "THE ESSENTIALS", "x": 30, "y": 80, "fontSize": 36, "fill": "#141414", "fontFamily": "Inter", "fontStyle": "bold", "draggable": true },
    { "className": "Text", "id": "body-text", "text": "5 TIPS FOR\nPRODUCTIVITY", "x": 30, "y": 130, "width": 240, "fontSize": 24, "fill": "#05eafa", "fontFamily": "Inter", "draggable": true },
    { "className": "Rect", "id": "image-placeholder", "x": 30, "y": 280, "width": 240, "height": 200, "fill": "#D0D0D0", "cornerRadius": 10, "shadowColor": "black", "shadowBlur": 10, "shadowOpacity": 0.2, "draggable": true }
  ]
}"##;

const VIDEO_AD: &str = r##"{
  "className": "Layer",
  "children": [
    { "className": "Rect", "id": "media-placeholder", "x": 0, "y": 0, "width": 300, "height": 550, "fill": "#2B4D66", "draggable": false },
    { "className": "Text", "id": "bg-watermark-text", "text": "LIVE", "x": 15, "y": 15, "fontSize": 60, "fill": "#E0E0E0", "fontFamily": "Inter", "fontStyle": "bold", "opacity": 0.3, "draggable": true },
    { "className": "Text", "id": "main-promo-text", "text": "A NEW ERA\nOF EDITING", "x": 20, "y": 150, "width": 260, "fontSize": 48, "lineHeight": 1.1, "fill": "#FFFFFF", "fontFamily": "Arial Black", "shadowColor": "#05eafa", "shadowBlur": 8, "draggable": true },
    { "className": "Text", "id": "cta-text", "text": "Click here to learn more.", "x": 20, "y": 450, "fontSize": 16, "fill": "#05eafa", "fontFamily": "Inter", "draggable": true }
  ]
}"##;

const EVENT_PROMO: &str = r##"{
  "className": "Layer",
  "children": [
    { "className": "Rect", "id": "bg-light-rect", "width": 300, "height": 550, "fill": "#EFEFEF", "listening": false },
    { "className": "Rect", "id": "footer-bar", "x": 0, "y": 300, "width": 300, "height": 250, "fill": "#141414", "listening": false },
    { "className": "Text", "id": "event-headline", "text": "GLOBAL\nEVENT", "x": 20, "y": 320, "fontSize": 40, "fill": "#FFFFFF", "fontFamily": "Arial Black", "draggable": true },
    { "className": "Text", "id": "event-date", "text": "October 25 | 7:00 PM EST", "x": 20, "y": 450, "fontSize": 18, "fill": "#05eafa", "fontFamily": "Inter", "draggable": true },
    { "className": "Rect", "id": "circle-placeholder", "x": 50, "y": 50, "width": 200, "height": 200, "fill": "#D0D0D0", "cornerRadius": 100, "draggable": true }
  ]
}"##;

const PRODUCT_ANNOUNCEMENT: &str = r##"{
  "className": "Layer",
  "children": [
    { "className": "Rect", "id": "bg-dark-rect-2", "width": 300, "height": 550, "fill": "#141414", "listening": false },
    { "className": "Rect", "id": "center-box", "x": 0, "y": 100, "width": 300, "height": 350, "fill": "#333333", "listening": false, "opacity": 0.8 },
    { "className": "Text", "id": "new-product-label", "text": "NEW PRODUCT", "x": 30, "y": 130, "fontSize": 24, "fill": "#05eafa", "fontFamily": "Inter", "fontStyle": "bold", "draggable": true },
    { "className": "Text", "id": "main-launch-text", "text": "LAUNCH\nTOMORROW", "x": 30, "y": 170, "fontSize": 50, "fill": "#FFFFFF", "fontFamily": "Arial Black", "lineHeight": 1, "draggable": true },
    { "className": "Text", "id": "cta-launch-text", "text": "Visit our site for details!", "x": 30, "y": 400, "fontSize": 18, "fill": "#D0D0D0", "fontFamily": "Inter", "draggable": true }
  ]
}"##;

const QUOTE_GRAPHIC: &str = r##"{
  "className": "Layer",
  "children": [
    { "className": "Rect", "id": "bg-white-rect", "width": 300, "height": 550, "fill": "#FFFFFF", "listening": false },
    { "className": "Rect", "id": "border-rect", "x": 20, "y": 20, "width": 260, "height": 510, "stroke": "#05eafa", "strokeWidth": 5, "listening": false },
    { "className": "Text", "id": "quote-text", "text": "“The best way to predict the future is to create it.”", "x": 40, "y": 150, "width": 220, "fontSize": 30, "align": "center", "fill": "#141414", "fontFamily": "Georgia", "fontStyle": "italic", "draggable": true },
    { "className": "Text", "id": "author-text", "text": "— Peter Drucker", "x": 40, "y": 350, "width": 220, "fontSize": 18, "align": "center", "fill": "#333333", "fontFamily": "Inter", "draggable": true }
  ]
}"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;

    #[test]
    fn every_template_parses() {
        for id in TemplateId::ALL {
            let nodes = id.instantiate().unwrap();
            assert!(!nodes.is_empty(), "{id} is empty");
        }
    }

    #[test]
    fn names_roundtrip() {
        for id in TemplateId::ALL {
            assert_eq!(id.as_str().parse::<TemplateId>().unwrap(), id);
        }
        assert!(matches!(
            "nope_template".parse::<TemplateId>(),
            Err(CoreError::UnknownTemplate(_))
        ));
    }

    #[test]
    fn structural_nodes_stay_locked() {
        let nodes = TemplateId::Carousel.instantiate().unwrap();
        let bg = nodes.iter().find(|n| n.id.as_str() == "bg-rect").unwrap();
        assert!(!bg.editable);
        assert!(!bg.listening);
        let headline = nodes
            .iter()
            .find(|n| n.id.as_str() == "headline-text")
            .unwrap();
        assert!(headline.editable);
        assert!(headline.draggable);
        assert!(headline.as_text().unwrap().font_style.bold);
    }

    #[test]
    fn media_placeholder_is_editable_but_fixed() {
        let nodes = TemplateId::VideoAd.instantiate().unwrap();
        let media = &nodes[0];
        assert_eq!(media.id.as_str(), "media-placeholder");
        assert!(media.editable);
        assert!(!media.draggable);
        assert!(matches!(media.kind, NodeKind::Rect(_)));
    }

    #[test]
    fn quote_is_centered_italic() {
        let nodes = TemplateId::QuoteGraphic.instantiate().unwrap();
        let quote = nodes[2].as_text().unwrap();
        assert!(quote.font_style.italic);
        assert_eq!(quote.align, crate::model::TextAlign::Center);
        assert_eq!(nodes[2].frame.width, 220.0);
    }
}
