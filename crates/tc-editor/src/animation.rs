//! Fire-and-forget entrance animations.
//!
//! Node attributes always hold the end state. A running tween only produces
//! presentation overrides that the host samples by time, so captures never
//! see a node mid-flight.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::f32::consts::PI;
use tc_core::id::NodeId;
use tc_core::model::{AnimationKind, SceneNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    ElasticEaseOut,
    BackEaseOut,
}

impl Easing {
    /// Map progress `t ∈ [0, 1]` to eased progress.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::ElasticEaseOut => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let period = 0.3;
                let shift = period / 4.0;
                2f32.powf(-10.0 * t) * ((t - shift) * (2.0 * PI) / period).sin() + 1.0
            }
            Easing::BackEaseOut => {
                let s = 1.70158;
                let u = t - 1.0;
                u * u * ((s + 1.0) * u + s) + 1.0
            }
        }
    }
}

/// Presentation values an animation overrides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Presentation {
    pub x: f32,
    pub y: f32,
    pub opacity: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Presentation {
    pub fn of(node: &SceneNode) -> Self {
        Self {
            x: node.frame.x,
            y: node.frame.y,
            opacity: node.opacity,
            scale_x: node.frame.scale_x,
            scale_y: node.frame.scale_y,
        }
    }

    fn lerp(self, to: Self, k: f32) -> Self {
        let mix = |a: f32, b: f32| a + (b - a) * k;
        Self {
            x: mix(self.x, to.x),
            y: mix(self.y, to.y),
            opacity: mix(self.opacity, to.opacity),
            scale_x: mix(self.scale_x, to.scale_x),
            scale_y: mix(self.scale_y, to.scale_y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    /// Seconds from the tween start.
    start: f64,
    duration: f64,
    easing: Easing,
    from: Presentation,
    to: Presentation,
}

impl Segment {
    fn end(&self) -> f64 {
        self.start + self.duration
    }

    fn sample(&self, elapsed: f64) -> Presentation {
        let t = ((elapsed - self.start) / self.duration) as f32;
        self.from.lerp(self.to, self.easing.apply(t))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub kind: AnimationKind,
    started_at: f64,
    segments: SmallVec<[Segment; 2]>,
}

impl Tween {
    /// Plan the tween for `kind` ending at the node's current attributes.
    /// `None` for `AnimationKind::None`.
    pub fn plan(node: &SceneNode, kind: AnimationKind, now: f64) -> Option<Self> {
        let end = Presentation::of(node);
        let mut segments = SmallVec::new();
        match kind {
            AnimationKind::None => return None,
            AnimationKind::FadeJiggle => {
                segments.push(Segment {
                    start: 0.0,
                    duration: 0.5,
                    easing: Easing::EaseIn,
                    from: Presentation { opacity: 0.0, ..end },
                    to: end,
                });
                // Jiggles up and snaps back to `end` when finished.
                segments.push(Segment {
                    start: 0.5,
                    duration: 0.8,
                    easing: Easing::ElasticEaseOut,
                    from: end,
                    to: Presentation {
                        y: end.y - 10.0,
                        ..end
                    },
                });
            }
            AnimationKind::SlideInLeft => {
                let (width, _) = node.extent();
                segments.push(Segment {
                    start: 0.0,
                    duration: 0.6,
                    easing: Easing::EaseOut,
                    from: Presentation {
                        x: -width,
                        opacity: 0.0,
                        ..end
                    },
                    to: end,
                });
            }
            AnimationKind::ZoomIn => {
                segments.push(Segment {
                    start: 0.0,
                    duration: 0.5,
                    easing: Easing::BackEaseOut,
                    from: Presentation {
                        scale_x: 0.1,
                        scale_y: 0.1,
                        opacity: 0.0,
                        ..end
                    },
                    to: end,
                });
            }
        }
        Some(Self {
            kind,
            started_at: now,
            segments,
        })
    }

    pub fn duration(&self) -> f64 {
        self.segments.last().map_or(0.0, Segment::end)
    }

    pub fn is_finished(&self, now: f64) -> bool {
        now - self.started_at >= self.duration()
    }

    /// The override at `now`, or `None` once finished.
    pub fn sample(&self, now: f64) -> Option<Presentation> {
        let elapsed = (now - self.started_at).max(0.0);
        self.segments
            .iter()
            .find(|s| elapsed < s.end())
            .map(|s| s.sample(elapsed))
    }
}

/// Running tweens, at most one per node.
#[derive(Debug, Default)]
pub struct Animator {
    tweens: HashMap<NodeId, Tween>,
}

impl Animator {
    /// Start `kind` on the node, replacing any running tween.
    pub fn start(&mut self, node: &SceneNode, kind: AnimationKind, now: f64) {
        match Tween::plan(node, kind, now) {
            Some(tween) => {
                log::debug!("animating {} with {}", node.id, kind.as_str());
                self.tweens.insert(node.id, tween);
            }
            None => {
                self.tweens.remove(&node.id);
            }
        }
    }

    pub fn cancel(&mut self, id: NodeId) -> bool {
        self.tweens.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.tweens.clear();
    }

    pub fn is_running(&self, id: NodeId, now: f64) -> bool {
        self.tweens.get(&id).is_some_and(|t| !t.is_finished(now))
    }

    pub fn sample(&self, id: NodeId, now: f64) -> Option<Presentation> {
        self.tweens.get(&id)?.sample(now)
    }

    /// Sample every running tween and drop the finished ones.
    pub fn tick(&mut self, now: f64) -> Vec<(NodeId, Presentation)> {
        self.tweens.retain(|_, t| !t.is_finished(now));
        self.tweens
            .iter()
            .filter_map(|(id, t)| t.sample(now).map(|p| (*id, p)))
            .collect()
    }

    pub fn active(&self) -> usize {
        self.tweens.len()
    }
}
