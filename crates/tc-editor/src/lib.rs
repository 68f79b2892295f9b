//! The editor core: one session owning the scene, its bounded undo/redo
//! history, the selection and everything derived from the scene
//! (listener bindings, filter caches, running animations).

pub mod animation;
pub mod assets;
pub mod config;
pub mod error;
pub mod history;
pub mod rehydrate;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod sidebar;
pub mod style;

pub use animation::{Animator, Easing, Presentation, Tween};
pub use assets::{AssetStore, LoadTarget, LoadTicket};
pub use config::{EditorConfig, StageView};
pub use error::{EditorError, EditorResult};
pub use history::HistoryStack;
pub use rehydrate::{Interaction, InteractiveNode, ListenerRegistry};
pub use selection::SelectionController;
pub use session::{EditorSession, ImagePlacement, TextEdit, TextPreset};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use sidebar::{DocumentProperties, NodeProperties, SidebarTab, SidebarUpdate};
pub use style::StyleChange;
