pub mod app;
pub mod dispatch;
pub mod event;
pub mod render;
pub mod spinner;
pub mod state;
pub mod terminal;
pub mod theme;
pub mod view_model;

pub use app::App;
pub use dispatch::Dispatcher;
pub use event::{AppEvent, EventLoop};
pub use render::RenderContext;
pub use state::{HealthStatus, InteractionState};
pub use terminal::{TerminalGuard, install_panic_hook};
pub use theme::Theme;
