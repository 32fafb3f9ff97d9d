pub mod reducer;
pub mod view;

pub use reducer::{reduce, Action, AppState, PersistedState};
pub use view::{AnalysisPhase, View};
