pub mod analysis;
pub mod session;
pub mod settings;

pub use analysis::{
    AnalysisRecord, AnalysisResults, AnalysisStatus, CapturedImage, ParameterReading,
};
pub use session::{Preferences, Session, ThemePreference, Units};
pub use settings::{ExportFormat, PrivacySettings, Settings, SettingsPatch};
