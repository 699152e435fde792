mod day;
mod progress;
mod session;
mod settings;

pub use day::ProgramDay;
pub use progress::ProgramState;
pub use session::{CompletionMark, MicrobreakOutcome, SessionKind, SessionRecord};
pub use settings::{
    DEFAULT_MICROBREAK_INTERVAL, MAX_MICROBREAK_INTERVAL, MIN_MICROBREAK_INTERVAL,
    NotificationSettings, SettingsPatch, UserSettings, clamp_interval,
};
