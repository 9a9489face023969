/// Window after a restart during which further restart requests are ignored,
/// covering the time the tracking session needs to reinitialize (seconds).
pub const RESTART_COOLDOWN_SECS: f64 = 5.0;
