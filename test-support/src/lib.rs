pub mod fake_relay;
pub mod fake_smtp;

use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::sync::Once;

pub fn setup_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        TermLogger::init(
            LevelFilter::Debug,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        )
        .unwrap();
    });
}
