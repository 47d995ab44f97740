//! Logging system demonstration
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # With custom filter
//! cargo run --example logging_demo -- pretty "core_runtime=trace"
//! ```

use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::env;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace);
    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    init_logging(config).expect("Failed to initialize logging");

    info!(format = ?format, "Logging initialized");
    debug!(folder = "/shared/audiobooks", "Structured fields example");
    warn!("Warnings carry context the same way");

    // Events flow alongside logs; a host UI would subscribe like this.
    let bus = EventBus::default();
    let mut rx = bus.subscribe();
    bus.emit(CoreEvent::Sync(SyncEvent::ExportCompleted {
        folder: "/shared/audiobooks".to_string(),
        books: 3,
        bytes: 412,
    }))
    .ok();

    let event = rx.recv().await.expect("event");
    info!(description = event.description(), "Received core event");
}
