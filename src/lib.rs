pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod insights;
pub mod models;
pub mod notify;
pub mod router;
pub mod state;
pub mod store;
pub mod utils;

use anyhow::Result;
use chrono::Local;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

pub use app::AppController;
pub use config::AppConfig;
pub use router::{route, Intent, Screen};
pub use state::{Action, AppState, View};

fn print_screen(state: &AppState) {
    let rendered = match route(state, Local::now().date_naive()) {
        Some(screen) => serde_json::to_string(&screen),
        None => serde_json::to_string(&json!({ "screen": null, "view": state.view.name() })),
    };
    match rendered {
        Ok(line) => println!("{line}"),
        Err(err) => log::error!("Failed to render {} screen: {err}", state.view.name()),
    }
}

/// Boots the core against the on-disk store and drives it with one JSON
/// [`Intent`] per stdin line. Every view change is printed as a JSON screen.
pub async fn run() -> Result<()> {
    let config = AppConfig::from_env();
    utils::logging::init(config.debug);

    log::info!("UriSNAP starting up...");

    let controller = AppController::open(config)?;

    let mut updates = controller.subscribe();
    let renderer = tokio::spawn(async move {
        let mut last_view = None;
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            if last_view.as_ref() != Some(&state.view) {
                print_screen(&state);
                last_view = Some(state.view.clone());
            }
        }
    });

    controller.boot().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let outcome = match serde_json::from_str::<Intent>(line) {
            Ok(intent) => controller.handle(intent).await.map(|_| ()),
            Err(err) => Err(anyhow::anyhow!("invalid intent: {err}")),
        };
        if let Err(err) = outcome {
            println!("{}", json!({ "error": format!("{err:#}") }));
        }
    }

    controller.wait_for_analysis().await;
    controller.shutdown().await;
    drop(controller);
    renderer.abort();

    log::info!("UriSNAP shutting down");
    Ok(())
}
