use color_eyre::{eyre::eyre, Result};
use softboard::config::Layout;
use softboard::connection::ScratchEditor;
use softboard::engine::BoardEngineHandle;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let path = std::env::args().nth(1).map(PathBuf::from);
    let layout = Layout::load(path)
        .await
        .map_err(|e| eyre!("Failed to load layout: {}", e))?;
    let script = layout.script.clone();
    let built = layout
        .build()
        .map_err(|e| eyre!("Failed to build layout: {}", e))?;
    let repeat_interval = built.settings.repeat_interval();

    // The scratch editor stands in for a real text field
    let editor = ScratchEditor::default();
    let (service, buttons) = built.into_service(Box::new(editor.clone()));

    info!("Starting board engine");
    let mut engine = BoardEngineHandle::spawn(service, buttons, repeat_interval);

    info!("Replaying {} touch events", script.len());
    for event in script {
        debug!("Replaying {:?}", event);
        engine
            .send(event)
            .await
            .map_err(|e| eyre!("Failed to send touch event: {}", e))?;
    }

    let service = engine
        .shutdown()
        .await
        .map_err(|e| eyre!("Failed to stop board engine: {}", e))?;
    let snapshot = engine.snapshot();
    info!(
        "Engine handled {} events, process counter {}",
        snapshot.handled_events,
        snapshot.process_counter
    );

    println!("Editor text: {:?}", editor.text());
    println!("Board: {}", snapshot.board);
    println!("Active shortcut: {:?}", service.active_short_cut());
    println!("Meta: {:?}", snapshot.meta);
    println!("Titles: {}", snapshot.titles.join(" | "));

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
