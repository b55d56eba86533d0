use color_eyre::Result;
use mayday_tui::{
    api::ReportClient,
    app::{Action, App},
    config::Config,
    events::{Event, EventHandler},
    geocode::Geocoder,
    location::{ConfiguredSource, FixOptions},
    logging,
    submit::Submitter,
    ui,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, time::Duration};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Instrumentation and safety
    let _log_guard = logging::initialize_logging();
    install_panic_hook();
    color_eyre::install()?;

    let config = Config::load();
    info!("Starting with report API at {}", config.api.base_url);

    // Ready terminal and state
    let mut terminal = setup_terminal()?;
    let mut app = App::new();
    let mut events = EventHandler::new(150); // High tick rate keeps the alert timing snappy

    // Background health poller for the footer indicator
    let health_tx = events.tx.clone();
    let health_client = ReportClient::new(&config.api);
    let poll_interval = Duration::from_secs(config.api.health_poll_seconds.max(1));
    tokio::spawn(async move {
        loop {
            let online = health_client.health().await;
            if health_tx.send(Event::Health(online)).is_err() {
                break;
            }
            tokio::time::sleep(poll_interval).await;
        }
    });

    // One submitter blueprint; cloned into a fresh task per submission
    let submitter = Submitter::new(
        ConfiguredSource::from_config(&config.location),
        Geocoder::new(&config.geocoding),
        ReportClient::new(&config.api),
        FixOptions::from(&config.location),
        events.tx.clone(),
    );

    // Main loop
    while !app.should_quit {
        terminal.draw(|f| ui::render(f, &app))?;

        if let Some(event) = events.next().await {
            match event {
                Event::Tick => app.on_tick(),
                Event::Input(key) => {
                    if let Some(Action::Submit { phone, message }) = app.handle_key(key) {
                        let task = submitter.clone();
                        tokio::spawn(async move { task.run(phone, message).await });
                    }
                }
                other => app.apply(other),
            }
        }
    }

    restore_terminal(terminal)?;
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::cursor::Hide
    )?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    Ok(())
}

fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Force terminal cleanup!
        crossterm::terminal::disable_raw_mode().ok();
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show
        )
        .ok();
        original_hook(panic_info);
    }));
}
