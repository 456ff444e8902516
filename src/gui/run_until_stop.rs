use std::{
    io::stdout,
    sync::{mpsc, Arc, Mutex},
    thread::spawn,
};

use crate::gui::error::GridGuiError;

use crossterm::{
    event::{self, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};

use ratatui::{
    prelude::*,
    widgets::{block::Title, *},
    Terminal,
};

enum ThreadMessage {
    Stop,
}

/// Runs the tick function on a worker thread until the operator presses a
/// key, showing the rolling status line the worker publishes.
///
/// The worker is a recursive fold: `init` is the starting state, `f` maps
/// state to state once per iteration and reports its status through the
/// shared line. When a key is pressed the final state is handed back, so the
/// caller can shut the hardware down cleanly.
pub fn run_until_stop<F, T>(
    title: &str,
    status: Arc<Mutex<String>>,
    init: T,
    f: F,
) -> Result<T, GridGuiError>
where
    F: Fn(T) -> T + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let (stop_tx, stop_rx) = mpsc::channel();
    let (res_tx, res_rx) = mpsc::channel();

    let th = spawn(move || {
        let mut val = init;

        loop {
            val = f(val);
            if let Ok(ThreadMessage::Stop) = stop_rx.try_recv() {
                let _ = res_tx.send(val);
                break;
            }
        }
    });

    let heading = format!(" {} ", title);
    loop {
        let last_status = status.lock().unwrap().clone();
        let block = Block::default()
            .title(Title::from(heading.clone().cyan().bold()).alignment(Alignment::Center))
            .borders(Borders::ALL);
        let text = Paragraph::new(vec![
            Line::from(last_status),
            Line::from(" Press any key to stop ".bold()),
        ]);
        terminal.draw(|frame| {
            let area = frame.size();
            frame.render_widget(text.block(block), area);
        })?;
        if event::poll(std::time::Duration::from_millis(16))? {
            if let event::Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    break;
                }
            }
        }
    }

    stop_tx.send(ThreadMessage::Stop)?;
    let res = res_rx.recv()?;
    th.join().map_err(|_| GridGuiError::Join)?;
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(res)
}
