use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};

/// A snapshot of the pipeline after one tick, ready to draw.
pub struct RasterView {
    pub width: usize,
    pub raw: Vec<i64>,
    pub tempo: Vec<i64>,
    pub status: String,
    pub blob_count: usize,
}

type ViewGenerator = Box<dyn FnMut() -> RasterView>;

struct App {
    generator: ViewGenerator,
    view: Option<RasterView>,
}

impl App {
    fn new(generator: ViewGenerator) -> App {
        App {
            generator,
            view: None,
        }
    }

    fn on_tick(&mut self) {
        self.view = Some((self.generator)());
    }
}

pub fn engage_gui(generator: ViewGenerator) -> Result<(), Box<dyn Error>> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // create app and run it
    let tick_rate = Duration::from_millis(50);
    let app = App::new(generator);
    let res = run_app(&mut terminal, app, tick_rate);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    tick_rate: Duration,
) -> io::Result<()> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui(f, &mut app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if let KeyCode::Char('q') = key.code {
                    return Ok(());
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let Some(view) = &app.view else {
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(f.size());
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let header = Paragraph::new(Line::from(format!(
        " blobs: {}   last command: {} ",
        view.blob_count, view.status
    )))
    .block(Block::default().title("Metronome Wall").borders(Borders::ALL));
    f.render_widget(header, rows[0]);

    f.render_widget(
        raster_paragraph("Raw intensity", view.width, &view.raw),
        halves[0],
    );
    f.render_widget(
        raster_paragraph("Tempo", view.width, &view.tempo),
        halves[1],
    );
}

fn raster_paragraph<'a>(title: &'a str, width: usize, values: &[i64]) -> Paragraph<'a> {
    let lines: Vec<Line> = values
        .chunks(width)
        .map(|row| {
            let cells: Vec<String> = row.iter().map(|v| format!("{:>5}", v)).collect();
            Line::from(cells.join(" "))
        })
        .collect();
    Paragraph::new(lines)
        .style(Style::default().fg(Color::White))
        .block(Block::default().title(title).borders(Borders::ALL))
}
