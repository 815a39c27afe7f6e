use std::{
    io::{self, Stdout},
    time::Duration,
};

use anyhow::Result;
use haven_core::{
    GRID_SIZE, Position,
    map::{Grid, Tag},
    report::{Report, Verdict},
    scenario::Scenario,
};
use ratatui::{
    crossterm::{
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};

struct App<'a> {
    /// The board as the scenario lays it out, before any monster is defeated.
    board: Grid,
    reports: &'a [Report],
    should_quit: bool,
}

/// Opens the board viewer and blocks until the user quits.
pub fn show(scenario: &Scenario, reports: &[Report]) -> Result<()> {
    let mut app = App {
        board: scenario.build_grid()?,
        reports,
        should_quit: false,
    };

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    result
}

/// Switches to raw mode on the alternate screen.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Leaves raw mode and the alternate screen.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let poll_rate = Duration::from_millis(250);
    while !app.should_quit {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(poll_rate)? {
            if let Event::Key(key) = event::read()? {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    app.should_quit = true;
                }
            }
        }
    }
    Ok(())
}

fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(GRID_SIZE as u16 + 4), Constraint::Length(2)])
        .split(frame.area());

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Ratio(1, app.reports.len().max(1) as u32);
            app.reports.len().max(1)
        ])
        .split(main_layout[0]);

    for (report, area) in app.reports.iter().zip(panels.iter()) {
        render_board(frame, *area, &app.board, report);
    }

    let help_text = Paragraph::new("Press 'q' or 'Esc' to quit.")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[1]);
}

fn tag_span(tag: Tag) -> Span<'static> {
    let style = match tag {
        Tag::Empty => Style::default().fg(Color::DarkGray),
        Tag::Pursuer => Style::default().fg(Color::Cyan).bold(),
        Tag::PursuerHazard | Tag::Monster => Style::default().fg(Color::Red).bold(),
        Tag::Rock => Style::default().fg(Color::Gray),
        Tag::Goal => Style::default().fg(Color::Yellow).bold(),
        Tag::Haven => Style::default().fg(Color::Green).bold(),
        Tag::DangerZone => Style::default().fg(Color::LightRed),
    };
    Span::styled(tag.glyph().to_string(), style)
}

/// Renders one algorithm's path over the board. Agents stay visible; other
/// path cells are starred.
fn render_board(frame: &mut Frame, area: Rect, board: &Grid, report: &Report) {
    let mut lines: Vec<Line> = Vec::with_capacity(GRID_SIZE + 1);

    let mut header = vec![Span::raw(" ")];
    header.extend((0..GRID_SIZE).map(|x| Span::raw(format!(" {x}"))));
    lines.push(Line::from(header));

    for y in 0..GRID_SIZE {
        let mut spans = vec![Span::raw(y.to_string())];
        for x in 0..GRID_SIZE {
            let position = Position::new(x, y);
            let tag = board[position];
            spans.push(Span::raw(" "));
            if report.path.contains(&position) && !tag.is_agent() {
                spans.push(Span::styled("*", Style::default().fg(Color::Magenta).bold()));
            } else {
                spans.push(tag_span(tag));
            }
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::default());
    lines.push(Line::from(match (report.result, report.steps, report.elapsed_ms) {
        (Verdict::Win, Some(steps), Some(ms)) => format!("Win in {steps} steps, {ms:.2} ms"),
        (Verdict::Win, ..) => "Win".to_string(),
        (Verdict::Lose, ..) => "Lose".to_string(),
    }));

    let board_paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(report.algorithm.name())
                .borders(Borders::ALL),
        )
        .alignment(Alignment::Center);

    frame.render_widget(board_paragraph, area);
}
