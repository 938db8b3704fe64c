use anyhow::{Context, Result};
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use registry_code::{FormField, InputValidator, RegistryForm};
use std::io;

pub struct App {
    pub form: RegistryForm,
}

impl App {
    pub fn new(reset_birth_date: NaiveDate) -> Self {
        Self {
            form: RegistryForm::new(reset_birth_date),
        }
    }

    pub fn generate(&mut self) {
        // "Today" is read at the moment of the button press
        let validator = InputValidator::new();
        self.form.generate(&validator);
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app, event::read);

    // Restore terminal before reporting anything
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.context("Terminal UI failed")
}

fn run_app<B, E>(terminal: &mut Terminal<B>, app: &mut App, mut next_event: E) -> io::Result<()>
where
    B: ratatui::backend::Backend,
    E: FnMut() -> io::Result<Event>,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = next_event()? {
            if key.kind == KeyEventKind::Press && handle_key(app, key) {
                return Ok(());
            }
        }
    }
}

/// Apply one key press to the form. Returns true when the user asked to quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    // Any key closes the error popup
    if app.form.error.is_some() {
        app.form.dismiss_error();
        return false;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let chorded = key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    let on_date = app.form.focused.is_date();

    match key.code {
        KeyCode::Esc => return true,
        KeyCode::Char('c') if ctrl => return true,
        KeyCode::Char('l') if ctrl => app.form.clear(),
        KeyCode::Enter => app.generate(),
        KeyCode::Tab => app.form.focus_next(),
        KeyCode::BackTab => app.form.focus_previous(),
        KeyCode::Up if on_date => app.form.shift_birth_date(1),
        KeyCode::Down if on_date => app.form.shift_birth_date(-1),
        KeyCode::PageUp if on_date => app.form.shift_birth_date(365),
        KeyCode::PageDown if on_date => app.form.shift_birth_date(-365),
        KeyCode::Up => app.form.focus_previous(),
        KeyCode::Down => app.form.focus_next(),
        KeyCode::Backspace => app.form.backspace(),
        KeyCode::Char(c) if !chorded => app.form.input_char(c),
        _ => {}
    }

    false
}

fn ui(f: &mut Frame, app: &App) {
    let area = centered_rect(64, 20, f.size());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(7), // Form fields
            Constraint::Length(3), // Code
            Constraint::Min(0),    // Status bar
        ])
        .split(area);

    render_title(f, chunks[0]);
    render_fields(f, chunks[1], &app.form);
    render_code(f, chunks[2], &app.form);
    render_status_bar(f, chunks[3]);

    if let Some(err) = &app.form.error {
        render_error(f, area, err);
    }
}

fn render_title(f: &mut Frame, area: Rect) {
    let title = Paragraph::new(Line::from(Span::styled(
        "ENTER STUDENT DETAILS",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(title, area);
}

fn render_fields(f: &mut Frame, area: Rect, form: &RegistryForm) {
    let lines: Vec<Line> = FormField::ALL
        .iter()
        .map(|field| {
            let focused = *field == form.focused;
            let marker = if focused { "→ " } else { "  " };
            let label_style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let mut value = form.value(*field);
            if focused && !field.is_date() {
                value.push('▏');
            }
            let value_style = if field.is_date() {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };

            Line::from(vec![
                Span::styled(marker, label_style),
                Span::styled(format!("{:<14}", format!("{}:", field.label())), label_style),
                Span::styled(value, value_style),
            ])
        })
        .collect();

    let fields = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Student "),
    );

    f.render_widget(fields, area);
}

fn render_code(f: &mut Frame, area: Rect, form: &RegistryForm) {
    let line = Line::from(vec![
        Span::styled("REGISTRY CODE: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(
            form.code_display.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    ]);

    let code = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Yellow)));

    f.render_widget(code, area);
}

fn render_status_bar(f: &mut Frame, area: Rect) {
    let status_spans = vec![
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Generate | "),
        Span::styled("Ctrl-L", Style::default().fg(Color::Yellow)),
        Span::raw(" Clear | "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Field | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Date | "),
        Span::styled("Esc", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let popup = centered_rect(48, 5, area);

    let error = Paragraph::new(vec![
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::White))),
        Line::from(Span::styled(
            "Press any key",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Error "),
    );

    f.render_widget(Clear, popup);
    f.render_widget(error, popup);
}

/// Fixed-size rect centered in `area`, clipped to it
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
