use anyhow::Result;
use clinic_map::{
    dates::{format_date, from_input_date},
    filter::{parse_recent_n, RECENT_PRESETS},
    scene::ListEntry,
    Dashboard, DragOutcome, LabelEdit, Notice, Region, UploadMode, SETTINGS_FILE_NAME,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

/// Pixels per keyboard nudge
const NUDGE: f64 = 2.0;
const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Clinics,
    Regions,
    Filters,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Clinics => Page::Regions,
            Page::Regions => Page::Filters,
            Page::Filters => Page::Clinics,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Clinics => Page::Filters,
            Page::Regions => Page::Clinics,
            Page::Filters => Page::Regions,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Clinics => "Clinics",
            Page::Regions => "Regions",
            Page::Filters => "Filters",
        }
    }
}

/// Text field currently being typed into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Search,
    DisplayName,
    DateFrom,
    DateTo,
    RecentN,
    UploadCsv,
    ExportPath,
    ImportPath,
}

impl InputMode {
    fn prompt(&self) -> &str {
        match self {
            InputMode::Search => "Search",
            InputMode::DisplayName => "Label text (\\n for new line)",
            InputMode::DateFrom => "From (YYYY-MM-DD, empty clears)",
            InputMode::DateTo => "To (YYYY-MM-DD, empty clears)",
            InputMode::RecentN => "Most recent N (empty clears)",
            InputMode::UploadCsv => "CSV path",
            InputMode::ExportPath => "Export settings to",
            InputMode::ImportPath => "Import settings from",
        }
    }
}

pub struct App {
    pub dashboard: Dashboard,
    pub rows: Vec<ListEntry>,
    pub state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    pub input: Option<InputMode>,
    pub buffer: String,
    pub message: Option<String>,
}

impl App {
    pub fn new(dashboard: Dashboard) -> Self {
        let mut app = Self {
            dashboard,
            rows: Vec::new(),
            state: TableState::default(),
            current_page: Page::Clinics,
            show_detail: true,
            input: None,
            buffer: String::new(),
            message: None,
        };
        app.refresh();
        app
    }

    /// Rebuild the flat row list and keep the cursor in range
    pub fn refresh(&mut self) {
        self.rows = self
            .dashboard
            .list()
            .into_iter()
            .flat_map(|(_, entries)| entries)
            .collect();

        let selected = match self.state.selected() {
            _ if self.rows.is_empty() => None,
            Some(i) => Some(i.min(self.rows.len() - 1)),
            None => Some(0),
        };
        self.state.select(selected);
    }

    pub fn current_name(&self) -> Option<String> {
        self.state
            .selected()
            .and_then(|i| self.rows.get(i))
            .map(|row| row.identity.clone())
    }

    pub fn next(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Move the current label by (dx, dy) through a drag session so the
    /// move is committed as a single offset write.
    pub fn nudge(&mut self, dx: f64, dy: f64) {
        let Some(name) = self.current_name() else {
            return;
        };
        self.dashboard.begin_drag(&name);
        self.dashboard.drag_by(dx, dy);
        if let DragOutcome::Commit { x, y, .. } = self.dashboard.end_drag() {
            self.message = Some(format!("{}: offset ({:.0}, {:.0})", name, x, y));
        }
    }

    pub fn cycle_recent_preset(&mut self) {
        let current = self.dashboard.filter().recent_n;
        let next = match current.and_then(|n| RECENT_PRESETS.iter().position(|p| *p == n)) {
            Some(i) if i + 1 < RECENT_PRESETS.len() => Some(RECENT_PRESETS[i + 1]),
            Some(_) => None,
            None if current.is_some() => None,
            None => Some(RECENT_PRESETS[0]),
        };
        self.dashboard.set_recent_n(next);
    }

    pub fn toggle_upload_mode(&mut self) {
        let mode = match self.dashboard.upload_mode() {
            UploadMode::Replace => UploadMode::Append,
            UploadMode::Append => UploadMode::Replace,
        };
        self.dashboard.set_upload_mode(mode);
        self.message = Some(format!("Upload mode: {}", mode.as_str()));
    }

    fn start_input(&mut self, mode: InputMode) {
        self.buffer = match mode {
            InputMode::Search => self.dashboard.search_query().to_string(),
            InputMode::DisplayName => self
                .current_name()
                .map(|name| {
                    self.dashboard
                        .settings()
                        .display_text_for(&name)
                        .replace('\n', "\\n")
                })
                .unwrap_or_default(),
            InputMode::ExportPath | InputMode::ImportPath => SETTINGS_FILE_NAME.to_string(),
            _ => String::new(),
        };
        self.input = Some(mode);
    }

    fn submit_input(&mut self, mode: InputMode) {
        let text = std::mem::take(&mut self.buffer);
        let trimmed = text.trim();

        match mode {
            InputMode::Search => self.dashboard.set_search(&text),
            InputMode::DisplayName => {
                if let Some(name) = self.current_name() {
                    let edit = LabelEdit::DisplayName(text.replace("\\n", "\n"));
                    self.dashboard.handle_label_change(&name, &edit);
                }
            }
            InputMode::DateFrom => self.dashboard.set_date_from(from_input_date(trimmed)),
            InputMode::DateTo => self.dashboard.set_date_to(from_input_date(trimmed)),
            InputMode::RecentN => self.dashboard.set_recent_n(parse_recent_n(trimmed)),
            InputMode::UploadCsv => match std::fs::read_to_string(trimmed) {
                Ok(csv) => {
                    self.dashboard.upload_csv(&csv);
                }
                Err(e) => self.message = Some(format!("Cannot read {}: {}", trimmed, e)),
            },
            InputMode::ExportPath => match self.dashboard.export_settings() {
                Some(json) => match std::fs::write(trimmed, json) {
                    Ok(()) => self.message = Some(format!("Settings exported to {}", trimmed)),
                    Err(e) => self.message = Some(format!("Export failed: {}", e)),
                },
                None => self.message = Some("Export failed".to_string()),
            },
            InputMode::ImportPath => match std::fs::read_to_string(trimmed) {
                Ok(json) => {
                    self.dashboard.import_settings(&json);
                }
                Err(e) => self.message = Some(format!("Cannot read {}: {}", trimmed, e)),
            },
        }
    }

    fn collect_notices(&mut self) {
        if let Some(notice) = self.dashboard.take_notices().pop() {
            self.message = Some(match notice {
                Notice::SettingsImported => "Settings imported".to_string(),
                Notice::SettingsRejected { reason } => format!("Import rejected: {}", reason),
                Notice::ClinicsLoaded { added, total } => {
                    format!("Loaded {} clinics ({} total)", added, total)
                }
                Notice::CsvEmpty => "No clinics found in CSV".to_string(),
            });
        }
    }

    /// Apply one key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if let Some(mode) = self.input {
            match key.code {
                KeyCode::Esc => {
                    self.input = None;
                    self.buffer.clear();
                }
                KeyCode::Enter => {
                    self.input = None;
                    self.submit_input(mode);
                }
                KeyCode::Backspace => {
                    self.buffer.pop();
                }
                KeyCode::Char(c) => self.buffer.push(c),
                _ => {}
            }
            self.after_action();
            return false;
        }

        let current = self.current_name();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.current_page = self.current_page.previous();
                } else {
                    self.current_page = self.current_page.next();
                }
            }
            KeyCode::BackTab => self.current_page = self.current_page.previous(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Home => self.state.select(Some(0)),
            KeyCode::Enter => {
                if let Some(name) = current {
                    self.dashboard.begin_drag(&name);
                    self.dashboard.end_drag();
                }
            }
            KeyCode::Char('d') => self.show_detail = !self.show_detail,
            KeyCode::Left | KeyCode::Char('h') => self.nudge(-NUDGE, 0.0),
            KeyCode::Right | KeyCode::Char('l') => self.nudge(NUDGE, 0.0),
            KeyCode::Char('K') => self.nudge(0.0, -NUDGE),
            KeyCode::Char('J') => self.nudge(0.0, NUDGE),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                if let Some(name) = current {
                    self.dashboard.step_font_size(&name, true);
                }
            }
            KeyCode::Char('-') => {
                if let Some(name) = current {
                    self.dashboard.step_font_size(&name, false);
                }
            }
            KeyCode::Char('>') => {
                self.dashboard.step_global_font_size(true);
            }
            KeyCode::Char('<') => {
                self.dashboard.step_global_font_size(false);
            }
            KeyCode::Char('r') => {
                if let Some(name) = current {
                    self.dashboard.reset_label(&name);
                    self.message = Some(format!("{}: label reset", name));
                }
            }
            KeyCode::Char('R') => {
                self.dashboard.reset_everything();
                self.message = Some("Everything reset to defaults".to_string());
            }
            KeyCode::Char('p') => self.cycle_recent_preset(),
            KeyCode::Char('c') => self.dashboard.clear_filters(),
            KeyCode::Char('m') => self.toggle_upload_mode(),
            KeyCode::Char('/') => self.start_input(InputMode::Search),
            KeyCode::Char('n') => self.start_input(InputMode::DisplayName),
            KeyCode::Char('f') => self.start_input(InputMode::DateFrom),
            KeyCode::Char('t') => self.start_input(InputMode::DateTo),
            KeyCode::Char('N') => self.start_input(InputMode::RecentN),
            KeyCode::Char('u') => self.start_input(InputMode::UploadCsv),
            KeyCode::Char('e') => self.start_input(InputMode::ExportPath),
            KeyCode::Char('i') => self.start_input(InputMode::ImportPath),
            _ => {}
        }
        self.after_action();
        false
    }

    fn after_action(&mut self) {
        self.collect_notices();
        self.refresh();
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
    let res = run_app(&mut terminal, app);

    // Pending label edits land before we exit
    app.dashboard.flush();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if app.handle_key(key) {
                    return Ok(());
                }
            }
        }

        app.dashboard.tick(Instant::now());
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar / input line
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Clinics if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
                .split(chunks[1]);

            render_table(f, content_chunks[0], app);
            render_detail_panel(f, content_chunks[1], app);
        }
        Page::Clinics => render_table(f, chunks[1], app),
        Page::Regions => render_regions(f, chunks[1], app),
        Page::Filters => render_filters(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn key_style() -> Style {
    Style::default().fg(Color::Yellow)
}

/// "#rrggbb" → terminal colour
fn hex_color(hex: &str) -> Color {
    let hex = hex.trim_start_matches('#');
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .unwrap_or(255)
    };
    Color::Rgb(channel(0), channel(2), channel(4))
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.dashboard.stats();

    let mut spans = vec![];
    for (i, page) in [Page::Clinics, Page::Regions, Page::Filters].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title().to_string(), style));
    }

    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Total: {}", stats.total),
        Style::default().fg(Color::White),
    ));
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("Mapped: {}", stats.mapped),
        Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        format!("Labeled: {}", stats.labeled),
        Style::default().fg(Color::Green),
    ));
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Font: {}px", app.dashboard.settings().global_font_size),
        Style::default().fg(Color::Magenta),
    ));

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" VA Clinic Map "),
    );
    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["", "Clinic", "City", "ST", "Region", "Opened", "Offset", "Size"]
        .iter()
        .map(|h| Cell::from(*h).style(key_style().add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let settings = app.dashboard.settings();
    let clinics = app.dashboard.clinics();
    let rows = app.rows.iter().map(|row| {
        let marker = match (row.is_mapped, row.is_labeled) {
            (false, _) => Span::styled("·", Style::default().fg(Color::DarkGray)),
            (true, true) => Span::styled("●", Style::default().fg(Color::Green)),
            (true, false) => Span::styled("○", Style::default().fg(Color::White)),
        };
        let opened = clinics
            .iter()
            .find(|c| c.name == row.identity)
            .map(|c| c.opening_date().map(format_date).unwrap_or_else(|| c.date.clone()))
            .unwrap_or_default();
        let (x, y) = settings.offset_for(&row.identity);
        let name_style = if row.is_selected {
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default()
        };

        Row::new(vec![
            Cell::from(Line::from(marker)),
            Cell::from(truncate(&row.identity, 36)).style(name_style),
            Cell::from(truncate(&row.city, 16)),
            Cell::from(row.state.clone()),
            Cell::from(row.region.as_str()).style(Style::default().fg(hex_color(row.region.color()))),
            Cell::from(opened),
            Cell::from(format!("{:.0},{:.0}", x, y)),
            Cell::from(format!("{}", settings.font_size_for(&row.identity))),
        ])
        .height(1)
    });

    let title = if app.dashboard.search_query().is_empty() {
        " Clinics ".to_string()
    } else {
        format!(" Clinics matching \"{}\" ", app.dashboard.search_query())
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(1),
            Constraint::Length(38),
            Constraint::Length(17),
            Constraint::Length(3),
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Length(9),
            Constraint::Length(5),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let Some(name) = app.current_name() else {
        let empty = Paragraph::new("No clinic").block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Label "),
        );
        f.render_widget(empty, area);
        return;
    };

    let settings = app.dashboard.settings();
    let clinic = app.dashboard.clinics().iter().find(|c| c.name == name);
    let (x, y) = settings.offset_for(&name);
    let label = Style::default().fg(Color::Cyan);

    let mut lines = vec![
        Line::from(Span::styled(
            name.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if let Some(clinic) = clinic {
        lines.push(Line::from(vec![
            Span::styled("Location: ", label),
            Span::raw(format!("{}, {}", clinic.city, clinic.state)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Coords:   ", label),
            Span::raw(match clinic.coordinate() {
                Some((lat, lon)) => format!("{:.4}, {:.4}", lat, lon),
                None => "not mapped".to_string(),
            }),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Opened:   ", label),
            Span::raw(clinic.date.clone()),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Label text:", label)));
    for text in settings.display_text_for(&name).split('\n') {
        lines.push(Line::from(format!("  {}", text.to_uppercase())));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Offset:   ", label),
        Span::raw(format!("x {:.0}  y {:.0}", x, y)),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Font:     ", label),
        Span::raw(format!("{}px", settings.font_size_for(&name))),
    ]));
    if settings.has_override(&name) {
        lines.push(Line::from(Span::styled(
            "customized",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::ITALIC),
        )));
    }

    lines.push(Line::from(""));
    for (keys, action) in [
        ("h/l J/K", "nudge"),
        ("+/-", "font size"),
        ("n", "edit text"),
        ("r", "reset label"),
        ("Enter", "select"),
    ] {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<8}", keys), key_style()),
            Span::raw(action),
        ]));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Label "),
    );
    f.render_widget(panel, area);
}

fn render_regions(f: &mut Frame, area: Rect, app: &App) {
    let counts = app.dashboard.region_counts();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length((counts.len() + 3) as u16)])
        .split(area);

    let data: Vec<(&str, u64)> = counts
        .iter()
        .map(|(region, count)| (region.as_str(), *count as u64))
        .collect();
    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Clinics by Region "),
        )
        .data(data.as_slice())
        .bar_width(10)
        .bar_gap(3)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(chart, chunks[0]);

    let labeled = app.dashboard.labeled_names();
    let rows = counts.iter().map(|(region, count)| {
        let shown = app
            .dashboard
            .clinics()
            .iter()
            .filter(|c| Region::from_state(&c.state) == *region && labeled.contains(&c.name))
            .count();
        Row::new(vec![
            Cell::from("■").style(Style::default().fg(hex_color(region.color()))),
            Cell::from(region.as_str()),
            Cell::from(format!("{}", count)),
            Cell::from(format!("{}", shown)),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(12),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(
        Row::new(vec!["", "Region", "Clinics", "Labeled"])
            .style(key_style().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(" Legend "));
    f.render_widget(table, chunks[1]);
}

fn render_filters(f: &mut Frame, area: Rect, app: &App) {
    let filter = app.dashboard.filter();
    let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    let show_date = |d: Option<chrono::NaiveDate>| {
        d.map(format_date).unwrap_or_else(|| "-".to_string())
    };

    let mut preset_spans = vec![Span::raw("  Presets: ")];
    for preset in RECENT_PRESETS {
        let style = if filter.recent_n == Some(preset) {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        preset_spans.push(Span::styled(format!("[{}] ", preset), style));
    }

    let stats = app.dashboard.stats();
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Label Filters",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("  From: "),
            Span::styled(show_date(filter.date_from), value),
            Span::raw("   To: "),
            Span::styled(show_date(filter.date_to), value),
        ]),
        Line::from(vec![
            Span::raw("  Most recent: "),
            Span::styled(
                filter
                    .recent_limit()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "all".to_string()),
                value,
            ),
        ]),
        Line::from(preset_spans),
        Line::from(""),
        Line::from(vec![
            Span::raw("  Showing labels for "),
            Span::styled(format!("{}", stats.labeled), Style::default().fg(Color::Green)),
            Span::raw(format!(" of {} clinics", stats.total)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::raw("  Upload mode: "),
            Span::styled(app.dashboard.upload_mode().as_str(), value),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  f", key_style()),
            Span::raw(" from  "),
            Span::styled("t", key_style()),
            Span::raw(" to  "),
            Span::styled("N", key_style()),
            Span::raw(" recent N  "),
            Span::styled("p", key_style()),
            Span::raw(" next preset  "),
            Span::styled("c", key_style()),
            Span::raw(" clear"),
        ]),
        Line::from(vec![
            Span::styled("  u", key_style()),
            Span::raw(" upload CSV  "),
            Span::styled("m", key_style()),
            Span::raw(" toggle mode  "),
            Span::styled("e", key_style()),
            Span::raw("/"),
            Span::styled("i", key_style()),
            Span::raw(" export/import settings  "),
            Span::styled("R", Style::default().fg(Color::Red)),
            Span::raw(" reset everything"),
        ]),
    ];

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let line = if let Some(mode) = app.input {
        Line::from(vec![
            Span::styled(format!(" {}: ", mode.prompt()), key_style()),
            Span::raw(app.buffer.clone()),
            Span::styled("█", Style::default().fg(Color::White)),
        ])
    } else {
        let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
        let mut spans = vec![Span::styled(
            format!(" Row: {}/{} ", selected, app.rows.len()),
            Style::default().fg(Color::Cyan),
        )];

        if let Some(message) = &app.message {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(message.clone(), Style::default().fg(Color::Green)));
        }
        if app.dashboard.has_pending_write() {
            spans.push(Span::styled(" ✎", Style::default().fg(Color::Magenta)));
        }

        spans.push(Span::raw(" | "));
        spans.push(Span::styled("/", key_style()));
        spans.push(Span::raw(" Search | "));
        spans.push(Span::styled("Tab", key_style()));
        spans.push(Span::raw(" Page | "));
        spans.push(Span::styled("</>", key_style()));
        spans.push(Span::raw(" Global font | "));
        spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        spans.push(Span::raw(" Quit"));
        Line::from(spans)
    };

    let status_bar = Paragraph::new(vec![line]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
