mod app;
mod event;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use tracing::{info, warn};

use studydraw::config::Config;
use studydraw::engine::draw::draw;
use studydraw::engine::{AppState, DrawSource, PriorityFilter, Subject, Syllabus};
use studydraw::store::json_store::JsonStore;
use studydraw::telemetry;

use app::{App, AppScreen, NoticeKind};
use event::{AppEvent, EventHandler};
use ui::components::chapter_editor::{ChapterEditor, PendingInput};
use ui::components::confirm_dialog::ConfirmDialog;
use ui::components::draw_modal::DrawModal;
use ui::components::progress_bar::ProgressBar;
use ui::components::subject_card::SubjectCard;
use ui::layout::{DashboardLayout, pack_hint_lines};

#[derive(Parser)]
#[command(name = "studydraw", version, about = "Track syllabus progress and draw the next chapter to study")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Syllabus name (bundled, or a file in the config directory)")]
    syllabus: Option<String>,

    #[arg(long, help = "Directory holding saved progress and the log file")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print progress per subject and overall
    Status,
    /// Draw a chapter and print it without changing progress
    Draw {
        #[arg(long, help = "Draw from one subject instead of all of them")]
        subject: Option<String>,
        #[arg(short, long, default_value = "All", help = "All, High, Medium or Low")]
        filter: PriorityFilter,
    },
    /// Write the saved progress to a file
    Export { path: PathBuf },
    /// Replace the saved progress with a previously exported file
    Import { path: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("warning: ignoring unreadable config: {e:#}");
        Config::default()
    });
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(syllabus) = cli.syllabus {
        config.syllabus = syllabus;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir.to_string_lossy().to_string();
    }

    if let Err(e) = telemetry::init_tracing(&config.data_dir(), &config.log_filter) {
        eprintln!("warning: logging disabled: {e:#}");
    }

    let syllabus = resolve_syllabus(&mut config);
    let store = match JsonStore::with_base_dir(config.data_dir()) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!(error = %e, "progress will not be saved");
            eprintln!("warning: progress will not be saved: {e:#}");
            None
        }
    };
    let state = match store {
        Some(ref store) => store.load_state(&syllabus),
        None => syllabus.initial_state(),
    };
    info!(syllabus = %syllabus.name, "started");

    match cli.command {
        Some(Command::Status) => {
            print_status(&state);
            Ok(())
        }
        Some(Command::Draw { subject, filter }) => {
            let source = match subject {
                Some(name) => DrawSource::subject(Subject::new(name), filter),
                None => DrawSource::combined(filter),
            };
            let mut rng = SmallRng::from_entropy();
            let result = draw(&state, &source, &mut rng)?;
            println!(
                "{}: {} ({} priority)",
                result.subject, result.chapter.name, result.chapter.priority
            );
            Ok(())
        }
        Some(Command::Export { path }) => {
            let store = store.context("no data directory to export from")?;
            store.export_to(&state, &path)?;
            println!("Exported progress to {}", path.display());
            Ok(())
        }
        Some(Command::Import { path }) => {
            let store = store.context("no data directory to import into")?;
            let imported = store.import_from(&path, &syllabus)?;
            print_status(&imported);
            Ok(())
        }
        None => run_tui(App::new(config, syllabus, state, store)),
    }
}

/// Falls back to the default syllabus when the configured one cannot be loaded.
fn resolve_syllabus(config: &mut Config) -> Syllabus {
    if let Some(syllabus) = Syllabus::load(&config.syllabus) {
        return syllabus;
    }
    warn!(syllabus = %config.syllabus, "unknown syllabus, using the default");
    eprintln!("warning: unknown syllabus `{}`, using the default", config.syllabus);
    config.normalize_syllabus(&Syllabus::available());
    Syllabus::load(&config.syllabus).unwrap_or_default()
}

fn print_status(state: &AppState) {
    let width = state
        .subjects()
        .map(|s| s.as_str().chars().count())
        .max()
        .unwrap_or(0)
        .max("Total".len());
    for subject in state.subjects() {
        let progress = state.subject_progress(subject.as_str());
        println!(
            "{:<width$}  {:>3}/{:<3} {:>3}%",
            subject.as_str(),
            progress.done,
            progress.total,
            progress.percent
        );
    }
    let totals = state.totals();
    println!(
        "{:<width$}  {:>3}/{:<3} {:>3}%",
        "Total", totals.done, totals.total, totals.percent
    );
}

fn run_tui(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(250));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit();
        return;
    }

    // Overlays take keys before the screen underneath
    if app.confirm.is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.answer_confirm(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.answer_confirm(false),
            _ => {}
        }
        return;
    }
    if app.slot.is_revealed() {
        match key.code {
            KeyCode::Char('c') | KeyCode::Enter => app.complete_draw(),
            KeyCode::Char('r') => app.redraw(),
            KeyCode::Esc | KeyCode::Char('q') => app.dismiss_draw(),
            _ => {}
        }
        return;
    }

    match app.screen {
        AppScreen::Dashboard => handle_dashboard_key(app, key),
        AppScreen::Editor => handle_editor_key(app, key),
    }
}

fn handle_dashboard_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => app.focus_prev(),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => app.focus_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected(),
        KeyCode::Char('d') => app.draw_focused(),
        KeyCode::Char('f') => app.cycle_subject_filter(),
        KeyCode::Char('a') => app.draw_combined(),
        KeyCode::Char('F') => app.cycle_combined_filter(),
        KeyCode::Char('r') => app.request_reset(),
        KeyCode::Char('e') => app.open_editor(),
        KeyCode::Char(ch @ '1'..='9') => app.focus(ch as usize - '1' as usize),
        _ => {}
    }
}

fn handle_editor_key(app: &mut App, key: KeyEvent) {
    if app.new_chapter.is_some() {
        match key.code {
            KeyCode::Esc => app.cancel_new_chapter(),
            KeyCode::Enter => app.submit_new_chapter(),
            KeyCode::Tab => app.new_chapter_cycle_priority(),
            KeyCode::Backspace => app.new_chapter_backspace(),
            KeyCode::Char(ch) => app.new_chapter_push(ch),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.close_editor(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Char('n') | KeyCode::Char('a') => app.start_new_chapter(),
        KeyCode::Char('x') | KeyCode::Delete => app.delete_selected(),
        KeyCode::Char('R') => app.request_restore(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Dashboard => render_dashboard(frame, app),
        AppScreen::Editor => render_editor(frame, app),
    }

    if let Some(result) = app.slot.active() {
        frame.render_widget(DrawModal::new(result, app.theme), area);
    }
    if let Some(ref pending) = app.confirm {
        let message = pending.message();
        frame.render_widget(ConfirmDialog::new(&message, app.theme), area);
    }
}

fn render_dashboard(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();

    let hints = [
        "[h/l] Subject",
        "[j/k] Chapter",
        "[Space] Toggle",
        "[d] Draw",
        "[f] Filter",
        "[a] Draw all",
        "[F] Filter all",
        "[r] Reset",
        "[e] Edit",
        "[q] Quit",
    ];
    let footer = footer_lines(app, &hints, area.width);
    let layout = DashboardLayout::new(area, app.subject_count(), footer.len() as u16);

    render_header(frame, app, layout.header);

    for (i, (subject, rect)) in app.state.subjects().zip(layout.cards.iter()).enumerate() {
        let selected = (i == app.focused).then_some(app.selected);
        let card = SubjectCard::new(subject, &app.state, app.theme)
            .filter(app.filter_for(subject))
            .selected(selected);
        frame.render_widget(card, *rect);
    }

    frame.render_widget(Paragraph::new(footer), layout.footer);
}

fn render_editor(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();

    let hints: &[&str] = if app.new_chapter.is_some() {
        &["[Enter] Add", "[Tab] Priority", "[Esc] Done"]
    } else {
        &["[j/k] Select", "[n] New", "[x] Delete", "[R] Restore defaults", "[Esc] Back"]
    };
    let footer = footer_lines(app, hints, area.width);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(footer.len() as u16),
        ])
        .split(area);

    render_header(frame, app, layout[0]);

    if let Some(subject) = app.focused_subject() {
        let editor = ChapterEditor {
            subject,
            chapters: app.focused_chapters(),
            selected: app.selected,
            input: app.new_chapter.as_ref().map(|input| PendingInput {
                name: &input.name,
                priority: input.priority,
            }),
            theme: app.theme,
        };
        frame.render_widget(editor, layout[1]);
    }

    frame.render_widget(Paragraph::new(footer), layout[2]);
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let header_info = format!(
        " {} | draw all: {} | {} ",
        app.syllabus.name, app.config.combined_filter, app.theme.name
    );
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " studydraw ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            header_info,
            Style::default().fg(colors.muted()).bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, rows[0]);

    frame.render_widget(ProgressBar::new(app.state.totals(), app.theme), rows[1]);
}

/// Key hints packed to the width, preceded by the current notice if any.
fn footer_lines<'a>(app: &App, hints: &[&str], width: u16) -> Vec<Line<'a>> {
    let colors = &app.theme.colors;
    let mut lines = Vec::new();
    if let Some(ref notice) = app.notice {
        let color = match notice.kind {
            NoticeKind::Info => colors.accent(),
            NoticeKind::Warning => colors.warning(),
        };
        lines.push(Line::from(Span::styled(
            format!("  {}", notice.text),
            Style::default().fg(color),
        )));
    }
    lines.extend(
        pack_hint_lines(hints, width as usize)
            .into_iter()
            .map(|line| Line::from(Span::styled(line, Style::default().fg(colors.muted())))),
    );
    lines
}
