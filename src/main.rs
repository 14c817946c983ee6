use std::{
    cmp::min,
    error::Error,
    io::{self, Stdout},
    time::Duration,
};

use canvas_plus::{
    assignments::load_feed,
    calendar::{upcoming, CalendarAggregator, MonthCursor},
    config::{Cli, Command, Config},
    database::SqliteStorage,
    dates::format_date_label,
    logging::init_logging,
    model::{AssignmentEvent, CalendarDayBucket, EventKind, MonthInfo},
    store::{MemoryStorage, MutationOutcome, TodoStorage, TodoStore},
};
use chrono::{Datelike, Local};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use ratatui::{
    prelude::{Alignment, Constraint, CrosstermBackend, Direction, Layout},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Tabs},
    Terminal,
};

type Store = TodoStore<Box<dyn TodoStorage>>;

const UPCOMING_LIMIT: usize = 20;
const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum View {
    Todo,
    Calendar,
    Upcoming,
}

impl View {
    const ALL: [View; 3] = [View::Todo, View::Calendar, View::Upcoming];

    fn title(self) -> &'static str {
        match self {
            View::Todo => "Todo",
            View::Calendar => "Calendar",
            View::Upcoming => "Upcoming",
        }
    }

    fn index(self) -> usize {
        View::ALL.iter().position(|v| *v == self).unwrap_or(0)
    }

    fn next(self) -> View {
        View::ALL[(self.index() + 1) % View::ALL.len()]
    }

    fn prev(self) -> View {
        View::ALL[(self.index() + View::ALL.len() - 1) % View::ALL.len()]
    }
}

enum AppState {
    Browse,
    Input,
}

struct State {
    pub view: View,
    pub state: AppState,
    pub input: String,
    pub todo_list_state: ListState,
    pub cursor: MonthCursor,
    pub notice: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = Config::resolve(&cli)?;
    let _logger = match init_logging(&config.log_level, &config.log_dir) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("warning: logging disabled: {err}");
            None
        }
    };

    let mut store = TodoStore::open(open_storage(&config));
    let assignments = match load_feed(&config.assignments_path) {
        Ok(assignments) => assignments,
        Err(err) => {
            warn!("event=feed_load module=main status=error error={}", err);
            vec![]
        }
    };
    let mut aggregator = CalendarAggregator::new();
    aggregator.seed(&assignments);

    if let Some(command) = cli.command {
        return run_command(command, &mut store, &assignments, &mut aggregator);
    }

    let state = State {
        view: View::Todo,
        state: AppState::Browse,
        input: "".to_string(),
        todo_list_state: ListState::default(),
        cursor: MonthCursor::default(),
        notice: None,
    };
    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, state, &mut store, &assignments, &mut aggregator);
    restore_terminal(&mut terminal)?;
    info!("event=app_exit module=main status=ok");
    result
}

fn open_storage(config: &Config) -> Box<dyn TodoStorage> {
    match SqliteStorage::open(&config.db_path) {
        Ok(storage) => Box::new(storage),
        Err(err) => {
            warn!(
                "event=storage_open module=main status=fallback backend=memory error={}",
                err
            );
            Box::new(MemoryStorage::default())
        }
    }
}

fn describe_failure(outcome: &MutationOutcome) -> Option<String> {
    match outcome {
        MutationOutcome::Unsaved(err) => Some(format!("Changes kept in memory only: {err}")),
        _ => None,
    }
}

fn run_command(
    command: Command,
    store: &mut Store,
    assignments: &[AssignmentEvent],
    aggregator: &mut CalendarAggregator,
) -> Result<(), Box<dyn Error>> {
    let outcome = match command {
        Command::List => {
            print_todos(store);
            return Ok(());
        }
        Command::Month { offset } => {
            let month = MonthCursor { offset }.month();
            print_month(month, &aggregator.month_buckets(month, assignments, store.items()));
            return Ok(());
        }
        Command::Upcoming { limit } => {
            for assignment in upcoming(assignments, Local::now().naive_local(), limit) {
                println!(
                    "{}  {}  {}",
                    format_date_label(assignment.due.as_deref().unwrap_or_default()),
                    assignment.course,
                    assignment.title
                );
            }
            return Ok(());
        }
        Command::Add { text } => store.add(&text),
        Command::Toggle { index } => store.toggle(index),
        Command::Delete { index } => store.delete(index),
    };

    if !outcome.changed() {
        eprintln!("Nothing changed.");
    }
    if let Some(notice) = describe_failure(&outcome) {
        eprintln!("{notice}");
    }
    print_todos(store);
    Ok(())
}

fn print_todos(store: &Store) {
    if store.is_empty() {
        println!("No tasks yet.");
    }
    for (idx, todo) in store.items().iter().enumerate() {
        println!(
            "{} {} {}  ({})",
            idx,
            match todo.done {
                true => "[x]",
                false => "[ ]",
            },
            todo.text,
            format_date_label(&todo.created_at)
        );
    }
}

fn print_month(month: MonthInfo, buckets: &[CalendarDayBucket]) {
    println!("{} {}", month.name(), month.year);
    for bucket in buckets {
        if bucket.events.is_empty() {
            continue;
        }
        for event in &bucket.events {
            println!(
                "{:>2}  {:<10} {}",
                bucket.day,
                match event.kind {
                    EventKind::Assignment => "assignment",
                    EventKind::Todo => "todo",
                },
                event.title
            );
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, Box<dyn Error>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    Ok(terminal.show_cursor()?)
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut state: State,
    store: &mut Store,
    assignments: &[AssignmentEvent],
    aggregator: &mut CalendarAggregator,
) -> Result<(), Box<dyn Error>> {
    Ok(loop {
        match state.view {
            View::Todo => draw_todos(terminal, store, &mut state),
            View::Calendar => {
                let month = state.cursor.month();
                let buckets = aggregator.month_buckets(month, assignments, store.items());
                draw_calendar(terminal, &state, month, &buckets);
            }
            View::Upcoming => draw_upcoming(terminal, &state, assignments, aggregator),
        };

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        let key = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => key,
            _ => continue,
        };

        match state.state {
            AppState::Input => match key.code {
                KeyCode::Char(c) => state.input.push(c),
                KeyCode::Backspace => {
                    state.input.pop();
                }
                KeyCode::Esc => {
                    state.input = "".to_string();
                    state.state = AppState::Browse;
                }
                KeyCode::Enter => {
                    let outcome = store.add(&state.input);
                    state.notice = describe_failure(&outcome);
                    if outcome.changed() {
                        state.todo_list_state.select(Some(store.len() - 1));
                    }
                    state.input = "".to_string();
                    state.state = AppState::Browse;
                }
                _ => {}
            },
            AppState::Browse => match key.code {
                KeyCode::Char('q') => break,
                KeyCode::Tab => state.view = state.view.next(),
                KeyCode::BackTab => state.view = state.view.prev(),
                KeyCode::Char('1') => state.view = View::Todo,
                KeyCode::Char('2') => state.view = View::Calendar,
                KeyCode::Char('3') => state.view = View::Upcoming,
                code => match state.view {
                    View::Todo => handle_todo_key(code, &mut state, store),
                    View::Calendar => match code {
                        KeyCode::Char('h') | KeyCode::Left => state.cursor.prev(),
                        KeyCode::Char('l') | KeyCode::Right => state.cursor.next(),
                        KeyCode::Char('t') => state.cursor.reset(),
                        _ => {}
                    },
                    View::Upcoming => {}
                },
            },
        }
    })
}

fn handle_todo_key(code: KeyCode, state: &mut State, store: &mut Store) {
    match code {
        KeyCode::Char('n') | KeyCode::Char('a') => state.state = AppState::Input,
        KeyCode::Char('j') | KeyCode::Down => todos_move_down(state, store.len()),
        KeyCode::Char('k') | KeyCode::Up => todos_move_up(state),
        KeyCode::Char(' ') | KeyCode::Char('x') | KeyCode::Enter => {
            if let Some(index) = state.todo_list_state.selected() {
                state.notice = describe_failure(&store.toggle(index));
            }
        }
        KeyCode::Char('D') => {
            if let Some(index) = state.todo_list_state.selected() {
                state.notice = describe_failure(&store.delete(index));
                state.todo_list_state.select(match store.len() {
                    0 => None,
                    len => Some(min(index, len - 1)),
                });
            }
        }
        _ => {}
    }
}

fn todos_move_up(state: &mut State) {
    match state.todo_list_state.selected() {
        Some(v) => {
            state.todo_list_state.select(Some(v.saturating_sub(1)));
        }
        None => {
            state.todo_list_state.select(Some(0));
        }
    }
}

fn todos_move_down(state: &mut State, len: usize) {
    if len == 0 {
        state.todo_list_state.select(None);
        return;
    }
    match state.todo_list_state.selected() {
        Some(v) => {
            state.todo_list_state.select(Some(min(v + 1, len - 1)));
        }
        None => {
            state.todo_list_state.select(Some(0));
        }
    }
}

/// `#RRGGBB` or `#RRGGBBAA`; anything else renders white.
fn hex_color(token: &str) -> Color {
    let opaque = match token.len() {
        9 if token.starts_with('#') => token.get(..7).unwrap_or(token),
        _ => token,
    };
    opaque.parse::<Color>().unwrap_or(Color::White)
}

fn view_tabs(state: &State) -> Tabs<'static> {
    Tabs::new(View::ALL.iter().map(|v| Line::from(v.title())).collect::<Vec<_>>())
        .block(Block::default().borders(Borders::ALL))
        .select(state.view.index())
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow))
}

fn footer(state: &State, help: &'static str) -> Paragraph<'static> {
    let line = match &state.notice {
        Some(notice) => Line::from(Span::styled(notice.clone(), Style::default().fg(Color::Red))),
        None => Line::from(help.dark_gray()),
    };
    Paragraph::new(vec![line]).alignment(Alignment::Center)
}

fn draw_todos(terminal: &mut Terminal<CrosstermBackend<Stdout>>, store: &Store, state: &mut State) {
    let todo_items: Vec<_> = store
        .items()
        .iter()
        .map(|todo| {
            let text = Span::styled(
                format!(
                    "{} {}",
                    match todo.done {
                        true => "[x]",
                        false => "[ ]",
                    },
                    todo.text.clone()
                ),
                match todo.done {
                    true => Style::default().add_modifier(Modifier::CROSSED_OUT | Modifier::DIM),
                    false => Style::default(),
                },
            );
            let date = Span::styled(
                format!("  {}", format_date_label(&todo.created_at)),
                Style::default().fg(Color::DarkGray),
            );
            ListItem::new(vec![Line::from(vec![text, date])])
        })
        .collect();

    let todo_ui = match todo_items.is_empty() {
        true => List::new(vec![ListItem::new("No tasks yet.")]),
        false => List::new(todo_items),
    }
    .block(Block::default().title("Todo").borders(Borders::ALL))
    .style(Style::default().fg(Color::White))
    .highlight_style(Style::default().add_modifier(Modifier::ITALIC))
    .highlight_symbol(">>");

    let tabs = view_tabs(state);
    let footer = footer(state, "(n) new  (space) toggle  (D) delete  (tab) switch view  (q) quit");
    let input = Paragraph::new(state.input.clone())
        .block(
            Block::default()
                .title("New task")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        )
        .style(Style::default());
    let editing = matches!(state.state, AppState::Input);

    terminal
        .draw(|frame| {
            let size = frame.size();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Min(3),
                        Constraint::Length(if editing { 3 } else { 0 }),
                        Constraint::Length(1),
                    ]
                    .as_ref(),
                )
                .split(size);

            frame.render_widget(tabs, chunks[0]);
            frame.render_stateful_widget(todo_ui, chunks[1], &mut state.todo_list_state);
            if editing {
                frame.render_widget(input, chunks[2]);
            }
            frame.render_widget(footer, chunks[3]);
        })
        .ok();
}

fn draw_calendar(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state: &State,
    month: MonthInfo,
    buckets: &[CalendarDayBucket],
) {
    let today = Local::now().date_naive();
    let is_today = |day: u32| {
        today.year() == month.year && today.month0() == month.month_index && today.day() == day
    };
    let blanks = month.leading_blank_days() as usize;
    let weeks = (blanks + buckets.len() + 6) / 7;

    let tabs = view_tabs(state);
    let footer = footer(state, "(h) previous month  (l) next month  (t) today  (q) quit");
    let header = Paragraph::new(vec![Line::from(Span::styled(
        format!("{} {}", month.name(), month.year),
        Style::default().add_modifier(Modifier::BOLD),
    ))])
    .alignment(Alignment::Center);

    terminal
        .draw(|frame| {
            let size = frame.size();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Length(1),
                        Constraint::Length(1),
                        Constraint::Min(weeks as u16 * 3),
                        Constraint::Length(1),
                    ]
                    .as_ref(),
                )
                .split(size);

            frame.render_widget(tabs, chunks[0]);
            frame.render_widget(header, chunks[1]);

            let columns = [Constraint::Ratio(1, 7); 7];
            let weekday_cells = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(columns.as_ref())
                .split(chunks[2]);
            for (i, name) in WEEKDAYS.iter().enumerate() {
                frame.render_widget(
                    Paragraph::new(*name).alignment(Alignment::Center),
                    weekday_cells[i],
                );
            }

            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints(vec![Constraint::Ratio(1, weeks.max(1) as u32); weeks.max(1)])
                .split(chunks[3]);
            for (week, row) in rows.iter().enumerate() {
                let cells = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints(columns.as_ref())
                    .split(*row);
                for (weekday, cell) in cells.iter().enumerate() {
                    let slot = week * 7 + weekday;
                    let bucket = match slot.checked_sub(blanks).and_then(|i| buckets.get(i)) {
                        Some(bucket) => bucket,
                        None => continue,
                    };
                    let lines: Vec<Line> = bucket
                        .events
                        .iter()
                        .map(|event| {
                            Line::from(Span::styled(
                                event.title.clone(),
                                Style::default().fg(hex_color(&event.accent_color)),
                            ))
                        })
                        .collect();
                    let border = match is_today(bucket.day) {
                        true => Style::default().fg(Color::Yellow),
                        false => Style::default().fg(Color::DarkGray),
                    };
                    frame.render_widget(
                        Paragraph::new(lines).block(
                            Block::default()
                                .title(bucket.day.to_string())
                                .borders(Borders::ALL)
                                .border_style(border),
                        ),
                        *cell,
                    );
                }
            }

            frame.render_widget(footer, chunks[4]);
        })
        .ok();
}

fn draw_upcoming(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state: &State,
    assignments: &[AssignmentEvent],
    aggregator: &mut CalendarAggregator,
) {
    let items: Vec<_> = upcoming(assignments, Local::now().naive_local(), UPCOMING_LIMIT)
        .into_iter()
        .map(|assignment| {
            let color = match &assignment.accent_color {
                Some(color) => hex_color(color),
                None => hex_color(aggregator.color_for(&assignment.course)),
            };
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled("▌ ", Style::default().fg(color)),
                    Span::styled(
                        assignment.title.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(Span::styled(
                    format!(
                        "  {}  {}",
                        assignment.course,
                        format_date_label(assignment.due.as_deref().unwrap_or_default())
                    ),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let list = match items.is_empty() {
        true => List::new(vec![ListItem::new("Nothing due.")]),
        false => List::new(items),
    }
    .block(Block::default().title("Upcoming").borders(Borders::ALL));

    let tabs = view_tabs(state);
    let footer = footer(state, "(tab) switch view  (q) quit");

    terminal
        .draw(|frame| {
            let size = frame.size();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Min(3),
                        Constraint::Length(1),
                    ]
                    .as_ref(),
                )
                .split(size);

            frame.render_widget(tabs, chunks[0]);
            frame.render_widget(list, chunks[1]);
            frame.render_widget(footer, chunks[2]);
        })
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_reads_rgb_and_drops_alpha() {
        assert_eq!(hex_color("#B1C5FF"), Color::Rgb(0xB1, 0xC5, 0xFF));
        assert_eq!(hex_color("#969aa4ff"), Color::Rgb(0x96, 0x9a, 0xa4));
    }

    #[test]
    fn hex_color_falls_back_to_white() {
        assert_eq!(hex_color("#12"), Color::White);
        assert_eq!(hex_color("#GGGGGG"), Color::White);
        assert_eq!(hex_color(""), Color::White);
    }
}
