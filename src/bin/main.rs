use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use profit_core::config::{parse_delimiter, Config};
use profit_core::{logging, Bucket, PredictionResult, SelectionState, SelectorPredictor};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Interactive menu profit form.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Reference table (overrides PROFIT_TABLE)
    #[arg(long)]
    table: Option<PathBuf>,

    /// Model artifact bundle, .json or bincode (overrides PROFIT_ARTIFACTS)
    #[arg(long)]
    artifacts: Option<PathBuf>,

    /// Single-byte table delimiter (overrides PROFIT_DELIMITER)
    #[arg(long)]
    delimiter: Option<String>,

    /// Log file (overrides PROFIT_LOG)
    #[arg(long)]
    log: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Restaurant,
    Category,
    Item,
    Predict,
}

impl Focus {
    const ORDER: [Focus; 4] = [Focus::Restaurant, Focus::Category, Focus::Item, Focus::Predict];

    fn step(self, delta: isize) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
        let n = Self::ORDER.len() as isize;
        Self::ORDER[(i + delta).rem_euclid(n) as usize]
    }
}

enum Message {
    Prediction(PredictionResult),
    Incomplete(String),
    Failure(String),
}

struct Form<'a> {
    engine: &'a SelectorPredictor,
    state: SelectionState,
    focus: Focus,
    message: Option<Message>,
}

impl<'a> Form<'a> {
    fn new(engine: &'a SelectorPredictor) -> Self {
        Self {
            engine,
            state: SelectionState::new(),
            focus: Focus::Restaurant,
            message: None,
        }
    }

    /// Options for a dropdown, without the placeholder entry.
    fn options(&self, focus: Focus) -> Vec<String> {
        let state = &self.state;
        match focus {
            Focus::Restaurant => self.engine.list_restaurants().to_vec(),
            Focus::Category => state
                .restaurant_id()
                .map(|r| self.engine.list_categories(r))
                .unwrap_or_default()
                .into_iter()
                .map(String::from)
                .collect(),
            Focus::Item => match (state.restaurant_id(), state.menu_category()) {
                (Some(r), Some(c)) => self.engine.list_items(r, c).into_iter().map(String::from).collect(),
                _ => Vec::new(),
            },
            Focus::Predict => Vec::new(),
        }
    }

    fn current(&self, focus: Focus) -> Option<&str> {
        match focus {
            Focus::Restaurant => self.state.restaurant_id(),
            Focus::Category => self.state.menu_category(),
            Focus::Item => self.state.menu_item(),
            Focus::Predict => None,
        }
    }

    /// Moves the focused dropdown by `delta`, wrapping through the
    /// placeholder at position 0.
    fn cycle(&mut self, delta: isize) {
        if self.focus == Focus::Predict {
            return;
        }
        let options = self.options(self.focus);
        if options.is_empty() {
            return;
        }
        let current = self
            .current(self.focus)
            .and_then(|v| options.iter().position(|o| o == v))
            .map_or(0, |i| i + 1);
        let next = cycle_index(options.len() + 1, current, delta);
        let value = if next == 0 { "" } else { options[next - 1].as_str() };
        self.choose(value);
    }

    fn choose(&mut self, value: &str) {
        self.message = None;
        match self.focus {
            Focus::Restaurant => self.state.select_restaurant(value),
            Focus::Category => {
                if let Err(e) = self.state.select_category(value) {
                    self.message = Some(Message::Incomplete(e.to_string()));
                }
            }
            Focus::Item => {
                if let Err(e) = self.state.select_item(self.engine, value) {
                    error!("Item selection failed: {e}");
                    self.message = Some(Message::Failure(e.to_string()));
                }
            }
            Focus::Predict => {}
        }
    }

    fn clear_focused(&mut self) {
        self.message = None;
        match self.focus {
            Focus::Restaurant => self.state.clear_restaurant(),
            Focus::Category => self.state.clear_category(),
            Focus::Item => self.state.clear_item(),
            Focus::Predict => {}
        }
    }

    fn predict(&mut self) {
        self.message = Some(match self.state.request() {
            Err(incomplete) => {
                info!("Prediction refused: {incomplete}");
                Message::Incomplete(incomplete.to_string())
            }
            Ok(request) => match request.run(self.engine) {
                Ok(result) => {
                    info!("{} / {} / {} -> {}", request.restaurant_id, request.menu_category, request.menu_item, result.label);
                    Message::Prediction(result)
                }
                Err(e) => {
                    error!("Prediction failed: {e}");
                    Message::Failure(format!("Prediction failed: {e}"))
                }
            },
        });
    }

    /// Returns false once the user asks to quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
            KeyCode::Up | KeyCode::BackTab => self.focus = self.focus.step(-1),
            KeyCode::Down | KeyCode::Tab => self.focus = self.focus.step(1),
            KeyCode::Left => self.cycle(-1),
            KeyCode::Right => self.cycle(1),
            KeyCode::Backspace | KeyCode::Delete => self.clear_focused(),
            KeyCode::Enter => {
                if self.focus == Focus::Predict {
                    self.predict();
                } else {
                    self.focus = self.focus.step(1);
                }
            }
            _ => {}
        }
        true
    }

    fn render(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(
            out,
            terminal::Clear(ClearType::All),
            cursor::MoveTo(2, 1),
            SetAttribute(Attribute::Bold),
            SetForegroundColor(Color::Blue),
            Print("Menu Profit Prediction"),
            ResetColor,
            SetAttribute(Attribute::Reset),
        )?;

        let mut row = 3;
        for (focus, label, placeholder) in [
            (Focus::Restaurant, "Restaurant ID", "Choose restaurant ID"),
            (Focus::Category, "Menu Category", "Choose menu category"),
            (Focus::Item, "Menu Item", "Choose menu item"),
        ] {
            let marker = if self.focus == focus { ">" } else { " " };
            let value = self.current(focus).unwrap_or(placeholder);
            let color = if self.current(focus).is_some() { Color::White } else { Color::DarkGrey };
            queue!(
                out,
                cursor::MoveTo(2, row),
                Print(format!("{marker} {label:<15}")),
                SetForegroundColor(color),
                Print(format!("< {value} >")),
                ResetColor,
            )?;
            row += 1;
        }

        let ingredients = self.state.ingredients().unwrap_or("-");
        let price = self.state.price().map_or("-".to_string(), |p| p.to_string());
        queue!(
            out,
            cursor::MoveTo(2, row),
            Print(format!("  {:<15}{ingredients}", "Ingredients")),
            cursor::MoveTo(2, row + 1),
            Print(format!("  {:<15}{price}", "Price")),
            cursor::MoveTo(2, row + 3),
        )?;

        if self.focus == Focus::Predict {
            queue!(out, SetAttribute(Attribute::Reverse), Print("> [ Predict ]"), SetAttribute(Attribute::Reset))?;
        } else {
            queue!(out, Print("  [ Predict ]"))?;
        }

        queue!(out, cursor::MoveTo(2, row + 5))?;
        match &self.message {
            Some(Message::Prediction(result)) => {
                let color = match result.bucket {
                    Bucket::High => Color::Green,
                    Bucket::Medium => Color::Yellow,
                    Bucket::Low => Color::Red,
                };
                queue!(
                    out,
                    SetForegroundColor(color),
                    SetAttribute(Attribute::Bold),
                    Print(format!("{} ({})", result.label, result.bucket)),
                    SetAttribute(Attribute::Reset),
                    ResetColor,
                )?;
            }
            Some(Message::Incomplete(text)) | Some(Message::Failure(text)) => {
                queue!(out, SetForegroundColor(Color::Red), Print(text), ResetColor)?;
            }
            None => {}
        }

        queue!(
            out,
            cursor::MoveTo(2, row + 7),
            SetForegroundColor(Color::DarkGrey),
            Print("Up/Down: field  Left/Right: choose  Backspace: clear  Enter: predict  q: quit"),
            ResetColor,
        )?;
        out.flush()
    }
}

/// Wraps `current + delta` into `0..len`.
fn cycle_index(len: usize, current: usize, delta: isize) -> usize {
    (current as isize + delta).rem_euclid(len as isize) as usize
}

/// Raw mode + alternate screen for the lifetime of the guard.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn resolve_config(args: Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if let Some(table) = args.table {
        config.table_path = table;
    }
    if let Some(artifacts) = args.artifacts {
        config.artifacts_path = artifacts;
    }
    if let Some(delimiter) = args.delimiter {
        config.delimiter = parse_delimiter(&delimiter)?;
    }
    if let Some(log) = args.log {
        config.log_path = log;
    }
    Ok(config)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(Args::parse())?;
    logging::init_file_logging(&config.log_path)?;
    info!("--- Menu profit form starting ---");

    let engine = SelectorPredictor::load(&config.table_path, &config.artifacts_path, config.delimiter)?;
    if engine.list_restaurants().is_empty() {
        warn!("Reference table {} has no rows", config.table_path.display());
    }

    let mut form = Form::new(&engine);
    let _guard = TerminalGuard::enter()?;
    let mut stdout = io::stdout();

    loop {
        form.render(&mut stdout)?;
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && !form.handle_key(key) {
                break;
            }
        }
    }

    info!("Shutting down.");
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("profit_form: {e}");
            ExitCode::FAILURE
        }
    }
}
