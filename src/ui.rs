use crate::app::{apply_effects, Effect};
use crate::form_value::{self, SharedFormValues};
use crate::model::Catalog;
use crate::widgets::asset_select::AssetSelectWidget;
use crate::widgets::params::ParamsEditor;
use crate::widgets::params_widget::ParamsWidget;
use crate::widgets::snapshot::SnapshotWidget;
use crate::widgets::status_bar::draw_footer;
use crate::widgets::Widget;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use std::rc::Rc;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Publish,
    Assets,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishPane {
    Editor,
    Preview,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub text: String,
    pub level: ToastLevel,
    pub until_tick: u64,
}

pub struct AppState {
    pub screen: Screen,
    pub publish_focus: PublishPane,
    pub params: ParamsWidget,
    pub preview: SnapshotWidget,
    pub assets: AssetSelectWidget,
    pub form_values: SharedFormValues,
    pub toast: Option<Toast>,
    pub tick: u64,
    pub last_live_json: String,
    pub showing_submission: bool,
    pub should_quit: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Catalog::default())
    }
}

impl AppState {
    pub fn new(catalog: Catalog) -> Self {
        let form_values = form_value::shared();
        let sink_store = Rc::clone(&form_values);
        let editor = ParamsEditor::with_sink(Box::new(move |params| {
            let value = serde_json::to_value(params).unwrap_or(serde_json::Value::Null);
            sink_store.borrow_mut().set("parameters", value);
        }));
        let mut preview = SnapshotWidget::new("Form value");
        preview.show("Form value", &serde_json::json!({}));
        Self {
            screen: Screen::Publish,
            publish_focus: PublishPane::Editor,
            params: ParamsWidget::new(editor),
            preview,
            assets: AssetSelectWidget::new("Assets — algorithms", catalog.assets, false),
            form_values,
            toast: None,
            tick: 0,
            last_live_json: String::new(),
            showing_submission: false,
            should_quit: false,
        }
    }

    pub fn show_toast(&mut self, text: String, level: ToastLevel, seconds: u64) {
        // 5 ticks per second at the 200 ms tick rate.
        self.toast = Some(Toast {
            text,
            level,
            until_tick: self.tick + seconds * 5,
        });
    }

    pub fn is_typing(&self) -> bool {
        match self.screen {
            Screen::Publish => self.params.editing,
            Screen::Assets => self.assets.searching,
        }
    }

    /// Keep the preview pane in sync with the form-value store. A fresh
    /// submission view stays up until the next content mutation.
    fn refresh_preview(&mut self) {
        let live = serde_json::to_string_pretty(&self.form_values.borrow().to_json())
            .unwrap_or_default();
        if live != self.last_live_json {
            self.last_live_json = live.clone();
            self.preview.title = "Form value".into();
            self.preview.text = live;
            self.showing_submission = false;
        }
    }
}

pub fn run() -> Result<()> {
    let (catalog, load_err) = match crate::services::catalog::load_default() {
        Ok(c) => (c, None),
        Err(e) => (Catalog::default(), Some(format!("{e:#}"))),
    };
    let mut state = AppState::new(catalog);
    if let Some(err) = load_err {
        state.show_toast(format!("Catalog: {err}"), ToastLevel::Error, 5);
    }

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();
    let res: Result<()> = loop {
        state.refresh_preview();
        terminal.draw(|f| draw_ui(f, &mut state))?;
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut state, key);
            }
        }
        if last_tick.elapsed() >= tick_rate {
            state.tick = state.tick.wrapping_add(1);
            if let Some(t) = &state.toast {
                if state.tick >= t.until_tick {
                    state.toast = None;
                }
            }
            last_tick = Instant::now();
        }
        if state.should_quit {
            break Ok(());
        }
    };
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

pub(crate) fn handle_key(state: &mut AppState, key: event::KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c')) {
        state.should_quit = true;
        return;
    }
    // Ctrl+S saves the description overlay when one is open, and submits
    // the draft otherwise.
    if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('s')) {
        if state.screen == Screen::Publish && state.params.overlay_active() {
            let _ = state.params.commit_description();
        } else {
            apply_effects(state, vec![Effect::SubmitDraft]);
        }
        return;
    }
    let typing = state.is_typing();
    match key.code {
        KeyCode::Char('q') if !typing => {
            state.should_quit = true;
            return;
        }
        KeyCode::F(1) => {
            state.screen = Screen::Publish;
            return;
        }
        KeyCode::F(2) => {
            state.screen = Screen::Assets;
            return;
        }
        KeyCode::Tab if state.screen == Screen::Publish && !typing => {
            state.publish_focus = match state.publish_focus {
                PublishPane::Editor => PublishPane::Preview,
                PublishPane::Preview => PublishPane::Editor,
            };
            return;
        }
        _ => {}
    }
    let effects = match state.screen {
        Screen::Publish => match state.publish_focus {
            PublishPane::Editor => state.params.on_key(key.code),
            PublishPane::Preview => state.preview.on_key(key.code),
        },
        Screen::Assets => state.assets.on_key(key.code),
    };
    apply_effects(state, effects);
}

fn draw_ui(f: &mut Frame, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());
    draw_tabs(f, chunks[0], state);
    match state.screen {
        Screen::Publish => {
            let panes = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(chunks[1]);
            let editor_focus = matches!(state.publish_focus, PublishPane::Editor);
            state.params.render(f, panes[0], editor_focus, state.tick);
            state.preview.render(f, panes[1], !editor_focus, state.tick);
        }
        Screen::Assets => state.assets.render(f, chunks[1], true, state.tick),
    }
    let help = match (state.screen, state.is_typing()) {
        (Screen::Publish, true) => "Esc done • Ctrl+S save description",
        (Screen::Publish, false) => {
            "↑↓ move • Enter edit/apply • Tab pane • Ctrl+S submit • F2 assets • q quit"
        }
        (Screen::Assets, true) => "type to filter • Esc done",
        (Screen::Assets, false) => "↑↓ move • Enter select • / search • F1 publish • q quit",
    };
    draw_footer(f, chunks[2], state, help);
}

fn draw_tabs(f: &mut Frame, area: Rect, state: &AppState) {
    let tab = |label: &str, active: bool| {
        if active {
            Span::styled(label.to_string(), crate::theme::text_active_bold())
        } else {
            Span::styled(label.to_string(), crate::theme::text_muted())
        }
    };
    let line = Line::from(vec![
        tab(" Publish [F1] ", state.screen == Screen::Publish),
        Span::raw(" "),
        tab(" Assets [F2] ", state.screen == Screen::Assets),
    ]);
    f.render_widget(ratatui::widgets::Paragraph::new(line), area);
}
