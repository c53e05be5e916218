use crate::app::Effect;
use crate::widgets::chrome::panel_block;
use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::*;

/// Pretty-printed view of the value the submission pipeline would read:
/// the live form-value store, or the assembled payload right after a
/// submit. Scrolls, wraps, and copies to the clipboard.
pub struct SnapshotWidget {
    pub title: String,
    pub text: String,
    pub scroll_y: u16,
    pub wrap: bool,
    last_viewport_h: u16,
}

impl SnapshotWidget {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: String::new(),
            scroll_y: 0,
            wrap: false,
            last_viewport_h: 0,
        }
    }

    pub fn show(&mut self, title: impl Into<String>, value: &serde_json::Value) {
        self.title = title.into();
        self.text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    }
}

impl crate::widgets::Widget for SnapshotWidget {
    fn render(&mut self, f: &mut Frame, area: Rect, focused: bool, _tick: u64) {
        let lines: Vec<Line> = self.text.lines().map(|l| Line::from(l.to_string())).collect();
        self.last_viewport_h = area.height.saturating_sub(2);
        let max_scroll = (lines.len() as u16).saturating_sub(self.last_viewport_h);
        if self.scroll_y > max_scroll {
            self.scroll_y = max_scroll;
        }
        let block = panel_block(&self.title, focused);
        let p = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: !self.wrap })
            .scroll((self.scroll_y, 0));
        f.render_widget(p, area);
    }

    fn on_key(&mut self, key: KeyCode) -> Vec<Effect> {
        match key {
            KeyCode::Up => {
                if self.scroll_y > 0 {
                    self.scroll_y -= 1;
                }
            }
            KeyCode::Down => {
                self.scroll_y = self.scroll_y.saturating_add(1);
            }
            KeyCode::PageUp => {
                self.scroll_y = self.scroll_y.saturating_sub(self.last_viewport_h);
            }
            KeyCode::PageDown => {
                self.scroll_y = self.scroll_y.saturating_add(self.last_viewport_h);
            }
            KeyCode::Home => {
                self.scroll_y = 0;
            }
            KeyCode::End => {
                let total = self.text.lines().count() as u16;
                self.scroll_y = total.saturating_sub(self.last_viewport_h);
            }
            KeyCode::Char('w') | KeyCode::Char('W') => {
                self.wrap = !self.wrap;
            }
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if !self.text.is_empty() {
                    return vec![Effect::CopySnapshot {
                        text: self.text.clone(),
                    }];
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
