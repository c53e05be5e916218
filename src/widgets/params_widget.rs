use crate::model::ParamType;
use crate::widgets::chrome::panel_block;
use crate::widgets::params::{ParamsEditor, ParamsState, ScalarField};
use crossterm::event::KeyCode;
use ratatui::crossterm::event as rt_event;
use ratatui::prelude::*;
use ratatui::widgets::*;
use tui_textarea::TextArea;

/// One focusable position in the editor, in render order. The flattened
/// slot list is recomputed from state on every key and every frame, so
/// structural changes (type switches, removals) can never leave the cursor
/// pointing at a stale position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Type(usize),
    Name(usize),
    OptionKey(usize, usize),
    OptionValue(usize, usize),
    RemoveOption(usize, usize),
    /// Appends after the row's last option; carries that option's index.
    AddOption(usize, usize),
    Label(usize),
    Description(usize),
    Required(usize),
    Default(usize),
    RemoveParam(usize),
    /// Shown on the last row only; carries that row's index.
    AddParam(usize),
    /// Shown instead of everything else while the list is empty.
    AddFirst,
}

pub(crate) fn flatten_slots(state: &ParamsState) -> Vec<Slot> {
    let mut slots: Vec<Slot> = Vec::new();
    let n = state.params.len();
    for (i, p) in state.params.iter().enumerate() {
        slots.push(Slot::Type(i));
        slots.push(Slot::Name(i));
        if let Some(opts) = &p.options {
            for j in 0..opts.len() {
                slots.push(Slot::OptionKey(i, j));
                slots.push(Slot::OptionValue(i, j));
                if opts.len() > 1 {
                    slots.push(Slot::RemoveOption(i, j));
                }
            }
            slots.push(Slot::AddOption(i, opts.len() - 1));
        }
        slots.push(Slot::Label(i));
        slots.push(Slot::Description(i));
        slots.push(Slot::Required(i));
        slots.push(Slot::Default(i));
        slots.push(Slot::RemoveParam(i));
        if i + 1 == n {
            slots.push(Slot::AddParam(i));
        }
    }
    if n == 0 {
        slots.push(Slot::AddFirst);
    }
    slots
}

pub struct ParamsWidget {
    pub editor: ParamsEditor,
    pub selected: usize,
    pub editing: bool,
    pub message: Option<String>,
    desc_editor: Option<TextArea<'static>>,
    scroll_y: u16,
    last_viewport_h: u16,
}

impl Default for ParamsWidget {
    fn default() -> Self {
        Self::new(ParamsEditor::new())
    }
}

impl ParamsWidget {
    pub fn new(editor: ParamsEditor) -> Self {
        Self {
            editor,
            selected: 0,
            editing: false,
            message: None,
            desc_editor: None,
            scroll_y: 0,
            last_viewport_h: 0,
        }
    }

    pub fn overlay_active(&self) -> bool {
        self.editing && self.desc_editor.is_some()
    }

    /// Save the description overlay back into the row under the cursor.
    /// Bound to Ctrl+S in the event loop.
    pub fn commit_description(&mut self) -> bool {
        if !self.editing {
            return false;
        }
        let Some(ta) = self.desc_editor.take() else {
            return false;
        };
        self.editing = false;
        self.message = None;
        let slots = flatten_slots(&self.editor.state);
        if let Some(Slot::Description(i)) = slots.get(self.selected).copied() {
            let text = ta.lines().join("\n");
            self.editor.set_scalar(i, ScalarField::Description, &text);
            return true;
        }
        false
    }

    fn clamp_selection(&mut self) {
        let total = flatten_slots(&self.editor.state).len();
        if total > 0 && self.selected >= total {
            self.selected = total - 1;
        }
    }

    fn cycle_type(&mut self, row: usize, dir: i32) {
        const ORDER: [ParamType; 3] = [ParamType::Unset, ParamType::Text, ParamType::Select];
        let cur = self
            .editor
            .state
            .params
            .get(row)
            .map(|p| p.ptype)
            .unwrap_or_default();
        let pos = ORDER.iter().position(|t| *t == cur).unwrap_or(0);
        let next = if dir >= 0 { (pos + 1) % 3 } else { (pos + 2) % 3 };
        self.editor.set_type(row, ORDER[next]);
        self.clamp_selection();
    }

    fn slot_text(&self, slot: Slot) -> Option<String> {
        let st = &self.editor.state;
        match slot {
            Slot::Name(i) => st.params.get(i).map(|p| p.name.clone()),
            Slot::Label(i) => st.params.get(i).map(|p| p.label.clone()),
            Slot::Default(i) => st.params.get(i).map(|p| p.default_value.clone()),
            Slot::OptionKey(i, j) => st
                .params
                .get(i)
                .and_then(|p| p.options.as_ref())
                .and_then(|v| v.get(j))
                .map(|o| o.key.clone()),
            Slot::OptionValue(i, j) => st
                .params
                .get(i)
                .and_then(|p| p.options.as_ref())
                .and_then(|v| v.get(j))
                .map(|o| o.value.clone()),
            _ => None,
        }
    }

    fn apply_text(&mut self, slot: Slot, s: &str) {
        match slot {
            Slot::Name(i) => {
                self.editor.set_scalar(i, ScalarField::Name, s);
            }
            Slot::Label(i) => {
                self.editor.set_scalar(i, ScalarField::Label, s);
            }
            Slot::Default(i) => {
                self.editor.set_scalar(i, ScalarField::Default, s);
            }
            Slot::OptionKey(i, j) => {
                self.editor.rename_option_key(i, j, s);
            }
            Slot::OptionValue(i, j) => {
                self.editor.set_option_value(i, j, s);
            }
            _ => {}
        }
    }

    fn activate(&mut self, slot: Slot) {
        match slot {
            Slot::Type(i) => self.cycle_type(i, 1),
            Slot::Name(_)
            | Slot::Label(_)
            | Slot::Default(_)
            | Slot::OptionKey(_, _)
            | Slot::OptionValue(_, _) => {
                self.editing = true;
                self.message = None;
            }
            Slot::Description(i) => {
                let mut ta = TextArea::default();
                if let Some(p) = self.editor.state.params.get(i) {
                    if !p.description.is_empty() {
                        ta.insert_str(&p.description);
                    }
                }
                ta.set_block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Editing: description — Ctrl+S Save • Esc Cancel"),
                );
                self.desc_editor = Some(ta);
                self.editing = true;
                self.message = None;
            }
            Slot::Required(i) => {
                let cur = self
                    .editor
                    .state
                    .params
                    .get(i)
                    .map(|p| p.required)
                    .unwrap_or(false);
                self.editor.set_required(i, !cur);
            }
            Slot::RemoveParam(i) => {
                self.editor.remove_param(i);
                self.clamp_selection();
            }
            Slot::AddParam(i) => {
                if self.editor.add_param(Some(i)) {
                    self.message = None;
                } else {
                    self.message = Some("Complete the highlighted fields first".into());
                }
            }
            Slot::AddFirst => {
                self.editor.add_param(None);
            }
            Slot::AddOption(i, j) => {
                if self.editor.add_option(i, j) {
                    self.message = None;
                } else {
                    self.message = Some("Fill every option key first".into());
                }
            }
            Slot::RemoveOption(i, j) => {
                self.editor.remove_option(i, j);
                self.clamp_selection();
            }
        }
    }

    fn value_style(&self, cur: bool, err: bool) -> Style {
        if err {
            crate::theme::text_error()
        } else if cur && self.editing {
            crate::theme::text_editing_bold()
        } else if cur {
            crate::theme::text_active_bold()
        } else {
            Style::default()
        }
    }

    fn field_line(
        &self,
        cur: bool,
        indent: &str,
        label: &str,
        mut value: String,
        err: bool,
        editable: bool,
        cursor_on: bool,
    ) -> Line<'static> {
        let mark = if cur { '›' } else { ' ' };
        if editable && self.editing && cur && cursor_on {
            value.push('▏');
        }
        Line::from(vec![
            Span::raw(format!("{indent}{mark} {label}: ")),
            Span::styled(value, self.value_style(cur, err)),
        ])
    }

    fn button_line(&self, cur: bool, indent: &str, label: &str) -> Line<'static> {
        let mark = if cur { '›' } else { ' ' };
        let style = if cur {
            crate::theme::list_cursor_style()
        } else {
            crate::theme::text_muted()
        };
        Line::from(vec![
            Span::raw(format!("{indent}{mark} ")),
            Span::styled(format!("[ {label} ]"), style),
        ])
    }

    /// Render the whole editor into lines, returning the line index of the
    /// selected slot so the viewport can follow the cursor. Must visit
    /// slots in exactly the `flatten_slots` order.
    fn build_lines(&self, cursor_on: bool) -> (Vec<Line<'static>>, usize) {
        let st = &self.editor.state;
        let mut lines: Vec<Line<'static>> = Vec::new();
        let mut sel_line = 0usize;
        let mut si = 0usize;
        let n = st.params.len();
        let at = |si: &mut usize, line_at: usize, sel_line: &mut usize| -> bool {
            let cur = *si == self.selected;
            if cur {
                *sel_line = line_at;
            }
            *si += 1;
            cur
        };
        for (i, p) in st.params.iter().enumerate() {
            lines.push(Line::from(Span::styled(
                format!("— parameter {} —", i + 1),
                crate::theme::text_muted(),
            )));

            let cur = at(&mut si, lines.len(), &mut sel_line);
            let err = st.type_dirty(i) && p.ptype == ParamType::Unset;
            let shown = if p.ptype == ParamType::Unset {
                "(unset)".to_string()
            } else {
                p.ptype.as_str().to_string()
            };
            lines.push(self.field_line(cur, "", "type *", shown, err, false, cursor_on));

            let cur = at(&mut si, lines.len(), &mut sel_line);
            let err = st.name_dirty(i) && p.name.is_empty();
            lines.push(self.field_line(cur, "", "name *", p.name.clone(), err, true, cursor_on));

            if let Some(opts) = &p.options {
                lines.push(Line::from(Span::raw("    options *:")));
                for (j, o) in opts.iter().enumerate() {
                    let cur = at(&mut si, lines.len(), &mut sel_line);
                    let err = st.option_dirty(i, j) && o.key.is_empty();
                    lines.push(self.field_line(cur, "    ", "key", o.key.clone(), err, true, cursor_on));
                    let cur = at(&mut si, lines.len(), &mut sel_line);
                    lines.push(self.field_line(
                        cur,
                        "    ",
                        "value",
                        o.value.clone(),
                        false,
                        true,
                        cursor_on,
                    ));
                    if opts.len() > 1 {
                        let cur = at(&mut si, lines.len(), &mut sel_line);
                        lines.push(self.button_line(cur, "    ", "Remove option"));
                    }
                }
                let cur = at(&mut si, lines.len(), &mut sel_line);
                lines.push(self.button_line(cur, "    ", "Add option"));
            }

            let cur = at(&mut si, lines.len(), &mut sel_line);
            lines.push(self.field_line(cur, "", "label", p.label.clone(), false, true, cursor_on));

            let cur = at(&mut si, lines.len(), &mut sel_line);
            let mut shown = p.description.lines().next().unwrap_or("").to_string();
            if p.description.lines().count() > 1 {
                shown.push_str(" …");
            }
            lines.push(self.field_line(cur, "", "description", shown, false, false, cursor_on));

            let cur = at(&mut si, lines.len(), &mut sel_line);
            let checked = if p.required { "[x]" } else { "[ ]" };
            lines.push(self.field_line(
                cur,
                "",
                "required",
                checked.to_string(),
                false,
                false,
                cursor_on,
            ));

            let cur = at(&mut si, lines.len(), &mut sel_line);
            lines.push(self.field_line(
                cur,
                "",
                "default",
                p.default_value.clone(),
                false,
                true,
                cursor_on,
            ));

            let cur = at(&mut si, lines.len(), &mut sel_line);
            lines.push(self.button_line(cur, "", "Remove parameter"));
            if i + 1 == n {
                let cur = at(&mut si, lines.len(), &mut sel_line);
                lines.push(self.button_line(cur, "", "Add parameter"));
            }
            lines.push(Line::from(""));
        }
        if n == 0 {
            lines.push(Line::from(Span::styled(
                "No parameters defined.",
                crate::theme::text_muted(),
            )));
            let cur = at(&mut si, lines.len(), &mut sel_line);
            lines.push(self.button_line(cur, "", "Add parameter"));
        }
        if let Some(msg) = &self.message {
            lines.push(Line::from(Span::styled(
                msg.clone(),
                crate::theme::text_muted(),
            )));
        }
        (lines, sel_line)
    }
}

impl crate::widgets::Widget for ParamsWidget {
    fn render(&mut self, f: &mut Frame, area: Rect, focused: bool, tick: u64) {
        let cursor_on = tick % 2 == 0 && self.desc_editor.is_none();
        self.clamp_selection();
        let (lines, sel_line) = self.build_lines(cursor_on);
        let inner_h = area.height.saturating_sub(2);
        self.last_viewport_h = inner_h;
        let ih = inner_h as usize;
        let cur_scroll = self.scroll_y as usize;
        let new_scroll = if sel_line < cur_scroll {
            sel_line
        } else if ih > 0 && sel_line >= cur_scroll + ih {
            sel_line + 1 - ih
        } else {
            cur_scroll
        };
        self.scroll_y = new_scroll.min(lines.len().saturating_sub(1)) as u16;
        let title = if self.editing {
            "Parameters — editing"
        } else {
            "Parameters"
        };
        let block = panel_block(title, focused);
        let p = Paragraph::new(lines).block(block).scroll((self.scroll_y, 0));
        f.render_widget(p, area);
        if self.editing {
            if let Some(ta) = self.desc_editor.as_mut() {
                let rect = centered_rect(70, 50, area);
                f.render_widget(Clear, rect);
                f.render_widget(&*ta, rect);
            }
        }
    }

    fn on_key(&mut self, key: KeyCode) -> Vec<crate::app::Effect> {
        let effects: Vec<crate::app::Effect> = Vec::new();
        if self.overlay_active() {
            match key {
                KeyCode::Esc => {
                    self.desc_editor = None;
                    self.editing = false;
                }
                k => {
                    if let Some(ev) = to_textarea_event(k) {
                        if let Some(ta) = self.desc_editor.as_mut() {
                            let _ = ta.input(ev);
                        }
                    }
                }
            }
            return effects;
        }
        let slots = flatten_slots(&self.editor.state);
        if self.selected >= slots.len() {
            self.selected = slots.len().saturating_sub(1);
        }
        let slot = slots[self.selected];
        if self.editing {
            match key {
                KeyCode::Esc | KeyCode::Enter => {
                    self.editing = false;
                }
                KeyCode::Backspace => {
                    if let Some(mut s) = self.slot_text(slot) {
                        s.pop();
                        self.apply_text(slot, &s);
                    }
                }
                KeyCode::Char(c) => {
                    if let Some(mut s) = self.slot_text(slot) {
                        s.push(c);
                        self.apply_text(slot, &s);
                    }
                }
                _ => {}
            }
            return effects;
        }
        match key {
            KeyCode::Up => {
                if self.selected > 0 {
                    self.selected -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected + 1 < slots.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Home => {
                self.selected = 0;
            }
            KeyCode::End => {
                self.selected = slots.len().saturating_sub(1);
            }
            KeyCode::Left => {
                if let Slot::Type(i) = slot {
                    self.cycle_type(i, -1);
                }
            }
            KeyCode::Right => {
                if let Slot::Type(i) = slot {
                    self.cycle_type(i, 1);
                }
            }
            KeyCode::Char(' ') => {
                if let Slot::Required(i) = slot {
                    let cur = self
                        .editor
                        .state
                        .params
                        .get(i)
                        .map(|p| p.required)
                        .unwrap_or(false);
                    self.editor.set_required(i, !cur);
                }
            }
            KeyCode::Enter => self.activate(slot),
            _ => {}
        }
        effects
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

fn to_textarea_event(key: KeyCode) -> Option<rt_event::KeyEvent> {
    let code = match key {
        KeyCode::Char(c) => rt_event::KeyCode::Char(c),
        KeyCode::Backspace => rt_event::KeyCode::Backspace,
        KeyCode::Enter => rt_event::KeyCode::Enter,
        KeyCode::Left => rt_event::KeyCode::Left,
        KeyCode::Right => rt_event::KeyCode::Right,
        KeyCode::Up => rt_event::KeyCode::Up,
        KeyCode::Down => rt_event::KeyCode::Down,
        KeyCode::Home => rt_event::KeyCode::Home,
        KeyCode::End => rt_event::KeyCode::End,
        KeyCode::Delete => rt_event::KeyCode::Delete,
        KeyCode::Tab => rt_event::KeyCode::Tab,
        _ => return None,
    };
    Some(rt_event::KeyEvent::new(code, rt_event::KeyModifiers::NONE))
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);
    let h = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(v[1]);
    h[1]
}
