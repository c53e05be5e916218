use crate::model::{Asset, ParamType, Parameter};
use crate::widgets::chrome::panel_block;
use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::collections::HashSet;

/// Searchable catalog list with radio (single) or checkbox (multi)
/// selection. In single mode the chosen asset's published parameters are
/// projected read-only under its row.
pub struct AssetSelectWidget {
    pub title: String,
    pub assets: Vec<Asset>,
    pub multiple: bool,
    pub search: String,
    pub searching: bool,
    pub selected: usize,
    chosen: Option<String>,
    checked: HashSet<String>,
    offset: usize,
    last_viewport_h: u16,
}

impl AssetSelectWidget {
    pub fn new(title: impl Into<String>, assets: Vec<Asset>, multiple: bool) -> Self {
        let checked = assets
            .iter()
            .filter(|a| a.checked)
            .map(|a| a.did.clone())
            .collect();
        Self {
            title: title.into(),
            assets,
            multiple,
            search: String::new(),
            searching: false,
            selected: 0,
            chosen: None,
            checked,
            offset: 0,
            last_viewport_h: 0,
        }
    }

    /// Rows matching the search input, by name, DID, or symbol.
    pub fn filtered(&self) -> Vec<&Asset> {
        if self.search.is_empty() {
            return self.assets.iter().collect();
        }
        let needle = self.search.to_lowercase();
        self.assets
            .iter()
            .filter(|a| {
                a.name.to_lowercase().contains(&needle)
                    || a.did.to_lowercase().contains(&needle)
                    || a.symbol.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn selected_asset(&self) -> Option<&Asset> {
        let chosen = self.chosen.as_deref()?;
        self.assets.iter().find(|a| a.did == chosen)
    }

    /// DIDs picked in multi mode, in catalog order.
    pub fn selection(&self) -> Vec<String> {
        self.assets
            .iter()
            .filter(|a| self.checked.contains(&a.did))
            .map(|a| a.did.clone())
            .collect()
    }

    fn keep_selected_visible(&mut self, total: usize) {
        let ih = self.last_viewport_h as usize;
        if ih == 0 {
            self.offset = 0;
            return;
        }
        if self.selected >= total && total > 0 {
            self.selected = total - 1;
        }
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset.saturating_add(ih) {
            self.offset = self.selected.saturating_sub(ih.saturating_sub(1));
        }
    }

    fn pick(&mut self) {
        let did = match self.filtered().get(self.selected) {
            Some(a) => a.did.clone(),
            None => return,
        };
        if self.multiple {
            if !self.checked.remove(&did) {
                self.checked.insert(did);
            }
        } else {
            self.chosen = Some(did);
        }
    }
}

/// Read-only projection of an already-published parameter list: pure
/// rendering, no editable state, no dirty-tracking. An empty list yields
/// no lines.
pub(crate) fn parameter_preview_lines(params: &[Parameter]) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    for p in params {
        if !p.description.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("      {}", p.description),
                crate::theme::text_muted(),
            )));
        }
        let req = if p.required { " *" } else { "" };
        match p.ptype {
            ParamType::Text => {
                lines.push(Line::from(vec![
                    Span::raw(format!("      {}{req}: ", p.label)),
                    Span::styled(
                        format!("[ {} ]", p.default_value),
                        crate::theme::text_active_bold(),
                    ),
                ]));
            }
            ParamType::Select => {
                lines.push(Line::from(Span::raw(format!("      {}{req}:", p.label))));
                for opt in p.options.as_deref().unwrap_or_default() {
                    lines.push(Line::from(Span::styled(
                        format!("        ( ) {} ({})", opt.value, opt.key),
                        crate::theme::text_muted(),
                    )));
                }
            }
            ParamType::Unset => {}
        }
    }
    lines
}

impl crate::widgets::Widget for AssetSelectWidget {
    fn render(&mut self, f: &mut Frame, area: Rect, focused: bool, tick: u64) {
        let mut lines: Vec<Line<'static>> = Vec::new();
        let mut search = self.search.clone();
        if self.searching && tick % 2 == 0 {
            search.push('▏');
        }
        let search_style = if self.searching {
            crate::theme::text_editing_bold()
        } else {
            crate::theme::text_muted()
        };
        lines.push(Line::from(vec![
            Span::raw(" search: "),
            Span::styled(search, search_style),
        ]));
        lines.push(Line::from(""));

        let multiple = self.multiple;
        let chosen = self.chosen.clone();
        let filtered: Vec<Asset> = self.filtered().into_iter().cloned().collect();
        if filtered.is_empty() {
            lines.push(Line::from(Span::styled(
                " No assets found.",
                crate::theme::text_muted(),
            )));
        }
        let total = filtered.len();
        self.last_viewport_h = area.height.saturating_sub(4);
        self.keep_selected_visible(total);
        let ih = self.last_viewport_h as usize;
        let start = self.offset.min(total.saturating_sub(ih.min(total)));
        for (idx, asset) in filtered.iter().enumerate().skip(start) {
            let cur = idx == self.selected;
            let sel = if cur { '›' } else { ' ' };
            let mark = if multiple {
                if self.checked.contains(&asset.did) {
                    "[x]"
                } else {
                    "[ ]"
                }
            } else if chosen.as_deref() == Some(asset.did.as_str()) {
                "(•)"
            } else {
                "( )"
            };
            let price = if asset.price == "0" {
                "Free".to_string()
            } else {
                asset.price.clone()
            };
            let name_style = if cur {
                crate::theme::text_active_bold()
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::raw(format!("{sel} {mark} ")),
                Span::styled(asset.name.clone(), name_style),
                Span::styled(format!("  {price}"), crate::theme::text_muted()),
            ]));
            lines.push(Line::from(Span::styled(
                format!("      {} | {}", asset.symbol, asset.did),
                crate::theme::text_muted(),
            )));
            if !multiple
                && chosen.as_deref() == Some(asset.did.as_str())
                && !asset.parameters.is_empty()
            {
                lines.extend(parameter_preview_lines(&asset.parameters));
            }
        }
        let block = panel_block(&self.title, focused);
        let p = Paragraph::new(lines).block(block);
        f.render_widget(p, area);
    }

    fn on_key(&mut self, key: KeyCode) -> Vec<crate::app::Effect> {
        if self.searching {
            match key {
                KeyCode::Esc | KeyCode::Enter => {
                    self.searching = false;
                }
                KeyCode::Backspace => {
                    self.search.pop();
                    self.selected = 0;
                    self.offset = 0;
                }
                KeyCode::Char(c) => {
                    self.search.push(c);
                    self.selected = 0;
                    self.offset = 0;
                }
                _ => {}
            }
            return Vec::new();
        }
        let total = self.filtered().len();
        match key {
            KeyCode::Up => {
                if self.selected > 0 {
                    self.selected -= 1;
                }
                self.keep_selected_visible(total);
            }
            KeyCode::Down => {
                if total > 0 && self.selected + 1 < total {
                    self.selected += 1;
                }
                self.keep_selected_visible(total);
            }
            KeyCode::Home => {
                self.selected = 0;
                self.keep_selected_visible(total);
            }
            KeyCode::End => {
                if total > 0 {
                    self.selected = total - 1;
                }
                self.keep_selected_visible(total);
            }
            KeyCode::Char('/') => {
                self.searching = true;
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.pick();
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParamOption;
    use crate::widgets::Widget;

    fn asset(did: &str, name: &str, symbol: &str, price: &str) -> Asset {
        Asset {
            did: did.into(),
            name: name.into(),
            price: price.into(),
            symbol: symbol.into(),
            checked: false,
            parameters: vec![],
        }
    }

    fn sample() -> Vec<Asset> {
        vec![
            asset("did:op:aaa", "Wind Forecast", "WND", "0"),
            asset("did:op:bbb", "Tide Tables", "TDE", "4"),
            asset("did:op:ccc", "Wave Model", "WAV", "2"),
        ]
    }

    #[test]
    fn search_matches_name_did_and_symbol_case_insensitive() {
        let mut w = AssetSelectWidget::new("Assets", sample(), false);
        w.search = "wind".into();
        assert_eq!(w.filtered().len(), 1);
        w.search = "BBB".into();
        assert_eq!(w.filtered()[0].symbol, "TDE");
        w.search = "wav".into();
        assert_eq!(w.filtered()[0].name, "Wave Model");
        w.search = "nothing".into();
        assert!(w.filtered().is_empty());
    }

    #[test]
    fn single_select_tracks_one_chosen_did() {
        let mut w = AssetSelectWidget::new("Assets", sample(), false);
        let _ = w.on_key(KeyCode::Down);
        let _ = w.on_key(KeyCode::Enter);
        assert_eq!(w.selected_asset().unwrap().did, "did:op:bbb");
        // Choosing another asset replaces the pick.
        let _ = w.on_key(KeyCode::Up);
        let _ = w.on_key(KeyCode::Enter);
        assert_eq!(w.selected_asset().unwrap().did, "did:op:aaa");
    }

    #[test]
    fn multi_select_toggles_checkboxes() {
        let mut w = AssetSelectWidget::new("Assets", sample(), true);
        let _ = w.on_key(KeyCode::Char(' '));
        let _ = w.on_key(KeyCode::Down);
        let _ = w.on_key(KeyCode::Char(' '));
        assert_eq!(w.selection(), vec!["did:op:aaa", "did:op:bbb"]);
        let _ = w.on_key(KeyCode::Char(' '));
        assert_eq!(w.selection(), vec!["did:op:aaa"]);
    }

    #[test]
    fn search_typing_narrows_and_resets_cursor() {
        let mut w = AssetSelectWidget::new("Assets", sample(), false);
        let _ = w.on_key(KeyCode::End);
        assert_eq!(w.selected, 2);
        let _ = w.on_key(KeyCode::Char('/'));
        assert!(w.searching);
        for c in "tde".chars() {
            let _ = w.on_key(KeyCode::Char(c));
        }
        assert_eq!(w.selected, 0);
        let _ = w.on_key(KeyCode::Enter);
        assert!(!w.searching);
        assert_eq!(w.filtered().len(), 1);
        assert_eq!(w.filtered()[0].name, "Tide Tables");
    }

    #[test]
    fn preview_lines_follow_parameter_types() {
        let params = vec![
            Parameter {
                ptype: ParamType::Text,
                name: "iterations".into(),
                label: "Iterations".into(),
                description: "Boosting rounds.".into(),
                required: true,
                default_value: "100".into(),
                options: None,
            },
            Parameter {
                ptype: ParamType::Select,
                name: "loss".into(),
                label: "Loss".into(),
                description: String::new(),
                required: false,
                default_value: String::new(),
                options: Some(vec![ParamOption::new("sq", "Squared")]),
            },
        ];
        let lines = parameter_preview_lines(&params);
        let text: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.clone()).collect::<String>())
            .collect();
        assert!(text[0].contains("Boosting rounds."));
        assert!(text[1].contains("Iterations *: "));
        assert!(text[1].contains("[ 100 ]"));
        assert!(text[2].contains("Loss:"));
        assert!(text[3].contains("( ) Squared (sq)"));
    }

    #[test]
    fn empty_parameter_list_renders_nothing() {
        assert!(parameter_preview_lines(&[]).is_empty());
    }
}
