use crate::model::{ParamOption, ParamType, Parameter};
use std::collections::HashSet;

/// Stable identity for editor rows and options. Ids come from a per-state
/// monotonic counter, so dirty-tracking survives removals without any
/// index renumbering.
pub type RowId = u64;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptionDraft {
    pub id: RowId,
    pub key: String,
    pub value: String,
}

/// One in-progress parameter row. `options` is `Some` iff the type is
/// `select`; every mutation path maintains that.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamDraft {
    pub id: RowId,
    pub ptype: ParamType,
    pub name: String,
    pub label: String,
    pub description: String,
    pub required: bool,
    pub default_value: String,
    pub options: Option<Vec<OptionDraft>>,
}

/// Scalar text fields that share one setter and no validation side effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarField {
    Name,
    Label,
    Description,
    Default,
}

/// The parameter-list being built in the publish wizard, plus the three
/// touched-row sets that drive error highlighting. Invalid rows are always
/// representable; the only failure mode is a silently refused append.
#[derive(Clone, Debug, Default)]
pub struct ParamsState {
    pub params: Vec<ParamDraft>,
    dirty_name: HashSet<RowId>,
    dirty_type: HashSet<RowId>,
    dirty_option: HashSet<RowId>,
    next_id: RowId,
}

impl ParamsState {
    fn alloc_id(&mut self) -> RowId {
        self.next_id += 1;
        self.next_id
    }

    fn blank_row(&mut self) -> ParamDraft {
        ParamDraft {
            id: self.alloc_id(),
            ptype: ParamType::Unset,
            name: String::new(),
            label: String::new(),
            description: String::new(),
            required: false,
            default_value: String::new(),
            options: None,
        }
    }

    fn blank_option(&mut self) -> OptionDraft {
        OptionDraft {
            id: self.alloc_id(),
            key: String::new(),
            value: String::new(),
        }
    }

    /// Append a blank row. With `after == None` (empty list) no validation
    /// runs. Otherwise the row at `after` gates the append: its name and
    /// type indices are marked dirty unconditionally, blank option keys
    /// are marked dirty, and the append only happens when the row has a
    /// non-empty name, a set type, and (for select) no blank option key.
    pub fn add_param(&mut self, after: Option<usize>) -> bool {
        let Some(index) = after else {
            let row = self.blank_row();
            self.params.push(row);
            return true;
        };
        let Some(row) = self.params.get(index) else {
            return false;
        };
        self.dirty_name.insert(row.id);
        self.dirty_type.insert(row.id);
        let mut blank_key = false;
        if row.ptype == ParamType::Select {
            if let Some(opts) = &row.options {
                for opt in opts.iter().filter(|o| o.key.is_empty()) {
                    blank_key = true;
                    self.dirty_option.insert(opt.id);
                }
            }
        }
        let row = &self.params[index];
        if row.name.is_empty() || row.ptype == ParamType::Unset || blank_key {
            return false;
        }
        let row = self.blank_row();
        self.params.push(row);
        true
    }

    pub fn remove_param(&mut self, index: usize) -> bool {
        if index >= self.params.len() {
            return false;
        }
        let removed = self.params.remove(index);
        self.dirty_name.remove(&removed.id);
        self.dirty_type.remove(&removed.id);
        if let Some(opts) = &removed.options {
            for opt in opts {
                self.dirty_option.remove(&opt.id);
            }
        }
        true
    }

    pub fn set_scalar(&mut self, index: usize, field: ScalarField, value: &str) -> bool {
        let Some(row) = self.params.get_mut(index) else {
            return false;
        };
        let slot = match field {
            ScalarField::Name => &mut row.name,
            ScalarField::Label => &mut row.label,
            ScalarField::Description => &mut row.description,
            ScalarField::Default => &mut row.default_value,
        };
        *slot = value.to_string();
        true
    }

    pub fn set_required(&mut self, index: usize, on: bool) -> bool {
        let Some(row) = self.params.get_mut(index) else {
            return false;
        };
        row.required = on;
        true
    }

    /// Change a row's type. Switching away from `select` drops the row's
    /// options and clears option-dirty state for every row (the source
    /// behavior, kept as-is). Switching to `select` seeds a fresh single
    /// blank option, also when the row already was `select`.
    pub fn set_type(&mut self, index: usize, ptype: ParamType) -> bool {
        let Some(row) = self.params.get(index) else {
            return false;
        };
        let id = row.id;
        self.dirty_type.insert(id);
        if ptype == ParamType::Select {
            let seed = self.blank_option();
            let row = &mut self.params[index];
            row.ptype = ptype;
            row.options = Some(vec![seed]);
        } else {
            let row = &mut self.params[index];
            row.ptype = ptype;
            row.options = None;
            self.dirty_option.clear();
        }
        true
    }

    /// Append a blank option to `row`'s list. The option at `after` is
    /// marked dirty first; the append is refused while any option of the
    /// row still has an empty key.
    pub fn add_option(&mut self, row: usize, after: usize) -> bool {
        let Some(opts) = self.params.get(row).and_then(|p| p.options.as_ref()) else {
            return false;
        };
        let mark = opts.get(after).map(|o| o.id);
        let any_blank = opts.iter().any(|o| o.key.is_empty());
        if let Some(id) = mark {
            self.dirty_option.insert(id);
        }
        if any_blank {
            return false;
        }
        let blank = self.blank_option();
        if let Some(opts) = self.params.get_mut(row).and_then(|p| p.options.as_mut()) {
            opts.push(blank);
            true
        } else {
            false
        }
    }

    /// Remove an option. A select row always keeps at least one option;
    /// removing the last one is refused.
    pub fn remove_option(&mut self, row: usize, opt: usize) -> bool {
        let Some(opts) = self.params.get_mut(row).and_then(|p| p.options.as_mut()) else {
            return false;
        };
        if opts.len() <= 1 || opt >= opts.len() {
            return false;
        }
        let removed = opts.remove(opt);
        self.dirty_option.remove(&removed.id);
        true
    }

    pub fn rename_option_key(&mut self, row: usize, opt: usize, key: &str) -> bool {
        let Some(entry) = self
            .params
            .get_mut(row)
            .and_then(|p| p.options.as_mut())
            .and_then(|v| v.get_mut(opt))
        else {
            return false;
        };
        entry.key = key.to_string();
        let id = entry.id;
        self.dirty_option.insert(id);
        true
    }

    pub fn set_option_value(&mut self, row: usize, opt: usize, value: &str) -> bool {
        let Some(entry) = self
            .params
            .get_mut(row)
            .and_then(|p| p.options.as_mut())
            .and_then(|v| v.get_mut(opt))
        else {
            return false;
        };
        entry.value = value.to_string();
        true
    }

    /// Serialize the current list into the wire shape the form-value sink
    /// and the submission pipeline consume.
    pub fn snapshot(&self) -> Vec<Parameter> {
        self.params
            .iter()
            .map(|p| Parameter {
                ptype: p.ptype,
                name: p.name.clone(),
                label: p.label.clone(),
                description: p.description.clone(),
                required: p.required,
                default_value: p.default_value.clone(),
                options: p.options.as_ref().map(|opts| {
                    opts.iter()
                        .map(|o| ParamOption::new(o.key.clone(), o.value.clone()))
                        .collect()
                }),
            })
            .collect()
    }

    pub fn name_dirty(&self, index: usize) -> bool {
        self.params
            .get(index)
            .map(|p| self.dirty_name.contains(&p.id))
            .unwrap_or(false)
    }

    pub fn type_dirty(&self, index: usize) -> bool {
        self.params
            .get(index)
            .map(|p| self.dirty_type.contains(&p.id))
            .unwrap_or(false)
    }

    pub fn option_dirty(&self, row: usize, opt: usize) -> bool {
        self.params
            .get(row)
            .and_then(|p| p.options.as_ref())
            .and_then(|v| v.get(opt))
            .map(|o| self.dirty_option.contains(&o.id))
            .unwrap_or(false)
    }

    /// Current index positions of dirty names, in list order.
    pub fn dirty_name_indices(&self) -> Vec<usize> {
        self.params
            .iter()
            .enumerate()
            .filter(|(_, p)| self.dirty_name.contains(&p.id))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn dirty_type_indices(&self) -> Vec<usize> {
        self.params
            .iter()
            .enumerate()
            .filter(|(_, p)| self.dirty_type.contains(&p.id))
            .map(|(i, _)| i)
            .collect()
    }

    /// Dirty option positions within one row's option list.
    pub fn dirty_option_indices(&self, row: usize) -> Vec<usize> {
        self.params
            .get(row)
            .and_then(|p| p.options.as_ref())
            .map(|opts| {
                opts.iter()
                    .enumerate()
                    .filter(|(_, o)| self.dirty_option.contains(&o.id))
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn any_option_dirty(&self) -> bool {
        !self.dirty_option.is_empty()
    }
}

pub type ChangeSink = Box<dyn FnMut(&[Parameter])>;

/// The parameter-list editor: state plus the observer contract with the
/// enclosing form. The sink is invoked synchronously after every
/// content-mutating operation; refused operations only update dirty sets
/// and stay silent.
#[derive(Default)]
pub struct ParamsEditor {
    pub state: ParamsState,
    on_change: Option<ChangeSink>,
}

impl ParamsEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: ChangeSink) -> Self {
        Self {
            state: ParamsState::default(),
            on_change: Some(sink),
        }
    }

    pub fn set_sink(&mut self, sink: ChangeSink) {
        self.on_change = Some(sink);
    }

    fn notify(&mut self) {
        if let Some(cb) = self.on_change.as_mut() {
            let snap = self.state.snapshot();
            cb(&snap);
        }
    }

    fn forward(&mut self, changed: bool) -> bool {
        if changed {
            self.notify();
        }
        changed
    }

    pub fn add_param(&mut self, after: Option<usize>) -> bool {
        let changed = self.state.add_param(after);
        self.forward(changed)
    }

    pub fn remove_param(&mut self, index: usize) -> bool {
        let changed = self.state.remove_param(index);
        self.forward(changed)
    }

    pub fn set_scalar(&mut self, index: usize, field: ScalarField, value: &str) -> bool {
        let changed = self.state.set_scalar(index, field, value);
        self.forward(changed)
    }

    pub fn set_required(&mut self, index: usize, on: bool) -> bool {
        let changed = self.state.set_required(index, on);
        self.forward(changed)
    }

    pub fn set_type(&mut self, index: usize, ptype: ParamType) -> bool {
        let changed = self.state.set_type(index, ptype);
        self.forward(changed)
    }

    pub fn add_option(&mut self, row: usize, after: usize) -> bool {
        let changed = self.state.add_option(row, after);
        self.forward(changed)
    }

    pub fn remove_option(&mut self, row: usize, opt: usize) -> bool {
        let changed = self.state.remove_option(row, opt);
        self.forward(changed)
    }

    pub fn rename_option_key(&mut self, row: usize, opt: usize, key: &str) -> bool {
        let changed = self.state.rename_option_key(row, opt, key);
        self.forward(changed)
    }

    pub fn set_option_value(&mut self, row: usize, opt: usize, value: &str) -> bool {
        let changed = self.state.set_option_value(row, opt, value);
        self.forward(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Build a state with `n` complete text rows (name set, type text).
    fn complete_rows(n: usize) -> ParamsState {
        let mut st = ParamsState::default();
        for i in 0..n {
            if i == 0 {
                assert!(st.add_param(None));
            } else {
                assert!(st.add_param(Some(i - 1)));
            }
            assert!(st.set_scalar(i, ScalarField::Name, &format!("p{i}")));
            assert!(st.set_type(i, ParamType::Text));
        }
        st
    }

    #[test]
    fn append_on_empty_list_always_succeeds() {
        let mut st = ParamsState::default();
        assert!(st.add_param(None));
        assert_eq!(st.params.len(), 1);
        let row = &st.params[0];
        assert_eq!(row.ptype, ParamType::Unset);
        assert!(row.name.is_empty());
        assert!(!row.required);
        // No options until the type becomes select.
        assert!(row.options.is_none());
        assert!(st.dirty_name_indices().is_empty());
        assert!(st.dirty_type_indices().is_empty());
    }

    #[test]
    fn append_gate_refuses_incomplete_last_row_and_marks_it() {
        let mut st = ParamsState::default();
        st.add_param(None);
        st.set_scalar(0, ScalarField::Name, "age");
        // Type still unset: refused, name and type both marked dirty.
        assert!(!st.add_param(Some(0)));
        assert_eq!(st.params.len(), 1);
        assert_eq!(st.dirty_name_indices(), vec![0]);
        assert_eq!(st.dirty_type_indices(), vec![0]);
        // Completing the row lets the append through.
        st.set_type(0, ParamType::Text);
        assert!(st.add_param(Some(0)));
        assert_eq!(st.params.len(), 2);
    }

    #[test]
    fn append_gate_checks_blank_option_keys() {
        let mut st = ParamsState::default();
        st.add_param(None);
        st.set_scalar(0, ScalarField::Name, "pick");
        st.set_type(0, ParamType::Select);
        assert!(!st.add_param(Some(0)));
        assert_eq!(st.params.len(), 1);
        assert_eq!(st.dirty_option_indices(0), vec![0]);
        st.rename_option_key(0, 0, "a");
        assert!(st.add_param(Some(0)));
        assert_eq!(st.params.len(), 2);
    }

    #[test]
    fn parameter_removal_shifts_dirty_indices() {
        // Dirty marks on rows 1 and 2 only: removing row 1 must keep
        // indices below untouched, drop the removed index, and shift
        // indices above down by one.
        let mut st = complete_rows(4);
        st.dirty_name.clear();
        st.dirty_type.clear();
        let id1 = st.params[1].id;
        let id2 = st.params[2].id;
        st.dirty_name.insert(id1);
        st.dirty_name.insert(id2);
        st.dirty_type.insert(id1);
        st.dirty_type.insert(id2);
        assert!(st.remove_param(1));
        assert_eq!(st.dirty_name_indices(), vec![1]);
        assert_eq!(st.dirty_type_indices(), vec![1]);
        // A mark below the removal point stays where it is.
        let mut st = complete_rows(3);
        st.dirty_name.clear();
        st.dirty_type.clear();
        let id0 = st.params[0].id;
        st.dirty_name.insert(id0);
        assert!(st.remove_param(2));
        assert_eq!(st.dirty_name_indices(), vec![0]);
    }

    #[test]
    fn option_removal_shifts_dirty_indices() {
        let mut st = ParamsState::default();
        st.add_param(None);
        st.set_scalar(0, ScalarField::Name, "pick");
        st.set_type(0, ParamType::Select);
        st.rename_option_key(0, 0, "a");
        st.add_option(0, 0);
        st.rename_option_key(0, 1, "b");
        st.add_option(0, 1);
        st.rename_option_key(0, 2, "c");
        // Marks on options 1 and 2 (renames marked 0 too; reset for clarity).
        st.dirty_option.clear();
        let opts = st.params[0].options.as_ref().unwrap();
        let (id1, id2) = (opts[1].id, opts[2].id);
        st.dirty_option.insert(id1);
        st.dirty_option.insert(id2);
        assert!(st.remove_option(0, 1));
        assert_eq!(st.dirty_option_indices(0), vec![1]);
        assert_eq!(
            st.params[0]
                .options
                .as_ref()
                .unwrap()
                .iter()
                .map(|o| o.key.as_str())
                .collect::<Vec<_>>(),
            vec!["a", "c"]
        );
    }

    #[test]
    fn remove_option_keeps_at_least_one_entry() {
        let mut st = ParamsState::default();
        st.add_param(None);
        st.set_type(0, ParamType::Select);
        assert!(!st.remove_option(0, 0));
        assert_eq!(st.params[0].options.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn add_option_refused_while_any_key_is_blank() {
        let mut st = ParamsState::default();
        st.add_param(None);
        st.set_type(0, ParamType::Select);
        st.rename_option_key(0, 0, "18");
        st.add_option(0, 0);
        // Second option has a blank key; pointing at the non-blank first
        // option does not help.
        assert!(!st.add_option(0, 0));
        assert_eq!(st.params[0].options.as_ref().unwrap().len(), 2);
        assert!(st.option_dirty(0, 0));
    }

    #[test]
    fn type_switch_away_from_select_clears_all_option_dirt() {
        let mut st = ParamsState::default();
        st.add_param(None);
        st.set_scalar(0, ScalarField::Name, "a");
        st.set_type(0, ParamType::Select);
        st.rename_option_key(0, 0, "x");
        st.add_param(Some(0));
        st.set_scalar(1, ScalarField::Name, "b");
        st.set_type(1, ParamType::Select);
        st.rename_option_key(1, 0, "y");
        assert!(st.any_option_dirty());
        // Switching row 0 to text clears option dirt of row 1 too.
        st.set_type(0, ParamType::Text);
        assert!(st.params[0].options.is_none());
        assert!(!st.any_option_dirty());
        assert!(st.dirty_option_indices(1).is_empty());
        assert!(st.params[1].options.is_some());
    }

    #[test]
    fn reselecting_select_reseeds_a_blank_option() {
        let mut st = ParamsState::default();
        st.add_param(None);
        st.set_type(0, ParamType::Select);
        st.rename_option_key(0, 0, "kept?");
        st.set_type(0, ParamType::Select);
        let opts = st.params[0].options.as_ref().unwrap();
        assert_eq!(opts.len(), 1);
        assert!(opts[0].key.is_empty());
    }

    #[test]
    fn snapshot_shape_matches_type() {
        let mut st = ParamsState::default();
        st.add_param(None);
        st.set_scalar(0, ScalarField::Name, "fname");
        st.set_type(0, ParamType::Text);
        st.add_param(Some(0));
        st.set_scalar(1, ScalarField::Name, "color");
        st.set_type(1, ParamType::Select);
        st.rename_option_key(0, 0, "ignored"); // row 0 is text, no options
        st.rename_option_key(1, 0, "r");
        st.set_option_value(1, 0, "Red");
        let snap = serde_json::to_value(st.snapshot()).unwrap();
        let arr = snap.as_array().unwrap();
        assert!(arr[0].get("options").is_none());
        let opts = arr[1].get("options").unwrap().as_array().unwrap();
        assert_eq!(opts.len(), 1);
        // Exactly one key per serialized option entry.
        assert_eq!(opts[0].as_object().unwrap().len(), 1);
        assert_eq!(opts[0].get("r").and_then(|v| v.as_str()), Some("Red"));
    }

    #[test]
    fn editor_notifies_on_content_changes_only() {
        let pushes: Rc<RefCell<Vec<Vec<Parameter>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&pushes);
        let mut ed = ParamsEditor::with_sink(Box::new(move |snap| {
            sink.borrow_mut().push(snap.to_vec());
        }));
        assert!(ed.add_param(None));
        assert_eq!(pushes.borrow().len(), 1);
        // Refused append: dirty marks only, no push.
        assert!(!ed.add_param(Some(0)));
        assert_eq!(pushes.borrow().len(), 1);
        assert!(ed.set_scalar(0, ScalarField::Name, "age"));
        assert!(ed.set_type(0, ParamType::Text));
        assert_eq!(pushes.borrow().len(), 3);
        let last = pushes.borrow().last().unwrap().clone();
        assert_eq!(last[0].name, "age");
        assert_eq!(last[0].ptype, ParamType::Text);
    }

    #[test]
    fn publish_scenario_end_to_end() {
        let mut ed = ParamsEditor::new();
        assert!(ed.add_param(None));
        ed.set_scalar(0, ScalarField::Name, "age");
        ed.set_type(0, ParamType::Select);
        // Seeded option still blank: adding another is refused.
        assert!(!ed.add_option(0, 0));
        ed.rename_option_key(0, 0, "18");
        ed.set_option_value(0, 0, "Eighteen");
        assert!(ed.add_option(0, 0));
        {
            let opts = ed.state.params[0].options.as_ref().unwrap();
            assert_eq!(
                opts.iter().map(|o| (o.key.as_str(), o.value.as_str())).collect::<Vec<_>>(),
                vec![("18", "Eighteen"), ("", "")]
            );
        }
        // New option key is blank: appending a second parameter refused.
        assert!(!ed.add_param(Some(0)));
        assert_eq!(ed.state.params.len(), 1);
        ed.rename_option_key(0, 1, "19");
        assert!(ed.add_param(Some(0)));
        assert_eq!(ed.state.params.len(), 2);
    }

    #[test]
    fn out_of_range_indices_are_soft_refusals() {
        let mut st = ParamsState::default();
        assert!(!st.remove_param(0));
        assert!(!st.set_scalar(3, ScalarField::Label, "x"));
        assert!(!st.set_type(1, ParamType::Text));
        assert!(!st.add_option(0, 0));
        assert!(!st.rename_option_key(0, 0, "k"));
        st.add_param(None);
        st.set_type(0, ParamType::Text);
        // Text rows have no option list to mutate.
        assert!(!st.set_option_value(0, 0, "v"));
    }
}
