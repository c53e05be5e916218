use crate::ui::{AppState, ToastLevel};
use serde_json::json;

#[cfg(test)]
mod tests;

/// Side effects emitted by widgets. Everything here applies synchronously;
/// there is no background work in this client.
pub enum Effect {
    ShowToast {
        text: String,
        level: ToastLevel,
        seconds: u64,
    },
    SubmitDraft,
    CopySnapshot {
        text: String,
    },
}

pub fn apply_effects(state: &mut AppState, effects: Vec<Effect>) {
    for eff in effects {
        match eff {
            Effect::ShowToast {
                text,
                level,
                seconds,
            } => state.show_toast(text, level, seconds),
            Effect::SubmitDraft => submit_draft(state),
            Effect::CopySnapshot { text } => copy_snapshot(state, &text),
        }
    }
}

/// Read the form-value store and assemble the publish payload the
/// execution service consumes. Incomplete parameter rows are not blocked
/// here; the editor only ever signals incompleteness via highlighting.
fn submit_draft(state: &mut AppState) {
    let inputs = state.form_values.borrow().to_json();
    let payload = json!({
        "service": "compute",
        "inputs": inputs,
    });
    state.preview.show("Submission", &payload);
    state.showing_submission = true;
    state.show_toast("Draft submitted".into(), ToastLevel::Success, 3);
}

fn copy_snapshot(state: &mut AppState, text: &str) {
    match arboard::Clipboard::new().and_then(|mut c| c.set_text(text)) {
        Ok(()) => state.show_toast("Copied to clipboard".into(), ToastLevel::Info, 2),
        Err(e) => state.show_toast(format!("Clipboard: {e}"), ToastLevel::Error, 3),
    }
}
