use super::*;
use crate::model::ParamType;
use crate::widgets::params::ScalarField;

#[test]
fn submit_assembles_payload_from_the_sink() {
    let mut st = AppState::default();
    st.params.editor.add_param(None);
    st.params.editor.set_scalar(0, ScalarField::Name, "age");
    st.params.editor.set_type(0, ParamType::Text);
    apply_effects(&mut st, vec![Effect::SubmitDraft]);
    assert!(st.showing_submission);
    assert_eq!(st.preview.title, "Submission");
    assert!(st.preview.text.contains("\"service\": \"compute\""));
    assert!(st.preview.text.contains("\"name\": \"age\""));
    assert!(st.toast.is_some());
}

#[test]
fn sink_pushes_land_in_the_form_value_store() {
    let st = AppState::default();
    // No pushes yet.
    assert!(st.form_values.borrow().get("parameters").is_none());
    let mut st = st;
    st.params.editor.add_param(None);
    let v = st.form_values.borrow().get("parameters").cloned().unwrap();
    assert_eq!(v.as_array().map(|a| a.len()), Some(1));
    // A refused append leaves the stored snapshot untouched.
    st.params.editor.add_param(Some(0));
    let v2 = st.form_values.borrow().get("parameters").cloned().unwrap();
    assert_eq!(v, v2);
}

#[test]
fn toast_effect_sets_text_and_expiry() {
    let mut st = AppState::default();
    st.tick = 10;
    apply_effects(
        &mut st,
        vec![Effect::ShowToast {
            text: "hello".into(),
            level: ToastLevel::Info,
            seconds: 2,
        }],
    );
    let t = st.toast.as_ref().unwrap();
    assert_eq!(t.text, "hello");
    assert_eq!(t.until_tick, 20);
}
