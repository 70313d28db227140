//! Stateful form controller for the browser
//!
//! Holds the form session in Rust; JavaScript forwards input events and
//! renders whatever `form()`, `previews()` and `errors()` return.

use std::cell::RefCell;
use std::rc::Rc;

use form_attachments::{
    encode_submission, AttachmentPolicy, EncodedValues, FormSession, PreviewSummary, SubmissionError,
};
use form_compiler::compile_template;
use form_types::{FieldValue, RawTemplate};
use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::FileList;

use crate::browser::{files_from_list, BlobUrlStore};
use crate::to_js;

#[wasm_bindgen]
pub struct FormController {
    session: Rc<RefCell<FormSession>>,
}

#[wasm_bindgen]
impl FormController {
    /// Compile a template and start a session on it
    #[wasm_bindgen(constructor)]
    pub fn new(template_json: &str) -> Result<FormController, JsValue> {
        let session = Self::session_from_json(template_json).map_err(|e| JsValue::from_str(&e))?;
        Ok(Self {
            session: Rc::new(RefCell::new(session)),
        })
    }

    /// Internal constructor (testable without JsValue)
    fn session_from_json(template_json: &str) -> Result<FormSession, String> {
        let template: RawTemplate =
            serde_json::from_str(template_json).map_err(|e| format!("Invalid template JSON: {}", e))?;
        let form = compile_template(&template).map_err(|e| e.to_string())?;
        Ok(FormSession::new(form, AttachmentPolicy::default(), Rc::new(BlobUrlStore)))
    }

    /// The compiled form
    pub fn form(&self) -> Result<JsValue, JsValue> {
        to_js(self.session.borrow().form())
    }

    /// Current value of a field (files are reported by name)
    pub fn value(&self, name: &str) -> Result<JsValue, JsValue> {
        let session = self.session.borrow();
        match session.value(name) {
            Some(value) => match value.to_scalar_json() {
                Some(json) => to_js(&json),
                None => to_js(&value.files().iter().map(|f| f.name()).collect::<Vec<_>>()),
            },
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Set a scalar field value; returns whether it was stored
    #[wasm_bindgen(js_name = setValue)]
    pub fn set_value(&self, name: &str, value: JsValue) -> Result<bool, JsValue> {
        let json: serde_json::Value = serde_wasm_bindgen::from_value(value)
            .map_err(|e| JsValue::from_str(&format!("Invalid value: {}", e)))?;
        let value = FieldValue::from_scalar_json(&json)
            .ok_or_else(|| JsValue::from_str(&format!("Value for '{}' must be a scalar", name)))?;
        Ok(self.session.borrow_mut().set_value(name, value))
    }

    /// Hand a picker's files to an attachment field; returns its previews
    #[wasm_bindgen(js_name = selectFiles)]
    pub fn select_files(&self, name: &str, files: &FileList) -> Result<JsValue, JsValue> {
        self.session
            .borrow_mut()
            .select_files(name, files_from_list(files))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.previews(name)
    }

    #[wasm_bindgen(js_name = removeAttachment)]
    pub fn remove_attachment(&self, name: &str, id: &str) -> bool {
        self.session.borrow_mut().remove_attachment(name, id)
    }

    #[wasm_bindgen(js_name = clearAttachments)]
    pub fn clear_attachments(&self, name: &str) -> bool {
        self.session.borrow_mut().clear_attachments(name)
    }

    /// Previews for an attachment field: `{id, previewUrl, name, size, type}`
    pub fn previews(&self, name: &str) -> Result<JsValue, JsValue> {
        let summaries: Vec<PreviewSummary> = self
            .session
            .borrow()
            .previews(name)
            .iter()
            .map(|p| p.summary())
            .collect();
        to_js(&summaries)
    }

    pub fn errors(&self) -> Result<JsValue, JsValue> {
        to_js(self.session.borrow().errors())
    }

    #[wasm_bindgen(js_name = isVisible)]
    pub fn is_visible(&self, name: &str) -> bool {
        self.session.borrow().is_visible(name)
    }

    #[wasm_bindgen(js_name = setDisabled)]
    pub fn set_disabled(&self, disabled: bool) {
        self.session.borrow_mut().set_disabled(disabled);
    }

    #[wasm_bindgen(js_name = isDisabled)]
    pub fn is_disabled(&self) -> bool {
        self.session.borrow().is_disabled()
    }

    pub fn validate(&self) -> Result<JsValue, JsValue> {
        let mut session = self.session.borrow_mut();
        let report = session.validate();
        session.apply_report(&report);
        to_js(&report)
    }

    /// Restore defaults and release every preview. A submission in flight
    /// resolves as superseded.
    pub fn reset(&self) {
        self.session.borrow_mut().reset();
    }

    /// Validate, read every attachment and resolve with the encoded payload.
    ///
    /// The session is not borrowed while files are read, so `reset()` may
    /// run meanwhile; the promise then rejects with the superseded error.
    /// A second `submit()` while one is reading files rejects as disabled.
    pub fn submit(&self) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            let payload = run_submit(&session).await.map_err(|e| JsValue::from_str(&e))?;
            to_js(&payload)
        })
    }
}

/// Internal submit (testable without JsValue)
async fn run_submit(session: &RefCell<FormSession>) -> Result<EncodedValues, String> {
    let ticket = {
        let mut session = session.borrow_mut();
        match session.begin_submit() {
            Ok(ticket) => ticket,
            Err(SubmissionError::Invalid(report)) => {
                session.apply_report(&report);
                return Err(SubmissionError::Invalid(report).to_string());
            }
            Err(e) => return Err(e.to_string()),
        }
    };

    let encoded = encode_submission(ticket.values()).await;
    session
        .borrow_mut()
        .complete_submit(ticket, encoded)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    const FOREMAN_TEMPLATE: &str = r#"{
        "formName": "Daily Log",
        "formId": "F-1",
        "fields": [
            {"fieldid": "1", "title": "Foreman", "fieldName": "foreman",
             "fieldType": "text", "visible": 1, "inputReq": 1}
        ]
    }"#;

    fn filled_session() -> RefCell<FormSession> {
        let mut session = FormController::session_from_json(FOREMAN_TEMPLATE).unwrap();
        session.set_value("foreman", FieldValue::from("Dana"));
        RefCell::new(session)
    }

    #[test]
    fn test_session_from_json() {
        let session = FormController::session_from_json(FOREMAN_TEMPLATE).unwrap();
        assert_eq!(session.form().fields.len(), 1);
        assert!(!session.validate().is_valid());
    }

    #[test]
    fn test_submit_keeps_owner_disabled_flag() {
        let session = filled_session();
        session.borrow_mut().set_disabled(true);

        let err = block_on(run_submit(&session)).unwrap_err();
        assert_eq!(err, "Form is disabled");
        assert!(session.borrow().is_disabled());
    }

    #[test]
    fn test_submit_reenables_after_success() {
        let session = filled_session();
        let payload = block_on(run_submit(&session)).unwrap();
        assert_eq!(payload["foreman"], "Dana");
        assert!(!session.borrow().is_disabled());
    }

    #[test]
    fn test_submit_rejected_while_another_is_reading() {
        let session = filled_session();
        let first = session.borrow_mut().begin_submit().unwrap();

        let err = block_on(run_submit(&session)).unwrap_err();
        assert_eq!(err, "Form is disabled");
        assert!(session.borrow().is_disabled());

        session.borrow_mut().complete_submit(first, Ok(EncodedValues::new())).unwrap();
        assert!(!session.borrow().is_disabled());
    }

    #[test]
    fn test_session_from_bad_json() {
        let err = FormController::session_from_json("{").err().unwrap();
        assert!(err.starts_with("Invalid template JSON"));
    }
}
