//! Form session
//!
//! Owns the working values of one compiled form, one attachment manager per
//! attachment field, and the field error channel. `reset()` restores the
//! defaults and bumps a generation counter; a submission started before a
//! reset is rejected when it completes.
//!
//! The session is disabled while either the owner has disabled it or a
//! submission of the current generation is reading files. The two are kept
//! apart so finishing a submission never lifts the owner's flag.

use std::rc::Rc;

use form_compiler::{build_schema, ValidationReport, ValidationSchema};
use form_types::{CompiledForm, FieldError, FieldKind, FieldValue, FileHandle, FileReadError, FormValues};
use tracing::debug;

use crate::encoder::{encode_submission, EncodedValues};
use crate::error::{AttachmentError, SubmissionError};
use crate::manager::AttachmentManager;
use crate::policy::AttachmentPolicy;
use crate::preview::{AttachmentPreview, PreviewStore};

/// A validated snapshot of the values, tagged with the session generation
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    generation: u64,
    values: FormValues,
}

impl SubmissionTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }
}

pub struct FormSession {
    form: CompiledForm,
    schema: ValidationSchema,
    values: FormValues,
    managers: Vec<AttachmentManager>,
    errors: Vec<FieldError>,
    disabled: bool,
    /// Generation of the submission currently reading files
    submitting: Option<u64>,
    generation: u64,
}

impl FormSession {
    pub fn new(form: CompiledForm, policy: AttachmentPolicy, store: Rc<dyn PreviewStore>) -> Self {
        let schema = build_schema(&form);
        let values = FormValues::from_defaults(&form);
        let managers = form
            .attachment_fields()
            .filter_map(|field| AttachmentManager::for_field(field, policy.clone(), store.clone()))
            .collect();

        Self {
            form,
            schema,
            values,
            managers,
            errors: Vec::new(),
            disabled: false,
            submitting: None,
            generation: 0,
        }
    }

    pub fn form(&self) -> &CompiledForm {
        &self.form
    }

    pub fn schema(&self) -> &ValidationSchema {
        &self.schema
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Disabled by the owner or by a submission in flight
    pub fn is_disabled(&self) -> bool {
        self.disabled || self.is_submitting()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting == Some(self.generation)
    }

    /// Set a field value. Unknown fields and disabled sessions are ignored;
    /// returns whether the value was stored.
    pub fn set_value(&mut self, name: &str, value: FieldValue) -> bool {
        if self.is_disabled() || self.form.field(name).is_none() {
            return false;
        }
        if let Some(manager) = self.manager_mut(name) {
            manager.sync_value(&value);
        }
        self.values.insert(name, value);
        true
    }

    pub fn select_files(&mut self, name: &str, files: Vec<FileHandle>) -> Result<(), AttachmentError> {
        let manager = self
            .manager_mut(name)
            .ok_or_else(|| AttachmentError::UnknownField(name.to_string()))?;

        match manager.select(files) {
            Ok(Some(value)) => {
                self.values.insert(name, value);
                self.clear_error(name);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                self.set_error(e.to_field_error());
                Err(e)
            }
        }
    }

    /// Remove one attachment; returns whether anything changed
    pub fn remove_attachment(&mut self, name: &str, id: &str) -> bool {
        let Some(value) = self.manager_mut(name).and_then(|m| m.remove(id)) else {
            return false;
        };
        self.values.insert(name, value);
        true
    }

    pub fn clear_attachments(&mut self, name: &str) -> bool {
        let Some(value) = self.manager_mut(name).and_then(|m| m.clear()) else {
            return false;
        };
        self.values.insert(name, value);
        self.clear_error(name);
        true
    }

    pub fn previews(&self, name: &str) -> &[AttachmentPreview] {
        self.manager(name).map(|m| m.previews()).unwrap_or(&[])
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn error_for(&self, name: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == name)
    }

    /// Record an error for a field, replacing any earlier one
    pub fn set_error(&mut self, error: FieldError) {
        self.clear_error(&error.field);
        self.errors.push(error);
    }

    pub fn clear_error(&mut self, name: &str) {
        self.errors.retain(|e| e.field != name);
    }

    /// A fieldset photo is only shown once its parent field has a value
    pub fn is_visible(&self, name: &str) -> bool {
        let Some(field) = self.form.field(name) else {
            return false;
        };
        match (&field.parent_field, field.kind, field.fieldset_member) {
            (Some(parent), FieldKind::Photo, true) => {
                self.values.get(parent).is_some_and(|v| !v.is_empty())
            }
            _ => true,
        }
    }

    /// Owner's disabled flag. A submission in flight keeps the session
    /// disabled until it completes, whatever is set here.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        self.sync_disabled();
    }

    fn sync_disabled(&mut self) {
        let disabled = self.is_disabled();
        for manager in &mut self.managers {
            manager.set_disabled(disabled);
        }
    }

    pub fn reset(&mut self) {
        self.values = FormValues::from_defaults(&self.form);
        self.errors.clear();
        for manager in &mut self.managers {
            manager.reset();
        }
        self.generation += 1;
        self.sync_disabled();
        debug!(form = %self.form.id, generation = self.generation, "form reset");
    }

    pub fn validate(&self) -> ValidationReport {
        self.schema.validate(&self.values)
    }

    /// Validate and snapshot the values for encoding. The session stays
    /// disabled until the ticket is passed to `complete_submit`.
    ///
    /// # Errors
    ///
    /// `Disabled` while the owner has disabled the form or another
    /// submission is reading files; `Invalid` when validation fails.
    pub fn begin_submit(&mut self) -> Result<SubmissionTicket, SubmissionError> {
        if self.is_disabled() {
            return Err(SubmissionError::Disabled);
        }
        let report = self.validate();
        if !report.is_valid() {
            return Err(SubmissionError::Invalid(report));
        }
        self.submitting = Some(self.generation);
        self.sync_disabled();
        Ok(SubmissionTicket {
            generation: self.generation,
            values: self.values.clone(),
        })
    }

    /// Finish a submission started by `begin_submit`. Re-enables editing
    /// unless the owner disabled the form, and drops the payload if the form
    /// was reset since the ticket was issued.
    pub fn complete_submit(
        &mut self,
        ticket: SubmissionTicket,
        encoded: Result<EncodedValues, FileReadError>,
    ) -> Result<EncodedValues, SubmissionError> {
        if self.submitting == Some(ticket.generation) {
            self.submitting = None;
            self.sync_disabled();
        }
        if ticket.generation != self.generation {
            debug!(
                form = %self.form.id,
                ticket = ticket.generation,
                current = self.generation,
                "stale submission ignored"
            );
            return Err(SubmissionError::Superseded);
        }
        Ok(encoded?)
    }

    /// Record validation errors from a rejected submission
    pub fn apply_report(&mut self, report: &ValidationReport) {
        for error in &report.errors {
            self.set_error(error.clone());
        }
    }

    /// Validate, encode and complete in one call; the session is disabled
    /// while files are read and a disabled session refuses to submit.
    pub async fn submit(&mut self) -> Result<EncodedValues, SubmissionError> {
        let ticket = match self.begin_submit() {
            Ok(ticket) => ticket,
            Err(SubmissionError::Invalid(report)) => {
                self.apply_report(&report);
                return Err(SubmissionError::Invalid(report));
            }
            Err(e) => return Err(e),
        };

        let encoded = encode_submission(ticket.values()).await;
        self.complete_submit(ticket, encoded)
    }

    fn manager(&self, name: &str) -> Option<&AttachmentManager> {
        self.managers.iter().find(|m| m.field() == name)
    }

    fn manager_mut(&mut self, name: &str) -> Option<&mut AttachmentManager> {
        self.managers.iter_mut().find(|m| m.field() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryFile;
    use crate::preview::MemoryPreviewStore;
    use form_types::CompiledField;
    use pretty_assertions::assert_eq;

    fn inspection_form() -> CompiledForm {
        let mut gate = CompiledField::new("gate", FieldKind::ShortText, "Gate", "Perimeter");
        gate.required = true;
        gate.fieldset_start = true;
        let mut photo = CompiledField::new("gate_photo", FieldKind::Photo, "Gate Photo", "Perimeter");
        photo.fieldset_member = true;
        photo.fieldset_end = true;
        photo.parent_field = Some("gate".into());
        let site = CompiledField::new("site_photos", FieldKind::Photo, "Site Photos", "Perimeter");

        CompiledForm {
            id: "F-1".into(),
            title: "Inspection".into(),
            fields: vec![gate, photo, site],
        }
    }

    fn session() -> (FormSession, Rc<MemoryPreviewStore>) {
        let store = Rc::new(MemoryPreviewStore::new());
        let session = FormSession::new(inspection_form(), AttachmentPolicy::default(), store.clone());
        (session, store)
    }

    fn image(name: &str) -> FileHandle {
        MemoryFile::new(name, "image/png", vec![1, 2, 3]).into_handle()
    }

    #[test]
    fn test_photo_subfield_follows_parent_value() {
        let (mut session, _store) = session();
        assert!(!session.is_visible("gate_photo"));
        assert!(session.is_visible("site_photos"));

        session.set_value("gate", FieldValue::from("North"));
        assert!(session.is_visible("gate_photo"));
        assert!(!session.is_visible("missing"));
    }

    #[test]
    fn test_select_mirrors_value_and_errors() {
        let (mut session, _store) = session();
        session.select_files("site_photos", vec![image("a.png"), image("b.png")]).unwrap();
        assert_eq!(session.value("site_photos").map(|v| v.files().len()), Some(2));

        let pdf = MemoryFile::new("a.pdf", "application/pdf", vec![1]).into_handle();
        assert!(session.select_files("gate_photo", vec![pdf]).is_err());
        assert_eq!(
            session.error_for("gate_photo").map(|e| e.message.as_str()),
            Some("Images only and each < 5 MB")
        );

        session.select_files("gate_photo", vec![image("c.png")]).unwrap();
        assert!(session.error_for("gate_photo").is_none());
        assert!(matches!(
            session.select_files("gate", vec![image("d.png")]),
            Err(AttachmentError::UnknownField(_))
        ));
    }

    #[test]
    fn test_clearing_value_releases_previews() {
        let (mut session, store) = session();
        session.select_files("site_photos", vec![image("a.png")]).unwrap();
        assert_eq!(store.live_count(), 1);

        session.set_value("site_photos", FieldValue::Files(Vec::new()));
        assert!(session.previews("site_photos").is_empty());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let (mut session, store) = session();
        session.set_value("gate", FieldValue::from("North"));
        session.select_files("site_photos", vec![image("a.png")]).unwrap();
        session.set_error(FieldError::new("gate", "bad"));
        session.set_disabled(true);

        session.reset();
        assert_eq!(session.value("gate"), Some(&FieldValue::Null));
        assert_eq!(session.value("site_photos"), Some(&FieldValue::Null));
        assert!(session.errors().is_empty());
        assert_eq!(session.generation(), 1);
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_disabled_session_ignores_edits() {
        let (mut session, _store) = session();
        session.set_disabled(true);
        assert!(!session.set_value("gate", FieldValue::from("North")));
        session.select_files("site_photos", vec![image("a.png")]).unwrap();
        assert!(session.previews("site_photos").is_empty());
    }

    #[test]
    fn test_stale_submission_superseded() {
        let (mut session, _store) = session();
        session.set_value("gate", FieldValue::from("North"));
        let ticket = session.begin_submit().unwrap();

        session.reset();
        assert!(!session.is_disabled());
        let result = session.complete_submit(ticket, Ok(EncodedValues::new()));
        assert_eq!(result, Err(SubmissionError::Superseded));
    }

    #[tokio::test]
    async fn test_disabled_session_refuses_submit() {
        let (mut session, _store) = session();
        session.set_value("gate", FieldValue::from("North"));
        session.set_disabled(true);

        assert_eq!(session.submit().await, Err(SubmissionError::Disabled));
        assert!(session.is_disabled());
        assert!(session.errors().is_empty());
    }

    #[tokio::test]
    async fn test_submit_leaves_enabled_session_enabled() {
        let (mut session, _store) = session();
        session.set_value("gate", FieldValue::from("North"));

        session.submit().await.unwrap();
        assert!(!session.is_disabled());
        assert!(session.set_value("gate", FieldValue::from("South")));
    }

    #[test]
    fn test_second_submit_waits_for_first() {
        let (mut session, _store) = session();
        session.set_value("gate", FieldValue::from("North"));

        let first = session.begin_submit().unwrap();
        assert!(session.is_submitting());
        assert!(!session.set_value("gate", FieldValue::from("South")));
        assert_eq!(session.begin_submit().unwrap_err(), SubmissionError::Disabled);

        let payload = session.complete_submit(first, Ok(EncodedValues::new()));
        assert!(payload.is_ok());
        assert!(!session.is_disabled());
        assert!(session.begin_submit().is_ok());
    }

    #[test]
    fn test_owner_disable_during_submit_survives_completion() {
        let (mut session, _store) = session();
        session.set_value("gate", FieldValue::from("North"));

        let ticket = session.begin_submit().unwrap();
        session.set_disabled(true);
        session.complete_submit(ticket, Ok(EncodedValues::new())).unwrap();
        assert!(session.is_disabled());

        session.set_disabled(false);
        assert!(!session.is_disabled());
    }

    #[test]
    fn test_reset_lifts_submission_lock() {
        let (mut session, _store) = session();
        session.set_value("gate", FieldValue::from("North"));
        let stale = session.begin_submit().unwrap();

        session.reset();
        session.set_value("gate", FieldValue::from("East"));
        let fresh = session.begin_submit().unwrap();

        assert_eq!(
            session.complete_submit(stale, Ok(EncodedValues::new())),
            Err(SubmissionError::Superseded)
        );
        assert!(session.is_submitting());
        assert!(session.complete_submit(fresh, Ok(EncodedValues::new())).is_ok());
        assert!(!session.is_disabled());
    }

    #[tokio::test]
    async fn test_invalid_submission_records_errors() {
        let (mut session, _store) = session();
        let err = session.submit().await.unwrap_err();

        assert!(matches!(err, SubmissionError::Invalid(_)));
        assert_eq!(session.error_for("gate").map(|e| e.message.as_str()), Some("Gate is required"));
        assert!(!session.is_disabled());
    }

    #[tokio::test]
    async fn test_submit_encodes_files() {
        let (mut session, _store) = session();
        session.set_value("gate", FieldValue::from("North"));
        session.select_files("gate_photo", vec![image("g.png")]).unwrap();

        let payload = session.submit().await.unwrap();
        assert_eq!(payload["gate"], "North");
        assert_eq!(payload["gate_photo"]["name"], "g.png");
        assert_eq!(payload["site_photos"], serde_json::Value::Null);
    }
}
