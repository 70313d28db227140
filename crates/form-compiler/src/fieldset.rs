//! Fieldset state machine over a flat field list
//!
//! Fieldsets are encoded as markers on consecutive fields: one
//! `fieldset_start`, then members, the last member carrying `fieldset_end`.
//! The tracker walks the list once and keeps only the currently open fieldset.

use form_types::CompiledField;

#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenFieldset {
    parent: String,
    group: String,
}

/// Forward-only checker for fieldset markers
#[derive(Debug, Default)]
pub struct FieldsetTracker {
    open: Option<OpenFieldset>,
}

impl FieldsetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the field that opened the current fieldset
    pub fn open_parent(&self) -> Option<&str> {
        self.open.as_ref().map(|o| o.parent.as_str())
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Advance over the next field in list order
    pub fn observe(&mut self, field: &CompiledField) -> Result<(), String> {
        if field.fieldset_start {
            if let Some(open) = &self.open {
                return Err(format!(
                    "fieldset '{}' opened before fieldset '{}' was closed",
                    field.name, open.parent
                ));
            }
            if field.fieldset_member {
                return Err(format!(
                    "field '{}' both opens a fieldset and belongs to one",
                    field.name
                ));
            }
            self.open = Some(OpenFieldset {
                parent: field.name.clone(),
                group: field.group.clone(),
            });
        } else if field.fieldset_member {
            let open = self.open.as_ref().ok_or_else(|| {
                format!("field '{}' is a fieldset member outside any fieldset", field.name)
            })?;
            if open.group != field.group {
                return Err(format!(
                    "field '{}' is in group '{}' but its fieldset '{}' is in group '{}'",
                    field.name, field.group, open.parent, open.group
                ));
            }
        } else {
            if let Some(open) = &self.open {
                return Err(format!(
                    "field '{}' interrupts fieldset '{}'",
                    field.name, open.parent
                ));
            }
            if field.fieldset_end {
                return Err(format!(
                    "field '{}' closes a fieldset it does not belong to",
                    field.name
                ));
            }
        }

        if field.fieldset_end {
            self.open = None;
        }
        Ok(())
    }

    /// Every opened fieldset must have been closed
    pub fn finish(&self) -> Result<(), String> {
        match &self.open {
            Some(open) => Err(format!("fieldset '{}' is never closed", open.parent)),
            None => Ok(()),
        }
    }
}

/// Check the fieldset markers of a whole list in one pass
pub fn check_fieldsets(fields: &[CompiledField]) -> Result<(), String> {
    let mut tracker = FieldsetTracker::new();
    for field in fields {
        tracker.observe(field)?;
    }
    tracker.finish()
}
