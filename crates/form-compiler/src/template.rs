//! Whole-template compilation

use std::collections::HashSet;

use form_types::{CompiledField, CompiledForm, FieldError, RawField, RawTemplate};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::TemplateCompilationError;
use crate::field::{comment_field, compile_field_checked, photo_field};
use crate::fieldset::FieldsetTracker;

/// A compiled form plus the fields that were dropped on the way
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileReport {
    pub form: CompiledForm,
    pub dropped: Vec<FieldError>,
}

/// Compile a template into a render-ready form
pub fn compile_template(template: &RawTemplate) -> Result<CompiledForm, TemplateCompilationError> {
    compile_template_report(template).map(|report| report.form)
}

/// Compile a template, keeping diagnostics for fields that were dropped.
///
/// Visible rows are ordered by category order, then field order, then their
/// position in the template. Each row contributes its main field followed
/// directly by its comment and photo sub-fields. A row whose main field is
/// dropped contributes nothing.
pub fn compile_template_report(
    template: &RawTemplate,
) -> Result<CompileReport, TemplateCompilationError> {
    let mut rows: Vec<&RawField> = template.fields.iter().filter(|f| f.visible).collect();
    // Stable sort: ties keep template order
    rows.sort_by_key(|f| (f.category_order, f.field_order));

    let mut fields: Vec<CompiledField> = Vec::with_capacity(rows.len());
    let mut dropped = Vec::new();
    let mut names: HashSet<String> = HashSet::new();
    let mut tracker = FieldsetTracker::new();

    for raw in rows {
        if raw.field_name.trim().is_empty() {
            return Err(TemplateCompilationError::EmptyFieldName {
                template: template.form_name.clone(),
                field_id: raw.field_id.clone(),
            });
        }

        let main = match compile_field_checked(raw) {
            Ok(field) => field,
            Err(e) => {
                warn!(template = %template.form_name, field = %raw.field_name, "{}", e);
                dropped.push(e.to_field_error());
                continue;
            }
        };

        push_field(template, &mut fields, &mut names, &mut tracker, main)?;
        if let Some(comment) = comment_field(raw, tracker.is_open()) {
            push_field(template, &mut fields, &mut names, &mut tracker, comment)?;
        }
        if let Some(photo) = photo_field(raw) {
            push_field(template, &mut fields, &mut names, &mut tracker, photo)?;
        }
    }

    tracker
        .finish()
        .map_err(|reason| TemplateCompilationError::UnbalancedFieldset {
            template: template.form_name.clone(),
            reason,
        })?;

    debug!(
        template = %template.form_name,
        fields = fields.len(),
        dropped = dropped.len(),
        "Compiled form template"
    );

    Ok(CompileReport {
        form: CompiledForm {
            id: template.form_id.clone(),
            title: template.form_name.clone(),
            fields,
        },
        dropped,
    })
}

fn push_field(
    template: &RawTemplate,
    fields: &mut Vec<CompiledField>,
    names: &mut HashSet<String>,
    tracker: &mut FieldsetTracker,
    field: CompiledField,
) -> Result<(), TemplateCompilationError> {
    if !names.insert(field.name.clone()) {
        return Err(TemplateCompilationError::DuplicateFieldName {
            template: template.form_name.clone(),
            name: field.name,
        });
    }
    tracker
        .observe(&field)
        .map_err(|reason| TemplateCompilationError::UnbalancedFieldset {
            template: template.form_name.clone(),
            reason,
        })?;
    fields.push(field);
    Ok(())
}
