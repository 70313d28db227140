//! Subcommand implementations. Each returns the JSON document to print.

use std::path::Path;
use std::rc::Rc;

use form_attachments::{FormSession, MemoryPreviewStore, SubmissionError};
use form_compiler::{build_schema, compile_catalog, compile_template, compile_template_report, group_fields, render_blocks};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::Config;
use crate::input::{load_template, load_templates, load_values, InputValue};

/// Result of a command: the document to print and whether it succeeded
#[derive(Debug)]
pub struct Outcome {
    pub document: Value,
    pub success: bool,
}

impl Outcome {
    fn ok(document: Value) -> Self {
        Self { document, success: true }
    }

    fn failed(document: Value) -> Self {
        Self { document, success: false }
    }
}

/// Compile one template (with dropped-field diagnostics) or a whole catalog
pub fn compile(templates: &Path) -> anyhow::Result<Outcome> {
    let mut templates = load_templates(templates)?;
    if templates.len() == 1 {
        let template = templates.remove(0);
        let report = compile_template_report(&template)?;
        info!(form = %report.form.id, fields = report.form.fields.len(), "template compiled");
        return Ok(Outcome::ok(serde_json::to_value(&report)?));
    }

    let catalog = compile_catalog(&templates);
    info!(forms = catalog.len(), failures = catalog.failures.len(), "catalog compiled");
    let success = catalog.failures.is_empty();
    Ok(Outcome {
        document: serde_json::to_value(&catalog)?,
        success,
    })
}

/// Validation schema for one template
pub fn schema(template: &Path) -> anyhow::Result<Outcome> {
    let form = compile_template(&load_template(template)?)?;
    Ok(Outcome::ok(serde_json::to_value(build_schema(&form))?))
}

/// Groups with their field names, plus the render blocks
pub fn groups(template: &Path) -> anyhow::Result<Outcome> {
    let form = compile_template(&load_template(template)?)?;
    let groups: Vec<Value> = group_fields(&form.fields)
        .iter()
        .map(|group| {
            json!({
                "name": group.name,
                "fields": group.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            })
        })
        .collect();
    Ok(Outcome::ok(json!({
        "form": form.id,
        "groups": groups,
        "blocks": render_blocks(&form.fields),
    })))
}

/// Validate a values file against a template
///
/// Field errors (schema failures and rejected attachments) are reported in
/// the document with `success == false`.
///
/// # Errors
///
/// Returns an error if the template or values cannot be loaded, or the
/// template fails to compile
pub async fn validate(config: &Config, template: &Path, values: &Path) -> anyhow::Result<Outcome> {
    let mut session = load_session(config, template, values).await?;
    if !session.errors().is_empty() {
        return Ok(Outcome::failed(json!({ "valid": false, "errors": session.errors() })));
    }

    let report = session.validate();
    session.apply_report(&report);
    Ok(Outcome {
        document: json!({ "valid": report.is_valid(), "errors": report.errors }),
        success: report.is_valid(),
    })
}

/// Validate and encode a values file, reading every referenced attachment
///
/// # Errors
///
/// Returns an error if loading or compiling fails, or an attachment cannot
/// be read while encoding. Validation failures are not errors; they come
/// back as a failed [`Outcome`].
pub async fn submit(config: &Config, template: &Path, values: &Path) -> anyhow::Result<Outcome> {
    let mut session = load_session(config, template, values).await?;
    if !session.errors().is_empty() {
        return Ok(Outcome::failed(json!({ "errors": session.errors() })));
    }

    match session.submit().await {
        Ok(payload) => Ok(Outcome::ok(Value::Object(payload))),
        Err(SubmissionError::Invalid(report)) => Ok(Outcome::failed(json!({ "errors": report.errors }))),
        Err(e) => Err(e.into()),
    }
}

/// Build a session and feed it the values file. Attachment rejections are
/// left on the session's error channel.
async fn load_session(config: &Config, template: &Path, values: &Path) -> anyhow::Result<FormSession> {
    let form = compile_template(&load_template(template)?)?;
    let store = Rc::new(MemoryPreviewStore::new());
    let mut session = FormSession::new(form, config.attachments.clone(), store);

    for (name, value) in load_values(values).await? {
        if session.form().field(&name).is_none() {
            warn!(field = %name, "value for unknown field ignored");
            continue;
        }
        match value {
            InputValue::Scalar(value) => {
                session.set_value(&name, value);
            }
            InputValue::Files(files) => {
                if let Err(e) = session.select_files(&name, files) {
                    warn!(field = %name, "attachments rejected: {}", e);
                }
            }
        }
    }
    Ok(session)
}
