//! Batch compilation of form templates
//!
//! One broken template must not take the whole catalog down: it is replaced
//! by an empty placeholder form whose title flags the error.

use form_types::{CompiledForm, RawTemplate};
use serde::Serialize;
use tracing::error;

use crate::template::compile_template;

/// A template that failed to compile
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFailure {
    pub form_id: String,
    pub form_name: String,
    pub error: String,
}

/// Compiled forms in template order, placeholders included
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    pub forms: Vec<CompiledForm>,
    pub failures: Vec<CatalogFailure>,
}

impl Catalog {
    pub fn find(&self, id: &str) -> Option<&CompiledForm> {
        self.forms.iter().find(|f| f.id == id)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

/// Compile every template, isolating failures per template
pub fn compile_catalog(templates: &[RawTemplate]) -> Catalog {
    let mut catalog = Catalog::default();

    for template in templates {
        match compile_template(template) {
            Ok(form) => catalog.forms.push(form),
            Err(e) => {
                error!(
                    template = %template.form_name,
                    "Error processing form template: {}", e
                );
                catalog.failures.push(CatalogFailure {
                    form_id: template.form_id.clone(),
                    form_name: template.form_name.clone(),
                    error: e.to_string(),
                });
                catalog.forms.push(CompiledForm::error_placeholder(
                    &template.form_id,
                    &template.form_name,
                ));
            }
        }
    }

    catalog
}
