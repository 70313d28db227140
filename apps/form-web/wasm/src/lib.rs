//! WASM bindings for dynamic forms
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { FormController, compileTemplate } from './pkg/form_web_wasm.js';
//!
//! await init();
//!
//! const controller = new FormController(templateJson);
//! render(controller.form());
//! controller.setValue("gate", "North");
//! const previews = controller.selectFiles("site_photos", input.files);
//! const payload = await controller.submit();
//! ```

pub mod browser;
pub mod controller;

use form_compiler::{build_schema, compile_catalog, compile_template, compile_template_report, CompileReport};
use form_types::RawTemplate;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use browser::{BlobUrlStore, BrowserFile};
pub use controller::FormController;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Compile one template; returns `{form, dropped}`
#[wasm_bindgen(js_name = compileTemplate)]
pub fn compile_template_js(template_json: &str) -> Result<JsValue, JsValue> {
    let report = compile_report(template_json).map_err(|e| JsValue::from_str(&e))?;
    to_js(&report)
}

/// Compile an array of templates; failed templates become error forms
#[wasm_bindgen(js_name = compileCatalog)]
pub fn compile_catalog_js(templates_json: &str) -> Result<JsValue, JsValue> {
    let templates: Vec<RawTemplate> = serde_json::from_str(templates_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid templates JSON: {}", e)))?;
    to_js(&compile_catalog(&templates))
}

/// Validation schema for a template
#[wasm_bindgen(js_name = buildSchema)]
pub fn build_schema_js(template_json: &str) -> Result<JsValue, JsValue> {
    let template = parse_template(template_json).map_err(|e| JsValue::from_str(&e))?;
    let form = compile_template(&template).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&build_schema(&form))
}

fn parse_template(template_json: &str) -> Result<RawTemplate, String> {
    serde_json::from_str(template_json).map_err(|e| format!("Invalid template JSON: {}", e))
}

fn compile_report(template_json: &str) -> Result<CompileReport, String> {
    let template = parse_template(template_json)?;
    compile_template_report(&template).map_err(|e| e.to_string())
}

/// Plain JS objects (not `Map`) for every JSON-shaped value
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
