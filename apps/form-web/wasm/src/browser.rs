//! Browser file handles and blob URL previews

use std::any::Any;
use std::rc::Rc;

use async_trait::async_trait;
use form_attachments::{PreviewError, PreviewStore};
use form_types::{FileBlob, FileHandle, FileReadError};
use js_sys::Uint8Array;
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FileList, Url};

/// A `File` from an `<input type="file">` picker
#[derive(Debug, Clone)]
pub struct BrowserFile {
    file: File,
}

impl BrowserFile {
    pub fn new(file: File) -> Self {
        Self { file }
    }

    pub fn file(&self) -> &File {
        &self.file
    }
}

#[async_trait(?Send)]
impl FileBlob for BrowserFile {
    fn name(&self) -> String {
        self.file.name()
    }

    fn size(&self) -> u64 {
        self.file.size() as u64
    }

    fn mime_type(&self) -> String {
        self.file.type_()
    }

    fn last_modified_ms(&self) -> i64 {
        self.file.last_modified() as i64
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn read_bytes(&self) -> Result<Vec<u8>, FileReadError> {
        let buffer = JsFuture::from(self.file.array_buffer())
            .await
            .map_err(|e| FileReadError::new(self.name(), js_error_text(&e)))?;
        Ok(Uint8Array::new(&buffer).to_vec())
    }
}

/// Every file in a picker list, in list order
pub fn files_from_list(list: &FileList) -> Vec<FileHandle> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|file| Rc::new(BrowserFile::new(file)) as FileHandle)
        .collect()
}

/// Preview store backed by `URL.createObjectURL`
#[derive(Debug, Default)]
pub struct BlobUrlStore;

impl PreviewStore for BlobUrlStore {
    fn create(&self, file: &FileHandle) -> Result<String, PreviewError> {
        let browser_file = file
            .as_any()
            .downcast_ref::<BrowserFile>()
            .ok_or_else(|| PreviewError(format!("'{}' is not a browser file", file.name())))?;
        Url::create_object_url_with_blob(browser_file.file()).map_err(|e| PreviewError(js_error_text(&e)))
    }

    fn revoke(&self, reference: &str) {
        let _ = Url::revoke_object_url(reference);
    }
}

fn js_error_text(value: &wasm_bindgen::JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
