use wasm_bindgen::prelude::*;
mod api;
mod error;
mod interop;
mod logging;

pub use logging::init_logging;

#[wasm_bindgen]
pub struct GenogramEditor {
    pub(crate) inner: genogram::Editor,
}

impl GenogramEditor {
    pub fn rs_new(config: genogram::EditorConfig) -> GenogramEditor {
        GenogramEditor { inner: genogram::Editor::with_config(config) }
    }

    pub fn editor(&self) -> &genogram::Editor {
        &self.inner
    }
}
