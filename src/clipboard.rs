use anyhow::{Context, Result};

pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// System clipboard. The handle is opened lazily so a headless session
/// without a display only fails when a copy is attempted.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.inner.is_none() {
            self.inner = Some(arboard::Clipboard::new().context("no clipboard available")?);
        }
        let Some(clipboard) = self.inner.as_mut() else {
            anyhow::bail!("no clipboard available");
        };
        clipboard
            .set_text(text.to_string())
            .context("clipboard write failed")
    }
}
