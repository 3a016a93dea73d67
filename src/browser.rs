use anyhow::{Context, Result};
use tracing::info;

/// Shows a web page or video on behalf of the desktop.
pub trait Browser {
    fn open(&mut self, url: &str) -> Result<()>;
}

/// Hands URLs to the system's default browser.
#[derive(Debug, Default)]
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&mut self, url: &str) -> Result<()> {
        info!("Opening in browser: {}", url);
        open::that(url).with_context(|| format!("Failed to open {}", url))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records opened URLs; clones share the record.
    #[derive(Debug, Default, Clone)]
    pub struct RecordingBrowser {
        pub opened: Rc<RefCell<Vec<String>>>,
    }

    impl Browser for RecordingBrowser {
        fn open(&mut self, url: &str) -> Result<()> {
            self.opened.borrow_mut().push(url.to_string());
            Ok(())
        }
    }
}
