//! Linux pointer query via Xlib `XQueryPointer`.
//!
//! A display connection is opened per query.  Mouse requests are rare
//! compared to the cost of a round trip, and this keeps the locator free of
//! raw pointers that would make it `!Send`.

use keyrelay_core::domain::ScreenPoint;

use crate::application::cursor::{CursorError, CursorLocator};

/// Linux X11 implementation of [`CursorLocator`].
#[derive(Debug, Default)]
pub struct LinuxCursorLocator;

impl LinuxCursorLocator {
    pub fn new() -> Self {
        Self
    }
}

impl CursorLocator for LinuxCursorLocator {
    fn position(&self) -> Result<ScreenPoint, CursorError> {
        query_pointer()
    }
}

fn query_pointer() -> Result<ScreenPoint, CursorError> {
    use std::os::raw::{c_int, c_uint};
    use x11::xlib;

    // SAFETY: a null name means "use $DISPLAY".  The display is closed below.
    let display = unsafe { xlib::XOpenDisplay(std::ptr::null()) };
    if display.is_null() {
        let display_env = std::env::var("DISPLAY").unwrap_or_else(|_| "<unset>".to_string());
        return Err(CursorError::Platform(format!(
            "XOpenDisplay failed; DISPLAY={display_env}"
        )));
    }

    let mut root_return: xlib::Window = 0;
    let mut child_return: xlib::Window = 0;
    let (mut root_x, mut root_y): (c_int, c_int) = (0, 0);
    let (mut win_x, mut win_y): (c_int, c_int) = (0, 0);
    let mut mask: c_uint = 0;

    // SAFETY: `display` is non-null and every out-pointer is a live local.
    let found = unsafe {
        let root = xlib::XDefaultRootWindow(display);
        xlib::XQueryPointer(
            display,
            root,
            &mut root_return,
            &mut child_return,
            &mut root_x,
            &mut root_y,
            &mut win_x,
            &mut win_y,
            &mut mask,
        )
    };

    // SAFETY: opened above and not used after this.
    unsafe { xlib::XCloseDisplay(display) };

    if found == 0 {
        return Err(CursorError::Platform(
            "pointer is not on the default screen".to_string(),
        ));
    }
    Ok(ScreenPoint::new(root_x, root_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// If a DISPLAY is available the query must succeed; otherwise it must
    /// fail cleanly.
    #[test]
    fn test_linux_cursor_locator_smoke() {
        let result = LinuxCursorLocator::new().position();
        if std::env::var("DISPLAY").is_err() {
            assert!(matches!(result, Err(CursorError::Platform(_))));
        }
    }
}
