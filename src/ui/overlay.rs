//! The HUD drawn over the canvas.
//!
//! `OverlayModel` is a plain description of what should be on screen for a
//! mode; `DomOverlay` turns it into elements and keeps them in sync.

use crate::morph::MorphMode;

pub const TITLE: &str = "ARIX";
pub const SUBTITLE: &str = "Signature Tree";
pub const STATUS: &str = "SYSTEM ONLINE // Y2K_EDITION";
pub const DESCRIPTION: &str = "Welcome to the digital void. Use your mouse/touch to rotate the camera. \
Experience the duality of chaos and order.";
pub const BANNER: &str = "MERRY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayButton {
    pub label: &'static str,
    /// Mode requested when clicked
    pub mode: MorphMode,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayModel {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub status: &'static str,
    pub description: &'static str,
    pub buttons: [OverlayButton; 2],
    /// Shown only while assembled
    pub banner: Option<&'static str>,
}

impl OverlayModel {
    pub fn for_mode(mode: MorphMode) -> Self {
        let button = |label, target: MorphMode| OverlayButton {
            label,
            mode: target,
            active: mode == target,
        };

        Self {
            title: TITLE,
            subtitle: SUBTITLE,
            status: STATUS,
            description: DESCRIPTION,
            buttons: [
                button("SCATTER", MorphMode::Scattered),
                button("ASSEMBLE", MorphMode::TreeShape),
            ],
            banner: mode.is_tree().then_some(BANNER),
        }
    }

    pub fn active_button(&self) -> Option<&OverlayButton> {
        self.buttons.iter().find(|b| b.active)
    }
}

#[cfg(target_arch = "wasm32")]
pub use dom::DomOverlay;

#[cfg(target_arch = "wasm32")]
mod dom {
    use std::cell::Cell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{Document, Element};

    use super::OverlayModel;
    use crate::error::{Error, Result};
    use crate::morph::MorphMode;

    const STYLE: &str = r#"
#arix-overlay { position: fixed; inset: 0; pointer-events: none; color: #e0e0ff;
  font-family: "Courier New", monospace; display: flex; flex-direction: column;
  justify-content: space-between; padding: 2rem; box-sizing: border-box; }
#arix-overlay h1 { margin: 0; font-size: 4rem; letter-spacing: 0.3em; color: #ff007f;
  text-shadow: 0 0 12px #ff007f, 0 0 32px #4a00e0; }
#arix-overlay .subtitle { font-size: 1.2rem; letter-spacing: 0.5em; color: #00ffcc; }
#arix-overlay .status { font-size: 0.75rem; opacity: 0.7; margin-top: 0.5rem; }
#arix-overlay .description { max-width: 24rem; font-size: 0.85rem; line-height: 1.5; opacity: 0.8; }
#arix-overlay .controls { display: flex; gap: 1rem; pointer-events: auto; }
#arix-overlay button { background: transparent; color: #00ffcc; border: 1px solid #00ffcc;
  padding: 0.75rem 2rem; font-family: inherit; letter-spacing: 0.2em; cursor: pointer; }
#arix-overlay button.active { background: #ff007f; border-color: #ff007f; color: #05020a;
  box-shadow: 0 0 16px #ff007f; }
#arix-overlay .banner { position: absolute; top: 40%; left: 0; right: 0; text-align: center;
  font-size: 6rem; letter-spacing: 0.4em; color: #ff007f; opacity: 0.85;
  text-shadow: 0 0 24px #ff007f; }
"#;

    fn dom_err(e: JsValue) -> Error {
        Error::Dom(format!("{:?}", e))
    }

    fn element(document: &Document, tag: &str, class: &str, text: &str) -> Result<Element> {
        let el = document.create_element(tag).map_err(dom_err)?;
        if !class.is_empty() {
            el.set_class_name(class);
        }
        if !text.is_empty() {
            el.set_text_content(Some(text));
        }
        Ok(el)
    }

    /// Overlay elements mounted into `document.body`
    pub struct DomOverlay {
        buttons: Vec<(MorphMode, Element)>,
        banner: Element,
        shown: Cell<Option<MorphMode>>,
    }

    impl DomOverlay {
        /// Build the overlay; `on_select` runs on the main thread for each
        /// button click with the mode that button requests.
        pub fn mount(document: &Document, mode: MorphMode, on_select: Rc<dyn Fn(MorphMode)>) -> Result<Self> {
            let body = document
                .body()
                .ok_or_else(|| Error::Dom("document has no body".to_string()))?;
            let model = OverlayModel::for_mode(mode);

            let style = element(document, "style", "", STYLE)?;
            body.append_child(&style).map_err(dom_err)?;

            let root = element(document, "div", "", "")?;
            root.set_id("arix-overlay");

            let header = element(document, "div", "header", "")?;
            header.append_child(&element(document, "h1", "", model.title)?).map_err(dom_err)?;
            header
                .append_child(&element(document, "div", "subtitle", model.subtitle)?)
                .map_err(dom_err)?;
            header
                .append_child(&element(document, "div", "status", model.status)?)
                .map_err(dom_err)?;
            root.append_child(&header).map_err(dom_err)?;

            let banner = element(document, "div", "banner", "")?;
            root.append_child(&banner).map_err(dom_err)?;

            let footer = element(document, "div", "footer", "")?;
            footer
                .append_child(&element(document, "p", "description", model.description)?)
                .map_err(dom_err)?;

            let controls = element(document, "div", "controls", "")?;
            let mut buttons = Vec::with_capacity(model.buttons.len());
            for entry in model.buttons {
                let button = element(document, "button", "", entry.label)?;
                let on_select = on_select.clone();
                let target = entry.mode;
                let closure = Closure::wrap(Box::new(move || on_select(target)) as Box<dyn FnMut()>);
                button
                    .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
                    .map_err(dom_err)?;
                closure.forget();

                controls.append_child(&button).map_err(dom_err)?;
                buttons.push((target, button));
            }
            footer.append_child(&controls).map_err(dom_err)?;
            root.append_child(&footer).map_err(dom_err)?;

            body.append_child(&root).map_err(dom_err)?;

            let overlay = Self {
                buttons,
                banner,
                shown: Cell::new(None),
            };
            overlay.sync(mode);
            Ok(overlay)
        }

        /// Re-apply the model when the mode differs from what is on screen
        pub fn sync(&self, mode: MorphMode) {
            if self.shown.get() == Some(mode) {
                return;
            }
            self.apply(&OverlayModel::for_mode(mode));
            self.shown.set(Some(mode));
        }

        fn apply(&self, model: &OverlayModel) {
            for (mode, element) in &self.buttons {
                let active = model.buttons.iter().any(|b| b.mode == *mode && b.active);
                element.set_class_name(if active { "active" } else { "" });
            }
            self.banner.set_text_content(model.banner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_button_active() {
        for mode in [MorphMode::Scattered, MorphMode::TreeShape] {
            let model = OverlayModel::for_mode(mode);
            assert_eq!(model.buttons.iter().filter(|b| b.active).count(), 1);
            assert_eq!(model.active_button().map(|b| b.mode), Some(mode));
        }
    }

    #[test]
    fn test_banner_only_when_assembled() {
        assert_eq!(OverlayModel::for_mode(MorphMode::Scattered).banner, None);
        assert_eq!(OverlayModel::for_mode(MorphMode::TreeShape).banner, Some("MERRY"));
    }

    #[test]
    fn test_buttons_map_to_actions() {
        let model = OverlayModel::for_mode(MorphMode::Scattered);
        assert_eq!(model.buttons[0].label, "SCATTER");
        assert_eq!(model.buttons[0].mode, MorphMode::Scattered);
        assert_eq!(model.buttons[1].label, "ASSEMBLE");
        assert_eq!(model.buttons[1].mode, MorphMode::TreeShape);
        assert!(model.description.starts_with("Welcome to the digital void."));
    }
}
