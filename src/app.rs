//! Browser bootstrap: canvas lookup, overlay, input listeners and the
//! animation loop. Everything runs on the main thread and shares the engine
//! through `Rc<RefCell<_>>`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window};

use crate::error::{Error, Result};
use crate::morph::MorphMode;
use crate::ui::DomOverlay;
use crate::SignatureTree;

/// Longest frame step fed to the engine, in seconds
const MAX_FRAME_DT: f32 = 0.1;

fn dom_err(e: JsValue) -> Error {
    Error::Dom(format!("{:?}", e))
}

/// Attach a typed event handler for the lifetime of the page
fn listen<E, F>(target: &EventTarget, name: &str, mut handler: F) -> Result<()>
where
    E: JsCast + 'static,
    F: FnMut(E) + 'static,
{
    let closure = Closure::wrap(Box::new(move |event: Event| {
        if let Ok(event) = event.dyn_into::<E>() {
            handler(event);
        }
    }) as Box<dyn FnMut(Event)>);
    target
        .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
        .map_err(dom_err)?;
    closure.forget();
    Ok(())
}

fn window_size(window: &Window) -> (u32, u32) {
    let dim = |v: std::result::Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
    (dim(window.inner_width()) as u32, dim(window.inner_height()) as u32)
}

fn request_frame(window: &Window, callback: &Closure<dyn FnMut(f64)>) {
    if let Err(e) = window.request_animation_frame(callback.as_ref().unchecked_ref()) {
        log::error!("requestAnimationFrame failed: {:?}", e);
    }
}

/// Mount the scene onto the canvas with id `canvas_id` and start rendering
#[wasm_bindgen]
pub fn start_app(canvas_id: &str) -> std::result::Result<(), JsValue> {
    Ok(mount(canvas_id)?)
}

fn mount(canvas_id: &str) -> Result<()> {
    let window = web_sys::window().ok_or_else(|| Error::Dom("no window".to_string()))?;
    let document = window
        .document()
        .ok_or_else(|| Error::Dom("no document".to_string()))?;
    let canvas: HtmlCanvasElement = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| Error::Dom(format!("missing #{}", canvas_id)))?
        .dyn_into()
        .map_err(|_| Error::Dom(format!("#{} is not a canvas", canvas_id)))?;

    let (width, height) = window_size(&window);
    canvas.set_width(width);
    canvas.set_height(height);

    let engine = Rc::new(RefCell::new(SignatureTree::build(canvas.clone(), Default::default())?));
    log::info!("ARIX signature tree mounted on #{}", canvas_id);

    let overlay = {
        let initial = engine.borrow().mode();
        let engine = engine.clone();
        let select: Rc<dyn Fn(MorphMode)> = Rc::new(move |mode| engine.borrow_mut().set_mode(mode));
        DomOverlay::mount(&document, initial, select)?
    };

    // Pointer drag orbits the camera
    let drag: Rc<Cell<Option<(i32, i32)>>> = Rc::new(Cell::new(None));
    {
        let drag = drag.clone();
        listen(&canvas, "mousedown", move |e: MouseEvent| {
            drag.set(Some((e.client_x(), e.client_y())));
        })?;
    }
    {
        let drag = drag.clone();
        let engine = engine.clone();
        listen(&window, "mousemove", move |e: MouseEvent| {
            if let Some((x, y)) = drag.get() {
                let (nx, ny) = (e.client_x(), e.client_y());
                engine.borrow_mut().orbit((nx - x) as f32, (ny - y) as f32);
                drag.set(Some((nx, ny)));
            }
        })?;
    }
    listen(&window, "mouseup", move |_: MouseEvent| drag.set(None))?;

    {
        let engine = engine.clone();
        listen(&canvas, "wheel", move |e: WheelEvent| {
            e.prevent_default();
            engine.borrow_mut().zoom(e.delta_y() as f32);
        })?;
    }

    {
        let engine = engine.clone();
        listen(&window, "keydown", move |e: KeyboardEvent| {
            if e.code() == "Space" {
                e.prevent_default();
                engine.borrow_mut().toggle();
            }
        })?;
    }

    {
        let engine = engine.clone();
        let canvas = canvas.clone();
        let resize_window = window.clone();
        listen(&window, "resize", move |_: Event| {
            let (width, height) = window_size(&resize_window);
            canvas.set_width(width);
            canvas.set_height(height);
            if let Err(e) = engine.borrow_mut().resize(width as i32, height as i32) {
                log::error!("resize failed: {:?}", e);
            }
        })?;
    }

    // Animation loop: the closure re-requests itself every frame
    let frame: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let first = frame.clone();
    let last = Cell::new(None::<f64>);
    let loop_window = window.clone();

    *first.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
        let dt = last
            .replace(Some(now))
            .map_or(0.0, |prev| ((now - prev) / 1000.0) as f32)
            .clamp(0.0, MAX_FRAME_DT);

        {
            let mut engine = engine.borrow_mut();
            engine.render(dt);
            overlay.sync(engine.mode());
        }

        if let Some(callback) = frame.borrow().as_ref() {
            request_frame(&loop_window, callback);
        }
    }) as Box<dyn FnMut(f64)>));

    if let Some(callback) = first.borrow().as_ref() {
        request_frame(&window, callback);
    }
    Ok(())
}
