//! Stag Lore entry point
//!
//! Wires the browser DOM to the animation core: hover starts and stops the
//! ember engine, resize re-runs the cover-fit mapper, clicking the book
//! opens the lore reader.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_page {
    use std::cell::RefCell;
    use std::f64::consts::TAU;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement, HtmlImageElement,
        KeyboardEvent, MouseEvent,
    };

    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use stag_lore::consts::*;
    use stag_lore::render::{DrawSurface, Rgb};
    use stag_lore::{AmbientConfig, EmberConfig, EmberEngine, Reader, SpriteMap, Viewport};

    /// 2D canvas backend for the engine's draw calls
    struct CanvasSurface {
        ctx: CanvasRenderingContext2d,
    }

    impl DrawSurface for CanvasSurface {
        fn clear(&mut self, width: f32, height: f32) {
            self.ctx
                .clear_rect(0.0, 0.0, width as f64, height as f64);
        }

        fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Rgb, alpha: f32) {
            self.ctx.begin_path();
            let _ = self
                .ctx
                .arc(x as f64, y as f64, radius as f64, 0.0, TAU);
            self.ctx.set_fill_style_str(&color.css(alpha));
            self.ctx.fill();
        }
    }

    /// Page instance holding all state
    struct App {
        engine: EmberEngine,
        reader: Reader,
        map: SpriteMap,
        surface: CanvasSurface,
        canvas: HtmlCanvasElement,
        anchor: HtmlElement,
        bg_img: HtmlImageElement,
        last_time: f64,
        frame_carry: f64,
    }

    impl App {
        /// Re-run the cover-fit mapping and pin the anchor to the sprite.
        /// Skipped while the background image has no decoded size yet; the
        /// initial CSS fallback stays in place.
        fn snap_book(&mut self) {
            if !self.bg_img.complete() {
                return;
            }

            let window = web_sys::window().expect("no window");
            let vw = window.inner_width().ok().and_then(|v| v.as_f64());
            let vh = window.inner_height().ok().and_then(|v| v.as_f64());
            let (Some(vw), Some(vh)) = (vw, vh) else {
                return;
            };

            let Some(rect) = self.map.anchor_rect(Viewport::new(vw as f32, vh as f32)) else {
                log::warn!("degenerate viewport {vw}x{vh}, keeping previous anchor");
                return;
            };

            let style = self.anchor.style();
            let _ = style.set_property("left", &format!("{}px", rect.left));
            let _ = style.set_property("top", &format!("{}px", rect.top));
            let _ = style.set_property("width", &format!("{}px", rect.width));
            let _ = style.set_property("height", &format!("{}px", rect.height));

            self.resize_canvas();
        }

        /// Size the canvas backing store from the anchor rect and device
        /// pixel ratio, then scale the context so draws are in CSS pixels.
        fn resize_canvas(&mut self) {
            let rect = self.anchor.get_bounding_client_rect();
            // Mid-layout the rect can be zero; the element's offset size is
            // the usable fallback
            let (w, h) = if rect.width() > 0.0 && rect.height() > 0.0 {
                (rect.width() as f32, rect.height() as f32)
            } else {
                (
                    self.anchor.offset_width() as f32,
                    self.anchor.offset_height() as f32,
                )
            };

            let dpr = web_sys::window()
                .map(|w| w.device_pixel_ratio())
                .unwrap_or(1.0) as f32;
            let size = self.engine.resize(w, h, dpr);
            let (device_w, device_h) = size.device();

            self.canvas.set_width(device_w);
            self.canvas.set_height(device_h);
            let style = self.canvas.style();
            let _ = style.set_property("width", &format!("{}px", size.width));
            let _ = style.set_property("height", &format!("{}px", size.height));
            let dpr = size.dpr as f64;
            let _ = self
                .surface
                .ctx
                .set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
        }

        /// One animation-frame callback: convert elapsed wall time to whole
        /// 60 Hz frames (with a catch-up cap) and advance + paint.
        fn frame(&mut self, time: f64) {
            let elapsed = if self.last_time > 0.0 {
                time - self.last_time
            } else {
                FRAME_MS
            };
            self.last_time = time;

            self.frame_carry += elapsed / FRAME_MS;
            let frames = (self.frame_carry as u32).min(MAX_CATCHUP_FRAMES);
            self.frame_carry = (self.frame_carry - frames as f64).clamp(0.0, 1.0);

            self.engine.tick(frames);
            self.engine.render(&mut self.surface);
        }

        /// Paint the current spread into the reader fields
        fn paint_spread(&self, document: &Document) {
            let spread = self.reader.current();
            set_text(document, "leftTitle", &spread.left.title);
            set_text(document, "leftBody", &spread.left.body);
            set_text(document, "leftFooter", &spread.left.footer);
            set_text(document, "rightTitle", &spread.right.title);
            set_text(document, "rightBody", &spread.right.body);
            set_text(document, "rightFooter", &spread.right.footer);
            set_text(document, "pageIndicator", &self.reader.indicator());
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_class(document: &Document, id: &str, class: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", class);
        }
    }

    /// Load the optional config override embedded as inline JSON
    fn load_config(document: &Document) -> EmberConfig {
        let Some(el) = document.get_element_by_id("ember-config") else {
            return EmberConfig::default();
        };
        let Some(json) = el.text_content() else {
            return EmberConfig::default();
        };
        match EmberConfig::from_json(&json) {
            Ok(config) => {
                log::info!("loaded ember config override ({} regions)", config.regions.len());
                config
            }
            Err(e) => {
                log::warn!("bad ember config override, using defaults: {e}");
                EmberConfig::default()
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Stag Lore starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let anchor: HtmlElement = document
            .get_element_by_id("bookAnchor")
            .expect("no book anchor")
            .dyn_into()
            .expect("anchor not an element");
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("embers")
            .expect("no ember canvas")
            .dyn_into()
            .expect("not a canvas");
        let bg_img: HtmlImageElement = document
            .get_element_by_id("bgImg")
            .expect("no background image")
            .dyn_into()
            .expect("not an image");

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .expect("context lookup failed")
            .expect("no 2d context")
            .dyn_into()
            .expect("not a 2d context");

        let seed = js_sys::Date::now() as u64;
        let config = load_config(&document);
        let app = Rc::new(RefCell::new(App {
            engine: EmberEngine::new(config, seed),
            reader: Reader::default(),
            map: SpriteMap::default(),
            surface: CanvasSurface { ctx },
            canvas,
            anchor,
            bg_img,
            last_time: 0.0,
            frame_carry: 0.0,
        }));

        log::info!("Animation core initialized with seed: {}", seed);

        app.borrow_mut().snap_book();

        setup_hover_handlers(app.clone());
        setup_reader_handlers(app.clone());
        setup_layout_handlers(app.clone());
        setup_ready_beat();
        setup_ambient_embers(seed);

        log::info!("Stag Lore running!");
    }

    /// Stillness before life: mark the page ready after a short beat so
    /// the entrance never reads as loading lag.
    fn setup_ready_beat() {
        let closure = Closure::once(move || {
            let document = web_sys::window().unwrap().document().unwrap();
            if let Some(body) = document.body() {
                let _ = body.class_list().add_1("ready");
            }
        });
        let window = web_sys::window().unwrap();
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            READY_DELAY_MS,
        );
        closure.forget();
    }

    /// Spawn the load-time ambient ember spans after the warmup beat.
    /// These are pure CSS animation; the canvas sparks only run on hover.
    fn setup_ambient_embers(seed: u64) {
        let closure = Closure::once(move || {
            let document = web_sys::window().unwrap().document().unwrap();
            let Some(wrap) = document.query_selector(".embers").ok().flatten() else {
                return;
            };
            wrap.set_inner_html("");

            let mut rng = Pcg32::seed_from_u64(seed);
            let embers = AmbientConfig::default().spawn(&mut rng);
            let count = embers.len();
            for ember in embers {
                let Ok(span) = document.create_element("span") else {
                    continue;
                };
                span.set_class_name("ember");
                let Ok(span) = span.dyn_into::<web_sys::HtmlElement>() else {
                    continue;
                };
                let style = span.style();
                let _ = style.set_property("--x", &format!("{}%", ember.x));
                let _ = style.set_property("--y", &format!("{}%", ember.y));
                let _ = style.set_property("--s", &format!("{}px", ember.size));
                let _ = style.set_property("--d", &format!("{}s", ember.duration));
                let _ = style.set_property("--delay", &format!("{}s", ember.delay));
                let _ = wrap.append_child(&span);
            }
            log::info!("spawned {count} ambient embers");
        });
        let window = web_sys::window().unwrap();
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            EMBER_WARMUP_MS,
        );
        closure.forget();
    }

    fn start_embers(app: &Rc<RefCell<App>>) {
        let started = {
            let mut a = app.borrow_mut();
            let started = a.engine.start();
            if started {
                a.last_time = 0.0;
                a.frame_carry = 0.0;
                let _ = a.anchor.class_list().add_1("is-burning");
            }
            started
        };
        // Only the transition asks for a loop, and the arm guard refuses
        // when a callback from before a raced stop is still pending
        if started {
            request_animation_frame(app.clone());
        }
    }

    fn stop_embers(app: &Rc<RefCell<App>>) {
        if !app.borrow_mut().engine.stop() {
            return;
        }
        {
            let a = app.borrow();
            let _ = a.anchor.class_list().remove_1("is-burning");
        }

        // Wipe after a short grace delay; a re-hover before the timer
        // fires keeps the sparks on screen
        let app = app.clone();
        let closure = Closure::once(move || {
            let a = &mut *app.borrow_mut();
            if a.engine.clear_if_stopped(&mut a.surface) {
                log::info!("ember canvas cleared");
            }
        });
        let window = web_sys::window().unwrap();
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            CLEAR_DELAY_MS,
        );
        closure.forget();
    }

    fn setup_hover_handlers(app: Rc<RefCell<App>>) {
        let anchor = app.borrow().anchor.clone();

        for event in ["mouseenter", "focusin"] {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                start_embers(&app);
            });
            let _ =
                anchor.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        for event in ["mouseleave", "focusout"] {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                stop_embers(&app);
            });
            let _ =
                anchor.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_reader_handlers(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();
        let anchor = app.borrow().anchor.clone();

        // Click the book: open the reader
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
                open_reader(&app);
            });
            let _ =
                anchor.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Backdrop / close button
        if let Some(reader_el) = document.get_element_by_id("reader") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let is_close = event
                    .target()
                    .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
                    .and_then(|el| el.closest("[data-close]").ok().flatten())
                    .is_some();
                if is_close {
                    close_reader(&app);
                }
            });
            let _ = reader_el
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Page-turn zones
        if let Some(zone) = document.query_selector(".zone-right").ok().flatten() {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
                flip_forward(&app);
            });
            let _ =
                zone.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        if let Some(zone) = document.query_selector(".zone-left").ok().flatten() {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
                page_back(&app);
            });
            let _ =
                zone.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if !app.borrow().reader.is_open() {
                    return;
                }
                match event.key().as_str() {
                    "Escape" => close_reader(&app),
                    "ArrowRight" => flip_forward(&app),
                    "ArrowLeft" => page_back(&app),
                    _ => {}
                }
            });
            let _ = document
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn open_reader(app: &Rc<RefCell<App>>) {
        let mut a = app.borrow_mut();
        if !a.reader.open() {
            return;
        }
        let document = web_sys::window().unwrap().document().unwrap();
        a.paint_spread(&document);
        drop(a);

        set_class(&document, "reader", "reader open");
        if let Some(el) = document.get_element_by_id("reader") {
            let _ = el.set_attribute("aria-hidden", "false");
        }
        if let Some(root) = document.document_element() {
            let _ = root.class_list().add_1("no-scroll");
        }
    }

    fn close_reader(app: &Rc<RefCell<App>>) {
        if !app.borrow_mut().reader.close() {
            return;
        }
        let document = web_sys::window().unwrap().document().unwrap();
        set_class(&document, "reader", "reader");
        if let Some(el) = document.get_element_by_id("reader") {
            let _ = el.set_attribute("aria-hidden", "true");
        }
        if let Some(root) = document.document_element() {
            let _ = root.class_list().remove_1("no-scroll");
        }
    }

    fn flip_forward(app: &Rc<RefCell<App>>) {
        let faces = {
            let mut a = app.borrow_mut();
            a.reader.begin_flip()
        };
        let Some(faces) = faces else {
            return;
        };

        let document = web_sys::window().unwrap().document().unwrap();

        // Leaf front shows the page being turned, back the one revealed
        set_text(&document, "flipFrontTitle", &faces.front.title);
        set_text(&document, "flipFrontBody", &faces.front.body);
        set_text(&document, "flipFrontFooter", &faces.front.footer);
        set_text(&document, "flipBackTitle", &faces.back.title);
        set_text(&document, "flipBackBody", &faces.back.body);
        set_text(&document, "flipBackFooter", &faces.back.footer);

        set_class(&document, "reader", "reader open flipping");

        // Commit once the CSS pageTurn keyframes finish
        let app = app.clone();
        let closure = Closure::once(move || {
            let document = web_sys::window().unwrap().document().unwrap();
            let mut a = app.borrow_mut();
            if a.reader.finish_flip() {
                a.paint_spread(&document);
                drop(a);
                set_class(&document, "reader", "reader open");
            }
        });
        let window = web_sys::window().unwrap();
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            FLIP_DURATION_MS,
        );
        closure.forget();
    }

    fn page_back(app: &Rc<RefCell<App>>) {
        let mut a = app.borrow_mut();
        if a.reader.page_back() {
            let document = web_sys::window().unwrap().document().unwrap();
            a.paint_spread(&document);
        }
    }

    fn setup_layout_handlers(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                app.borrow_mut().snap_book();
            });
            let _ = window
                .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // The intrinsic size may be unknown until decode completes
        {
            let bg_img = app.borrow().bg_img.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                log::info!("background image decoded, re-snapping anchor");
                app.borrow_mut().snap_book();
            });
            let _ =
                bg_img.add_event_listener_with_callback("load", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        if !app.borrow_mut().engine.arm_frame_loop() {
            return;
        }
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        let keep_going = {
            let a = &mut *app.borrow_mut();
            a.engine.frame_fired();
            a.frame(time);
            a.engine.is_running()
        };

        // stop() simply stops asking for the next frame; the in-flight
        // frame above still completed normally
        if keep_going {
            request_animation_frame(app);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_page::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Stag Lore (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web page");

    println!("\nRunning ember smoke test...");
    smoke_test_embers();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless run of the full engine cycle against the recording surface
#[cfg(not(target_arch = "wasm32"))]
fn smoke_test_embers() {
    use stag_lore::render::Recorder;
    use stag_lore::{EmberConfig, EmberEngine, SpriteMap, Viewport};

    let map = SpriteMap::default();
    let rect = map
        .anchor_rect(Viewport::new(1920.0, 1080.0))
        .expect("viewport is valid");

    let mut engine = EmberEngine::new(EmberConfig::default(), 0xCAFE);
    engine.resize(rect.width, rect.height, 2.0);
    engine.start();
    engine.tick(120);

    let mut recorder = Recorder::new();
    engine.render(&mut recorder);

    assert!(engine.spark_count() > 0, "sparks should be alive");
    assert!(
        engine.spark_count() <= engine.config().tuning.max_sparks,
        "capacity bound must hold"
    );
    assert!(recorder.circles() >= engine.spark_count());
    println!(
        "✓ {} sparks alive after 120 frames, {} draw calls",
        engine.spark_count(),
        recorder.ops.len()
    );
}
