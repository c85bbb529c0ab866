//! Command router: one request line in, one [`Response`] out.
//!
//! | Path       | Params          | Effect                                   |
//! |------------|-----------------|------------------------------------------|
//! | `/`        | none            | control page                             |
//! | `/drive`   | `x`, `y`, `t`   | new drive target, failsafe fed           |
//! | `/btn`     | `id`            | button callback + `btn:<label>` message  |
//! | `/sld`     | `id`, `v`       | clamp + store, slider callback + message |
//! | `/control` | `msg`           | message callback with `+`-decoded text   |
//! | `/health`  | none            | nothing                                  |
//!
//! Parameter problems on `/btn` and `/sld` are answered with status 200
//! and the error text as the body; clients read the body, not the status.
//! The router never touches a connection, so it is testable on its own.

pub mod page;
pub mod registry;

use log::debug;

use crate::codec::{Response, extract_query_int, parse_request_line, query_raw_from};
use crate::drive::{DriveCommand, MotionSupervisor};
use crate::error::{CapacityError, ValidationError};

use registry::{
    ButtonCallback, ButtonRegistration, ButtonRegistry, SliderCallback, SliderRegistration,
    SliderRegistry, label,
};

pub type MessageCallback = Box<dyn FnMut(&str)>;

/// Which handler served a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Drive,
    Button,
    Slider,
    Control,
    Health,
    NotFound,
}

impl Route {
    /// Every route except `NotFound` counts as a successful request.
    pub fn is_success(self) -> bool {
        self != Self::NotFound
    }
}

/// Routing result, written to the connection by the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub route: Route,
    pub response: Response,
}

impl Routed {
    fn ok(route: Route, body: &'static str) -> Self {
        Self {
            route,
            response: Response::text(body),
        }
    }

    fn invalid(route: Route, e: ValidationError) -> Self {
        debug!("{route:?} rejected: {e}");
        Self::ok(route, e.body())
    }
}

#[derive(Default)]
pub struct CommandRouter {
    buttons: ButtonRegistry,
    sliders: SliderRegistry,
    on_message: Option<MessageCallback>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ──────────────────────────────────────────

    pub fn set_message_callback(&mut self, cb: MessageCallback) {
        self.on_message = Some(cb);
    }

    pub fn add_button(&mut self, text: &str, on_press: ButtonCallback) -> Result<usize, CapacityError> {
        let label = label(text)?;
        self.buttons.push(ButtonRegistration::new(label, on_press))
    }

    pub fn add_slider(
        &mut self,
        text: &str,
        on_change: SliderCallback,
        min: i32,
        max: i32,
        initial: i32,
        step: i32,
    ) -> Result<usize, CapacityError> {
        let label = label(text)?;
        self.sliders.push(SliderRegistration::new(
            label, on_change, min, max, initial, step,
        ))
    }

    pub fn clear_buttons(&mut self) {
        self.buttons.clear();
    }

    pub fn clear_sliders(&mut self) {
        self.sliders.clear();
    }

    pub fn buttons(&self) -> &ButtonRegistry {
        &self.buttons
    }

    pub fn sliders(&self) -> &SliderRegistry {
        &self.sliders
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Dispatch one request line.
    ///
    /// A `/drive` request updates `motion` at `now_ms`; nothing else
    /// touches the drive train.
    pub fn route(&mut self, line: &str, motion: &mut MotionSupervisor, now_ms: u32) -> Routed {
        let req = parse_request_line(line);
        if req.method != "GET" {
            return self.not_found();
        }

        match req.path {
            "/" => Routed {
                route: Route::Root,
                response: Response::html(page::render(&self.buttons, &self.sliders)),
            },
            "/drive" => Self::drive(line, motion, now_ms),
            "/btn" => self.button(line),
            "/sld" => self.slider(line),
            "/control" => self.control(line),
            "/health" => Routed::ok(Route::Health, "OK"),
            _ => self.not_found(),
        }
    }

    fn not_found(&self) -> Routed {
        Routed {
            route: Route::NotFound,
            response: Response::not_found(),
        }
    }

    fn drive(line: &str, motion: &mut MotionSupervisor, now_ms: u32) -> Routed {
        let x = extract_query_int(line, "x").unwrap_or(0);
        let y = extract_query_int(line, "y").unwrap_or(0);
        let t = extract_query_int(line, "t").unwrap_or(100);

        let cmd = DriveCommand::from_joystick(x, y, t);
        motion.set_target(cmd, now_ms);
        Routed::ok(Route::Drive, "OK")
    }

    fn button(&mut self, line: &str) -> Routed {
        let Some(id) = extract_query_int(line, "id") else {
            return Routed::invalid(Route::Button, ValidationError::MissingId);
        };
        let Some(button) = self.buttons.get_mut(id) else {
            return Routed::invalid(Route::Button, ValidationError::BadId);
        };

        button.press();
        let msg = format!("btn:{}", button.label());
        self.notify(&msg);
        Routed::ok(Route::Button, "OK")
    }

    fn slider(&mut self, line: &str) -> Routed {
        let Some(id) = extract_query_int(line, "id") else {
            return Routed::invalid(Route::Slider, ValidationError::MissingId);
        };
        let Some(v) = extract_query_int(line, "v") else {
            return Routed::invalid(Route::Slider, ValidationError::MissingValue);
        };
        let Some(slider) = self.sliders.get_mut(id) else {
            return Routed::invalid(Route::Slider, ValidationError::BadId);
        };

        let stored = slider.set(v);
        let msg = format!("sld:{}={stored}", slider.label());
        self.notify(&msg);
        Routed::ok(Route::Slider, "OK")
    }

    fn control(&mut self, line: &str) -> Routed {
        if let Some(raw) = query_raw_from(line, "msg") {
            let msg = raw.replace('+', " ");
            self.notify(&msg);
        }
        Routed::ok(Route::Control, "OK")
    }

    fn notify(&mut self, msg: &str) {
        if let Some(cb) = self.on_message.as_mut() {
            cb(msg);
        }
    }
}
