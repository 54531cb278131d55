//! Headless Chrome backed surface.
//!
//! `headless_chrome` is a blocking client, so every call runs on tokio's
//! blocking pool. Pointer state (position and held buttons) is tracked here
//! because the protocol does not report it back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use headless_chrome::protocol::cdp::Emulation;
use headless_chrome::protocol::cdp::Input;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions, Tab};

use super::{
    MouseButton, Point, SurfaceError, SurfaceEvent, SurfaceLauncher, Viewport, VisualSurface,
};

const POINTER_STEP: Duration = Duration::from_millis(16);
const MULTI_CLICK_WINDOW: Duration = Duration::from_millis(500);

/// Launches one Chrome instance per surface.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    pub headless: bool,
    pub viewport: Viewport,
}

impl ChromeLauncher {
    pub fn new(headless: bool, viewport: Viewport) -> Self {
        Self { headless, viewport }
    }
}

#[async_trait]
impl SurfaceLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn VisualSurface>, SurfaceError> {
        let headless = self.headless;
        let viewport = self.viewport;
        let (browser, tab) = run_blocking(move || {
            let launch_options = LaunchOptions {
                headless,
                window_size: Some((viewport.width, viewport.height)),
                ..Default::default()
            };
            let browser = Browser::new(launch_options)
                .map_err(|e| SurfaceError::Launch(format!("failed to launch browser: {e}")))?;
            let tab = browser
                .new_tab()
                .map_err(|e| SurfaceError::Launch(format!("failed to create tab: {e}")))?;
            Ok((browser, tab))
        })
        .await?;

        tracing::debug!(headless, "chrome launched");
        Ok(Box::new(ChromeSurface {
            browser: Some(browser),
            tab,
            pointer: PointerState::default(),
        }))
    }
}

/// Presses of one button at one spot, counted for the CDP `clickCount`.
#[derive(Debug, Clone, Copy)]
struct ClickRun {
    button: MouseButton,
    at: Point,
    count: u32,
    pressed_at: Instant,
}

#[derive(Debug, Clone, Default)]
struct PointerState {
    position: Option<Point>,
    pressed: Vec<MouseButton>,
    last_click: Option<ClickRun>,
}

impl PointerState {
    fn at(&self) -> Point {
        self.position.unwrap_or(Point::new(0.0, 0.0))
    }

    /// Records a press and returns its click count. A press of the same
    /// button at the same spot within `MULTI_CLICK_WINDOW` continues the run.
    fn press(&mut self, button: MouseButton, now: Instant) -> u32 {
        let at = self.at();
        let count = match self.last_click {
            Some(run)
                if run.button == button
                    && run.at == at
                    && now.saturating_duration_since(run.pressed_at) <= MULTI_CLICK_WINDOW =>
            {
                run.count + 1
            }
            _ => 1,
        };
        self.last_click = Some(ClickRun {
            button,
            at,
            count,
            pressed_at: now,
        });
        self.pressed.push(button);
        count
    }

    /// Records a release and returns the click count it completes.
    fn release(&mut self, button: MouseButton) -> u32 {
        self.pressed.retain(|held| *held != button);
        self.last_click
            .filter(|run| run.button == button)
            .map_or(1, |run| run.count)
    }

    /// Moving to another spot ends the current click run.
    fn move_to(&mut self, to: Point) {
        if self.position != Some(to) {
            self.last_click = None;
        }
        self.position = Some(to);
    }
}

pub struct ChromeSurface {
    browser: Option<Browser>,
    tab: Arc<Tab>,
    pointer: PointerState,
}

#[async_trait]
impl VisualSurface for ChromeSurface {
    async fn open(&mut self, url: &str) -> Result<(), SurfaceError> {
        let tab = Arc::clone(&self.tab);
        let url = url.to_string();
        run_blocking(move || {
            tab.navigate_to(&url)
                .map_err(|e| SurfaceError::Navigation(format!("failed to navigate: {e}")))?
                .wait_until_navigated()
                .map_err(|e| {
                    SurfaceError::Navigation(format!("failed to wait for navigation: {e}"))
                })?;
            Ok(())
        })
        .await
    }

    async fn resize(&mut self, viewport: Viewport) -> Result<(), SurfaceError> {
        let tab = Arc::clone(&self.tab);
        run_blocking(move || {
            tab.call_method(Emulation::SetDeviceMetricsOverride {
                width: viewport.width,
                height: viewport.height,
                device_scale_factor: 1.0,
                mobile: false,
                scale: None,
                screen_width: None,
                screen_height: None,
                position_x: None,
                position_y: None,
                dont_set_visible_size: None,
                screen_orientation: None,
                viewport: None,
                display_feature: None,
                device_posture: None,
            })
            .map_err(|e| SurfaceError::Navigation(format!("failed to set viewport: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn capture(&mut self) -> Result<Vec<u8>, SurfaceError> {
        let tab = Arc::clone(&self.tab);
        run_blocking(move || {
            tab.capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
                .map_err(|e| SurfaceError::Capture(e.to_string()))
        })
        .await
    }

    async fn dispatch(&mut self, events: &[SurfaceEvent]) -> Result<(), SurfaceError> {
        let tab = Arc::clone(&self.tab);
        let events = events.to_vec();
        let mut pointer = self.pointer.clone();
        let (pointer, outcome) = run_blocking(move || {
            let outcome = replay(&tab, &mut pointer, &events);
            Ok((pointer, outcome))
        })
        .await?;
        self.pointer = pointer;
        outcome
    }

    async fn release_all(&mut self) -> Result<(), SurfaceError> {
        if self.pointer.pressed.is_empty() {
            return Ok(());
        }
        let released: Vec<SurfaceEvent> = self
            .pointer
            .pressed
            .iter()
            .map(|button| SurfaceEvent::PointerUp { button: *button })
            .collect();
        self.dispatch(&released).await
    }

    async fn close(&mut self) -> Result<(), SurfaceError> {
        let Some(browser) = self.browser.take() else {
            return Ok(());
        };
        let tab = Arc::clone(&self.tab);
        run_blocking(move || {
            if let Err(e) = tab.close(false) {
                tracing::debug!("tab close failed: {e}");
            }
            // Dropping the browser terminates the Chrome process.
            drop(browser);
            Ok(())
        })
        .await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, SurfaceError>
where
    F: FnOnce() -> Result<T, SurfaceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SurfaceError::Task(e.to_string()))?
}

fn replay(
    tab: &Tab,
    pointer: &mut PointerState,
    events: &[SurfaceEvent],
) -> Result<(), SurfaceError> {
    for event in events {
        match event {
            SurfaceEvent::PointerMove { to, duration } => {
                move_pointer(tab, pointer, *to, *duration)?;
            }
            SurfaceEvent::PointerDown { button } => {
                let clicks = pointer.press(*button, Instant::now());
                mouse_button_event(
                    tab,
                    Input::DispatchMouseEventTypeOption::MousePressed,
                    pointer.at(),
                    *button,
                    clicks,
                )?;
            }
            SurfaceEvent::PointerUp { button } => {
                let clicks = pointer.release(*button);
                mouse_button_event(
                    tab,
                    Input::DispatchMouseEventTypeOption::MouseReleased,
                    pointer.at(),
                    *button,
                    clicks,
                )?;
            }
            SurfaceEvent::Pause(duration) => std::thread::sleep(*duration),
            SurfaceEvent::Wheel {
                at,
                delta_x,
                delta_y,
            } => {
                tab.call_method(Input::DispatchMouseEvent {
                    Type: Input::DispatchMouseEventTypeOption::MouseWheel,
                    x: at.x,
                    y: at.y,
                    delta_x: Some(*delta_x),
                    delta_y: Some(*delta_y),
                    modifiers: None,
                    timestamp: None,
                    button: None,
                    buttons: None,
                    click_count: None,
                    force: None,
                    tangential_pressure: None,
                    tilt_x: None,
                    tilt_y: None,
                    twist: None,
                    pointer_Type: None,
                })
                .map_err(|e| SurfaceError::Input(format!("wheel: {e}")))?;
                pointer.move_to(*at);
            }
            SurfaceEvent::Key(key) => press_key(tab, key)?,
        }
    }
    Ok(())
}

fn move_pointer(
    tab: &Tab,
    pointer: &mut PointerState,
    to: Point,
    duration: Duration,
) -> Result<(), SurfaceError> {
    let from = pointer.position.unwrap_or(to);
    let steps = (duration.as_millis() / POINTER_STEP.as_millis()).max(1) as u32;
    let pause = duration / steps;
    for step in 1..=steps {
        let t = f64::from(step) / f64::from(steps);
        tab.call_method(Input::DispatchMouseEvent {
            Type: Input::DispatchMouseEventTypeOption::MouseMoved,
            x: from.x + (to.x - from.x) * t,
            y: from.y + (to.y - from.y) * t,
            button: pointer.pressed.first().map(|b| cdp_button(*b)),
            modifiers: None,
            timestamp: None,
            buttons: None,
            click_count: None,
            force: None,
            tangential_pressure: None,
            tilt_x: None,
            tilt_y: None,
            twist: None,
            delta_x: None,
            delta_y: None,
            pointer_Type: None,
        })
        .map_err(|e| SurfaceError::Input(format!("pointer move: {e}")))?;
        if !pause.is_zero() {
            std::thread::sleep(pause);
        }
    }
    pointer.move_to(to);
    Ok(())
}

fn mouse_button_event(
    tab: &Tab,
    kind: Input::DispatchMouseEventTypeOption,
    at: Point,
    button: MouseButton,
    click_count: u32,
) -> Result<(), SurfaceError> {
    tab.call_method(Input::DispatchMouseEvent {
        Type: kind,
        x: at.x,
        y: at.y,
        button: Some(cdp_button(button)),
        click_count: Some(click_count),
        modifiers: None,
        timestamp: None,
        buttons: None,
        force: None,
        tangential_pressure: None,
        tilt_x: None,
        tilt_y: None,
        twist: None,
        delta_x: None,
        delta_y: None,
        pointer_Type: None,
    })
    .map_err(|e| SurfaceError::Input(format!("mouse button: {e}")))?;
    Ok(())
}

fn press_key(tab: &Tab, key: &str) -> Result<(), SurfaceError> {
    let mut chars = key.chars();
    let single = matches!((chars.next(), chars.next()), (Some(_), None));
    if single {
        tab.send_character(key)
            .map_err(|e| SurfaceError::Input(format!("character {key:?}: {e}")))?;
        return Ok(());
    }
    // Unknown named keys are skipped so a bad key name cannot end the game.
    if let Err(e) = tab.press_key(key) {
        tracing::warn!(target: "dispatch", key, "key not supported by browser: {e}");
    }
    Ok(())
}

fn cdp_button(button: MouseButton) -> Input::MouseButton {
    match button {
        MouseButton::Left => Input::MouseButton::Left,
        MouseButton::Right => Input::MouseButton::Right,
        MouseButton::Middle => Input::MouseButton::Middle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointer_at(x: f64, y: f64) -> PointerState {
        let mut pointer = PointerState::default();
        pointer.move_to(Point::new(x, y));
        pointer
    }

    #[test]
    fn repeated_presses_in_place_count_up() {
        let mut pointer = pointer_at(100.0, 100.0);
        let start = Instant::now();

        assert_eq!(pointer.press(MouseButton::Left, start), 1);
        assert_eq!(pointer.release(MouseButton::Left), 1);
        assert_eq!(
            pointer.press(MouseButton::Left, start + Duration::from_millis(50)),
            2
        );
        assert_eq!(pointer.release(MouseButton::Left), 2);
        assert_eq!(
            pointer.press(MouseButton::Left, start + Duration::from_millis(80)),
            3
        );
        assert_eq!(pointer.release(MouseButton::Left), 3);
        assert!(pointer.pressed.is_empty());
    }

    #[test]
    fn moving_away_or_waiting_starts_a_new_click() {
        let mut pointer = pointer_at(10.0, 10.0);
        let start = Instant::now();
        pointer.press(MouseButton::Left, start);
        pointer.release(MouseButton::Left);

        // Moving in place, as a click does between press and release, keeps the run.
        pointer.move_to(Point::new(10.0, 10.0));
        assert_eq!(
            pointer.press(MouseButton::Left, start + Duration::from_millis(10)),
            2
        );
        pointer.release(MouseButton::Left);

        pointer.move_to(Point::new(20.0, 10.0));
        assert_eq!(
            pointer.press(MouseButton::Left, start + Duration::from_millis(20)),
            1
        );
        pointer.release(MouseButton::Left);

        assert_eq!(pointer.press(MouseButton::Left, start + Duration::from_secs(2)), 1);
        pointer.release(MouseButton::Left);

        assert_eq!(
            pointer.press(MouseButton::Right, start + Duration::from_millis(2010)),
            1
        );
    }
}
