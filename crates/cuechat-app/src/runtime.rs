//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: UI state machine
//! - [`Bridge`]: Session bridge
//! - [`Driver`]: Platform-specific I/O

use cuechat_client::{ConnectionAction, Environment, SessionConfig, UserId};

use crate::{App, AppAction, AppEvent, Bridge, Driver, DriverEvent};

/// Result of one [`Runtime::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Driver had nothing ready.
    Idle,
    /// An event was processed.
    Processed,
    /// The application asked to quit.
    Quit,
}

/// Generic runtime that orchestrates App, Bridge, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment for correlation ids and timestamps
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    app: App,
    bridge: Bridge<E>,
}

impl<D, E> Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    /// Create a new runtime with the given driver and environment.
    pub fn new(driver: D, env: E, config: SessionConfig) -> Self {
        Self { driver, app: App::new(), bridge: Bridge::new(env, config) }
    }

    /// Log in before the loop starts.
    pub async fn login(&mut self, user_id: UserId) -> Result<(), D::Error> {
        let actions = self.app.login(user_id);
        self.process_actions(actions).await?;
        Ok(())
    }

    /// Run the main event loop until the application quits.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.render()?;

        while self.step().await? != Step::Quit {}

        self.driver.stop();
        Ok(())
    }

    /// Process one event from the driver.
    pub async fn step(&mut self) -> Result<Step, D::Error> {
        let Some(event) = self.driver.poll_event().await? else {
            return Ok(Step::Idle);
        };

        let events = match event {
            DriverEvent::Line(line) => {
                let actions = self.app.handle(AppEvent::Line(line));
                return Ok(if self.process_actions(actions).await? {
                    Step::Quit
                } else {
                    Step::Processed
                });
            },
            DriverEvent::Shutdown => return Ok(Step::Quit),
            DriverEvent::Server(event) => self.bridge.handle_server_event(event),
            DriverEvent::Api(response) => self.bridge.handle_api_response(response),
            DriverEvent::Connected => self.bridge.handle_connected(),
            DriverEvent::Disconnected => self.bridge.handle_disconnected(),
        };

        self.flush().await?;
        if self.process_bridge_events(events).await? {
            return Ok(Step::Quit);
        }
        Ok(Step::Processed)
    }

    /// Step until the driver is idle or the application quits.
    ///
    /// Returns `true` if the application quit.
    pub async fn run_until_idle(&mut self) -> Result<bool, D::Error> {
        loop {
            match self.step().await? {
                Step::Idle => return Ok(false),
                Step::Quit => return Ok(true),
                Step::Processed => {},
            }
        }
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.render()?,
                    AppAction::Quit => return Ok(true),

                    // Session operations go through the bridge
                    AppAction::Login { .. }
                    | AppAction::Logout
                    | AppAction::OpenChat { .. }
                    | AppAction::StartChat { .. }
                    | AppAction::CloseChat { .. }
                    | AppAction::SendMessage { .. } => {
                        let events = self.bridge.process_app_action(action);
                        self.flush().await?;
                        for event in events {
                            pending_actions.extend(self.app.handle(event));
                        }
                    },
                }
            }
        }
        Ok(false)
    }

    /// Process events from Bridge back to App.
    async fn process_bridge_events(&mut self, events: Vec<AppEvent>) -> Result<bool, D::Error> {
        for event in events {
            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Execute pending socket and REST work, in the order it was produced.
    async fn flush(&mut self) -> Result<(), D::Error> {
        for action in self.bridge.take_transport() {
            match action {
                ConnectionAction::Connect => {
                    if !self.driver.is_connected() {
                        self.driver.connect().await?;
                    }
                },
                ConnectionAction::Send(command) => self.driver.send_command(command).await?,
                ConnectionAction::Close => self.driver.disconnect(),
            }
        }

        for request in self.bridge.take_requests() {
            self.driver.submit(request);
        }
        Ok(())
    }

    fn render(&mut self) -> Result<(), D::Error> {
        self.driver.render(&self.app, self.bridge.session())
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a reference to the Bridge
    pub fn bridge(&self) -> &Bridge<E> {
        &self.bridge
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the Driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
