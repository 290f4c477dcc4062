//! Serial session: owns the device connection and turns its lines into
//! slider move events.
//!
//! A connected session runs two workers. A blocking reader thread pulls
//! bytes off the port and forwards complete lines over a bounded channel;
//! the async dispatch task parses each line, runs it through the
//! [`Interpreter`] and fans resulting [`SliderMoveEvent`]s out to
//! subscribers. A third task listens for config reloads for the lifetime of
//! the session and renews the connection when its parameters change.

mod error;
mod interpreter;

pub use error::{SessionError, SessionResult};
pub use interpreter::{Interpreter, Mode, SliderMoveEvent, VOLUME_STEP};

use crate::config::{ConfigManager, ConnectionInfo};
use crate::fanout::Broadcaster;
use crate::port::{PortConfiguration, PortError, PortOpener, SerialPortAdapter};
use crate::protocol::{LineSplitter, Token};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Pause between tearing a connection down and acting on a reload.
pub const STOP_DELAY: Duration = Duration::from_millis(50);

const LINE_CHANNEL_CAPACITY: usize = 64;
const READ_BUFFER_SIZE: usize = 64;

struct Connection {
    params: ConnectionInfo,
    stop_tx: oneshot::Sender<()>,
    dispatch: JoinHandle<()>,
}

pub struct SerialSession {
    config: Arc<ConfigManager>,
    opener: Arc<dyn PortOpener>,
    interpreter: Arc<Mutex<Interpreter>>,
    moves: Arc<Broadcaster<SliderMoveEvent>>,
    connection: Mutex<Option<Connection>>,
    /// Parameters of the most recent start attempt, successful or not.
    last_params: Mutex<Option<ConnectionInfo>>,
    reload_listener: JoinHandle<()>,
}

impl SerialSession {
    /// Create a disconnected session and subscribe it to config reloads.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: Arc<ConfigManager>, opener: Arc<dyn PortOpener>) -> Arc<Self> {
        let reloads = config.subscribe_to_changes();
        debug!("Created serial session instance");

        Arc::new_cyclic(|weak: &Weak<Self>| Self {
            config,
            opener,
            interpreter: Arc::new(Mutex::new(Interpreter::new())),
            moves: Arc::new(Broadcaster::new()),
            connection: Mutex::new(None),
            last_params: Mutex::new(None),
            reload_listener: tokio::spawn(watch_reloads(weak.clone(), reloads)),
        })
    }

    /// Open the configured port and start reading from it.
    ///
    /// Fails with [`SessionError::AlreadyActive`] while a connection is up;
    /// call [`stop`](Self::stop) first.
    pub fn start(&self) -> SessionResult<()> {
        let mut connection = self.connection.lock();
        if connection.is_some() {
            warn!("Already connected, can't start another without closing first");
            return Err(SessionError::AlreadyActive);
        }

        let params = self.config.connection_info();
        *self.last_params.lock() = Some(params.clone());

        debug!(
            port = %params.serial_port,
            baud_rate = params.baud_rate,
            "Attempting serial connection"
        );

        let port = self
            .opener
            .open(&params.serial_port, &PortConfiguration::new(params.baud_rate))
            .map_err(|e| {
                warn!(error = %e, "Failed to open serial connection");
                e
            })?;

        let (lines_tx, lines_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));
        let reader = {
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name(format!("serial-reader-{}", params.serial_port.to_lowercase()))
                .spawn(move || read_lines(port, lines_tx, shutdown))
                .map_err(PortError::from)?
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        let dispatch = tokio::spawn(dispatch_lines(
            params.serial_port.clone(),
            Arc::clone(&self.config),
            Arc::clone(&self.interpreter),
            Arc::clone(&self.moves),
            lines_rx,
            stop_rx,
            shutdown,
            reader,
        ));

        info!(port = %params.serial_port, baud_rate = params.baud_rate, "Connected");
        *connection = Some(Connection {
            params,
            stop_tx,
            dispatch,
        });
        Ok(())
    }

    /// Close the active connection and wait for its workers to finish.
    /// Does nothing when not connected.
    pub async fn stop(&self) {
        let Some(connection) = self.connection.lock().take() else {
            debug!("Not currently connected, nothing to stop");
            return;
        };

        debug!(port = %connection.params.serial_port, "Shutting down serial connection");
        let _ = connection.stop_tx.send(());
        if let Err(e) = connection.dispatch.await {
            warn!(error = %e, "Serial dispatch task ended abnormally");
        }
    }

    /// Receive every slider move produced from now on, in order.
    pub fn subscribe_to_slider_moves(&self) -> mpsc::Receiver<SliderMoveEvent> {
        self.moves.subscribe()
    }

    /// True from a successful start until stop, even if the device has
    /// gone quiet or disappeared in between.
    pub fn is_connected(&self) -> bool {
        self.connection.lock().is_some()
    }

    pub fn cached_slider_count(&self) -> usize {
        self.interpreter.lock().cached_slider_count()
    }

    pub fn current_slider(&self) -> Option<String> {
        self.interpreter.lock().current_slider().map(str::to_string)
    }

    pub fn mode(&self) -> Mode {
        self.interpreter.lock().mode()
    }

    async fn on_config_reload(&self) {
        let interpreter = Arc::clone(&self.interpreter);
        tokio::spawn(async move {
            tokio::time::sleep(STOP_DELAY).await;
            interpreter.lock().reset_slider_count();
        });

        let current = self.config.connection_info();
        let changed = matches!(&*self.last_params.lock(), Some(previous) if *previous != current);
        if !changed {
            return;
        }

        info!(
            port = %current.serial_port,
            baud_rate = current.baud_rate,
            "Detected change in connection parameters, attempting to renew connection"
        );
        self.stop().await;
        tokio::time::sleep(STOP_DELAY).await;

        match self.start() {
            Ok(()) => debug!("Renewed connection successfully"),
            Err(e) => warn!(error = %e, "Failed to renew connection after parameter change"),
        }
    }
}

impl Drop for SerialSession {
    fn drop(&mut self) {
        self.reload_listener.abort();
        if let Some(connection) = self.connection.get_mut().take() {
            let _ = connection.stop_tx.send(());
        }
    }
}

impl std::fmt::Debug for SerialSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSession")
            .field("connected", &self.is_connected())
            .field("last_params", &*self.last_params.lock())
            .field("moves", &self.moves)
            .finish()
    }
}

async fn watch_reloads(
    session: Weak<SerialSession>,
    mut reloads: mpsc::Receiver<crate::config::ConfigReloaded>,
) {
    while let Some(signal) = reloads.recv().await {
        let Some(session) = session.upgrade() else {
            return;
        };
        debug!(generation = signal.generation, "Config reloaded");
        session.on_config_reload().await;
    }
}

/// Blocking read loop. Ends when `shutdown` is set, the line receiver goes
/// away, or the port fails with a non-transient error.
fn read_lines(
    mut port: Box<dyn SerialPortAdapter>,
    lines: mpsc::Sender<String>,
    shutdown: Arc<AtomicBool>,
) {
    let mut splitter = LineSplitter::new();
    let mut buffer = [0u8; READ_BUFFER_SIZE];

    while !shutdown.load(Ordering::SeqCst) {
        let n = match port.read_bytes(&mut buffer) {
            Ok(n) => n,
            Err(e) if e.is_transient() => continue,
            Err(e) => {
                warn!(port = port.name(), error = %e, "Failed to read line from serial");
                return;
            }
        };

        for line in splitter.push(&buffer[..n]) {
            if lines.blocking_send(line).is_err() {
                return;
            }
        }
    }
    debug!(port = port.name(), "Serial reader stopped");
}

#[allow(clippy::too_many_arguments)]
async fn dispatch_lines(
    port_name: String,
    config: Arc<ConfigManager>,
    interpreter: Arc<Mutex<Interpreter>>,
    moves: Arc<Broadcaster<SliderMoveEvent>>,
    mut lines: mpsc::Receiver<String>,
    mut stop_rx: oneshot::Receiver<()>,
    shutdown: Arc<AtomicBool>,
    reader: thread::JoinHandle<()>,
) {
    let mut reading = true;

    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            line = lines.recv(), if reading => {
                let Some(line) = line else {
                    warn!(port = %port_name, "Serial reader ended, waiting for stop");
                    reading = false;
                    continue;
                };
                let Some(token) = Token::parse_line(&line) else {
                    trace!(port = %port_name, line = ?line, "Ignoring unexpected line");
                    continue;
                };
                let event = interpreter.lock().handle(token, &config);
                if let Some(event) = event {
                    moves.broadcast(event).await;
                }
            }
        }
    }

    // Unblock a reader parked on a full channel before joining it.
    shutdown.store(true, Ordering::SeqCst);
    drop(lines);
    match tokio::task::spawn_blocking(move || reader.join()).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => warn!(port = %port_name, "Serial reader panicked"),
        Err(e) => warn!(port = %port_name, error = %e, "Failed to join serial reader"),
    }
    info!(port = %port_name, "Serial connection closed");
}
