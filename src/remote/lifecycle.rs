//! Connection state and timer bookkeeping for the remote channel.
//!
//! The async driver in `client` asks this type before arming either timer,
//! which keeps the two invariants in one place: the liveness ticker only runs
//! while connected, and at most one reconnect is ever pending.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug)]
pub struct Lifecycle {
    state: ConnectionState,
    liveness_armed: bool,
    reconnect_pending: bool,
    stopped: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            liveness_armed: false,
            reconnect_pending: false,
            stopped: false,
        }
    }
}

impl Lifecycle {
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn liveness_armed(&self) -> bool {
        self.liveness_armed
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Begin a connection attempt. Returns false when one is already open or
    /// in flight, or after shutdown.
    pub fn begin_connect(&mut self) -> bool {
        if self.stopped || self.state != ConnectionState::Disconnected {
            return false;
        }
        self.state = ConnectionState::Connecting;
        true
    }

    /// The socket opened: cancel any pending reconnect and arm liveness.
    pub fn opened(&mut self) {
        if self.stopped {
            return;
        }
        self.state = ConnectionState::Connected;
        self.reconnect_pending = false;
        self.liveness_armed = true;
    }

    /// The socket closed or a connect attempt failed.
    ///
    /// Returns true when the caller must arm a new reconnect timer; false
    /// when one is already pending or the channel has been shut down.
    pub fn closed(&mut self) -> bool {
        self.state = ConnectionState::Disconnected;
        self.liveness_armed = false;
        if self.stopped || self.reconnect_pending {
            return false;
        }
        self.reconnect_pending = true;
        true
    }

    /// The reconnect timer fired. Returns whether to start a new attempt.
    pub fn reconnect_due(&mut self) -> bool {
        if !self.reconnect_pending {
            return false;
        }
        self.reconnect_pending = false;
        self.begin_connect()
    }

    /// A ping may go out only on an open connection.
    pub fn should_ping(&self) -> bool {
        self.liveness_armed && self.state == ConnectionState::Connected
    }

    /// Tear down: disarm both timers and refuse further connects.
    pub fn shutdown(&mut self) {
        self.stopped = true;
        self.state = ConnectionState::Disconnected;
        self.liveness_armed = false;
        self.reconnect_pending = false;
    }
}
