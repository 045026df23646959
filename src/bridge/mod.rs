//! Bridge loop. Scan, resolve and drive the IPC session once per tick.
//!
//! Each tick is self-contained: any failure is logged, reported as a
//! [`TickOutcome`], and retried on the next tick. The loop owns the
//! session, the catalog, and the detector; nothing else touches them.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::catalog::GameCatalog;
use crate::ipc::protocol::Activity;
use crate::ipc::session::Session;
use crate::resolver::GameDetector;

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The process table could not be read; session left as it was.
    ScanFailed,
    /// No game and no connection.
    Idle,
    /// The game exited; the connection was closed.
    Disconnected,
    /// Could not connect for this game; retried next tick.
    ConnectFailed { client_id: String },
    /// Activity sent. `connected` is set when this tick opened the
    /// connection.
    Updated { client_id: String, connected: bool },
    /// The connection broke while sending; reconnect next tick.
    UpdateFailed { client_id: String },
}

pub struct Bridge<D> {
    detector: D,
    catalog: GameCatalog,
    session: Session,
    distro: String,
    clear_on_disconnect: bool,
    /// Last game reported as missing from the catalog, to warn once.
    unresolved: Option<String>,
}

impl<D: GameDetector> Bridge<D> {
    pub fn new(detector: D, catalog: GameCatalog, session: Session, distro: String) -> Self {
        Self {
            detector,
            catalog,
            session,
            distro,
            clear_on_disconnect: false,
            unresolved: None,
        }
    }

    /// Send an empty activity before closing when the game goes away.
    pub fn clear_on_disconnect(mut self, clear: bool) -> Self {
        self.clear_on_disconnect = clear;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// One scan-resolve-connect-update cycle.
    pub async fn tick(&mut self) -> TickOutcome {
        let report = match self.detector.scan() {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "process scan failed");
                return TickOutcome::ScanFailed;
            }
        };
        if report.skipped > 0 {
            tracing::trace!(skipped = report.skipped, "unreadable process entries");
        }

        let Some(game) = report.game else {
            if self.session.is_connected() {
                tracing::info!("no game running, closing connection");
                self.session.disconnect(self.clear_on_disconnect).await;
                return TickOutcome::Disconnected;
            }
            return TickOutcome::Idle;
        };

        let resolution = self.catalog.resolve(&game.name);
        if resolution.is_known() {
            self.unresolved = None;
        } else if self.unresolved.as_deref() != Some(game.name.as_str()) {
            tracing::warn!(
                game = %game.name,
                "game not in catalog, the handshake will be rejected"
            );
            self.unresolved = Some(game.name.clone());
        }
        let target = resolution.client_id();

        let mut connected = false;
        if let Some(active) = self.session.active_client_id()
            && active != target
        {
            tracing::info!(from = active, to = target, game = %game.name, "game changed, reconnecting");
            self.session.disconnect(false).await;
        }
        if !self.session.is_connected() {
            match self.session.connect(target).await {
                Ok(_) => {
                    tracing::info!(game = %game.name, pid = game.pid, client_id = target, "connected");
                    connected = true;
                }
                Err(e) => {
                    tracing::warn!(game = %game.name, client_id = target, error = %e, "connection failed");
                    return TickOutcome::ConnectFailed {
                        client_id: target.to_string(),
                    };
                }
            }
        }

        let activity = Activity::playing(&game.name, &self.distro);
        match self.session.set_activity(game.pid, activity).await {
            Ok(()) => TickOutcome::Updated {
                client_id: target.to_string(),
                connected,
            },
            Err(e) => {
                tracing::warn!(game = %game.name, error = %e, "activity update failed");
                TickOutcome::UpdateFailed {
                    client_id: target.to_string(),
                }
            }
        }
    }

    /// Tick every `interval` until `shutdown` resolves, then close the
    /// connection.
    pub async fn run(mut self, interval: Duration, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let outcome = self.tick().await;
                    tracing::debug!(?outcome, "tick");
                }
            }
        }

        tracing::info!("shutting down");
        self.session.disconnect(self.clear_on_disconnect).await;
    }
}
