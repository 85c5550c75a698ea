// Copyright 2025 The stratus Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Signal types that can trigger shutdown
#[derive(Debug, Clone, Copy)]
pub enum ShutdownSignal {
    /// CTRL+C (SIGINT) signal
    Interrupt,
    /// SIGTERM signal (Unix only)
    #[cfg(unix)]
    Terminate,
    /// Manual shutdown request
    Manual,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "SIGINT (CTRL+C)"),
            #[cfg(unix)]
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
            ShutdownSignal::Manual => write!(f, "Manual"),
        }
    }
}

/// Spawns a task that listens for shutdown signals and notifies all
/// subscribers via a broadcast channel.
///
/// On Unix this listens for both SIGINT (CTRL+C) and SIGTERM, which is
/// what the platform sends before it stops an instance. On Windows only
/// CTRL+C is available.
///
/// Returns a tuple of:
/// - `broadcast::Sender<ShutdownSignal>`: Used to create receivers for shutdown notifications
/// - `JoinHandle<()>`: Handle to the listener task
pub fn spawn_signal_handler() -> (broadcast::Sender<ShutdownSignal>, JoinHandle<()>) {
    let (shutdown_tx, _) = broadcast::channel::<ShutdownSignal>(16);
    let signal_shutdown_tx = shutdown_tx.clone();

    let handle = tokio::spawn(async move {
        listen_for_signals(signal_shutdown_tx).await;
    });

    (shutdown_tx, handle)
}

async fn listen_for_signals(shutdown_tx: broadcast::Sender<ShutdownSignal>) {
    #[cfg(unix)]
    {
        listen_for_signals_unix(shutdown_tx).await;
    }
    #[cfg(not(unix))]
    {
        listen_for_signals_windows(shutdown_tx).await;
    }
}

/// Unix-specific signal handling (SIGINT and SIGTERM)
#[cfg(unix)]
async fn listen_for_signals_unix(shutdown_tx: broadcast::Sender<ShutdownSignal>) {
    use tokio::signal::unix::{signal, SignalKind};

    let (Ok(mut sigint), Ok(mut sigterm)) = (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) else {
        return;
    };

    tokio::select! {
        _ = sigint.recv() => {
            let _ = shutdown_tx.send(ShutdownSignal::Interrupt);
        }
        _ = sigterm.recv() => {
            let _ = shutdown_tx.send(ShutdownSignal::Terminate);
        }
    }
}

/// Windows-specific signal handling (CTRL+C only)
#[cfg(not(unix))]
async fn listen_for_signals_windows(shutdown_tx: broadcast::Sender<ShutdownSignal>) {
    if tokio::signal::ctrl_c().await.is_ok() {
        let _ = shutdown_tx.send(ShutdownSignal::Interrupt);
    }
}

/// Creates a shutdown receiver from the broadcast sender
pub fn create_shutdown_receiver(
    shutdown_tx: &broadcast::Sender<ShutdownSignal>,
) -> broadcast::Receiver<ShutdownSignal> {
    shutdown_tx.subscribe()
}

/// Utility function to manually trigger shutdown (useful for testing or graceful shutdown)
pub fn trigger_manual_shutdown(
    shutdown_tx: &broadcast::Sender<ShutdownSignal>,
) -> Result<(), broadcast::error::SendError<ShutdownSignal>> {
    shutdown_tx.send(ShutdownSignal::Manual).map(|_| ())
}
