// Request dispatcher - bounded queue in front of a small worker pool

use crate::core::bridge_service::BridgeService;
use crate::core::config::BridgeConfig;
use crate::models::channel::{MethodCall, MethodResponse};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};

struct Request {
    call: MethodCall,
    reply: oneshot::Sender<MethodResponse>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel closed")]
    Closed,
}

/// Host-side endpoint of the method channel
#[derive(Clone)]
pub struct ChannelHandle {
    name: Arc<str>,
    sender: mpsc::Sender<Request>,
}

impl ChannelHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send one call and wait for its response
    pub async fn invoke(&self, call: MethodCall) -> Result<MethodResponse, ChannelError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Request { call, reply })
            .await
            .map_err(|_| ChannelError::Closed)?;
        response.await.map_err(|_| ChannelError::Closed)
    }
}

/// Start serving `service` on a channel.
///
/// The returned task ends once every handle is dropped and in-flight requests
/// have finished; the session is disposed on the way out.
pub fn spawn(service: BridgeService, config: &BridgeConfig) -> (ChannelHandle, JoinHandle<()>) {
    let (sender, receiver) = mpsc::channel(config.request_queue_size.max(1));
    let permits = config.max_concurrent_requests.max(1);
    let handle = ChannelHandle {
        name: Arc::from(config.channel_name.as_str()),
        sender,
    };

    log::info!(
        "Serving channel '{}' ({} workers, queue {})",
        config.channel_name,
        permits,
        config.request_queue_size
    );

    let task = tokio::spawn(serve(Arc::new(service), receiver, permits));
    (handle, task)
}

async fn serve(service: Arc<BridgeService>, mut receiver: mpsc::Receiver<Request>, permits: usize) {
    let limiter = Arc::new(Semaphore::new(permits));
    let mut in_flight = JoinSet::new();

    while let Some(request) = receiver.recv().await {
        // Reap finished workers so the set stays small
        reap_finished(&mut in_flight);

        let permit = match limiter.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };

        let service = service.clone();
        in_flight.spawn(async move {
            let method = request.call.method.clone();
            let response = service.handle(request.call).await;
            if request.reply.send(response).is_err() {
                log::debug!("Caller went away before '{}' completed", method);
            }
            drop(permit);
        });
    }

    while let Some(joined) = in_flight.join_next().await {
        log_worker_exit(joined);
    }

    log::info!("Channel detached, releasing pose engine");
    service.session().dispose().await;
}

/// Collect workers that already finished. Returns how many of them failed.
fn reap_finished(in_flight: &mut JoinSet<()>) -> usize {
    let mut failed = 0;
    while let Some(joined) = in_flight.try_join_next() {
        if !log_worker_exit(joined) {
            failed += 1;
        }
    }
    failed
}

fn log_worker_exit(joined: Result<(), JoinError>) -> bool {
    match joined {
        Ok(()) => true,
        Err(e) => {
            log::error!("Request worker failed: {}", e);
            false
        }
    }
}
