// ── Topology rendezvous ──
//
// The layer-3 and link tasks may fetch their data early, but must not
// touch the node map before the topology task has stored it. One
// one-shot channel per waiter; dropping the sender side unblocks both
// waiters with `Cancelled`.

use tokio::sync::oneshot;

use crate::error::CoreError;

/// Held by the topology task. Consumed once the node map is in place.
pub(crate) struct TopologyReady {
    layer3: oneshot::Sender<()>,
    links: oneshot::Sender<()>,
}

impl TopologyReady {
    pub(crate) fn release(self) {
        // A waiter that already went away is fine.
        let _ = self.layer3.send(());
        let _ = self.links.send(());
    }
}

/// Held by one waiting task.
pub(crate) struct TopologyWait {
    rx: oneshot::Receiver<()>,
    task: &'static str,
}

impl TopologyWait {
    /// Resolves once the topology is released, or with `Cancelled` if the
    /// topology task ended without releasing.
    pub(crate) async fn wait(self) -> Result<(), CoreError> {
        self.rx
            .await
            .map_err(|_| CoreError::Cancelled { task: self.task })
    }
}

/// One releaser and the waiters for the layer-3 and link tasks.
pub(crate) fn topology_barrier() -> (TopologyReady, TopologyWait, TopologyWait) {
    let (layer3_tx, layer3_rx) = oneshot::channel();
    let (links_tx, links_rx) = oneshot::channel();
    (
        TopologyReady {
            layer3: layer3_tx,
            links: links_tx,
        },
        TopologyWait {
            rx: layer3_rx,
            task: "layer3",
        },
        TopologyWait {
            rx: links_rx,
            task: "links",
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn release_wakes_both_waiters() {
        let (ready, layer3, links) = topology_barrier();
        let waiters = tokio::spawn(async move { (layer3.wait().await, links.wait().await) });
        ready.release();
        let (a, b) = waiters.await.unwrap_or_else(|e| panic!("{e}"));
        assert!(a.is_ok());
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn dropped_releaser_cancels_waiters() {
        let (ready, layer3, links) = topology_barrier();
        drop(ready);
        assert!(matches!(
            layer3.wait().await,
            Err(CoreError::Cancelled { task: "layer3" })
        ));
        assert!(matches!(
            links.wait().await,
            Err(CoreError::Cancelled { task: "links" })
        ));
    }

    #[tokio::test]
    async fn release_survives_gone_waiter() {
        let (ready, layer3, links) = topology_barrier();
        drop(layer3);
        ready.release();
        assert!(links.wait().await.is_ok());
    }
}
